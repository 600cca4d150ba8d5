use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::iter::{Enumerate, Peekable};
use std::path::Path;
use std::str::{FromStr, Lines};

use super::constants::{FOILS_EXTENSION, LAYER_SCALAR_LINES, TARGET_EXTENSION};
use super::element::Element;
use super::error::{DescriptionElementError, DescriptionError};
use super::quantity::Quantity;

type LineIter<'a> = Peekable<Enumerate<Lines<'a>>>;

/// Which slot of the simulation a layered description fills, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionKind {
    Target,
    Foils,
}

impl DescriptionKind {
    pub fn from_path(path: &Path) -> Result<Self, DescriptionError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(TARGET_EXTENSION) => Ok(Self::Target),
            Some(FOILS_EXTENSION) => Ok(Self::Foils),
            _ => Err(DescriptionError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

/// An element line of a description file: atomic mass and symbol, e.g. `28.09 Si`
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionElement {
    pub mass: f64,
    pub element: Element,
}

impl DescriptionElement {
    pub fn new(mass: f64, symbol: &str) -> Self {
        Self {
            mass,
            element: Element::new(symbol, None),
        }
    }
}

impl FromStr for DescriptionElement {
    type Err = DescriptionElementError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split_whitespace().collect();
        if tokens.len() != 2 {
            return Err(DescriptionElementError::BadFormat(s.to_string()));
        }
        Ok(Self {
            mass: tokens[0]
                .parse()
                .map_err(|_| DescriptionElementError::BadMass(tokens[0].to_string()))?,
            element: tokens[1].parse()?,
        })
    }
}

impl fmt::Display for DescriptionElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.mass, self.element)
    }
}

/// Atomic fraction of one listed element in a layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerComponent {
    pub element_index: usize,
    pub amount: f64,
}

/// One layer of a target or of a detector foil
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub thickness: Quantity,
    pub stopping_power_beam: String,
    pub stopping_power_recoil: String,
    pub density: Quantity,
    pub composition: Vec<LayerComponent>,
}

/// The shared format of MCERD `.target` and `.foils` files.
///
/// ```text
/// 12.011 C          <- element lines
/// 28.09 Si
///                   <- one blank line
/// 13.3 nm           <- layer: thickness
/// ZBL               <-        stopping power for beam
/// ZBL               <-        stopping power for recoil
/// 2.25 g/cm3        <-        density
/// 0 1.0             <-        element index, atomic fraction (one or more)
///                   <- blank line between layers
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayeredDescription {
    pub elements: Vec<DescriptionElement>,
    pub layers: Vec<Layer>,
}

impl LayeredDescription {
    /// Read a `.target` or `.foils` file. The extension decides the returned kind.
    pub fn read(path: &Path) -> Result<(DescriptionKind, Self), DescriptionError> {
        let kind = DescriptionKind::from_path(path)?;
        if !path.exists() {
            return Err(DescriptionError::BadFilePath(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        Ok((kind, contents.parse()?))
    }

    pub fn write(&self, path: &Path) -> Result<(), DescriptionError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for element in self.elements.iter() {
            writeln!(writer, "{element}")?;
        }
        writeln!(writer)?;
        for (idx, layer) in self.layers.iter().enumerate() {
            if idx > 0 {
                writeln!(writer)?;
            }
            write_layer(writer, layer)?;
        }
        Ok(())
    }
}

impl FromStr for LayeredDescription {
    type Err = DescriptionError;
    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let mut lines = contents.lines().enumerate().peekable();
        let mut description = LayeredDescription::default();

        loop {
            match lines.next() {
                Some((_, line)) if line.trim().is_empty() => break,
                Some((idx, line)) => description.elements.push(
                    line.parse()
                        .map_err(|_| malformed(idx, "expected '<mass> <symbol>'", line))?,
                ),
                None => {
                    return Err(DescriptionError::MissingTerminator(
                        "element list is not followed by a blank line",
                    ))
                }
            }
        }

        while let Some(layer) = parse_layer(&mut lines)? {
            for component in layer.composition.iter() {
                if component.element_index >= description.elements.len() {
                    return Err(DescriptionError::BadElementIndex {
                        layer: description.layers.len(),
                        index: component.element_index,
                        count: description.elements.len(),
                    });
                }
            }
            description.layers.push(layer);
        }

        Ok(description)
    }
}

fn malformed(idx: usize, reason: &'static str, line: &str) -> DescriptionError {
    DescriptionError::MalformedLine {
        line: idx + 1,
        reason,
        found: line.to_string(),
    }
}

/// Parse the next layer block, skipping leading blank lines. None at end of file.
fn parse_layer(lines: &mut LineIter<'_>) -> Result<Option<Layer>, DescriptionError> {
    while lines.next_if(|(_, l)| l.trim().is_empty()).is_some() {}
    if lines.peek().is_none() {
        return Ok(None);
    }

    let mut scalars: Vec<(usize, &str)> = Vec::with_capacity(LAYER_SCALAR_LINES);
    for _ in 0..LAYER_SCALAR_LINES {
        match lines.next() {
            Some((idx, line)) if line.trim().is_empty() => {
                return Err(malformed(idx, "layer is missing one of its four scalar lines", line))
            }
            Some((idx, line)) => scalars.push((idx, line.trim())),
            None => {
                return Err(DescriptionError::MissingTerminator(
                    "file ends inside the scalar lines of a layer",
                ))
            }
        }
    }

    let (idx, thickness) = scalars[0];
    let thickness: Quantity = thickness
        .parse()
        .map_err(|_| malformed(idx, "invalid layer thickness", thickness))?;
    let (idx, density) = scalars[3];
    let density: Quantity = density
        .parse()
        .map_err(|_| malformed(idx, "invalid layer density", density))?;

    let mut composition = Vec::new();
    while let Some((idx, line)) = lines.next_if(|(_, l)| !l.trim().is_empty()) {
        composition.push(parse_component(line).ok_or_else(|| {
            malformed(idx, "expected '<element index> <amount>'", line)
        })?);
    }
    if composition.is_empty() {
        return Err(DescriptionError::MissingTerminator(
            "layer has no composition lines",
        ));
    }

    Ok(Some(Layer {
        thickness,
        stopping_power_beam: scalars[1].1.to_string(),
        stopping_power_recoil: scalars[2].1.to_string(),
        density,
        composition,
    }))
}

fn parse_component(line: &str) -> Option<LayerComponent> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 2 {
        return None;
    }
    Some(LayerComponent {
        element_index: tokens[0].parse().ok()?,
        amount: tokens[1].parse().ok()?,
    })
}

fn write_layer<W: Write>(writer: &mut W, layer: &Layer) -> std::io::Result<()> {
    writeln!(writer, "{}", layer.thickness)?;
    writeln!(writer, "{}", layer.stopping_power_beam)?;
    writeln!(writer, "{}", layer.stopping_power_recoil)?;
    writeln!(writer, "{}", layer.density)?;
    for component in layer.composition.iter() {
        writeln!(writer, "{} {}", component.element_index, component.amount)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn zbl_layer(thickness: f64, density: f64, composition: &[(usize, f64)]) -> Layer {
        Layer {
            thickness: Quantity::new(thickness, Some("nm")),
            stopping_power_beam: String::from("ZBL"),
            stopping_power_recoil: String::from("ZBL"),
            density: Quantity::new(density, Some("g/cm3")),
            composition: composition
                .iter()
                .map(|(element_index, amount)| LayerComponent {
                    element_index: *element_index,
                    amount: *amount,
                })
                .collect(),
        }
    }

    fn lithium_target() -> LayeredDescription {
        LayeredDescription {
            elements: vec![
                DescriptionElement::new(6.94, "Li"),
                DescriptionElement::new(16.0, "O"),
                DescriptionElement::new(28.09, "Si"),
                DescriptionElement::new(54.94, "Mn"),
            ],
            layers: vec![
                zbl_layer(0.01, 0.000001, &[(0, 1.0)]),
                zbl_layer(90.0, 4.0, &[(0, 0.048), (1, 0.649), (3, 0.303)]),
                zbl_layer(1000.0, 2.32, &[(2, 1.0)]),
            ],
        }
    }

    #[test]
    fn test_description_element_errors() {
        assert_eq!(
            "28.09".parse::<DescriptionElement>(),
            Err(DescriptionElementError::BadFormat(String::from("28.09")))
        );
        assert_eq!(
            "heavy Si".parse::<DescriptionElement>(),
            Err(DescriptionElementError::BadMass(String::from("heavy")))
        );
        assert!(matches!(
            "28.09 si".parse::<DescriptionElement>(),
            Err(DescriptionElementError::BadElement(_))
        ));
    }

    #[test]
    fn test_parse_target_text() {
        let text = "6.94 Li\n16.00 O\n\n0.01 nm\nZBL\nZBL\n0.000001 g/cm3\n0 1.0\n\n\
                    90 nm\nZBL\nZBL\n4.0 g/cm3\n0 0.048\n1 0.649\n";
        let description: LayeredDescription = text.parse().unwrap();
        assert_eq!(description.elements.len(), 2);
        assert_eq!(description.elements[1], DescriptionElement::new(16.0, "O"));
        assert_eq!(description.layers.len(), 2);
        assert_eq!(description.layers[1].thickness, Quantity::new(90.0, Some("nm")));
        assert_eq!(description.layers[1].composition.len(), 2);
        assert_eq!(description.layers[1].composition[1].element_index, 1);
    }

    #[test]
    fn test_write_then_parse() {
        let target = lithium_target();
        let mut buffer: Vec<u8> = Vec::new();
        target.write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.starts_with("6.94 Li\n16 O\n28.09 Si\n54.94 Mn\n\n0.01 nm\nZBL\n"));
        assert!(text.ends_with("2 1\n"));
        assert_eq!(text.parse::<LayeredDescription>().unwrap(), target);
    }

    #[test]
    fn test_read_by_extension() {
        let temp = TempDir::new().unwrap();
        let target_path = temp.path().join("sample.target");
        let foils_path = temp.path().join("detector.foils");
        let other_path = temp.path().join("sample.layers");
        lithium_target().write(&target_path).unwrap();
        lithium_target().write(&foils_path).unwrap();
        lithium_target().write(&other_path).unwrap();

        let (kind, description) = LayeredDescription::read(&target_path).unwrap();
        assert_eq!(kind, DescriptionKind::Target);
        assert_eq!(description, lithium_target());
        let (kind, _) = LayeredDescription::read(&foils_path).unwrap();
        assert_eq!(kind, DescriptionKind::Foils);
        assert!(matches!(
            LayeredDescription::read(&other_path),
            Err(DescriptionError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            LayeredDescription::read(&temp.path().join("missing.target")),
            Err(DescriptionError::BadFilePath(_))
        ));
    }

    #[test]
    fn test_malformed_descriptions() {
        assert!(matches!(
            "6.94 Li".parse::<LayeredDescription>(),
            Err(DescriptionError::MissingTerminator(_))
        ));
        assert!(matches!(
            "6.94 Li\n\n1 nm\nZBL\n".parse::<LayeredDescription>(),
            Err(DescriptionError::MissingTerminator(_))
        ));
        assert!(matches!(
            "6.94 Li\n\n1 nm\nZBL\nZBL\n1 g/cm3\n0 one\n".parse::<LayeredDescription>(),
            Err(DescriptionError::MalformedLine { line: 7, .. })
        ));
        assert!(matches!(
            "6.94 Li\n\n1 nm\nZBL\nZBL\n1 g/cm3\n1 1.0\n".parse::<LayeredDescription>(),
            Err(DescriptionError::BadElementIndex { index: 1, .. })
        ));
    }
}
