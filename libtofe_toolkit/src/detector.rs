use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::constants::{DETECTOR_SECTION_SEPARATOR, FOIL_BLOCK_LINES, FOIL_SEPARATOR};
use super::error::DescriptionError;
use super::layers::{DescriptionElement, DescriptionKind, Layer, LayeredDescription};
use super::quantity::{Quantity, QuantityPair};

const KEY_DETECTOR_TYPE: &str = "Detector type:";
const KEY_DETECTOR_ANGLE: &str = "Detector angle:";
const KEY_VIRTUAL_SIZE: &str = "Virtual detector size:";
const KEY_TIMING_DETECTORS: &str = "Timing detector numbers:";
const KEY_FOILS_FILE: &str = "Description file for the detector foils:";
const HEADER_KEYS: [&str; 5] = [
    KEY_DETECTOR_TYPE,
    KEY_DETECTOR_ANGLE,
    KEY_VIRTUAL_SIZE,
    KEY_TIMING_DETECTORS,
    KEY_FOILS_FILE,
];

const KEY_FOIL_TYPE: &str = "Foil type:";
const KEY_FOIL_DIAMETER: &str = "Foil diameter:";
const KEY_FOIL_SIZE: &str = "Foil size:";
const KEY_FOIL_DISTANCE: &str = "Foil distance:";
const FOIL_KEYS: [&str; 4] = [
    KEY_FOIL_TYPE,
    KEY_FOIL_DIAMETER,
    KEY_FOIL_SIZE,
    KEY_FOIL_DISTANCE,
];

const CIRCULAR: &str = "circular";
const RECTANGULAR: &str = "rectangular";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FoilShape {
    Circular { diameter: f64 },
    Rectangular { width: f64, height: f64 },
}

/// A detector foil: its aperture, distance from the target and its own layers
#[derive(Debug, Clone, PartialEq)]
pub struct Foil {
    pub shape: FoilShape,
    pub distance: f64,
    pub layers: Vec<Layer>,
}

impl Foil {
    pub fn circular(diameter: f64, distance: f64) -> Self {
        Self {
            shape: FoilShape::Circular { diameter },
            distance,
            layers: Vec::new(),
        }
    }

    pub fn rectangular(width: f64, height: f64, distance: f64) -> Self {
        Self {
            shape: FoilShape::Rectangular { width, height },
            distance,
            layers: Vec::new(),
        }
    }
}

/// MCERD detector description.
///
/// The detector file holds the header fields and the foil geometry; the layers of the
/// foils live in a separate `.foils` file named by the header. Layer *i* of that file
/// belongs to foil *i*.
#[derive(Debug, Clone, PartialEq)]
pub struct Detector {
    pub detector_type: String,
    pub angle: Quantity,
    pub virtual_size: QuantityPair,
    pub timing_detectors: (usize, usize),
    pub foils_file: PathBuf,
    pub foil_elements: Vec<DescriptionElement>,
    pub foils: Vec<Foil>,
}

impl Detector {
    /// Read a detector description file and the foils file it references.
    ///
    /// A relative foils file is looked up next to the detector file.
    pub fn read(path: &Path) -> Result<Self, DescriptionError> {
        if !path.exists() {
            return Err(DescriptionError::BadFilePath(path.to_path_buf()));
        }
        let contents = std::fs::read_to_string(path)?;
        let mut detector = Self::parse_description(&contents)?;

        let foils_path = resolve_reference(path, &detector.foils_file);
        let (kind, foils) = LayeredDescription::read(&foils_path)?;
        if kind != DescriptionKind::Foils {
            return Err(DescriptionError::UnsupportedFormat(foils_path));
        }
        detector.attach_foil_layers(foils)?;
        log::debug!(
            "Read detector {} with {} foils",
            path.to_string_lossy(),
            detector.foils.len()
        );
        Ok(detector)
    }

    /// Parse the detector file itself. The foils are returned without layers.
    pub fn parse_description(contents: &str) -> Result<Self, DescriptionError> {
        let mut lines = contents.lines().enumerate();
        let mut header: [Option<(usize, &str)>; 5] = [None; 5];

        // Header keys may come in any order; stop once all of them are found
        for (idx, line) in lines.by_ref() {
            for (slot, key) in header.iter_mut().zip(HEADER_KEYS.iter()) {
                if slot.is_none() && line.starts_with(key) {
                    *slot = Some((idx, line[key.len()..].trim()));
                    break;
                }
            }
            if header.iter().all(Option::is_some) {
                break;
            }
        }
        let field = |i: usize| header[i].ok_or(DescriptionError::MissingField(HEADER_KEYS[i]));

        let (_, detector_type) = field(0)?;
        let (idx, angle) = field(1)?;
        let angle: Quantity = angle
            .parse()
            .map_err(|_| malformed(idx, "invalid detector angle", angle))?;
        let (idx, virtual_size) = field(2)?;
        let virtual_size: QuantityPair = virtual_size
            .parse()
            .map_err(|_| malformed(idx, "invalid virtual detector size", virtual_size))?;
        let (idx, timing) = field(3)?;
        let timing_detectors = parse_timing(timing)
            .ok_or_else(|| malformed(idx, "expected two timing detector numbers", timing))?;
        let (_, foils_file) = field(4)?;

        let mut foils = Vec::new();
        while let Some((idx, line)) = lines.next() {
            // Separators, blank lines and anything else between foil blocks
            if !FOIL_KEYS.iter().any(|k| line.starts_with(k)) {
                continue;
            }
            let mut block = vec![(idx, line)];
            while block.len() < FOIL_BLOCK_LINES {
                match lines.next() {
                    Some(next) => block.push(next),
                    None => {
                        return Err(DescriptionError::MissingTerminator(
                            "file ends inside a foil block",
                        ))
                    }
                }
            }
            foils.push(parse_foil(&block)?);
        }

        Ok(Self {
            detector_type: detector_type.to_string(),
            angle,
            virtual_size,
            timing_detectors,
            foils_file: PathBuf::from(foils_file),
            foil_elements: Vec::new(),
            foils,
        })
    }

    /// Hand the layers of a foils description to the foils, in order.
    ///
    /// Surplus layers go to the last foil; fewer layers than foils is an error.
    pub fn attach_foil_layers(
        &mut self,
        description: LayeredDescription,
    ) -> Result<(), DescriptionError> {
        let n_foils = self.foils.len();
        let n_layers = description.layers.len();
        if n_layers < n_foils || (n_foils == 0 && n_layers > 0) {
            return Err(DescriptionError::FoilLayerMismatch {
                foils: n_foils,
                layers: n_layers,
            });
        }

        for foil in self.foils.iter_mut() {
            foil.layers.clear();
        }
        for (idx, layer) in description.layers.into_iter().enumerate() {
            let foil_idx = idx.min(n_foils.saturating_sub(1));
            self.foils[foil_idx].layers.push(layer);
        }
        self.foil_elements = description.elements;
        Ok(())
    }

    /// The `.foils` description of this detector, all foil layers in foil order.
    ///
    /// The foils file only records layers, not which foil owns them, so only layouts that
    /// [`Detector::attach_foil_layers`] rebuilds can be written: exactly one layer per foil,
    /// except the last foil which may hold more.
    pub fn foils_description(&self) -> Result<LayeredDescription, DescriptionError> {
        let last = self.foils.len().saturating_sub(1);
        for (idx, foil) in self.foils.iter().enumerate() {
            let n_layers = foil.layers.len();
            if n_layers == 0 || (idx < last && n_layers > 1) {
                return Err(DescriptionError::FoilLayerLayout {
                    foil: idx,
                    layers: n_layers,
                });
            }
        }
        Ok(LayeredDescription {
            elements: self.foil_elements.clone(),
            layers: self
                .foils
                .iter()
                .flat_map(|f| f.layers.iter().cloned())
                .collect(),
        })
    }

    /// Write the detector file (not the foils file)
    pub fn write(&self, path: &Path) -> Result<(), DescriptionError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{KEY_DETECTOR_TYPE} {}", self.detector_type)?;
        writeln!(writer, "{KEY_DETECTOR_ANGLE} {}", self.angle)?;
        writeln!(writer, "{KEY_VIRTUAL_SIZE} {}", self.virtual_size)?;
        writeln!(
            writer,
            "{KEY_TIMING_DETECTORS} {} {}",
            self.timing_detectors.0, self.timing_detectors.1
        )?;
        writeln!(writer, "{KEY_FOILS_FILE} {}", self.foils_file.to_string_lossy())?;
        writeln!(writer, "{DETECTOR_SECTION_SEPARATOR}")?;
        for (idx, foil) in self.foils.iter().enumerate() {
            if idx > 0 {
                writeln!(writer, "{FOIL_SEPARATOR}")?;
            }
            match foil.shape {
                FoilShape::Circular { diameter } => {
                    writeln!(writer, "{KEY_FOIL_TYPE} {CIRCULAR}")?;
                    writeln!(writer, "{KEY_FOIL_DIAMETER} {diameter}")?;
                }
                FoilShape::Rectangular { width, height } => {
                    writeln!(writer, "{KEY_FOIL_TYPE} {RECTANGULAR}")?;
                    writeln!(writer, "{KEY_FOIL_SIZE} {width} {height}")?;
                }
            }
            writeln!(writer, "{KEY_FOIL_DISTANCE} {}", foil.distance)?;
        }
        Ok(())
    }
}

/// Resolve a file named inside `referrer` relative to the referrer's directory
pub(crate) fn resolve_reference(referrer: &Path, reference: &Path) -> PathBuf {
    if reference.is_absolute() {
        return reference.to_path_buf();
    }
    match referrer.parent() {
        Some(dir) => dir.join(reference),
        None => reference.to_path_buf(),
    }
}

fn malformed(idx: usize, reason: &'static str, found: &str) -> DescriptionError {
    DescriptionError::MalformedLine {
        line: idx + 1,
        reason,
        found: found.to_string(),
    }
}

fn parse_timing(value: &str) -> Option<(usize, usize)> {
    let tokens: Vec<&str> = value.split_whitespace().collect();
    if tokens.len() != 2 {
        return None;
    }
    Some((tokens[0].parse().ok()?, tokens[1].parse().ok()?))
}

fn parse_foil(block: &[(usize, &str)]) -> Result<Foil, DescriptionError> {
    let mut values: [Option<(usize, &str)>; 4] = [None; 4];
    for (idx, line) in block.iter() {
        let slot = FOIL_KEYS
            .iter()
            .position(|k| line.starts_with(k))
            .ok_or_else(|| malformed(*idx, "expected a foil field", line))?;
        values[slot] = Some((*idx, line[FOIL_KEYS[slot].len()..].trim()));
    }
    let field = |i: usize| values[i].ok_or(DescriptionError::MissingField(FOIL_KEYS[i]));

    let (idx, distance) = field(3)?;
    let distance: f64 = distance
        .parse()
        .map_err(|_| malformed(idx, "invalid foil distance", distance))?;

    let (idx, kind) = field(0)?;
    let shape = match kind {
        CIRCULAR => {
            let (idx, diameter) = field(1)?;
            FoilShape::Circular {
                diameter: diameter
                    .parse()
                    .map_err(|_| malformed(idx, "invalid foil diameter", diameter))?,
            }
        }
        RECTANGULAR => {
            let (idx, size) = field(2)?;
            let size: QuantityPair = size
                .parse()
                .map_err(|_| malformed(idx, "invalid foil size", size))?;
            FoilShape::Rectangular {
                width: size.first,
                height: size.second,
            }
        }
        _ => return Err(malformed(idx, "unknown foil type", kind)),
    };

    Ok(Foil {
        shape,
        distance,
        layers: Vec::new(),
    })
}
