use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::constants::*;
use super::cut_name::CutName;
use super::element::Element;
use super::error::CutFileError;
use super::selection::{Selection, SelectionType};

/// A single coincidence event in a cut: time-of-flight channel, energy channel and the
/// event number assigned by the acquisition (non-decreasing within a cut).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutEvent {
    pub tof: i64,
    pub energy: i64,
    pub event_number: i64,
}

impl CutEvent {
    pub fn new(tof: i64, energy: i64, event_number: i64) -> Self {
        Self {
            tof,
            energy,
            event_number,
        }
    }
}

/// CutFile is one detector channel's selected events plus the metadata needed to
/// analyze them later.
///
/// A CutFile is either made from a user selection ([`CutFile::set_info`]), loaded from
/// disk ([`CutFile::load`]), or produced by splitting another cut (see the splitter
/// module). The event count is always the length of `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct CutFile {
    /// Measurement directory the cut belongs to; cuts are saved under `<dir>/cuts/`
    pub source_directory: Option<PathBuf>,
    pub element: Option<Element>,
    pub selection_type: SelectionType,
    pub weight_factor: f64,
    pub energy: f64,
    pub detector_angle: i64,
    pub scatter_element: Option<Element>,
    pub is_derived_from_split: bool,
    pub split_index: usize,
    pub split_count: usize,
    /// Which selection of this element (and isotope) the cut is, from the file name
    pub ordinal: usize,
    pub data: Vec<CutEvent>,
}

impl Default for CutFile {
    fn default() -> Self {
        Self {
            source_directory: None,
            element: None,
            selection_type: SelectionType::Erd,
            weight_factor: 1.0,
            energy: 0.0,
            detector_angle: 0,
            scatter_element: None,
            is_derived_from_split: false,
            split_index: 0,
            split_count: 1,
            ordinal: 0,
            data: Vec::new(),
        }
    }
}

impl CutFile {
    /// Create an empty cut which will be saved under the given measurement directory
    pub fn new(directory: &Path) -> Self {
        Self {
            source_directory: Some(directory.to_path_buf()),
            ..Default::default()
        }
    }

    pub fn event_count(&self) -> usize {
        self.data.len()
    }

    /// Fill the cut from a user selection and the events inside it
    pub fn set_info(&mut self, selection: &Selection, data: Vec<CutEvent>) {
        self.data = data;
        self.element = Some(selection.element.clone());
        self.selection_type = selection.selection_type;
        self.weight_factor = selection.weight_factor;
        self.scatter_element = selection.scatter_element.clone();
        self.is_derived_from_split = false;
        self.split_index = 0;
        self.split_count = 1;
        self.energy = 0.0;
        self.detector_angle = 0;
    }

    /// Copy the metadata of another cut and take new data.
    ///
    /// The weight factor compounds: parent weight times `additional_weight_factor`.
    /// Split position is left untouched.
    pub fn copy_info(
        &mut self,
        cut_file: &CutFile,
        data: Vec<CutEvent>,
        additional_weight_factor: f64,
    ) {
        self.source_directory = cut_file.source_directory.clone();
        self.data = data;
        self.element = cut_file.element.clone();
        self.selection_type = cut_file.selection_type;
        self.weight_factor = cut_file.weight_factor * additional_weight_factor;
        self.energy = cut_file.energy;
        self.detector_angle = cut_file.detector_angle;
        self.scatter_element = cut_file.scatter_element.clone();
        self.ordinal = cut_file.ordinal;
    }

    /// Load and parse a cut file.
    ///
    /// The element and selection ordinal come from the file name, the metadata from the
    /// `Key: value` header and the events from the remaining lines.
    pub fn load(path: &Path) -> Result<Self, CutFileError> {
        if !path.exists() {
            return Err(CutFileError::BadFilePath(path.to_path_buf()));
        }
        let name = CutName::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;

        let mut cut = Self::parse(&contents, path)?;
        cut.element = Some(name.element.clone());
        cut.ordinal = name.ordinal;
        cut.source_directory = measurement_directory(path, &name);
        if let Some(index) = name.split_index {
            cut.is_derived_from_split = true;
            cut.split_index = index;
        }
        if cut.is_derived_from_split && cut.split_index >= cut.split_count {
            return Err(CutFileError::BadSplitPosition {
                path: path.to_path_buf(),
                index: cut.split_index,
                count: cut.split_count,
            });
        }

        log::debug!(
            "Loaded cut {} with {} events",
            path.to_string_lossy(),
            cut.event_count()
        );
        Ok(cut)
    }

    /// Parse the body of a cut file. `path` is only used to report errors.
    fn parse(contents: &str, path: &Path) -> Result<Self, CutFileError> {
        let mut cut = CutFile::default();
        let mut header_count: Option<usize> = None;
        let mut lines = contents.lines().enumerate().peekable();

        // Header: every leading line of the form `key: value`
        while let Some(&(_, line)) = lines.peek() {
            let Some((key, value)) = line.split_once(':') else {
                break;
            };
            let (key, value) = (key.trim(), value.trim());
            let bad_field = || CutFileError::BadField {
                path: path.to_path_buf(),
                key: key.to_string(),
                value: value.to_string(),
            };
            match key {
                KEY_COUNT => header_count = Some(value.parse().map_err(|_| bad_field())?),
                KEY_TYPE => cut.selection_type = value.parse().map_err(|_| bad_field())?,
                KEY_WEIGHT_FACTOR => {
                    let weight: f64 = value.parse().map_err(|_| bad_field())?;
                    if !(weight.is_finite() && weight > 0.0) {
                        return Err(bad_field());
                    }
                    cut.weight_factor = weight;
                }
                KEY_ENERGY => cut.energy = value.parse().map_err(|_| bad_field())?,
                KEY_DETECTOR_ANGLE => cut.detector_angle = value.parse().map_err(|_| bad_field())?,
                KEY_SCATTER_ELEMENT => {
                    cut.scatter_element = Element::parse_optional(value).map_err(|_| bad_field())?
                }
                KEY_ELEMENT_LOSSES => {
                    cut.is_derived_from_split = match value {
                        "True" => true,
                        "False" => false,
                        _ => return Err(bad_field()),
                    }
                }
                KEY_SPLIT_COUNT => {
                    cut.split_count = match value.parse() {
                        Ok(0) | Err(_) => return Err(bad_field()),
                        Ok(n) => n,
                    }
                }
                _ => log::debug!("Ignoring unrecognized cut header line: {line}"),
            }
            lines.next();
        }

        // Separator: blank lines and the column header comment
        while let Some(&(_, line)) = lines.peek() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed == CUT_COLUMN_HEADER {
                lines.next();
            } else {
                break;
            }
        }

        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            cut.data.push(parse_event(line).ok_or_else(|| CutFileError::MalformedLine {
                path: path.to_path_buf(),
                line: idx + 1,
                found: line.to_string(),
            })?);
        }

        if let Some(count) = header_count {
            if count != cut.data.len() {
                log::warn!(
                    "Cut file {} declares {} events but contains {}; using the data",
                    path.to_string_lossy(),
                    count,
                    cut.data.len()
                );
            }
        }

        Ok(cut)
    }

    /// Save the cut under its measurement directory.
    ///
    /// Plain cuts go to `<dir>/cuts/<basename>.<element>.<n>.cut`, where `n` starts at
    /// `disambiguation_start` and is increased until the name is unused, so a second
    /// selection of the same isotope never overwrites the first. Split cuts go to
    /// `<dir>/cuts/elemloss/<basename>.<element>.<disambiguation_start>.<split index>.cut`
    /// and replace any previous split with that name.
    ///
    /// The free-name scan is not atomic; only one writer per directory is supported.
    pub fn save(&self, disambiguation_start: usize) -> Result<PathBuf, CutFileError> {
        let element = self.element.as_ref().ok_or(CutFileError::MissingElement)?;
        let directory = self
            .source_directory
            .as_ref()
            .ok_or(CutFileError::MissingDirectory)?;
        let basename = directory_basename(directory)?;

        let mut cut_dir = directory.join(CUTS_DIRECTORY);
        if self.is_derived_from_split {
            cut_dir = cut_dir.join(SPLITS_DIRECTORY);
        }
        std::fs::create_dir_all(&cut_dir)?;

        let path = if self.is_derived_from_split {
            cut_dir.join(
                CutName::new(&basename, element, disambiguation_start, Some(self.split_index))
                    .to_string(),
            )
        } else {
            let mut ordinal = disambiguation_start;
            loop {
                let candidate =
                    cut_dir.join(CutName::new(&basename, element, ordinal, None).to_string());
                if !candidate.exists() {
                    break candidate;
                }
                ordinal += 1;
            }
        };

        let mut writer = BufWriter::new(File::create(&path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;

        log::info!(
            "Saved cut with {} events to {}",
            self.event_count(),
            path.to_string_lossy()
        );
        Ok(path)
    }

    /// Serialize the cut in the cut file text format
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let scatter = self
            .scatter_element
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_else(|| String::from("None"));
        let losses = if self.is_derived_from_split {
            "True"
        } else {
            "False"
        };

        writeln!(writer, "{KEY_COUNT}: {}", self.event_count())?;
        writeln!(writer, "{KEY_TYPE}: {}", self.selection_type)?;
        writeln!(writer, "{KEY_WEIGHT_FACTOR}: {:?}", self.weight_factor)?;
        writeln!(writer, "{KEY_ENERGY}: {}", self.energy)?;
        writeln!(writer, "{KEY_DETECTOR_ANGLE}: {}", self.detector_angle)?;
        writeln!(writer, "{KEY_SCATTER_ELEMENT}: {scatter}")?;
        writeln!(writer, "{KEY_ELEMENT_LOSSES}: {losses}")?;
        writeln!(writer, "{KEY_SPLIT_COUNT}: {}", self.split_count)?;
        writeln!(writer)?;
        writeln!(writer, "{CUT_COLUMN_HEADER}")?;
        for event in self.data.iter() {
            writeln!(
                writer,
                "{} {} {}",
                event.tof, event.energy, event.event_number
            )?;
        }
        Ok(())
    }
}

/// Parse one `tof energy event_number` line. None if it is not exactly three integers.
fn parse_event(line: &str) -> Option<CutEvent> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != EVENT_FIELDS_PER_LINE {
        return None;
    }
    Some(CutEvent {
        tof: fields[0].parse().ok()?,
        energy: fields[1].parse().ok()?,
        event_number: fields[2].parse().ok()?,
    })
}

/// Walk up from a cut file to its measurement directory:
/// `<dir>/cuts/x.cut` or `<dir>/cuts/elemloss/x.cut`
fn measurement_directory(path: &Path, name: &CutName) -> Option<PathBuf> {
    let mut cut_dir = path.parent()?;
    let in_split_dir = cut_dir
        .file_name()
        .is_some_and(|n| n == SPLITS_DIRECTORY);
    if name.split_index.is_some() || in_split_dir {
        cut_dir = cut_dir.parent()?;
    }
    cut_dir.parent().map(Path::to_path_buf)
}

fn directory_basename(directory: &Path) -> Result<String, CutFileError> {
    if let Some(name) = directory.file_name() {
        return Ok(name.to_string_lossy().to_string());
    }
    // Paths like "." or ".." have no final component until resolved
    directory
        .canonicalize()?
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or(CutFileError::MissingDirectory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn hydrogen_cut(directory: &Path) -> CutFile {
        let mut cut = CutFile::new(directory);
        let mut selection = Selection::new(Element::new("H", Some(1)), SelectionType::Erd);
        selection.weight_factor = 0.75;
        cut.set_info(
            &selection,
            vec![
                CutEvent::new(1200, 340, 3),
                CutEvent::new(1180, 355, 7),
                CutEvent::new(1215, 330, 7),
            ],
        );
        cut
    }

    #[test]
    fn test_load_minimal_header() {
        let temp = TempDir::new().unwrap();
        let cut_dir = temp.path().join("meas").join(CUTS_DIRECTORY);
        std::fs::create_dir_all(&cut_dir).unwrap();
        let path = cut_dir.join("meas.H.0.cut");
        std::fs::write(
            &path,
            "Count: 3\nType: ERD\nWeight Factor: 1.0\n\nToF, Energy, Event number\n10 20 1\n11 21 2\n12 22 5\n",
        )
        .unwrap();

        let cut = CutFile::load(&path).unwrap();
        assert_eq!(cut.event_count(), 3);
        assert_eq!(
            cut.data,
            vec![
                CutEvent::new(10, 20, 1),
                CutEvent::new(11, 21, 2),
                CutEvent::new(12, 22, 5)
            ]
        );
        assert_eq!(cut.element, Some(Element::new("H", None)));
        assert_eq!(cut.source_directory, Some(temp.path().join("meas")));
        assert!(!cut.is_derived_from_split);
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let meas = temp.path().join("tof_e_01048");
        let mut cut = hydrogen_cut(&meas);
        cut.scatter_element = Some(Element::new("Cl", Some(35)));
        cut.selection_type = SelectionType::Rbs;

        let path = cut.save(0).unwrap();
        assert_eq!(
            path,
            meas.join(CUTS_DIRECTORY).join("tof_e_01048.1H.0.cut")
        );

        let loaded = CutFile::load(&path).unwrap();
        assert_eq!(loaded.data, cut.data);
        assert_eq!(loaded.element, cut.element);
        assert!((loaded.weight_factor - cut.weight_factor).abs() < 1e-12);
        assert_eq!(loaded.selection_type, SelectionType::Rbs);
        assert_eq!(loaded.scatter_element, cut.scatter_element);
        assert_eq!(loaded.split_count, 1);
        assert_eq!(loaded.source_directory, Some(meas));
    }

    #[test]
    fn test_save_layout() {
        let cut = hydrogen_cut(Path::new("meas"));
        let mut buffer: Vec<u8> = Vec::new();
        cut.write_to(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "Count: 3\nType: ERD\nWeight Factor: 0.75\nEnergy: 0\nDetector Angle: 0\n\
             Scatter Element: None\nElement losses: False\nSplit count: 1\n\n\
             ToF, Energy, Event number\n1200 340 3\n1180 355 7\n1215 330 7\n"
        );
    }

    #[test]
    fn test_save_does_not_overwrite() {
        let temp = TempDir::new().unwrap();
        let meas = temp.path().join("meas");
        let cut = hydrogen_cut(&meas);
        let first = cut.save(0).unwrap();
        let second = cut.save(0).unwrap();
        assert_ne!(first, second);
        assert!(second.ends_with("meas.1H.1.cut"));
        assert_eq!(CutFile::load(&second).unwrap().ordinal, 1);
    }

    #[test]
    fn test_split_save_overwrites() {
        let temp = TempDir::new().unwrap();
        let meas = temp.path().join("meas");
        let mut cut = hydrogen_cut(&meas);
        cut.is_derived_from_split = true;
        cut.split_index = 2;
        cut.split_count = 4;
        let first = cut.save(1).unwrap();
        let second = cut.save(1).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            meas.join(CUTS_DIRECTORY)
                .join(SPLITS_DIRECTORY)
                .join("meas.1H.1.2.cut")
        );

        let loaded = CutFile::load(&first).unwrap();
        assert!(loaded.is_derived_from_split);
        assert_eq!(loaded.split_index, 2);
        assert_eq!(loaded.split_count, 4);
        assert_eq!(loaded.ordinal, 1);
        assert_eq!(loaded.source_directory, Some(meas));
    }

    #[test]
    fn test_malformed_line() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meas.H.0.cut");
        std::fs::write(&path, "Count: 2\n\nToF, Energy, Event number\n1 2 3\n4 5\n").unwrap();
        match CutFile::load(&path) {
            Err(CutFileError::MalformedLine { line, .. }) => assert_eq!(line, 5),
            other => panic!("expected MalformedLine, got {other:?}"),
        }
    }

    #[test]
    fn test_non_integer_field() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meas.H.0.cut");
        std::fs::write(&path, "Count: 2\n\n1 2 3\n1 2 x\n").unwrap();
        match CutFile::load(&path) {
            Err(CutFileError::MalformedLine { line, found, .. }) => {
                assert_eq!(line, 4);
                assert_eq!(found, "1 2 x");
            }
            other => panic!("expected MalformedLine, got {other:?}"),
        }
    }

    #[test]
    fn test_element_losses_header_marks_split() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meas.H.0.cut");
        std::fs::write(&path, "Element losses: True\nSplit count: 3\n\n1 2 3\n").unwrap();
        let cut = CutFile::load(&path).unwrap();
        assert!(cut.is_derived_from_split);
        assert_eq!(cut.split_index, 0);
        assert_eq!(cut.split_count, 3);
    }

    #[test]
    fn test_element_losses_must_be_boolean() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meas.H.0.cut");
        std::fs::write(&path, "Element losses: maybe\n\n1 2 3\n").unwrap();
        match CutFile::load(&path) {
            Err(CutFileError::BadField { key, value, .. }) => {
                assert_eq!(key, KEY_ELEMENT_LOSSES);
                assert_eq!(value, "maybe");
            }
            other => panic!("expected BadField, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_split_count() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meas.H.0.cut");
        std::fs::write(&path, "Split count: 0\n\n1 2 3\n").unwrap();
        match CutFile::load(&path) {
            Err(CutFileError::BadField { key, .. }) => assert_eq!(key, KEY_SPLIT_COUNT),
            other => panic!("expected BadField, got {other:?}"),
        }
    }

    #[test]
    fn test_split_index_outside_count() {
        let temp = TempDir::new().unwrap();
        let split_dir = temp.path().join("meas").join(CUTS_DIRECTORY).join(SPLITS_DIRECTORY);
        std::fs::create_dir_all(&split_dir).unwrap();
        let path = split_dir.join("meas.H.0.2.cut");
        std::fs::write(&path, "Element losses: True\nSplit count: 2\n\n1 2 3\n").unwrap();
        assert!(matches!(
            CutFile::load(&path),
            Err(CutFileError::BadSplitPosition {
                index: 2,
                count: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_bad_header_value() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meas.H.0.cut");
        std::fs::write(&path, "Weight Factor: -2\n\n1 2 3\n").unwrap();
        assert!(matches!(
            CutFile::load(&path),
            Err(CutFileError::BadField { .. })
        ));
    }

    #[test]
    fn test_unknown_header_is_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("meas.4He.0.cut");
        std::fs::write(&path, "Count: 1\nComment: made by hand\nType: RBS\n\n1 2 3\n").unwrap();
        let cut = CutFile::load(&path).unwrap();
        assert_eq!(cut.selection_type, SelectionType::Rbs);
        assert_eq!(cut.event_count(), 1);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            CutFile::load(Path::new("/definitely/not/here/meas.H.0.cut")),
            Err(CutFileError::BadFilePath(_))
        ));
    }

    #[test]
    fn test_save_requires_element() {
        let cut = CutFile::new(Path::new("meas"));
        assert!(matches!(cut.save(0), Err(CutFileError::MissingElement)));
    }
}
