use std::fmt;
use std::path::Path;
use std::str::FromStr;

use super::constants::CUT_EXTENSION;
use super::element::Element;
use super::error::CutNameError;

/// The identity a cut file carries in its file name.
///
/// `<basename>.<element>.<ordinal>[.<split index>].cut`, e.g. `tof_e_01048.1H.0.cut` or
/// `tof_e_01048.1H.0.2.cut`. The basename is the name of the measurement directory, the
/// ordinal separates several selections of the same element and isotope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutName {
    pub basename: String,
    pub element: Element,
    pub ordinal: usize,
    pub split_index: Option<usize>,
}

impl CutName {
    pub fn new(basename: &str, element: &Element, ordinal: usize, split_index: Option<usize>) -> Self {
        Self {
            basename: basename.to_string(),
            element: element.clone(),
            ordinal,
            split_index,
        }
    }

    /// Read the name from the final component of a path
    pub fn from_path(path: &Path) -> Result<Self, CutNameError> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        file_name.parse()
    }
}

impl FromStr for CutName {
    type Err = CutNameError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stem = s
            .strip_suffix(&format!(".{CUT_EXTENSION}"))
            .ok_or_else(|| CutNameError::MissingExtension(s.to_string()))?;

        let tokens: Vec<&str> = stem.split('.').collect();
        if tokens.len() != 3 && tokens.len() != 4 {
            return Err(CutNameError::BadPattern(s.to_string()));
        }
        if tokens.iter().any(|t| t.is_empty()) {
            return Err(CutNameError::BadPattern(s.to_string()));
        }

        let element: Element = tokens[1]
            .parse()
            .map_err(|e| CutNameError::BadElement(s.to_string(), e))?;
        let ordinal: usize = tokens[2]
            .parse()
            .map_err(|_| CutNameError::BadNumber(s.to_string()))?;
        let split_index = match tokens.get(3) {
            Some(t) => Some(
                t.parse::<usize>()
                    .map_err(|_| CutNameError::BadNumber(s.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            basename: tokens[0].to_string(),
            element,
            ordinal,
            split_index,
        })
    }
}

impl fmt::Display for CutName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.basename, self.element, self.ordinal)?;
        if let Some(index) = self.split_index {
            write!(f, ".{index}")?;
        }
        write!(f, ".{CUT_EXTENSION}")
    }
}
