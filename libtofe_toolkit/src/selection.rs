use std::fmt;
use std::str::FromStr;

use super::element::Element;
use super::error::SelectionTypeError;

/// Whether a selection holds primary recoils or scattered beam particles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionType {
    #[default]
    Erd,
    Rbs,
}

impl FromStr for SelectionType {
    type Err = SelectionTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ERD" => Ok(Self::Erd),
            "RBS" => Ok(Self::Rbs),
            other => Err(SelectionTypeError::Unknown(other.to_string())),
        }
    }
}

impl fmt::Display for SelectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Erd => write!(f, "ERD"),
            Self::Rbs => write!(f, "RBS"),
        }
    }
}

/// The information a user-made selection hands over to a cut file.
///
/// Only read when populating a CutFile; the selection itself (its polygon, plotting
/// state etc.) lives outside of this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub element: Element,
    pub selection_type: SelectionType,
    pub weight_factor: f64,
    pub scatter_element: Option<Element>,
}

impl Selection {
    pub fn new(element: Element, selection_type: SelectionType) -> Self {
        Self {
            element,
            selection_type,
            weight_factor: 1.0,
            scatter_element: None,
        }
    }
}
