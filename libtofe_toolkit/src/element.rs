use std::fmt;
use std::str::FromStr;

use super::error::ElementError;

/// A detected (or beam) species: chemical symbol plus optional isotope mass number.
///
/// The textual form is `[mass number]Symbol`, e.g. `H`, `1H`, `35Cl`. The same grammar
/// is used in cut file names, cut file headers and MCERD command files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element {
    pub symbol: String,
    pub isotope: Option<u32>,
}

impl Element {
    pub fn new(symbol: &str, isotope: Option<u32>) -> Self {
        Self {
            symbol: symbol.to_string(),
            isotope,
        }
    }

    /// Parse an optional element, where the literal `None` (or nothing) means absent
    pub fn parse_optional(s: &str) -> Result<Option<Self>, ElementError> {
        let s = s.trim();
        if s.is_empty() || s == "None" {
            Ok(None)
        } else {
            Ok(Some(s.parse()?))
        }
    }
}

impl FromStr for Element {
    type Err = ElementError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ElementError::Empty);
        }

        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (mass, symbol) = s.split_at(split);

        let mut chars = symbol.chars();
        match chars.next() {
            Some(c) if c.is_ascii_uppercase() => (),
            _ => return Err(ElementError::BadFormat(s.to_string())),
        }
        // Symbols are at most three letters (temporary IUPAC names)
        if symbol.len() > 3 || !chars.all(|c| c.is_ascii_lowercase()) {
            return Err(ElementError::BadFormat(s.to_string()));
        }

        let isotope = if mass.is_empty() {
            None
        } else {
            match mass.parse::<u32>() {
                Ok(0) | Err(_) => return Err(ElementError::BadMassNumber(s.to_string())),
                Ok(m) => Some(m),
            }
        };

        Ok(Self {
            symbol: symbol.to_string(),
            isotope,
        })
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.isotope {
            Some(mass) => write!(f, "{mass}{}", self.symbol),
            None => write!(f, "{}", self.symbol),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_isotope() {
        let elem: Element = "35Cl".parse().unwrap();
        assert_eq!(elem, Element::new("Cl", Some(35)));
        assert_eq!(elem.to_string(), "35Cl");
    }

    #[test]
    fn test_parse_natural() {
        let elem: Element = "Pm".parse().unwrap();
        assert_eq!(elem.isotope, None);
        assert_eq!(elem.to_string(), "Pm");
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!("".parse::<Element>(), Err(ElementError::Empty));
        assert!(matches!(
            "h".parse::<Element>(),
            Err(ElementError::BadFormat(_))
        ));
        assert!(matches!(
            "12".parse::<Element>(),
            Err(ElementError::BadFormat(_))
        ));
        assert!(matches!(
            "0H".parse::<Element>(),
            Err(ElementError::BadMassNumber(_))
        ));
        assert!(matches!(
            "1HE".parse::<Element>(),
            Err(ElementError::BadFormat(_))
        ));
    }

    #[test]
    fn test_optional() {
        assert_eq!(Element::parse_optional("None"), Ok(None));
        assert_eq!(
            Element::parse_optional(" 4He "),
            Ok(Some(Element::new("He", Some(4))))
        );
    }
}
