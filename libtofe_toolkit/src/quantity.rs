use std::fmt;
use std::str::FromStr;

use super::error::QuantityError;

/// A number with an optional unit token, e.g. `8.515 MeV`, `20.6 deg` or `41.12`
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub value: f64,
    pub unit: Option<String>,
}

impl Quantity {
    pub fn new(value: f64, unit: Option<&str>) -> Self {
        Self {
            value,
            unit: unit.map(String::from),
        }
    }
}

/// Two numbers sharing an optional unit, e.g. `0.5 3.0 nm` or `14.0 14.0`
#[derive(Debug, Clone, PartialEq)]
pub struct QuantityPair {
    pub first: f64,
    pub second: f64,
    pub unit: Option<String>,
}

impl QuantityPair {
    pub fn new(first: f64, second: f64, unit: Option<&str>) -> Self {
        Self {
            first,
            second,
            unit: unit.map(String::from),
        }
    }
}

fn parse_number(token: &str) -> Result<f64, QuantityError> {
    token
        .parse()
        .map_err(|_| QuantityError::BadNumber(token.to_string()))
}

/// Split `n` numbers and at most one trailing unit token
fn split_tokens(s: &str, n: usize) -> Result<(Vec<f64>, Option<String>), QuantityError> {
    let tokens: Vec<&str> = s.split_whitespace().collect();
    if tokens.len() != n && tokens.len() != n + 1 {
        return Err(QuantityError::BadFormat(s.to_string(), n));
    }
    let numbers = tokens[..n]
        .iter()
        .map(|t| parse_number(t))
        .collect::<Result<Vec<f64>, QuantityError>>()?;
    Ok((numbers, tokens.get(n).map(|u| u.to_string())))
}

impl FromStr for Quantity {
    type Err = QuantityError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (numbers, unit) = split_tokens(s, 1)?;
        Ok(Self {
            value: numbers[0],
            unit,
        })
    }
}

impl FromStr for QuantityPair {
    type Err = QuantityError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (numbers, unit) = split_tokens(s, 2)?;
        Ok(Self {
            first: numbers[0],
            second: numbers[1],
            unit,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)?;
        if let Some(unit) = &self.unit {
            write!(f, " {unit}")?;
        }
        Ok(())
    }
}

impl fmt::Display for QuantityPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first, self.second)?;
        if let Some(unit) = &self.unit {
            write!(f, " {unit}")?;
        }
        Ok(())
    }
}
