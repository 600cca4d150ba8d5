use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use super::error::DescriptionError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecoilPoint {
    pub depth: f64,
    pub concentration: f64,
}

/// Concentration of the recoiling element as a function of depth.
///
/// Points are kept exactly in file order; they define a piecewise profile (steps are
/// written as two points a hair apart) and must never be sorted or merged.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecoilDistribution {
    pub points: Vec<RecoilPoint>,
}

impl RecoilDistribution {
    pub fn new(points: &[(f64, f64)]) -> Self {
        Self {
            points: points
                .iter()
                .map(|(depth, concentration)| RecoilPoint {
                    depth: *depth,
                    concentration: *concentration,
                })
                .collect(),
        }
    }

    pub fn read(path: &Path) -> Result<Self, DescriptionError> {
        if !path.exists() {
            return Err(DescriptionError::BadFilePath(path.to_path_buf()));
        }
        std::fs::read_to_string(path)?.parse()
    }

    pub fn write(&self, path: &Path) -> Result<(), DescriptionError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for point in self.points.iter() {
            writeln!(writer, "{} {}", point.depth, point.concentration)?;
        }
        Ok(())
    }
}

impl FromStr for RecoilDistribution {
    type Err = DescriptionError;
    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let mut points = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let point = parse_point(line).ok_or_else(|| DescriptionError::MalformedLine {
                line: idx + 1,
                reason: "expected '<depth> <concentration>'",
                found: line.to_string(),
            })?;
            points.push(point);
        }
        Ok(Self { points })
    }
}

fn parse_point(line: &str) -> Option<RecoilPoint> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 2 {
        return None;
    }
    Some(RecoilPoint {
        depth: tokens[0].parse().ok()?,
        concentration: tokens[1].parse().ok()?,
    })
}
