use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ElementError {
    #[error("Element identifier is empty")]
    Empty,
    #[error("Invalid element identifier {0:?}; expected [mass number]Symbol, e.g. 1H or Cl")]
    BadFormat(String),
    #[error("Invalid isotope mass number in element identifier {0:?}")]
    BadMassNumber(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionTypeError {
    #[error("Unknown selection type {0:?}; expected ERD or RBS")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("Expected {1} number(s) optionally followed by a unit, found {0:?}")]
    BadFormat(String, usize),
    #[error("Could not parse {0:?} as a number")]
    BadNumber(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescriptionElementError {
    #[error("Expected '<mass> <symbol>' for a description element, found {0:?}")]
    BadFormat(String),
    #[error("Invalid atomic mass {0:?} in description element")]
    BadMass(String),
    #[error("Invalid element in description element: {0}")]
    BadElement(#[from] ElementError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecoilAngleWidthError {
    #[error("Unknown recoil angle width {0:?}; expected wide or narrow")]
    Unknown(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CutNameError {
    #[error("Cut file name {0:?} does not end in .cut")]
    MissingExtension(String),
    #[error("Cut file name {0:?} does not match <basename>.<element>.<ordinal>[.<split>].cut")]
    BadPattern(String),
    #[error("Cut file name {0:?} has an invalid element token: {1}")]
    BadElement(String, ElementError),
    #[error("Cut file name {0:?} has a non-numeric ordinal or split token")]
    BadNumber(String),
}

#[derive(Debug, Error)]
pub enum CutFileError {
    #[error("Could not open cut file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Malformed cut file name: {0}")]
    BadName(#[from] CutNameError),
    #[error("Malformed cut file {path:?} at line {line}: expected three integers, found {found:?}")]
    MalformedLine {
        path: PathBuf,
        line: usize,
        found: String,
    },
    #[error("Malformed cut file {path:?}: header field {key:?} has invalid value {value:?}")]
    BadField {
        path: PathBuf,
        key: String,
        value: String,
    },
    #[error("Malformed cut file {path:?}: split index {index} is outside of split count {count}")]
    BadSplitPosition {
        path: PathBuf,
        index: usize,
        count: usize,
    },
    #[error("Cut file cannot be saved without an element")]
    MissingElement,
    #[error("Cut file cannot be saved without a source directory")]
    MissingDirectory,
    #[error("Cut file failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("Split count must be at least 1, got {0}")]
    InvalidSplitCount(usize),
    #[error("Reference cut has {available} events, which is fewer than the {required} splits requested")]
    InsufficientReferenceData { available: usize, required: usize },
    #[error("Additional split weight factor must be positive, got {0}")]
    InvalidWeightFactor(f64),
    #[error("Saving a split cut file failed: {0}")]
    SaveError(#[from] CutFileError),
}

#[derive(Debug, Error)]
pub enum DescriptionError {
    #[error("Could not open description file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Description file {0:?} has an unsupported extension; expected .target or .foils")]
    UnsupportedFormat(PathBuf),
    #[error("Malformed description file at line {line}: {reason} (found {found:?})")]
    MalformedLine {
        line: usize,
        reason: &'static str,
        found: String,
    },
    #[error("Malformed description file: {0}")]
    MissingTerminator(&'static str),
    #[error("Malformed description file: layer {layer} references element index {index}, but only {count} elements are listed")]
    BadElementIndex {
        layer: usize,
        index: usize,
        count: usize,
    },
    #[error("Malformed detector description: missing header field {0:?}")]
    MissingField(&'static str),
    #[error("Malformed detector description: {foils} foils are listed but the foils file has {layers} layers")]
    FoilLayerMismatch { foils: usize, layers: usize },
    #[error("Detector foil {foil} holds {layers} layers; a foils file can only give one layer to each foil and any surplus to the last")]
    FoilLayerLayout { foil: usize, layers: usize },
    #[error("Description file failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CommandFileError {
    #[error("Could not open MCERD command file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Malformed MCERD command file at line {line}: key {key:?} has invalid value {value:?}")]
    BadValue {
        line: usize,
        key: &'static str,
        value: String,
    },
    #[error("MCERD command file cannot be written without the {0:?} field")]
    MissingField(&'static str),
    #[error("MCERD parameter files failed due to description error: {0}")]
    DescriptionError(#[from] DescriptionError),
    #[error("MCERD command file failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to CutFile error: {0}")]
    CutFileError(#[from] CutFileError),
    #[error("Processor failed due to Split error: {0}")]
    SplitError(#[from] SplitError),
    #[error("Processor failed due to MCERD command file error: {0}")]
    CommandFileError(#[from] CommandFileError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed because the configured split count {0} is invalid")]
    BadSplitCount(usize),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}
