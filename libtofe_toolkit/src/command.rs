use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::constants::{
    HEADER_GENERAL, HEADER_NONPHYSICAL, HEADER_PHYSICAL, HEADER_SIMULATION_TYPE, HEADER_SPECIFIC,
    SUBHEADER_ERD, SUBHEADER_RBS,
};
use super::detector::{resolve_reference, Detector};
use super::element::Element;
use super::error::{CommandFileError, DescriptionError, RecoilAngleWidthError};
use super::layers::{DescriptionKind, LayeredDescription};
use super::quantity::{Quantity, QuantityPair};
use super::recoil::RecoilDistribution;
use super::selection::SelectionType;

// Keys as MCERD reads them. A line belongs to a key if it starts with it.
const KEY_SIMULATION_TYPE: &str = "Type of simulation:";
const KEY_BEAM_ION: &str = "Beam ion:";
const KEY_BEAM_ENERGY: &str = "Beam energy:";
const KEY_TARGET_FILE: &str = "Target description file:";
const KEY_DETECTOR_FILE: &str = "Detector description file:";
const KEY_RECOILING_ATOM: &str = "Recoiling atom:";
const KEY_RECOIL_FILE: &str = "Recoiling material distribution:";
const KEY_TARGET_ANGLE: &str = "Target angle:";
const KEY_BEAM_SPOT_SIZE: &str = "Beam spot size:";
const KEY_MIN_SCATTERING_ANGLE: &str = "Minimum angle of scattering:";
const KEY_MIN_ION_ENERGY: &str = "Minimum energy of ions:";
const KEY_NUMBER_OF_IONS: &str = "Number of ions:";
const KEY_NUMBER_OF_PREIONS: &str = "Number of ions in the presimulation:";
const KEY_RECOILS_PER_ION: &str = "Average number of recoils per primary ion:";
const KEY_SEED: &str = "Seed number of the random number generator:";
const KEY_RECOIL_ANGLE_WIDTH: &str = "Recoil angle width (wide or narrow):";
const KEY_MIN_MAIN_SCATTERING_ANGLE: &str = "Minimum main scattering angle:";
const KEY_BEAM_DIVERGENCE: &str = "Beam divergence:";
const KEY_BEAM_PROFILE: &str = "Beam profile:";
const KEY_TOPOGRAPHY_FILE: &str = "Surface topography file:";
const KEY_TOPOGRAPHY_SIDE: &str = "Side length of the surface topography image:";
const KEY_SCALING_IONS: &str = "Number of real ions per each scaling ion:";
const KEY_PRESIMULATION_FILE: &str = "Presimulation * result file:";

const COMMAND_KEYS: [&str; 23] = [
    KEY_SIMULATION_TYPE,
    KEY_BEAM_ION,
    KEY_BEAM_ENERGY,
    KEY_TARGET_FILE,
    KEY_DETECTOR_FILE,
    KEY_RECOILING_ATOM,
    KEY_RECOIL_FILE,
    KEY_TARGET_ANGLE,
    KEY_BEAM_SPOT_SIZE,
    KEY_MIN_SCATTERING_ANGLE,
    KEY_MIN_ION_ENERGY,
    KEY_NUMBER_OF_IONS,
    KEY_NUMBER_OF_PREIONS,
    KEY_RECOILS_PER_ION,
    KEY_SEED,
    KEY_RECOIL_ANGLE_WIDTH,
    KEY_MIN_MAIN_SCATTERING_ANGLE,
    KEY_BEAM_DIVERGENCE,
    KEY_BEAM_PROFILE,
    KEY_TOPOGRAPHY_FILE,
    KEY_TOPOGRAPHY_SIDE,
    KEY_SCALING_IONS,
    KEY_PRESIMULATION_FILE,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoilAngleWidth {
    Wide,
    Narrow,
}

impl FromStr for RecoilAngleWidth {
    type Err = RecoilAngleWidthError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wide" => Ok(Self::Wide),
            "narrow" => Ok(Self::Narrow),
            _ => Err(RecoilAngleWidthError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for RecoilAngleWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wide => write!(f, "wide"),
            Self::Narrow => write!(f, "narrow"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Beam {
    pub ion: Option<Element>,
    pub energy: Option<Quantity>,
    pub spot_size: Option<QuantityPair>,
    pub divergence: Option<Quantity>,
    pub profile: Option<String>,
}

/// Everything an MCERD run is told through its command file.
///
/// Every key MCERD understands has its own field; a field is None when the command file
/// does not set it. The three referenced description files are parsed into `target`,
/// `detector` and `recoil` by [`SimulationParameters::read`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimulationParameters {
    pub simulation_type: Option<SelectionType>,
    pub beam: Beam,
    pub target_file: Option<PathBuf>,
    pub detector_file: Option<PathBuf>,
    pub recoiling_atom: Option<Element>,
    pub recoil_file: Option<PathBuf>,
    pub target_angle: Option<Quantity>,
    pub minimum_scattering_angle: Option<Quantity>,
    pub minimum_main_scattering_angle: Option<Quantity>,
    pub minimum_ion_energy: Option<Quantity>,
    pub number_of_ions: Option<u64>,
    pub number_of_preions: Option<u64>,
    pub recoils_per_ion: Option<u64>,
    pub seed: Option<u64>,
    pub recoil_angle_width: Option<RecoilAngleWidth>,
    pub surface_topography_file: Option<PathBuf>,
    pub surface_side_length: Option<Quantity>,
    pub scaling_ions: Option<u64>,
    pub presimulation_file: Option<PathBuf>,

    pub target: Option<LayeredDescription>,
    pub detector: Option<Detector>,
    pub recoil: Option<RecoilDistribution>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Target,
    Detector,
    Recoil,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target => write!(f, "Target description"),
            Self::Detector => write!(f, "Detector description"),
            Self::Recoil => write!(f, "Recoiling material distribution"),
        }
    }
}

/// A referenced description file that could not be read. The rest of the command file
/// is still usable.
#[derive(Debug)]
pub struct ReferenceFailure {
    pub kind: ReferenceKind,
    pub path: PathBuf,
    pub error: DescriptionError,
}

impl fmt::Display for ReferenceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} file {} could not be read: {}",
            self.kind,
            self.path.to_string_lossy(),
            self.error
        )
    }
}

impl SimulationParameters {
    /// Read an MCERD command file and the description files it names.
    ///
    /// Referenced files are resolved relative to the command file. Failing to read one
    /// of them is not an error of the command file: it is logged, returned in the list of
    /// failures, and its slot stays None.
    pub fn read(path: &Path) -> Result<(Self, Vec<ReferenceFailure>), CommandFileError> {
        if !path.exists() {
            return Err(CommandFileError::BadFilePath(path.to_path_buf()));
        }
        let mut params: Self = std::fs::read_to_string(path)?.parse()?;
        let mut failures = Vec::new();

        if let Some(target_path) = params.target_file.as_ref().map(|f| resolve_reference(path, f)) {
            match read_target(&target_path) {
                Ok(target) => params.target = Some(target),
                Err(error) => failures.push(ReferenceFailure {
                    kind: ReferenceKind::Target,
                    path: target_path,
                    error,
                }),
            }
        }

        if let Some(detector_path) = params.detector_file.as_ref().map(|f| resolve_reference(path, f)) {
            match Detector::read(&detector_path) {
                Ok(detector) => params.detector = Some(detector),
                Err(error) => failures.push(ReferenceFailure {
                    kind: ReferenceKind::Detector,
                    path: detector_path,
                    error,
                }),
            }
        }

        if let Some(recoil_path) = params.recoil_file.as_ref().map(|f| resolve_reference(path, f)) {
            match RecoilDistribution::read(&recoil_path) {
                Ok(recoil) => params.recoil = Some(recoil),
                Err(error) => failures.push(ReferenceFailure {
                    kind: ReferenceKind::Recoil,
                    path: recoil_path,
                    error,
                }),
            }
        }

        for failure in failures.iter() {
            log::warn!("{failure}");
        }
        Ok((params, failures))
    }

    /// Store a value for a known key. None if the value does not parse.
    fn assign(&mut self, key: &str, value: &str) -> Option<()> {
        match key {
            KEY_SIMULATION_TYPE => self.simulation_type = Some(value.parse().ok()?),
            KEY_BEAM_ION => self.beam.ion = Some(value.parse().ok()?),
            KEY_BEAM_ENERGY => self.beam.energy = Some(value.parse().ok()?),
            KEY_TARGET_FILE => self.target_file = Some(PathBuf::from(value)),
            KEY_DETECTOR_FILE => self.detector_file = Some(PathBuf::from(value)),
            KEY_RECOILING_ATOM => self.recoiling_atom = Some(value.parse().ok()?),
            KEY_RECOIL_FILE => self.recoil_file = Some(PathBuf::from(value)),
            KEY_TARGET_ANGLE => self.target_angle = Some(value.parse().ok()?),
            KEY_BEAM_SPOT_SIZE => self.beam.spot_size = Some(value.parse().ok()?),
            KEY_MIN_SCATTERING_ANGLE => self.minimum_scattering_angle = Some(value.parse().ok()?),
            KEY_MIN_ION_ENERGY => self.minimum_ion_energy = Some(value.parse().ok()?),
            KEY_NUMBER_OF_IONS => self.number_of_ions = Some(value.parse().ok()?),
            KEY_NUMBER_OF_PREIONS => self.number_of_preions = Some(value.parse().ok()?),
            KEY_RECOILS_PER_ION => self.recoils_per_ion = Some(value.parse().ok()?),
            KEY_SEED => self.seed = Some(value.parse().ok()?),
            KEY_RECOIL_ANGLE_WIDTH => self.recoil_angle_width = Some(value.parse().ok()?),
            KEY_MIN_MAIN_SCATTERING_ANGLE => {
                self.minimum_main_scattering_angle = Some(value.parse().ok()?)
            }
            KEY_BEAM_DIVERGENCE => self.beam.divergence = Some(value.parse().ok()?),
            KEY_BEAM_PROFILE => self.beam.profile = Some(value.to_string()),
            KEY_TOPOGRAPHY_FILE => self.surface_topography_file = Some(PathBuf::from(value)),
            KEY_TOPOGRAPHY_SIDE => self.surface_side_length = Some(value.parse().ok()?),
            KEY_SCALING_IONS => self.scaling_ions = Some(value.parse().ok()?),
            KEY_PRESIMULATION_FILE => self.presimulation_file = Some(PathBuf::from(value)),
            _ => (),
        }
        Some(())
    }

    /// Write the command file only
    pub fn write(&self, path: &Path) -> Result<(), CommandFileError> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize the command file with MCERD's section headers. Unset fields are left
    /// out so that MCERD falls back to its own defaults.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let simulation_type = self.simulation_type.unwrap_or_default();

        writeln!(writer, "{HEADER_SIMULATION_TYPE}")?;
        write_field(writer, KEY_SIMULATION_TYPE, &self.simulation_type)?;

        writeln!(writer, "{HEADER_GENERAL}")?;
        write_field(writer, KEY_BEAM_ION, &self.beam.ion)?;
        write_field(writer, KEY_BEAM_ENERGY, &self.beam.energy)?;
        write_field(writer, KEY_BEAM_DIVERGENCE, &self.beam.divergence)?;
        write_field(writer, KEY_BEAM_PROFILE, &self.beam.profile)?;

        writeln!(writer, "{HEADER_SPECIFIC}")?;
        if simulation_type == SelectionType::Erd {
            writeln!(writer, "{SUBHEADER_ERD}")?;
        } else {
            writeln!(writer, "{SUBHEADER_RBS}")?;
        }
        write_field(writer, KEY_TARGET_FILE, &display_path(&self.target_file))?;
        write_field(writer, KEY_DETECTOR_FILE, &display_path(&self.detector_file))?;
        write_field(writer, KEY_RECOILING_ATOM, &self.recoiling_atom)?;
        write_field(writer, KEY_RECOIL_FILE, &display_path(&self.recoil_file))?;
        write_field(writer, KEY_TARGET_ANGLE, &self.target_angle)?;
        write_field(writer, KEY_BEAM_SPOT_SIZE, &self.beam.spot_size)?;
        write_field(
            writer,
            KEY_TOPOGRAPHY_FILE,
            &display_path(&self.surface_topography_file),
        )?;
        write_field(writer, KEY_TOPOGRAPHY_SIDE, &self.surface_side_length)?;

        writeln!(writer, "{HEADER_PHYSICAL}")?;
        write_field(writer, KEY_MIN_SCATTERING_ANGLE, &self.minimum_scattering_angle)?;
        write_field(
            writer,
            KEY_MIN_MAIN_SCATTERING_ANGLE,
            &self.minimum_main_scattering_angle,
        )?;
        write_field(writer, KEY_MIN_ION_ENERGY, &self.minimum_ion_energy)?;
        write_field(writer, KEY_RECOILS_PER_ION, &self.recoils_per_ion)?;
        write_field(writer, KEY_RECOIL_ANGLE_WIDTH, &self.recoil_angle_width)?;
        write_field(
            writer,
            KEY_PRESIMULATION_FILE,
            &display_path(&self.presimulation_file),
        )?;
        write_field(writer, KEY_SCALING_IONS, &self.scaling_ions)?;

        writeln!(writer, "{HEADER_NONPHYSICAL}")?;
        write_field(writer, KEY_NUMBER_OF_IONS, &self.number_of_ions)?;
        write_field(writer, KEY_NUMBER_OF_PREIONS, &self.number_of_preions)?;
        write_field(writer, KEY_SEED, &self.seed)?;
        Ok(())
    }

    /// Write the command file and every description file it references into `directory`.
    ///
    /// The file names are the ones recorded in the parameters; the foils file goes next
    /// to the detector file. Returns the path of the command file.
    pub fn write_all(
        &self,
        directory: &Path,
        command_name: &str,
    ) -> Result<PathBuf, CommandFileError> {
        // Validate the foil layout before anything is written
        let foils = self
            .detector
            .as_ref()
            .map(Detector::foils_description)
            .transpose()?;
        std::fs::create_dir_all(directory)?;

        if let Some(target) = &self.target {
            let name = self
                .target_file
                .as_ref()
                .ok_or(CommandFileError::MissingField(KEY_TARGET_FILE))?;
            target.write(&directory.join(name))?;
        }

        if let Some(detector) = &self.detector {
            let name = self
                .detector_file
                .as_ref()
                .ok_or(CommandFileError::MissingField(KEY_DETECTOR_FILE))?;
            let detector_path = directory.join(name);
            detector.write(&detector_path)?;
            if let Some(foils) = &foils {
                foils.write(&resolve_reference(&detector_path, &detector.foils_file))?;
            }
        }

        if let Some(recoil) = &self.recoil {
            let name = self
                .recoil_file
                .as_ref()
                .ok_or(CommandFileError::MissingField(KEY_RECOIL_FILE))?;
            recoil.write(&directory.join(name))?;
        }

        let command_path = directory.join(command_name);
        self.write(&command_path)?;
        log::info!(
            "Wrote MCERD parameter files to {}",
            directory.to_string_lossy()
        );
        Ok(command_path)
    }
}

impl FromStr for SimulationParameters {
    type Err = CommandFileError;
    fn from_str(contents: &str) -> Result<Self, Self::Err> {
        let mut params = Self::default();
        for (idx, line) in contents.lines().enumerate() {
            let Some(&key) = COMMAND_KEYS.iter().find(|k| line.starts_with(**k)) else {
                continue;
            };
            let value = line[key.len()..].trim();
            if value.is_empty() {
                log::debug!("MCERD command key {key:?} has no value; leaving it unset");
                continue;
            }
            params
                .assign(key, value)
                .ok_or_else(|| CommandFileError::BadValue {
                    line: idx + 1,
                    key,
                    value: value.to_string(),
                })?;
        }
        Ok(params)
    }
}

fn read_target(path: &Path) -> Result<LayeredDescription, DescriptionError> {
    match LayeredDescription::read(path)? {
        (DescriptionKind::Target, target) => Ok(target),
        (DescriptionKind::Foils, _) => Err(DescriptionError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn display_path(path: &Option<PathBuf>) -> Option<std::path::Display<'_>> {
    path.as_ref().map(|p| p.display())
}

fn write_field<W: Write, T: fmt::Display>(
    writer: &mut W,
    key: &str,
    value: &Option<T>,
) -> std::io::Result<()> {
    if let Some(value) = value {
        writeln!(writer, "{key} {value}")?;
    }
    Ok(())
}
