use std::path::Path;
use std::sync::mpsc::Sender;

use super::command::SimulationParameters;
use super::config::Config;
use super::cut_file::CutFile;
use super::error::ProcessorError;
use super::worker_status::{Stage, WorkerStatus};

/// Split a single cut file against the reference and save the parts if asked to.
///
/// Returns the number of events that landed in a split.
pub fn process_cut(
    config: &Config,
    reference: &CutFile,
    cut_path: &Path,
) -> Result<usize, ProcessorError> {
    let cut = CutFile::load(cut_path)?;
    let options = config.split_options();
    let assigned = if config.save_splits {
        let saved = cut.split_and_save(reference, config.split_count, &options)?;
        for (split, path) in saved.iter() {
            log::debug!(
                "Split {} of {}: {} events in {}",
                split.split_index + 1,
                split.split_count,
                split.event_count(),
                path.to_string_lossy()
            );
        }
        saved.iter().map(|(split, _)| split.event_count()).sum()
    } else {
        let splits = cut.split(reference, config.split_count, &options)?;
        splits.iter().map(CutFile::event_count).sum()
    };

    if assigned < cut.event_count() {
        log::warn!(
            "{} of {} events in {} fall outside the reference windows",
            cut.event_count() - assigned,
            cut.event_count(),
            cut_path.to_string_lossy()
        );
    }
    Ok(assigned)
}

/// Parse the MCERD command file and log what it sets up. Referenced files that fail to
/// read are logged by the parser and do not stop the job.
fn process_command(command_path: &Path) -> Result<(), ProcessorError> {
    log::info!(
        "Reading MCERD command file {}...",
        command_path.to_string_lossy()
    );
    let (params, failures) = SimulationParameters::read(command_path)?;
    if let Some(ion) = &params.beam.ion {
        log::info!("Beam ion: {ion}");
    }
    if let Some(energy) = &params.beam.energy {
        log::info!("Beam energy: {energy}");
    }
    if let Some(atom) = &params.recoiling_atom {
        log::info!("Recoiling atom: {atom}");
    }
    if let Some(target) = &params.target {
        log::info!("Target layers: {}", target.layers.len());
    }
    if let Some(detector) = &params.detector {
        log::info!("Detector foils: {}", detector.foils.len());
    }
    if let Some(recoil) = &params.recoil {
        log::info!("Recoil distribution points: {}", recoil.points.len());
    }
    if !failures.is_empty() {
        log::warn!(
            "{} referenced description file(s) could not be read",
            failures.len()
        );
    }
    Ok(())
}

/// The main loop of the toolkit.
///
/// This takes in a config (and progress monitor), splits every configured cut against the
/// reference cut and then checks the MCERD command file if one is configured. Meant to be
/// called from a separate thread.
pub fn process(config: Config, tx: Sender<WorkerStatus>) -> Result<(), ProcessorError> {
    if !config.is_split_count_valid() {
        return Err(ProcessorError::BadSplitCount(config.split_count));
    }

    log::info!(
        "Loading reference cut {}...",
        config.reference_path.to_string_lossy()
    );
    let reference = CutFile::load(&config.reference_path)?;

    let n_cuts = config.cut_paths.len();
    tx.send(WorkerStatus::new(0.0, 0, Stage::Splitting))?;
    for (idx, cut_path) in config.cut_paths.iter().enumerate() {
        log::info!("Splitting {}...", cut_path.to_string_lossy());
        let assigned = process_cut(&config, &reference, cut_path)?;
        log::info!(
            "Finished {}: {assigned} events in {} splits.",
            cut_path.to_string_lossy(),
            config.split_count
        );
        tx.send(WorkerStatus::new(
            (idx + 1) as f32 / n_cuts as f32,
            idx,
            Stage::Splitting,
        ))?;
    }

    if let Some(command_path) = &config.command_path {
        tx.send(WorkerStatus::new(0.0, n_cuts, Stage::Simulation))?;
        process_command(command_path)?;
        tx.send(WorkerStatus::new(1.0, n_cuts, Stage::Simulation))?;
    }
    Ok(())
}
