use clap::{Arg, Command};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;

use libtofe_toolkit::command::SimulationParameters;
use libtofe_toolkit::config::Config;
use libtofe_toolkit::cut_file::CutFile;
use libtofe_toolkit::process::process;
use libtofe_toolkit::worker_status::{Stage, WorkerStatus};

fn make_template_config(path: &Path) {
    log::info!("Making a template config at {}...", path.to_string_lossy());
    match Config::default().write_config_file(path) {
        Ok(()) => log::info!("Done."),
        Err(e) => log::error!("Could not create template config: {e}"),
    }
}

fn show_cut(path: &Path) {
    let cut = match CutFile::load(path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    let element = cut.element.as_ref().map(|e| e.to_string()).unwrap_or_default();
    log::info!("Element: {element} (selection {})", cut.ordinal);
    log::info!("Type: {}", cut.selection_type);
    log::info!("Events: {}", cut.event_count());
    log::info!("Weight Factor: {:?}", cut.weight_factor);
    if let Some(scatter) = &cut.scatter_element {
        log::info!("Scatter Element: {scatter}");
    }
    if cut.is_derived_from_split {
        log::info!("Split {} of {}", cut.split_index + 1, cut.split_count);
    }
    if let (Some(first), Some(last)) = (cut.data.first(), cut.data.last()) {
        log::info!(
            "Event numbers: {} to {}",
            first.event_number,
            last.event_number
        );
    }
}

fn show_command(path: &Path) {
    let (params, failures) = match SimulationParameters::read(path) {
        Ok(result) => result,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    if let Some(kind) = params.simulation_type {
        log::info!("Type of simulation: {kind}");
    }
    if let Some(ion) = &params.beam.ion {
        log::info!("Beam ion: {ion}");
    }
    if let Some(energy) = &params.beam.energy {
        log::info!("Beam energy: {energy}");
    }
    if let Some(atom) = &params.recoiling_atom {
        log::info!("Recoiling atom: {atom}");
    }
    if let Some(ions) = params.number_of_ions {
        log::info!("Number of ions: {ions}");
    }
    if let Some(target) = &params.target {
        log::info!(
            "Target: {} elements in {} layers",
            target.elements.len(),
            target.layers.len()
        );
    }
    if let Some(detector) = &params.detector {
        log::info!(
            "Detector: {} at {} with {} foils",
            detector.detector_type,
            detector.angle,
            detector.foils.len()
        );
    }
    if let Some(recoil) = &params.recoil {
        log::info!("Recoil distribution: {} points", recoil.points.len());
    }
    if failures.is_empty() {
        log::info!("All referenced files were read.");
    } else {
        log::warn!("{} referenced file(s) could not be read.", failures.len());
    }
}

fn main() {
    // Create a cli
    let matches = Command::new("tofe_toolkit_cli")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(Command::new("cut").about("Show the contents of a cut file"))
        .subcommand(Command::new("mcerd").about("Read and check an MCERD command file"))
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .required(true)
                .help("Path to the file"),
        )
        .get_matches();

    // Initialize feedback
    let logger = simplelog::TermLogger::new(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );

    let pb_manager = MultiProgress::new();

    LogWrapper::new(pb_manager.clone(), logger)
        .try_init()
        .expect("Could not create logging/progress!");

    // Parse the cli
    let path = PathBuf::from(matches.get_one::<String>("path").expect("We require args"));

    match matches.subcommand() {
        Some(("new", _)) => {
            make_template_config(&path);
            return;
        }
        Some(("cut", _)) => {
            show_cut(&path);
            return;
        }
        Some(("mcerd", _)) => {
            show_command(&path);
            return;
        }
        _ => (),
    }

    // Load our config
    log::info!("Loading config from {}...", path.to_string_lossy());
    let config = match Config::read_config_file(&path) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{e}");
            return;
        }
    };
    log::info!("Config successfully loaded.");
    log::info!("Reference Cut: {}", config.reference_path.to_string_lossy());
    log::info!("Number of Cuts: {}", config.cut_paths.len());
    log::info!("Split Count: {}", config.split_count);
    log::info!("Overflow: {:?}", config.overflow);
    log::info!("Save Splits: {}", config.save_splits);
    if let Some(command_path) = &config.command_path {
        log::info!("MCERD Command File: {}", command_path.to_string_lossy());
    }

    // Setup the progress bar
    let pb = pb_manager.add(ProgressBar::new(100));
    match ProgressStyle::with_template("{msg:<24} [{elapsed_precise}] {wide_bar} {pos:>3}%") {
        Ok(style) => pb.set_style(style),
        Err(e) => log::warn!("Could not style the progress bar: {e}"),
    }
    let (tx, rx) = channel::<WorkerStatus>();
    // Spawn the task!
    let handle = std::thread::spawn(move || process(config, tx));

    loop {
        // No UI to wake us, so poll about once a second
        std::thread::sleep(std::time::Duration::from_secs(1));
        for status in rx.try_iter() {
            let message = match status.stage {
                Stage::Splitting => format!("Splitting cut {}", status.file_index + 1),
                Stage::Simulation => String::from("Reading MCERD files"),
            };
            pb.set_message(message);
            pb.set_position((status.progress * 100.0) as u64);
        }

        if handle.is_finished() {
            match handle.join() {
                Ok(result) => match result {
                    Ok(_) => log::info!("Successfully split cut files!"),
                    Err(e) => log::error!("Splitting failed with error: {e}"),
                },
                Err(_) => log::error!("Failed to join splitting task!"),
            }
            break;
        }
    }

    pb.finish();

    log::info!("Done.");
}
