//! # tofe_toolkit
//!
//! tofe_toolkit handles the data files of a Time-of-Flight Elastic Recoil Detection
//! (ToF-ERD) analysis, written in Rust. It reads and writes the cut files which hold the
//! coincidence events a user selected for one element, splits cut files into consecutive
//! parts of a measurement for elemental-loss analysis, and reads and writes the parameter
//! files of the MCERD Monte-Carlo simulation.
//!
//! ## Installation
//!
//! The only method of install is from source.
//!
//! ### Rust
//!
//! If you have not used Rust before, you will most likely need to install the Rust tool
//! chain. See the [Rust docs](https://www.rust-lang.org/tools/install) for installation
//! instructions.
//!
//! ### Building & Install
//!
//! To build and install the CLI use `cargo install --path ./tofe_toolkit_cli` from the top
//! level repository. The binary will be installed to your cargo install location
//! (typically something like `~/.cargo/bin/`). To use the CLI see the `tofe_toolkit_cli`
//! README.
//!
//! ## Configuration
//!
//! A splitting job is described by a YAML file:
//!
//! ```yml
//! cut_paths:
//! - /data/tof_e_01048/cuts/tof_e_01048.7Li.0.cut
//! reference_path: /data/tof_e_01048/cuts/tof_e_01048.35Cl.0.cut
//! split_count: 10
//! overflow: drop
//! weight_factor: 1.0
//! save_splits: true
//! command_path: null
//! ```
//!
//! - `cut_paths`: cut files to split
//! - `reference_path`: the cut whose event numbering defines the split boundaries
//! (typically the beam or heaviest recoil)
//! - `split_count`: number of parts, at least 1
//! - `overflow`: `drop` or `append_to_last`; what happens to events newer than the last
//! reference window
//! - `weight_factor`: multiplied into every split's weight factor
//! - `save_splits`: write the splits to `<measurement>/cuts/elemloss/`
//! - `command_path`: optional MCERD command file to read and check
//!
//! ## Cut File Format
//!
//! Cut files are named `<measurement>.<element>.<n>.cut` (or
//! `<measurement>.<element>.<n>.<split>.cut` for splits) and look like
//!
//! ```text
//! Count: 3
//! Type: ERD
//! Weight Factor: 1.0
//! Energy: 0
//! Detector Angle: 0
//! Scatter Element: None
//! Element losses: False
//! Split count: 1
//!
//! ToF, Energy, Event number
//! 1200 340 3
//! 1180 355 7
//! 1215 330 7
//! ```
//!
//! ## Splitting
//!
//! A cut is split against a reference cut: the reference's events are divided into
//! `split_count` windows of equal length and the event number closing each window
//! becomes the upper bound of a split. The cut's events are then handed out to the splits
//! in order of those bounds. Every element of a measurement split against the same
//! reference therefore covers the same stretch of the measurement.
//!
//! ## MCERD Files
//!
//! [`command::SimulationParameters`] models the MCERD command file. Reading it also reads
//! the target, detector (with its foils) and recoil distribution files it names;
//! [`command::SimulationParameters::write_all`] writes the whole set back out.
pub mod command;
pub mod config;
pub mod constants;
pub mod cut_file;
pub mod cut_name;
pub mod detector;
pub mod element;
pub mod error;
pub mod layers;
pub mod process;
pub mod quantity;
pub mod recoil;
pub mod selection;
pub mod splitter;
pub mod worker_status;
