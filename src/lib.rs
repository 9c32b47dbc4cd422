//! DXT: Drydock Export Toolkit
//!
//! A command-line companion for CAD work that turns "save" into a
//! structured local backup: versioned archive and interchange exports,
//! per-body mesh files and a preview image, with the export location
//! remembered per design across sessions.

pub mod cli;
pub mod core;
pub mod export;
pub mod host;
