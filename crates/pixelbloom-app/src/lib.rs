//! Headless host for the PixelBloom engine: config loading, PNG import/export and run
//! reports.

use anyhow::{Context, Result};
use pixelbloom_core::EngineConfig;
use std::{fs::File, io::BufReader, path::Path};

pub mod headless;
pub mod image_io;

pub use headless::{FrameStats, HeadlessOptions, HeadlessReport, ReportSummary, run_headless};
pub use image_io::{DEFAULT_BACKGROUND, export_png, import_png, render_rgba};

/// Load an engine configuration from a JSON file. Missing fields fall back to defaults.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    let file =
        File::open(path).with_context(|| format!("failed to open config {}", path.display()))?;
    let config: EngineConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    Ok(config)
}
