//! PNG import into the engine canvas and palette-rendered PNG snapshots.

use anyhow::{Context, Result, ensure};
use image::{
    ExtendedColorType, ImageBuffer, ImageEncoder, Rgba, RgbaImage, codecs::png::PngEncoder,
};
use pixelbloom_core::{Canvas, Engine, Rgb};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
};
use tracing::info;

/// Backdrop drawn behind empty cells.
pub const DEFAULT_BACKGROUND: Rgb = Rgb::new(0x0f, 0x0a, 0x0b);

/// Replace the engine canvas with the quantized pixels of a PNG (or any format the
/// `image` crate can sniff).
pub fn import_png(path: &Path, engine: &mut Engine) -> Result<()> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode image {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    engine
        .import_rgba(width as usize, height as usize, image.as_raw())
        .with_context(|| format!("failed to import image {}", path.display()))?;
    Ok(())
}

/// Render the canvas to an RGBA image, `cell_size` pixels per grid cell.
pub fn render_rgba(canvas: &Canvas, background: Rgb, cell_size: u32) -> Result<RgbaImage> {
    let cell_size = cell_size.max(1);
    let grid = canvas.grid();
    let width = u32::try_from(grid.cols())
        .ok()
        .and_then(|cols| cols.checked_mul(cell_size));
    let height = u32::try_from(grid.rows())
        .ok()
        .and_then(|rows| rows.checked_mul(cell_size));
    let (Some(width), Some(height)) = (width, height) else {
        anyhow::bail!(
            "snapshot of {}x{} cells at {cell_size}px overflows image bounds",
            grid.rows(),
            grid.cols()
        );
    };
    ensure!(width > 0 && height > 0, "cannot render an empty grid");

    let palette = canvas.palette();
    let preview = canvas.preview();
    let image: RgbaImage = ImageBuffer::from_fn(width, height, |x, y| {
        let row = (y / cell_size) as usize;
        let col = (x / cell_size) as usize;
        let Rgb([r, g, b]) = grid
            .get(row, col)
            .and_then(|cell| palette.resolve(cell, preview))
            .unwrap_or(background);
        Rgba([r, g, b, 255])
    });
    Ok(image)
}

/// Write a PNG snapshot of the canvas, creating parent directories as needed.
pub fn export_png(canvas: &Canvas, background: Rgb, cell_size: u32, path: &Path) -> Result<()> {
    let image = render_rgba(canvas, background, cell_size)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create snapshot {}", path.display()))?;
    PngEncoder::new(BufWriter::new(file))
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgba8,
        )
        .with_context(|| format!("failed to encode snapshot {}", path.display()))?;
    info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "snapshot written"
    );
    Ok(())
}
