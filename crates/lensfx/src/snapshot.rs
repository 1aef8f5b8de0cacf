use std::path::Path;

use anyhow::{Context, Result};
use renderer::assets::load_rgba;
use renderer::{render_still, ShaderParams, Vec2, Viewport};
use tracing::info;

/// Renders one CPU frame of the lens over `image_path` and writes it as PNG.
pub fn write_snapshot(
    image_path: &Path,
    output: &Path,
    size: (u32, u32),
    mouse: Vec2,
    params: &ShaderParams,
) -> Result<()> {
    let source = load_rgba(image_path)
        .with_context(|| format!("failed to load background image {}", image_path.display()))?;
    let viewport = Viewport::new(size.0, size.1);
    let still = render_still(&source, viewport, mouse, params);
    still
        .save_with_format(output, image::ImageFormat::Png)
        .with_context(|| format!("failed to write snapshot to {}", output.display()))?;
    info!(
        path = %output.display(),
        width = viewport.width,
        height = viewport.height,
        mouse_x = mouse.x,
        mouse_y = mouse.y,
        "snapshot written"
    );
    Ok(())
}
