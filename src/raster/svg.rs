use std::io::Cursor;

use anyhow::Context;

use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Largest raster edge accepted, in pixels.
pub const MAX_RASTER_DIM: u32 = 16_384;

/// Straight-alpha RGBA8 pixels of a rasterized frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Row-major RGBA8, not premultiplied.
    pub data: Vec<u8>,
}

impl RasterFrame {
    /// Encode the pixels as PNG.
    pub fn to_png(&self) -> FlipbookResult<Vec<u8>> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| FlipbookError::validation("raster buffer does not match its size"))?;
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode png")?;
        Ok(buf)
    }
}

fn to_px(v: f32, scale: f32) -> FlipbookResult<u32> {
    let px = (v * scale).ceil();
    if !px.is_finite() || px <= 0.0 {
        return Err(FlipbookError::validation("svg has invalid width/height"));
    }
    let px = (px as u32).max(1);
    if px > MAX_RASTER_DIM {
        return Err(FlipbookError::validation(format!(
            "svg raster size too large: {px} (max {MAX_RASTER_DIM})"
        )));
    }
    Ok(px)
}

/// Rasterize an SVG document at `scale` times its intrinsic size.
pub fn rasterize_svg(svg: &[u8], scale: f32) -> FlipbookResult<RasterFrame> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(FlipbookError::validation(
            "raster scale must be finite and > 0",
        ));
    }
    let mut opts = usvg::Options::default();
    opts.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_data(svg, &opts).context("parse svg tree")?;

    let size = tree.size();
    let width = to_px(size.width(), scale)?;
    let height = to_px(size.height(), scale)?;
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| FlipbookError::validation("failed to allocate svg pixmap"))?;
    let sx = width as f32 / size.width();
    let sy = height as f32 / size.height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    let mut data = pixmap.take();
    unpremultiply_rgba8_in_place(&mut data);
    Ok(RasterFrame {
        width,
        height,
        data,
    })
}

/// Rasterize an SVG document straight to PNG bytes.
pub fn svg_to_png(svg: &[u8], scale: f32) -> FlipbookResult<Vec<u8>> {
    rasterize_svg(svg, scale)?.to_png()
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/raster/svg.rs"]
mod tests;
