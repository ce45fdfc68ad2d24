//! Pixel-addressable drawing surfaces.

use crate::color::Rgb;
use thiserror::Error;

/// Something the board can be painted onto and read back from.
///
/// Readback must be exact: implementations must not smooth or blend, since
/// the pending buffer recovers color codes from rendered pixels.
pub trait Surface {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Write one pixel. Out-of-range writes are ignored.
    fn fill_pixel(&mut self, x: usize, y: usize, color: Rgb);

    /// Read one pixel, `None` when out of range or unreadable.
    fn pixel(&self, x: usize, y: usize) -> Option<Rgb>;
}

/// Errors from exporting a surface.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] png::EncodingError),
}

/// In-memory RGB surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelSurface {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelSurface {
    /// Color of a freshly created surface (an empty canvas reads back as black).
    pub const BACKGROUND: Rgb = Rgb::BLACK;

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Self::BACKGROUND; width * height],
        }
    }

    /// Raw pixels in row-major order.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Encode the surface as an 8-bit RGB PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width as u32, self.height as u32);
            encoder.set_color(png::ColorType::Rgb);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            let data: Vec<u8> = self.pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect();
            writer.write_image_data(&data)?;
        }
        Ok(out)
    }
}

impl Surface for PixelSurface {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn fill_pixel(&mut self, x: usize, y: usize, color: Rgb) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color;
        }
    }

    fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        (x < self.width && y < self.height).then(|| self.pixels[y * self.width + x])
    }
}

// ============================================================================
// Browser canvas surface
// ============================================================================

/// Last fill color set on a canvas context, so the CSS string is only built
/// when the color changes.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
#[derive(Debug, Default)]
struct FillStyle {
    current: Option<Rgb>,
}

#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
impl FillStyle {
    /// CSS to apply before drawing with `color`, or `None` if already set.
    fn update(&mut self, color: Rgb) -> Option<String> {
        if self.current == Some(color) {
            return None;
        }
        self.current = Some(color);
        Some(color.to_css())
    }
}

#[cfg(target_arch = "wasm32")]
mod canvas {
    use super::*;
    use web_sys::CanvasRenderingContext2d;

    /// Surface backed by a 2D canvas context.
    ///
    /// Image smoothing is switched off on construction so that readback
    /// returns the exact palette color that was written. The surface owns the
    /// context's fill style.
    pub struct CanvasSurface {
        ctx: CanvasRenderingContext2d,
        width: usize,
        height: usize,
        fill: FillStyle,
    }

    impl CanvasSurface {
        pub fn new(ctx: CanvasRenderingContext2d, width: usize, height: usize) -> Self {
            ctx.set_image_smoothing_enabled(false);
            Self {
                ctx,
                width,
                height,
                fill: FillStyle::default(),
            }
        }
    }

    impl Surface for CanvasSurface {
        fn width(&self) -> usize {
            self.width
        }

        fn height(&self) -> usize {
            self.height
        }

        fn fill_pixel(&mut self, x: usize, y: usize, color: Rgb) {
            if x >= self.width || y >= self.height {
                return;
            }
            if let Some(css) = self.fill.update(color) {
                self.ctx.set_fill_style_str(&css);
            }
            self.ctx.fill_rect(x as f64, y as f64, 1.0, 1.0);
        }

        fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
            if x >= self.width || y >= self.height {
                return None;
            }
            let image = self
                .ctx
                .get_image_data(x as f64, y as f64, 1.0, 1.0)
                .map_err(|e| log::warn!("Canvas readback failed: {:?}", e))
                .ok()?;
            let data = image.data();
            (data.len() >= 3).then(|| Rgb::new(data[0], data[1], data[2]))
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_and_read() {
        let mut surface = PixelSurface::new(4, 3);
        surface.fill_pixel(3, 2, Rgb::new(1, 2, 3));
        assert_eq!(surface.pixel(3, 2), Some(Rgb::new(1, 2, 3)));
        assert_eq!(surface.pixel(0, 0), Some(PixelSurface::BACKGROUND));
    }

    #[test]
    fn test_out_of_range_is_ignored() {
        let mut surface = PixelSurface::new(2, 2);
        surface.fill_pixel(2, 0, Rgb::new(9, 9, 9));
        assert_eq!(surface.pixel(2, 0), None);
        assert!(surface.pixels().iter().all(|p| *p == PixelSurface::BACKGROUND));
    }

    #[test]
    fn test_fill_style_only_changes_on_new_color() {
        let mut fill = FillStyle::default();
        assert_eq!(fill.update(Rgb::new(255, 0, 0)).as_deref(), Some("#ff0000"));
        assert_eq!(fill.update(Rgb::new(255, 0, 0)), None);
        assert_eq!(fill.update(Rgb::BLACK).as_deref(), Some("#000000"));
        assert_eq!(fill.update(Rgb::new(255, 0, 0)).as_deref(), Some("#ff0000"));
    }

    #[test]
    fn test_encode_png_signature() {
        let surface = PixelSurface::new(8, 8);
        let bytes = surface.encode_png().unwrap();
        assert_eq!(&bytes[..8], &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a]);
    }
}
