//! First-page rasterization for previews
//!
//! Rendering is delegated to PDFium through [`PageRasterizer`], so callers
//! (and tests) can swap in another backend. Pages are rendered at one pixel
//! per point, which makes the image size equal to the page size in points
//! and lets the calibration UI map clicks straight to coordinates.

use std::path::PathBuf;

use base64::Engine;
use pdfium_render::prelude::*;
use tracing::debug;

use crate::error::{Result, WhiteoutError};

/// A rendered page as PNG plus the page size in points.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub png: Vec<u8>,
    pub width: f64,
    pub height: f64,
}

impl RenderedPage {
    pub fn png_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.png)
    }
}

pub trait PageRasterizer: Send + Sync {
    /// Render page 1 of `bytes`. A document without pages is an error.
    fn render_first_page(&self, bytes: &[u8]) -> Result<RenderedPage>;
}

/// PDFium-backed rasterizer.
///
/// The library is bound on every call rather than held, since a bound
/// `Pdfium` is not `Send`. With a `library_dir` the platform library in that
/// directory is tried first, then the system library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumRasterizer {
    library_dir: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new(library_dir: Option<PathBuf>) -> Self {
        Self { library_dir }
    }

    fn bind(&self) -> Result<Pdfium> {
        let local = self.library_dir.as_ref().map(|dir| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
        });
        let bindings = match local {
            Some(Ok(bindings)) => bindings,
            Some(Err(e)) => {
                debug!("PDFium not found in configured directory ({}); trying system", e);
                Pdfium::bind_to_system_library().map_err(raster_error)?
            }
            None => Pdfium::bind_to_system_library().map_err(raster_error)?,
        };
        Ok(Pdfium::new(bindings))
    }
}

fn raster_error(e: PdfiumError) -> WhiteoutError {
    WhiteoutError::RasterError(e.to_string())
}

impl PageRasterizer for PdfiumRasterizer {
    fn render_first_page(&self, bytes: &[u8]) -> Result<RenderedPage> {
        let pdfium = self.bind()?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| WhiteoutError::ParseError(e.to_string()))?;
        let page = document
            .pages()
            .get(0)
            .map_err(|_| WhiteoutError::EmptyDocument)?;

        let width = page.width().value as f64;
        let height = page.height().value as f64;

        let bitmap = page
            .render_with_config(&PdfRenderConfig::new().scale_page_by_factor(1.0))
            .map_err(raster_error)?;
        let png = encode_png(
            bitmap.width() as u32,
            bitmap.height() as u32,
            &bitmap.as_rgba_bytes(),
        )?;
        debug!("Rendered {}x{} pt page to {} PNG bytes", width, height, png.len());

        Ok(RenderedPage { png, width, height })
    }
}

/// Encode 8-bit RGBA pixels as PNG.
pub fn encode_png(width: u32, height: u32, rgba: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| WhiteoutError::RasterError(format!("PNG header: {}", e)))?;
        writer
            .write_image_data(rgba)
            .map_err(|e| WhiteoutError::RasterError(format!("PNG data: {}", e)))?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_encode_png_signature_and_size() {
        let pixels = vec![255u8; 4 * 3 * 2];
        let png = encode_png(3, 2, &pixels).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);

        let decoder = png::Decoder::new(png.as_slice());
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, 3);
        assert_eq!(reader.info().height, 2);
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        assert!(matches!(
            encode_png(10, 10, &[0u8; 4]),
            Err(WhiteoutError::RasterError(_))
        ));
    }

    #[test]
    fn test_png_base64() {
        let page = RenderedPage {
            png: b"abc".to_vec(),
            width: 612.0,
            height: 792.0,
        };
        assert_eq!(page.png_base64(), "YWJj");
    }

    #[test]
    fn test_missing_library_dir_is_a_raster_error() {
        let rasterizer = PdfiumRasterizer::new(Some(PathBuf::from("/nonexistent/pdfium")));
        // Only meaningful where no system PDFium is installed either
        if let Err(e) = rasterizer.bind() {
            assert!(matches!(e, WhiteoutError::RasterError(_)));
        }
    }
}
