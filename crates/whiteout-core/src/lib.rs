//! Whiteout-and-overlay edits of single-page PDFs
//!
//! The core operation is [`composite`]: paint a rectangle white, then draw
//! text anchored to its top edge. Around it sit:
//! - `preset` / `resolve`: per-flow default layouts and the merging of
//!   submitted coordinate overrides, including the fallback on bad input
//! - `surface`: the lopdf-backed page that records and writes the overlay
//! - `extract`: best-effort plate number and date range from document text
//! - `raster`: first-page PNG previews through PDFium
//! - `workflow`: the freeform, calibration and direct-template flows

pub mod compositor;
pub mod error;
pub mod extract;
pub mod font;
pub mod geometry;
pub mod preset;
pub mod raster;
pub mod region;
pub mod resolve;
pub mod surface;
pub mod workflow;

pub use compositor::{composite, PageSurface, Rgb, TextStyle};
pub use error::{Result, WhiteoutError};
pub use extract::{extract_fields, extract_fields_from_pdf, ExtractedFields};
pub use font::OverlayFont;
pub use geometry::{PageBox, PlacementOffset, Point, Rect};
pub use preset::{LayoutPreset, Slot, TemplateKind};
pub use raster::{PageRasterizer, PdfiumRasterizer, RenderedPage};
pub use region::{BaselineMode, TextRegion};
pub use resolve::{FormValues, MalformedOverride, Resolution, ZeroPolicy};
pub use surface::OverlayDocument;
pub use workflow::{
    apply_freeform, fill_direct_template, generate_template, DirectTemplateFill, FreeformEdit,
    TemplateFill,
};
