//! Overlay fonts
//!
//! Text is written with a simple (single-byte) font using
//! `WinAnsiEncoding`, which covers Latin-1 and therefore the Danish
//! letters the certificates use. A TrueType file is embedded whole when
//! one is configured; otherwise the standard Helvetica is referenced and
//! left for the viewer to supply.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use tracing::{info, warn};
use ttf_parser::Face;

use crate::error::{Result, WhiteoutError};

const FIRST_CHAR: u8 = 32;
const LAST_CHAR: u8 = 255;

/// Code points for WinAnsi bytes 0x80..=0x9F. `None` marks unused codes.
const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'),
    None,
    Some('\u{201A}'),
    Some('\u{0192}'),
    Some('\u{201E}'),
    Some('\u{2026}'),
    Some('\u{2020}'),
    Some('\u{2021}'),
    Some('\u{02C6}'),
    Some('\u{2030}'),
    Some('\u{0160}'),
    Some('\u{2039}'),
    Some('\u{0152}'),
    None,
    Some('\u{017D}'),
    None,
    None,
    Some('\u{2018}'),
    Some('\u{2019}'),
    Some('\u{201C}'),
    Some('\u{201D}'),
    Some('\u{2022}'),
    Some('\u{2013}'),
    Some('\u{2014}'),
    Some('\u{02DC}'),
    Some('\u{2122}'),
    Some('\u{0161}'),
    Some('\u{203A}'),
    Some('\u{0153}'),
    None,
    Some('\u{017E}'),
    Some('\u{0178}'),
];

/// Encode text as WinAnsi bytes. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let cp = c as u32;
            match cp {
                0x20..=0x7E | 0xA0..=0xFF => cp as u8,
                _ => WIN_ANSI_HIGH
                    .iter()
                    .position(|&m| m == Some(c))
                    .map(|i| 0x80 + i as u8)
                    .unwrap_or(b'?'),
            }
        })
        .collect()
}

/// Character for a WinAnsi byte, if the code is assigned.
fn decode_win_ansi(byte: u8) -> Option<char> {
    match byte {
        0x20..=0x7E | 0xA0..=0xFF => Some(byte as char),
        0x80..=0x9F => WIN_ANSI_HIGH[(byte - 0x80) as usize],
        _ => None,
    }
}

/// Metrics needed for the font dictionary and descriptor, in 1/1000 em.
#[derive(Debug, Clone)]
struct TrueTypeMetrics {
    base_font: String,
    widths: Vec<i64>,
    bbox: [i64; 4],
    ascent: i64,
    descent: i64,
    cap_height: i64,
    italic_angle: f32,
}

impl TrueTypeMetrics {
    fn read(data: &[u8]) -> Result<Self> {
        let face = Face::parse(data, 0)
            .map_err(|e| WhiteoutError::ParseError(format!("Font parse failed: {}", e)))?;

        let upem = face.units_per_em().max(1) as i64;
        let scale = |v: i64| v * 1000 / upem;

        let widths = (FIRST_CHAR..=LAST_CHAR)
            .map(|code| {
                decode_win_ansi(code)
                    .and_then(|c| face.glyph_index(c))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| scale(adv as i64))
                    .unwrap_or(0)
            })
            .collect();

        let bb = face.global_bounding_box();
        let base_font = face
            .names()
            .into_iter()
            .find(|name| name.name_id == ttf_parser::name_id::POST_SCRIPT_NAME)
            .and_then(|name| name.to_string())
            .map(|name| sanitize_font_name(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "EmbeddedFont".to_string());

        Ok(Self {
            base_font,
            widths,
            bbox: [
                scale(bb.x_min as i64),
                scale(bb.y_min as i64),
                scale(bb.x_max as i64),
                scale(bb.y_max as i64),
            ],
            ascent: scale(face.ascender() as i64),
            descent: scale(face.descender() as i64),
            cap_height: scale(face.capital_height().unwrap_or(face.ascender()) as i64),
            italic_angle: face.italic_angle().unwrap_or(0.0),
        })
    }
}

fn sanitize_font_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_graphic() && !"()<>[]{}/%#".contains(*c))
        .collect()
}

/// A parsed TrueType program ready to embed.
#[derive(Debug)]
pub struct EmbeddedFont {
    data: Vec<u8>,
    metrics: TrueTypeMetrics,
}

/// Font used to draw overlay text.
#[derive(Debug, Clone, Default)]
pub enum OverlayFont {
    /// Standard-14 Helvetica, not embedded.
    #[default]
    Builtin,
    /// A TrueType program embedded in full.
    Embedded(Arc<EmbeddedFont>),
}

impl OverlayFont {
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let metrics = TrueTypeMetrics::read(&data)?;
        Ok(OverlayFont::Embedded(Arc::new(EmbeddedFont { data, metrics })))
    }

    /// Load a TrueType file, quietly using Helvetica if it is missing or
    /// unreadable.
    pub fn load_or_builtin(path: &Path) -> Self {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                warn!("Font {} unavailable ({}); using Helvetica", path.display(), e);
                return OverlayFont::Builtin;
            }
        };
        match Self::from_bytes(data) {
            Ok(font) => {
                info!("Loaded font {} ({})", path.display(), font.base_font());
                font
            }
            Err(e) => {
                warn!("Font {} rejected ({}); using Helvetica", path.display(), e);
                OverlayFont::Builtin
            }
        }
    }

    pub fn base_font(&self) -> &str {
        match self {
            OverlayFont::Builtin => "Helvetica",
            OverlayFont::Embedded(font) => &font.metrics.base_font,
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, OverlayFont::Embedded(_))
    }

    /// Add the font objects to `doc` and return the font dictionary's id.
    pub fn add_to_document(&self, doc: &mut Document) -> Result<ObjectId> {
        let font_dict = match self {
            OverlayFont::Builtin => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            },
            OverlayFont::Embedded(font) => {
                let m = &font.metrics;
                let file_id = doc.add_object(compressed_font_file(&font.data)?);
                let descriptor_id = doc.add_object(dictionary! {
                    "Type" => "FontDescriptor",
                    "FontName" => Object::Name(m.base_font.clone().into_bytes()),
                    // Nonsymbolic
                    "Flags" => 32,
                    "FontBBox" => m.bbox.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
                    "ItalicAngle" => Object::Real(m.italic_angle),
                    "Ascent" => m.ascent,
                    "Descent" => m.descent,
                    "CapHeight" => m.cap_height,
                    "StemV" => 80,
                    "FontFile2" => Object::Reference(file_id),
                });
                dictionary! {
                    "Type" => "Font",
                    "Subtype" => "TrueType",
                    "BaseFont" => Object::Name(m.base_font.clone().into_bytes()),
                    "FirstChar" => FIRST_CHAR as i64,
                    "LastChar" => LAST_CHAR as i64,
                    "Widths" => m.widths.iter().map(|w| Object::Integer(*w)).collect::<Vec<_>>(),
                    "Encoding" => "WinAnsiEncoding",
                    "FontDescriptor" => Object::Reference(descriptor_id),
                }
            }
        };
        Ok(doc.add_object(font_dict))
    }
}

fn compressed_font_file(data: &[u8]) -> Result<Stream> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map(|compressed| {
            let mut dict = Dictionary::new();
            dict.set("Length1", Object::Integer(data.len() as i64));
            dict.set("Filter", Object::Name(b"FlateDecode".to_vec()));
            Stream::new(dict, compressed).with_compression(false)
        })
        .map_err(|e| WhiteoutError::SerializationError(format!("Font compression failed: {}", e)))
}
