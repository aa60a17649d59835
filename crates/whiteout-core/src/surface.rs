//! lopdf-backed page surface
//!
//! [`OverlayDocument`] opens a PDF, targets its first page and records
//! whiteouts and text runs as content-stream operations. Nothing touches
//! the document until [`OverlayDocument::save`]; a document with no
//! recorded operations is saved exactly as lopdf would save it untouched.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::debug;

use crate::compositor::{PageSurface, Rgb, TextStyle};
use crate::error::{Result, WhiteoutError};
use crate::font::{encode_win_ansi, OverlayFont};
use crate::geometry::{PageBox, Point, Rect};

/// Placeholder until the font resource name is chosen at save time.
const FONT_PLACEHOLDER: &[u8] = b"__overlay_font__";

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn fill_color(color: Rgb) -> Operation {
    Operation::new("rg", vec![real(color.r), real(color.g), real(color.b)])
}

/// Load and save with no edits.
pub fn resave(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(bytes).map_err(|e| WhiteoutError::ParseError(e.to_string()))?;
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| WhiteoutError::SerializationError(e.to_string()))?;
    Ok(output)
}

/// First page of a loaded document, plus pending overlay operations.
pub struct OverlayDocument {
    doc: Document,
    page_id: ObjectId,
    page_box: PageBox,
    operations: Vec<Operation>,
}

impl OverlayDocument {
    pub fn open(bytes: &[u8]) -> Result<Self> {
        let doc = Document::load_mem(bytes).map_err(|e| WhiteoutError::ParseError(e.to_string()))?;
        Self::from_document(doc)
    }

    pub fn from_document(doc: Document) -> Result<Self> {
        let page_id = *doc
            .get_pages()
            .get(&1)
            .ok_or(WhiteoutError::EmptyDocument)?;
        let page_box = PageBox::for_page(&doc, page_id);
        Ok(Self {
            doc,
            page_id,
            page_box,
            operations: Vec::new(),
        })
    }

    pub fn has_pending(&self) -> bool {
        !self.operations.is_empty()
    }

    /// Write pending operations into page 1 and serialize.
    pub fn save(mut self, font: &OverlayFont) -> Result<Vec<u8>> {
        if self.has_pending() {
            self.flush(font)?;
        }

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| WhiteoutError::SerializationError(e.to_string()))?;
        Ok(output)
    }

    fn flush(&mut self, font: &OverlayFont) -> Result<()> {
        let font_id = font.add_to_document(&mut self.doc)?;
        let font_name = register_font(&mut self.doc, self.page_id, font_id)?;
        debug!(
            "Writing {} overlay operations with font /{}",
            self.operations.len(),
            String::from_utf8_lossy(&font_name)
        );

        let mut operations = vec![Operation::new("Q", vec![]), Operation::new("q", vec![])];
        operations.extend(self.operations.drain(..).map(|mut op| {
            if op.operator == "Tf" {
                if let Some(Object::Name(name)) = op.operands.first_mut() {
                    if name.as_slice() == FONT_PLACEHOLDER {
                        *name = font_name.clone();
                    }
                }
            }
            op
        }));
        operations.push(Operation::new("Q", vec![]));

        let overlay = Content { operations }
            .encode()
            .map_err(|e| WhiteoutError::OperationError(e.to_string()))?;

        // Existing content runs inside q ... Q so a stray CTM or color
        // cannot leak into the overlay.
        let prefix_id = self.doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        // Leading newline keeps the previous stream's last token from
        // fusing with the opening Q when streams are concatenated.
        let overlay = [b"\n".as_slice(), &overlay].concat();
        let overlay_id = self.doc.add_object(Stream::new(Dictionary::new(), overlay));
        wrap_page_contents(&mut self.doc, self.page_id, prefix_id, overlay_id)
    }
}

impl PageSurface for OverlayDocument {
    fn whiteout(&mut self, rect: Rect) {
        let (x, y, w, h) = self.page_box.to_pdf_rect(&rect);
        self.operations.extend([
            Operation::new("q", vec![]),
            fill_color(Rgb::WHITE),
            Operation::new("re", vec![real(x), real(y), real(w), real(h)]),
            Operation::new("f", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn draw_text(&mut self, at: Point, line: &str, style: &TextStyle) {
        let origin = self.page_box.to_pdf(at);
        self.operations.extend([
            Operation::new("BT", vec![]),
            fill_color(style.color),
            Operation::new("Tr", vec![Object::Integer(0)]),
            Operation::new(
                "Tf",
                vec![Object::Name(FONT_PLACEHOLDER.to_vec()), real(style.font_size)],
            ),
            Operation::new("Td", vec![real(origin.x), real(origin.y)]),
            Operation::new(
                "Tj",
                vec![Object::String(encode_win_ansi(line), StringFormat::Hexadecimal)],
            ),
            Operation::new("ET", vec![]),
        ]);
    }
}

/// Resolve a dictionary entry that may be inline or indirect.
fn resolved_dict(doc: &Document, obj: &Object) -> Option<Dictionary> {
    match obj {
        Object::Dictionary(dict) => Some(dict.clone()),
        Object::Reference(id) => doc.get_dictionary(*id).ok().cloned(),
        _ => None,
    }
}

/// Page resources, following inheritance through the page tree.
fn page_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut node = Some(page_id);
    for _ in 0..10 {
        let Some(id) = node else { break };
        let Ok(dict) = doc.get_dictionary(id) else { break };
        if let Some(resources) = dict.get(b"Resources").ok().and_then(|r| resolved_dict(doc, r)) {
            return resources;
        }
        node = match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => Some(*parent),
            _ => None,
        };
    }
    Dictionary::new()
}

/// Add the font to page 1's resources under a fresh name and return it.
///
/// The page gets its own inline copy of the resource dictionary so shared
/// or inherited resources of other pages are left alone.
fn register_font(doc: &mut Document, page_id: ObjectId, font_id: ObjectId) -> Result<Vec<u8>> {
    let mut resources = page_resources(doc, page_id);
    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|f| resolved_dict(doc, f))
        .unwrap_or_default();

    let name = (0..)
        .map(|i| format!("WoF{}", i).into_bytes())
        .find(|candidate| !fonts.has(candidate))
        .unwrap_or_else(|| b"WoF".to_vec());

    fonts.set(name.clone(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| WhiteoutError::OperationError(e.to_string()))?;
    page.set("Resources", Object::Dictionary(resources));
    Ok(name)
}

fn wrap_page_contents(
    doc: &mut Document,
    page_id: ObjectId,
    prefix_id: ObjectId,
    overlay_id: ObjectId,
) -> Result<()> {
    let existing = doc
        .get_dictionary(page_id)
        .map_err(|e| WhiteoutError::OperationError(e.to_string()))?
        .get(b"Contents")
        .ok()
        .cloned();

    let mut contents = vec![Object::Reference(prefix_id)];
    match existing {
        Some(Object::Reference(id)) => {
            // A reference may point at an array of streams
            match doc.get_object(id) {
                Ok(Object::Array(arr)) => contents.extend(arr.iter().cloned()),
                _ => contents.push(Object::Reference(id)),
            }
        }
        Some(Object::Array(arr)) => contents.extend(arr),
        _ => {}
    }
    contents.push(Object::Reference(overlay_id));

    let page = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| WhiteoutError::OperationError(e.to_string()))?;
    page.set("Contents", Object::Array(contents));
    Ok(())
}
