//! Page geometry in top-left page coordinates
//!
//! Callers describe regions the way a viewer shows them: origin at the
//! top-left corner of the visible page box, x to the right, y downward,
//! in points. PDF user space has its origin at the bottom-left, so every
//! drawing operation goes through [`PageBox`] before it reaches a content
//! stream.

use lopdf::{Document, Object, ObjectId};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in top-left page coordinates.
///
/// `x1 >= x0` and `y1 >= y0` are not enforced; a degenerate rectangle is
/// legal and simply covers nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).abs()
    }

    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).abs()
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0.0 || self.height() == 0.0
    }
}

/// Shift applied to the text anchor without moving the whiteout box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementOffset {
    pub off_x: f64,
    pub off_y: f64,
}

impl PlacementOffset {
    pub const ZERO: Self = Self {
        off_x: 0.0,
        off_y: 0.0,
    };

    pub const fn new(off_x: f64, off_y: f64) -> Self {
        Self { off_x, off_y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The visible box of a page in PDF user space, `[llx, lly, urx, ury]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl PageBox {
    /// US Letter, used when a page carries no usable box.
    pub const LETTER: Self = Self {
        llx: 0.0,
        lly: 0.0,
        urx: 612.0,
        ury: 792.0,
    };

    pub fn from_array(values: [f64; 4]) -> Self {
        let [a, b, c, d] = values;
        Self {
            llx: a.min(c),
            lly: b.min(d),
            urx: a.max(c),
            ury: b.max(d),
        }
    }

    /// Look up CropBox, then MediaBox, walking up the page tree.
    pub fn for_page(doc: &Document, page_id: ObjectId) -> Self {
        for key in [b"CropBox".as_slice(), b"MediaBox".as_slice()] {
            if let Some(values) = inherited_box(doc, page_id, key, 10) {
                return Self::from_array(values);
            }
        }
        Self::LETTER
    }

    pub fn width(&self) -> f64 {
        self.urx - self.llx
    }

    pub fn height(&self) -> f64 {
        self.ury - self.lly
    }

    /// Top-left page point to PDF user space.
    pub fn to_pdf(&self, point: Point) -> Point {
        Point::new(self.llx + point.x, self.ury - point.y)
    }

    /// `re` operands `(x, y, width, height)` for a top-left rectangle.
    pub fn to_pdf_rect(&self, rect: &Rect) -> (f64, f64, f64, f64) {
        let left = rect.x0.min(rect.x1);
        let bottom = rect.y0.max(rect.y1);
        let origin = self.to_pdf(Point::new(left, bottom));
        (origin.x, origin.y, rect.width(), rect.height())
    }
}

fn inherited_box(doc: &Document, node_id: ObjectId, key: &[u8], depth: usize) -> Option<[f64; 4]> {
    if depth == 0 {
        return None;
    }
    let dict = doc.get_dictionary(node_id).ok()?;

    if let Ok(obj) = dict.get(key) {
        let arr = match obj {
            Object::Array(arr) => Some(arr),
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(Object::Array(arr)) => Some(arr),
                _ => None,
            },
            _ => None,
        };
        if let Some(values) = arr.and_then(|a| numbers4(a)) {
            return Some(values);
        }
    }

    match dict.get(b"Parent") {
        Ok(Object::Reference(parent_id)) => inherited_box(doc, *parent_id, key, depth - 1),
        _ => None,
    }
}

fn numbers4(arr: &[Object]) -> Option<[f64; 4]> {
    if arr.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, obj) in out.iter_mut().zip(arr) {
        *slot = match obj {
            Object::Integer(i) => *i as f64,
            Object::Real(r) => *r as f64,
            _ => return None,
        };
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn test_y_axis_flip() {
        let page = PageBox::LETTER;
        let p = page.to_pdf(Point::new(100.0, 50.0));
        assert_eq!(p, Point::new(100.0, 742.0));
    }

    #[test]
    fn test_offset_box_origin() {
        let page = PageBox::from_array([10.0, 20.0, 610.0, 820.0]);
        let p = page.to_pdf(Point::new(0.0, 0.0));
        assert_eq!(p, Point::new(10.0, 820.0));
    }

    #[test]
    fn test_rect_uses_bottom_left_corner() {
        let page = PageBox::LETTER;
        let (x, y, w, h) = page.to_pdf_rect(&Rect::new(100.0, 50.0, 550.0, 150.0));
        assert_eq!((x, y, w, h), (100.0, 642.0, 450.0, 100.0));
    }

    #[test]
    fn test_inverted_rect_is_normalized() {
        let page = PageBox::LETTER;
        let a = page.to_pdf_rect(&Rect::new(550.0, 150.0, 100.0, 50.0));
        let b = page.to_pdf_rect(&Rect::new(100.0, 50.0, 550.0, 150.0));
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_area_rect_is_empty() {
        assert!(Rect::new(0.0, 0.0, 0.0, 0.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 100.0, 50.0).is_empty());
    }

    #[test]
    fn test_media_box_inherited_from_pages_node() {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 842.into(), 595.into()],
            }),
        );

        let page = PageBox::for_page(&doc, page_id);
        assert_eq!(page.width(), 842.0);
        assert_eq!(page.height(), 595.0);
    }

    #[test]
    fn test_crop_box_wins_over_media_box() {
        let mut doc = Document::with_version("1.7");
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "CropBox" => vec![36.into(), 36.into(), 576.into(), 756.into()],
        });
        let page = PageBox::for_page(&doc, page_id);
        assert_eq!(page.to_pdf(Point::new(0.0, 0.0)), Point::new(36.0, 756.0));
    }
}
