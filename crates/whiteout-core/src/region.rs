//! Text regions and the two vertical anchoring rules

use serde::{Deserialize, Serialize};

use crate::geometry::{PlacementOffset, Point, Rect};

/// Line advance as a multiple of the font size.
pub const LINE_SPACING: f64 = 1.2;

/// Where glyph tops sit relative to the baseline, as a fraction of size.
const TOP_ALIGN_FACTOR: f64 = 0.8;

/// How the first baseline is derived from a region's top edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BaselineMode {
    /// Visual top of the glyphs lands on `y0`.
    TopAligned,
    /// Baseline one font size (plus `drop`) below `y0`, indented by `inset_x`.
    Baseline { inset_x: f64, drop: f64 },
}

impl BaselineMode {
    /// Name/date edits of uploaded documents.
    pub const FREEFORM: Self = Self::Baseline {
        inset_x: 5.0,
        drop: 2.0,
    };

    /// Direct template download from the main form.
    pub const TEMPLATE: Self = Self::Baseline {
        inset_x: 0.0,
        drop: 0.0,
    };

    /// Anchor of the first line.
    pub fn anchor(&self, rect: &Rect, offset: &PlacementOffset, font_size: f64) -> Point {
        match *self {
            BaselineMode::TopAligned => Point::new(
                rect.x0 + offset.off_x,
                rect.y0 + offset.off_y + font_size * TOP_ALIGN_FACTOR,
            ),
            BaselineMode::Baseline { inset_x, drop } => Point::new(
                rect.x0 + offset.off_x + inset_x,
                rect.y0 + offset.off_y + font_size + drop,
            ),
        }
    }
}

/// One named slot, fully resolved and ready to composite.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub rect: Rect,
    pub offset: PlacementOffset,
    pub font_size: f64,
    pub text: String,
    /// Split on `\n` and stack lines; otherwise the text is drawn as one run.
    pub multiline: bool,
}

impl TextRegion {
    pub fn new(
        rect: Rect,
        offset: PlacementOffset,
        font_size: f64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            rect,
            offset,
            font_size,
            text: text.into(),
            multiline: false,
        }
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_aligned_anchor() {
        let rect = Rect::new(57.0, 31.0, 804.0, 203.0);
        let p = BaselineMode::TopAligned.anchor(&rect, &PlacementOffset::ZERO, 188.0);
        assert_eq!(p.x, 57.0);
        assert!((p.y - (31.0 + 188.0 * 0.8)).abs() < 1e-9);
    }

    #[test]
    fn test_freeform_anchor_has_inset_and_drop() {
        let rect = Rect::new(100.0, 50.0, 550.0, 150.0);
        let offset = PlacementOffset::new(3.0, -4.0);
        let p = BaselineMode::FREEFORM.anchor(&rect, &offset, 14.0);
        assert_eq!(p, Point::new(108.0, 62.0));
    }

    #[test]
    fn test_template_anchor_is_plain_baseline() {
        let rect = Rect::new(10.0, 20.0, 110.0, 70.0);
        let p = BaselineMode::TEMPLATE.anchor(&rect, &PlacementOffset::ZERO, 63.0);
        assert_eq!(p, Point::new(10.0, 83.0));
    }

    #[test]
    fn test_whitespace_text_is_blank() {
        let rect = Rect::new(0.0, 0.0, 1.0, 1.0);
        let region = TextRegion::new(rect, PlacementOffset::ZERO, 10.0, " \n\t");
        assert!(region.is_blank());
    }
}
