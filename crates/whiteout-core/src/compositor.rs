//! Whiteout-and-overlay compositing
//!
//! A region is composited in two steps: the rectangle is painted opaque
//! white (no stroke), then the text is drawn from the anchor chosen by the
//! [`BaselineMode`]. Text is left-aligned and never wrapped or clipped;
//! anything wider than the rectangle simply runs past `x1`.
//!
//! Blank text (after trimming) is a no-op. In particular the rectangle is
//! *not* erased, so submitting an empty field leaves the old content in
//! place.

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};
use crate::region::{BaselineMode, TextRegion, LINE_SPACING};

/// Fill color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    /// Dark navy used for name/date edits.
    pub const INK: Self = Self::new(20.0 / 255.0, 20.0 / 255.0, 60.0 / 255.0);

    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font_size: f64,
    pub color: Rgb,
}

/// Something a region can be composited onto.
///
/// Coordinates are top-left page coordinates; implementations convert to
/// whatever space the backing engine uses.
pub trait PageSurface {
    /// Paint `rect` opaque white with no stroke.
    fn whiteout(&mut self, rect: Rect);

    /// Draw one line of text with its baseline starting at `at`.
    fn draw_text(&mut self, at: Point, line: &str, style: &TextStyle);
}

/// Composite one region. Returns the number of text runs drawn.
pub fn composite<S: PageSurface + ?Sized>(
    surface: &mut S,
    region: &TextRegion,
    mode: BaselineMode,
    color: Rgb,
) -> usize {
    if region.is_blank() {
        return 0;
    }

    surface.whiteout(region.rect);

    let style = TextStyle {
        font_size: region.font_size,
        color,
    };
    let anchor = mode.anchor(&region.rect, &region.offset, region.font_size);

    if !region.multiline {
        surface.draw_text(anchor, &region.text, &style);
        return 1;
    }

    let line_height = region.font_size * LINE_SPACING;
    let mut drawn = 0;
    for (i, line) in region.text.split('\n').enumerate() {
        // Browsers submit textarea newlines as CRLF
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            continue;
        }
        let at = Point::new(anchor.x, anchor.y + i as f64 * line_height);
        surface.draw_text(at, line, &style);
        drawn += 1;
    }
    drawn
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::geometry::PlacementOffset;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Draw {
        Whiteout(Rect),
        Text { at: Point, line: String, size: f64, color: Rgb },
    }

    #[derive(Default)]
    pub(crate) struct RecordingSurface {
        pub draws: Vec<Draw>,
    }

    impl PageSurface for RecordingSurface {
        fn whiteout(&mut self, rect: Rect) {
            self.draws.push(Draw::Whiteout(rect));
        }

        fn draw_text(&mut self, at: Point, line: &str, style: &TextStyle) {
            self.draws.push(Draw::Text {
                at,
                line: line.to_string(),
                size: style.font_size,
                color: style.color,
            });
        }
    }

    fn text_ys(draws: &[Draw]) -> Vec<f64> {
        draws
            .iter()
            .filter_map(|d| match d {
                Draw::Text { at, .. } => Some(at.y),
                _ => None,
            })
            .collect()
    }

    const NAME_RECT: Rect = Rect::new(100.0, 50.0, 550.0, 150.0);

    #[test]
    fn test_blank_text_draws_nothing() {
        let mut surface = RecordingSurface::default();
        let region = TextRegion::new(NAME_RECT, PlacementOffset::ZERO, 14.0, "   ");
        let drawn = composite(&mut surface, &region, BaselineMode::FREEFORM, Rgb::INK);
        assert_eq!(drawn, 0);
        assert!(surface.draws.is_empty(), "blank text must not erase the region");
    }

    #[test]
    fn test_whiteout_precedes_text() {
        let mut surface = RecordingSurface::default();
        let region = TextRegion::new(NAME_RECT, PlacementOffset::ZERO, 14.0, "Jens Hansen");
        composite(&mut surface, &region, BaselineMode::FREEFORM, Rgb::INK);

        assert_eq!(surface.draws.len(), 2);
        assert_eq!(surface.draws[0], Draw::Whiteout(NAME_RECT));
        assert!(matches!(surface.draws[1], Draw::Text { .. }));
    }

    #[test]
    fn test_three_line_name_steps_by_line_height() {
        let mut surface = RecordingSurface::default();
        let region = TextRegion::new(
            NAME_RECT,
            PlacementOffset::ZERO,
            14.0,
            "Line one\nLine two\nLine three",
        )
        .multiline();
        let drawn = composite(&mut surface, &region, BaselineMode::FREEFORM, Rgb::INK);

        assert_eq!(drawn, 3);
        let ys = text_ys(&surface.draws);
        assert_eq!(ys.len(), 3);
        assert!((ys[1] - ys[0] - 14.0 * 1.2).abs() < 1e-9);
        assert!((ys[2] - ys[1] - 14.0 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_blank_line_advances_without_drawing() {
        let mut surface = RecordingSurface::default();
        let region =
            TextRegion::new(NAME_RECT, PlacementOffset::ZERO, 10.0, "first\n\nthird").multiline();
        let drawn = composite(&mut surface, &region, BaselineMode::FREEFORM, Rgb::INK);

        assert_eq!(drawn, 2);
        let ys = text_ys(&surface.draws);
        assert!((ys[1] - ys[0] - 2.0 * 10.0 * 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_crlf_lines_are_trimmed() {
        let mut surface = RecordingSurface::default();
        let region = TextRegion::new(NAME_RECT, PlacementOffset::ZERO, 10.0, "a\r\nb").multiline();
        composite(&mut surface, &region, BaselineMode::FREEFORM, Rgb::INK);

        let lines: Vec<_> = surface
            .draws
            .iter()
            .filter_map(|d| match d {
                Draw::Text { line, .. } => Some(line.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_single_line_region_ignores_newlines() {
        let mut surface = RecordingSurface::default();
        let region =
            TextRegion::new(NAME_RECT, PlacementOffset::ZERO, 11.0, "01-01-2025\n02-01-2025");
        let drawn = composite(&mut surface, &region, BaselineMode::FREEFORM, Rgb::INK);
        assert_eq!(drawn, 1);
    }

    #[test]
    fn test_top_aligned_text_position() {
        let mut surface = RecordingSurface::default();
        let rect = Rect::new(72.0, 225.0, 176.0, 259.0);
        let region = TextRegion::new(rect, PlacementOffset::new(2.0, 1.0), 31.0, "20-12-2025");
        composite(&mut surface, &region, BaselineMode::TopAligned, Rgb::BLACK);

        match &surface.draws[1] {
            Draw::Text { at, size, color, .. } => {
                assert_eq!(at.x, 74.0);
                assert!((at.y - (226.0 + 31.0 * 0.8)).abs() < 1e-9);
                assert_eq!(*size, 31.0);
                assert_eq!(*color, Rgb::BLACK);
            }
            other => panic!("expected text draw, got {:?}", other),
        }
    }

    #[test]
    fn test_text_wider_than_rect_is_not_wrapped() {
        let mut surface = RecordingSurface::default();
        let rect = Rect::new(0.0, 0.0, 10.0, 10.0);
        let long = "x".repeat(500);
        let region = TextRegion::new(rect, PlacementOffset::ZERO, 12.0, long.clone());
        composite(&mut surface, &region, BaselineMode::TEMPLATE, Rgb::BLACK);
        assert!(matches!(&surface.draws[1], Draw::Text { line, .. } if *line == long));
    }
}

#[cfg(test)]
mod proptests {
    use super::tests::{Draw, RecordingSurface};
    use super::*;
    use crate::geometry::PlacementOffset;
    use proptest::prelude::*;

    fn any_rect() -> impl Strategy<Value = Rect> {
        (0.0f64..800.0, 0.0f64..800.0, 0.0f64..800.0, 0.0f64..800.0)
            .prop_map(|(x0, y0, x1, y1)| Rect::new(x0, y0, x1, y1))
    }

    proptest! {
        #[test]
        fn whitespace_never_touches_surface(
            rect in any_rect(),
            ws in "[ \t\n\r]{0,12}",
            size in 1.0f64..200.0,
        ) {
            let mut surface = RecordingSurface::default();
            let region = TextRegion::new(rect, PlacementOffset::ZERO, size, ws).multiline();
            prop_assert_eq!(composite(&mut surface, &region, BaselineMode::FREEFORM, Rgb::INK), 0);
            prop_assert!(surface.draws.is_empty());
        }

        #[test]
        fn nonblank_text_always_erases_first(
            rect in any_rect(),
            text in "[A-Za-z0-9]{1,20}",
            size in 1.0f64..200.0,
        ) {
            let mut surface = RecordingSurface::default();
            let region = TextRegion::new(rect, PlacementOffset::ZERO, size, text);
            composite(&mut surface, &region, BaselineMode::TopAligned, Rgb::BLACK);
            prop_assert_eq!(&surface.draws[0], &Draw::Whiteout(rect));
        }

        #[test]
        fn line_spacing_is_exact(
            lines in proptest::collection::vec("[a-z]{1,8}", 2..6),
            size in 1.0f64..100.0,
        ) {
            let mut surface = RecordingSurface::default();
            let rect = Rect::new(0.0, 0.0, 100.0, 100.0);
            let region =
                TextRegion::new(rect, PlacementOffset::ZERO, size, lines.join("\n")).multiline();
            composite(&mut surface, &region, BaselineMode::FREEFORM, Rgb::INK);
            let ys: Vec<f64> = surface.draws.iter().filter_map(|d| match d {
                Draw::Text { at, .. } => Some(at.y),
                _ => None,
            }).collect();
            prop_assert_eq!(ys.len(), lines.len());
            for pair in ys.windows(2) {
                prop_assert!((pair[1] - pair[0] - size * 1.2).abs() < 1e-6);
            }
        }
    }
}
