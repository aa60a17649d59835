//! Built-in layout presets
//!
//! The certificate templates come in two physical sizes, and the three
//! entry points that fill them were calibrated independently. Their
//! defaults disagree (a number is 188pt in one flow, 121pt in another,
//! 63pt in a third). Each flow keeps its own preset rather than sharing a
//! reconciled one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Rectangle used for a slot no preset knows about.
pub const INERT_RECT: Rect = Rect::new(0.0, 0.0, 100.0, 50.0);

const ZERO_RECT: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

/// The six named regions of a certificate template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    UpNumber,
    DownNumber,
    UpLeftDate,
    UpRightDate,
    DownLeftDate,
    DownRightDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotCategory {
    Number,
    Date,
}

impl Slot {
    pub const ALL: [Slot; 6] = [
        Slot::UpNumber,
        Slot::DownNumber,
        Slot::UpLeftDate,
        Slot::UpRightDate,
        Slot::DownLeftDate,
        Slot::DownRightDate,
    ];

    /// Form field prefix, e.g. `un` for `un_x0`.
    pub fn prefix(&self) -> &'static str {
        match self {
            Slot::UpNumber => "un",
            Slot::DownNumber => "dn",
            Slot::UpLeftDate => "ul",
            Slot::UpRightDate => "ur",
            Slot::DownLeftDate => "dl",
            Slot::DownRightDate => "dr",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.prefix() == prefix)
    }

    pub fn category(&self) -> SlotCategory {
        match self {
            Slot::UpNumber | Slot::DownNumber => SlotCategory::Number,
            _ => SlotCategory::Date,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Which certificate template is being filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    Big,
    Small,
}

impl TemplateKind {
    /// Anything other than `"big"` selects the small template.
    pub fn from_form(value: Option<&str>) -> Self {
        match value.unwrap_or("big") {
            "big" => TemplateKind::Big,
            _ => TemplateKind::Small,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Big => "big",
            TemplateKind::Small => "small",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            TemplateKind::Big => "big.pdf",
            TemplateKind::Small => "small.pdf",
        }
    }

    /// Slots that receive text on this template.
    pub fn active_slots(&self) -> &'static [Slot] {
        match self {
            TemplateKind::Big => &Slot::ALL,
            TemplateKind::Small => &[Slot::UpNumber, Slot::UpLeftDate, Slot::UpRightDate],
        }
    }

    pub fn calibration_preset(&self) -> &'static LayoutPreset {
        match self {
            TemplateKind::Big => &CALIBRATION_BIG,
            TemplateKind::Small => &CALIBRATION_SMALL,
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default rectangles and font sizes for one template flow.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPreset {
    pub name: &'static str,
    pub slots: [(Slot, Rect); 6],
    pub number_font_size: f64,
    pub date_font_size: f64,
}

impl LayoutPreset {
    pub fn rect(&self, slot: Slot) -> Rect {
        self.slots
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, r)| *r)
            .unwrap_or(INERT_RECT)
    }

    pub fn font_size(&self, category: SlotCategory) -> f64 {
        match category {
            SlotCategory::Number => self.number_font_size,
            SlotCategory::Date => self.date_font_size,
        }
    }
}

/// Calibration flow, big template.
pub static CALIBRATION_BIG: LayoutPreset = LayoutPreset {
    name: "calibration-big",
    slots: [
        (Slot::UpNumber, Rect::new(57.0, 31.0, 804.0, 203.0)),
        (Slot::DownNumber, Rect::new(57.0, 321.0, 804.0, 481.0)),
        (Slot::UpLeftDate, Rect::new(72.0, 225.0, 176.0, 259.0)),
        (Slot::UpRightDate, Rect::new(666.0, 225.0, 777.0, 259.0)),
        (Slot::DownLeftDate, Rect::new(72.0, 514.0, 176.0, 545.0)),
        (Slot::DownRightDate, Rect::new(666.0, 513.0, 777.0, 550.0)),
    ],
    number_font_size: 188.0,
    date_font_size: 31.0,
};

/// Calibration flow, small template. The lower half does not exist.
pub static CALIBRATION_SMALL: LayoutPreset = LayoutPreset {
    name: "calibration-small",
    slots: [
        (Slot::UpNumber, Rect::new(43.0, 115.0, 529.0, 219.0)),
        (Slot::DownNumber, ZERO_RECT),
        (Slot::UpLeftDate, Rect::new(46.0, 281.0, 151.0, 309.0)),
        (Slot::UpRightDate, Rect::new(431.0, 276.0, 538.0, 309.0)),
        (Slot::DownLeftDate, ZERO_RECT),
        (Slot::DownRightDate, ZERO_RECT),
    ],
    number_font_size: 121.0,
    date_font_size: 31.0,
};

/// Direct template download from the main form; every slot starts inert.
pub static DIRECT_TEMPLATE: LayoutPreset = LayoutPreset {
    name: "direct-template",
    slots: [
        (Slot::UpNumber, INERT_RECT),
        (Slot::DownNumber, INERT_RECT),
        (Slot::UpLeftDate, INERT_RECT),
        (Slot::UpRightDate, INERT_RECT),
        (Slot::DownLeftDate, INERT_RECT),
        (Slot::DownRightDate, INERT_RECT),
    ],
    number_font_size: 63.0,
    date_font_size: 10.0,
};

/// Defaults for the name/date edit of an uploaded document. Also the
/// fail-safe set when any submitted coordinate is malformed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeformPreset {
    pub name_rect: Rect,
    pub date_rect: Rect,
    pub name_font_size: f64,
    pub date_font_size: f64,
}

pub static FREEFORM: FreeformPreset = FreeformPreset {
    name_rect: Rect::new(100.0, 50.0, 550.0, 150.0),
    date_rect: Rect::new(250.0, 520.0, 500.0, 560.0),
    name_font_size: 14.0,
    date_font_size: 11.0,
};
