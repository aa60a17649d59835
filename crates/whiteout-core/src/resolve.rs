//! Merging submitted overrides with preset defaults
//!
//! Overrides arrive as raw form strings. They are parsed up front into
//! `Option<f64>` so a malformed value is an explicit error rather than
//! something discovered halfway through drawing. What happens on error is
//! decided by the caller through [`with_fallback`].

use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use crate::geometry::{PlacementOffset, Rect};
use crate::preset::{LayoutPreset, Slot, SlotCategory, INERT_RECT};
use crate::region::TextRegion;

/// Submitted form fields by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormValues(HashMap<String, String>);

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Field value, or `""` when absent.
    pub fn text(&self, key: &str) -> String {
        self.get(key).unwrap_or_default().to_string()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormValues {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl From<HashMap<String, String>> for FormValues {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("Field '{field}' is not a number: {value:?}")]
pub struct MalformedOverride {
    pub field: String,
    pub value: String,
}

/// Parse one numeric field. Absent and whitespace-only fields are `None`.
pub fn parse_override(form: &FormValues, key: &str) -> Result<Option<f64>, MalformedOverride> {
    let Some(raw) = form.get(key) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| MalformedOverride {
            field: key.to_string(),
            value: raw.to_string(),
        })
}

/// How an explicitly submitted `0` is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroPolicy {
    /// `0` means "not supplied" and the preset value is used. A caller of
    /// this flow cannot ask for coordinate 0 or size 0.
    ZeroMeansUnset,
    /// `0` is taken at face value.
    Literal,
}

impl ZeroPolicy {
    pub fn pick(self, submitted: Option<f64>, default: f64) -> f64 {
        match (self, submitted) {
            (ZeroPolicy::ZeroMeansUnset, Some(v)) if v == 0.0 => default,
            (_, Some(v)) => v,
            (_, None) => default,
        }
    }
}

/// Parsed coordinate overrides for one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlotOverrides {
    pub x0: Option<f64>,
    pub y0: Option<f64>,
    pub x1: Option<f64>,
    pub y1: Option<f64>,
    pub off_x: Option<f64>,
    pub off_y: Option<f64>,
}

impl SlotOverrides {
    /// Read `{key}_x0` … `{key}_off_y`.
    pub fn from_form(form: &FormValues, key: &str) -> Result<Self, MalformedOverride> {
        let field = |suffix: &str| parse_override(form, &format!("{}_{}", key, suffix));
        Ok(Self {
            x0: field("x0")?,
            y0: field("y0")?,
            x1: field("x1")?,
            y1: field("y1")?,
            off_x: field("off_x")?,
            off_y: field("off_y")?,
        })
    }
}

/// Rectangle and offset for a slot after merging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotPlacement {
    pub rect: Rect,
    pub offset: PlacementOffset,
}

impl SlotPlacement {
    pub fn from_defaults(rect: Rect) -> Self {
        Self {
            rect,
            offset: PlacementOffset::ZERO,
        }
    }

    pub fn into_region(self, font_size: f64, text: impl Into<String>) -> TextRegion {
        TextRegion::new(self.rect, self.offset, font_size, text)
    }
}

/// Merge overrides onto a default rectangle. Offsets have no preset and
/// default to zero under either policy.
pub fn merge_placement(
    default: Rect,
    overrides: &SlotOverrides,
    policy: ZeroPolicy,
) -> SlotPlacement {
    SlotPlacement {
        rect: Rect::new(
            policy.pick(overrides.x0, default.x0),
            policy.pick(overrides.y0, default.y0),
            policy.pick(overrides.x1, default.x1),
            policy.pick(overrides.y1, default.y1),
        ),
        offset: PlacementOffset::new(
            overrides.off_x.unwrap_or(0.0),
            overrides.off_y.unwrap_or(0.0),
        ),
    }
}

/// Placement for a template slot.
pub fn resolve_region(
    slot: Slot,
    preset: &LayoutPreset,
    overrides: &SlotOverrides,
    policy: ZeroPolicy,
) -> SlotPlacement {
    merge_placement(preset.rect(slot), overrides, policy)
}

/// Placements for all six template slots.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPlacements([(Slot, SlotPlacement); 6]);

impl SlotPlacements {
    /// Preset rectangles with zero offsets.
    pub fn from_preset(preset: &LayoutPreset) -> Self {
        Self(Slot::ALL.map(|slot| (slot, SlotPlacement::from_defaults(preset.rect(slot)))))
    }

    /// Read `{field_prefix}{slot}_x0` … for every slot. The first malformed
    /// field aborts the whole set.
    pub fn from_form(
        form: &FormValues,
        field_prefix: &str,
        preset: &LayoutPreset,
        policy: ZeroPolicy,
    ) -> Result<Self, MalformedOverride> {
        let mut placements = Self::from_preset(preset);
        for (slot, placement) in placements.0.iter_mut() {
            let key = format!("{}{}", field_prefix, slot.prefix());
            let overrides = SlotOverrides::from_form(form, &key)?;
            *placement = resolve_region(*slot, preset, &overrides, policy);
        }
        Ok(placements)
    }

    pub fn get(&self, slot: Slot) -> SlotPlacement {
        self.0
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, p)| *p)
            .unwrap_or(SlotPlacement::from_defaults(INERT_RECT))
    }
}

/// Font size for a slot category.
pub fn resolve_font_size(
    preset: &LayoutPreset,
    category: SlotCategory,
    submitted: Option<f64>,
    policy: ZeroPolicy,
) -> f64 {
    policy.pick(submitted, preset.font_size(category))
}

/// Outcome of resolving a whole request's overrides.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Overridden(T),
    FellBack { value: T, cause: MalformedOverride },
}

impl<T> Resolution<T> {
    pub fn fell_back(&self) -> bool {
        matches!(self, Resolution::FellBack { .. })
    }

    pub fn into_inner(self) -> T {
        match self {
            Resolution::Overridden(value) | Resolution::FellBack { value, .. } => value,
        }
    }
}

/// Any malformed field discards every override in the request, not just
/// the bad one, and the flow's fixed defaults are used instead.
pub fn with_fallback<T>(
    attempt: Result<T, MalformedOverride>,
    fallback: impl FnOnce() -> T,
) -> Resolution<T> {
    match attempt {
        Ok(value) => Resolution::Overridden(value),
        Err(cause) => {
            warn!("{}; reverting all coordinates to defaults", cause);
            Resolution::FellBack {
                value: fallback(),
                cause,
            }
        }
    }
}
