//! The three editing flows
//!
//! Each flow has a request type built from submitted form values and a
//! function that applies it to document bytes. The `draw_*` halves work on
//! any [`PageSurface`] so layout can be checked without a PDF.

use tracing::{debug, info, warn};

use crate::compositor::{composite, PageSurface, Rgb};
use crate::error::{Result, WhiteoutError};
use crate::font::OverlayFont;
use crate::preset::{Slot, SlotCategory, TemplateKind, DIRECT_TEMPLATE, FREEFORM};
use crate::region::BaselineMode;
use crate::resolve::{
    merge_placement, parse_override, resolve_font_size, with_fallback, FormValues,
    MalformedOverride, Resolution, SlotOverrides, SlotPlacement, SlotPlacements, ZeroPolicy,
};
use crate::surface::{resave, OverlayDocument};

/// Name/date edit of an uploaded document.
#[derive(Debug, Clone, PartialEq)]
pub struct FreeformEdit {
    /// Multi-line name block.
    pub top_name: String,
    /// Single-line date/section text.
    pub second_section: String,
    pub name: SlotPlacement,
    pub date: SlotPlacement,
    pub name_font_size: f64,
    pub date_font_size: f64,
}

impl FreeformEdit {
    /// Reads `top_name`, `second_section`, `r1_*`, `r2_*`,
    /// `main_top_fontsize` and `main_date_fontsize`. Submitted zeros are
    /// kept as given.
    pub fn from_form(form: &FormValues) -> Resolution<Self> {
        let top_name = form.text("top_name");
        let second_section = form.text("second_section");

        let attempt = (|| -> std::result::Result<Self, MalformedOverride> {
            let policy = ZeroPolicy::Literal;
            let name_ov = SlotOverrides::from_form(form, "r1")?;
            let date_ov = SlotOverrides::from_form(form, "r2")?;
            Ok(Self {
                top_name: top_name.clone(),
                second_section: second_section.clone(),
                name: merge_placement(FREEFORM.name_rect, &name_ov, policy),
                date: merge_placement(FREEFORM.date_rect, &date_ov, policy),
                name_font_size: policy
                    .pick(parse_override(form, "main_top_fontsize")?, FREEFORM.name_font_size),
                date_font_size: policy
                    .pick(parse_override(form, "main_date_fontsize")?, FREEFORM.date_font_size),
            })
        })();

        with_fallback(attempt, || Self::with_defaults(top_name, second_section))
    }

    pub fn with_defaults(top_name: impl Into<String>, second_section: impl Into<String>) -> Self {
        Self {
            top_name: top_name.into(),
            second_section: second_section.into(),
            name: SlotPlacement::from_defaults(FREEFORM.name_rect),
            date: SlotPlacement::from_defaults(FREEFORM.date_rect),
            name_font_size: FREEFORM.name_font_size,
            date_font_size: FREEFORM.date_font_size,
        }
    }
}

/// Composite the name and date regions. Returns the number of text runs.
pub fn draw_freeform<S: PageSurface + ?Sized>(surface: &mut S, edit: &FreeformEdit) -> usize {
    let name = edit
        .name
        .into_region(edit.name_font_size, edit.top_name.as_str())
        .multiline();
    let date = edit
        .date
        .into_region(edit.date_font_size, edit.second_section.as_str());

    composite(surface, &name, BaselineMode::FREEFORM, Rgb::INK)
        + composite(surface, &date, BaselineMode::FREEFORM, Rgb::INK)
}

/// Apply a freeform edit to page 1. A document without pages is saved
/// back unchanged.
pub fn apply_freeform(bytes: &[u8], edit: &FreeformEdit, font: &OverlayFont) -> Result<Vec<u8>> {
    let mut page = match OverlayDocument::open(bytes) {
        Ok(page) => page,
        Err(WhiteoutError::EmptyDocument) => {
            warn!("Uploaded document has no pages; returning it unedited");
            return resave(bytes);
        }
        Err(e) => return Err(e),
    };
    let drawn = draw_freeform(&mut page, edit);
    info!("Freeform edit drew {} text runs", drawn);
    page.save(font)
}

/// Calibration-flow fill of a stock template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFill {
    pub kind: TemplateKind,
    pub plate_number: String,
    pub left_date: String,
    pub right_date: String,
    pub placements: SlotPlacements,
    pub number_font_size: f64,
    pub date_font_size: f64,
}

impl TemplateFill {
    /// Reads `template_type`, `plate_number`, `left_date`, `right_date`,
    /// the per-slot `un_*` … `dr_*` fields, `number_fontsize` and
    /// `date_fontsize`. Zero means "use the preset".
    pub fn from_form(form: &FormValues) -> Resolution<Self> {
        let kind = TemplateKind::from_form(form.get("template_type"));
        let preset = kind.calibration_preset();
        let policy = ZeroPolicy::ZeroMeansUnset;

        let base = Self {
            kind,
            plate_number: form.text("plate_number"),
            left_date: form.text("left_date"),
            right_date: form.text("right_date"),
            placements: SlotPlacements::from_preset(preset),
            number_font_size: preset.number_font_size,
            date_font_size: preset.date_font_size,
        };

        let attempt = (|| -> std::result::Result<Self, MalformedOverride> {
            Ok(Self {
                placements: SlotPlacements::from_form(form, "", preset, policy)?,
                number_font_size: resolve_font_size(
                    preset,
                    SlotCategory::Number,
                    parse_override(form, "number_fontsize")?,
                    policy,
                ),
                date_font_size: resolve_font_size(
                    preset,
                    SlotCategory::Date,
                    parse_override(form, "date_fontsize")?,
                    policy,
                ),
                ..base.clone()
            })
        })();

        with_fallback(attempt, || base)
    }

    /// Text for a slot: the plate on both numbers, the left date on both
    /// left slots and the right date on both right slots.
    pub fn text_for(&self, slot: Slot) -> &str {
        match slot {
            Slot::UpNumber | Slot::DownNumber => &self.plate_number,
            Slot::UpLeftDate | Slot::DownLeftDate => &self.left_date,
            Slot::UpRightDate | Slot::DownRightDate => &self.right_date,
        }
    }

    fn font_size(&self, slot: Slot) -> f64 {
        match slot.category() {
            SlotCategory::Number => self.number_font_size,
            SlotCategory::Date => self.date_font_size,
        }
    }
}

pub fn draw_template<S: PageSurface + ?Sized>(surface: &mut S, fill: &TemplateFill) -> usize {
    fill.kind
        .active_slots()
        .iter()
        .map(|&slot| {
            let region = fill
                .placements
                .get(slot)
                .into_region(fill.font_size(slot), fill.text_for(slot));
            composite(surface, &region, BaselineMode::TopAligned, Rgb::BLACK)
        })
        .sum()
}

/// Fill a stock template. Unlike uploads, an empty template is an error.
pub fn generate_template(
    template: &[u8],
    fill: &TemplateFill,
    font: &OverlayFont,
) -> Result<Vec<u8>> {
    let mut page = OverlayDocument::open(template)?;
    let drawn = draw_template(&mut page, fill);
    info!("Filled {} template: {} text runs", fill.kind, drawn);
    page.save(font)
}

/// Form field holding each slot's text in the direct-download flow.
fn direct_text_field(slot: Slot) -> &'static str {
    match slot {
        Slot::UpNumber => "tpl_up_number",
        Slot::DownNumber => "tpl_down_number",
        Slot::UpLeftDate => "tpl_upleft_date",
        Slot::UpRightDate => "tpl_upright_date",
        Slot::DownLeftDate => "tpl_downleft_date",
        Slot::DownRightDate => "tpl_downright_date",
    }
}

/// Direct template download from the main form: six slots, each with its
/// own text.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectTemplateFill {
    pub kind: TemplateKind,
    pub texts: [(Slot, String); 6],
    pub placements: SlotPlacements,
    pub number_font_size: f64,
    pub date_font_size: f64,
}

impl DirectTemplateFill {
    /// Reads `template_type`, the `tpl_*` text fields, `tpl_{slot}_*`
    /// coordinates, `tpl_number_fontsize` and `tpl_date_fontsize`.
    ///
    /// Coordinates and font sizes fall back independently: a bad size does
    /// not discard good coordinates, and the other way round.
    pub fn from_form(form: &FormValues) -> Resolution<Self> {
        let policy = ZeroPolicy::Literal;
        let kind = TemplateKind::from_form(form.get("template_type"));
        let texts = Slot::ALL.map(|slot| (slot, form.text(direct_text_field(slot))));

        let placements = with_fallback(
            SlotPlacements::from_form(form, "tpl_", &DIRECT_TEMPLATE, policy),
            || SlotPlacements::from_preset(&DIRECT_TEMPLATE),
        );
        let sizes = with_fallback(
            (|| -> std::result::Result<(f64, f64), MalformedOverride> {
                Ok((
                    policy.pick(
                        parse_override(form, "tpl_number_fontsize")?,
                        DIRECT_TEMPLATE.number_font_size,
                    ),
                    policy.pick(
                        parse_override(form, "tpl_date_fontsize")?,
                        DIRECT_TEMPLATE.date_font_size,
                    ),
                ))
            })(),
            || (DIRECT_TEMPLATE.number_font_size, DIRECT_TEMPLATE.date_font_size),
        );

        let cause = match (&placements, &sizes) {
            (Resolution::FellBack { cause, .. }, _) | (_, Resolution::FellBack { cause, .. }) => {
                Some(cause.clone())
            }
            _ => None,
        };
        let (number_font_size, date_font_size) = sizes.into_inner();
        let value = Self {
            kind,
            texts,
            placements: placements.into_inner(),
            number_font_size,
            date_font_size,
        };

        match cause {
            Some(cause) => Resolution::FellBack { value, cause },
            None => Resolution::Overridden(value),
        }
    }

    pub fn text_for(&self, slot: Slot) -> &str {
        self.texts
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, t)| t.as_str())
            .unwrap_or_default()
    }
}

pub fn draw_direct_template<S: PageSurface + ?Sized>(
    surface: &mut S,
    fill: &DirectTemplateFill,
) -> usize {
    Slot::ALL
        .iter()
        .map(|&slot| {
            let size = match slot.category() {
                SlotCategory::Number => fill.number_font_size,
                SlotCategory::Date => fill.date_font_size,
            };
            let region = fill.placements.get(slot).into_region(size, fill.text_for(slot));
            composite(surface, &region, BaselineMode::TEMPLATE, Rgb::BLACK)
        })
        .sum()
}

/// Fill a stock template from the main form. A template without pages is
/// saved back unchanged.
pub fn fill_direct_template(
    template: &[u8],
    fill: &DirectTemplateFill,
    font: &OverlayFont,
) -> Result<Vec<u8>> {
    let mut page = match OverlayDocument::open(template) {
        Ok(page) => page,
        Err(WhiteoutError::EmptyDocument) => return resave(template),
        Err(e) => return Err(e),
    };
    let drawn = draw_direct_template(&mut page, fill);
    debug!("Direct {} template: {} text runs", fill.kind, drawn);
    page.save(font)
}
