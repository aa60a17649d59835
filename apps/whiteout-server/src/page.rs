//! The single HTML page
//!
//! Rendered server-side. Submitted values are echoed back after a preview
//! so the user can keep adjusting coordinates; all of them pass through
//! `html-escape`.

use std::fmt::Write;

use html_escape::{encode_double_quoted_attribute, encode_text};
use whiteout_core::resolve::SlotPlacement;
use whiteout_core::{FreeformEdit, Slot};

/// What to show on the page.
#[derive(Debug, Default)]
pub struct PageContext {
    /// Values to pre-fill the edit form with.
    pub edit: Option<FreeformEdit>,
    /// Base64 PNG of the edited first page.
    pub preview_png: Option<String>,
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="da">
<head>
<meta charset="utf-8">
<title>PDF whiteout</title>
<style>
body { font-family: sans-serif; margin: 2em; max-width: 60em; }
fieldset { margin-bottom: 1em; }
label { display: inline-block; margin: 0.2em 0.6em 0.2em 0; }
input[type=number] { width: 5em; }
img.preview { border: 1px solid #888; max-width: 100%; }
</style>
</head>
<body>
<h1>PDF whiteout</h1>
"#;

const PNG_DATA_URL: &str = "data:image/png;base64,";

const TEMPLATE_SELECT: &str = r#"<label>Template <select name="template_type">
<option value="big">big</option>
<option value="small">small</option>
</select></label>"#;

const CALIBRATION: &str = r#"<h2>Template</h2>
<form method="post" action="/generate_template">
<label>Template <select name="template_type">
<option value="big">big</option>
<option value="small">small</option>
</select></label>
<label>Prøvemærke <input name="plate_number"></label>
<label>Venstre dato <input name="left_date"></label>
<label>Højre dato <input name="right_date"></label>
<label>Tal-størrelse <input type="number" step="any" name="number_fontsize" value="0"></label>
<label>Dato-størrelse <input type="number" step="any" name="date_fontsize" value="0"></label>
<p>Koordinater på 0 bruger skabelonens standard.</p>
<button type="submit">Generér skabelon</button>
</form>
</body>
</html>
"#;

fn number_input(out: &mut String, name: &str, value: f64) {
    write!(
        out,
        r#"<label>{name} <input type="number" step="any" name="{name}" value="{value}"></label>"#,
        name = encode_double_quoted_attribute(name),
        value = value,
    )
    .unwrap();
}

fn placement_inputs(out: &mut String, prefix: &str, placement: &SlotPlacement) {
    let values = [
        ("x0", placement.rect.x0),
        ("y0", placement.rect.y0),
        ("x1", placement.rect.x1),
        ("y1", placement.rect.y1),
        ("off_x", placement.offset.off_x),
        ("off_y", placement.offset.off_y),
    ];
    for (suffix, value) in values {
        number_input(out, &format!("{}_{}", prefix, suffix), value);
    }
}

fn direct_template_fieldset(out: &mut String) {
    out.push_str("<fieldset><legend>Direkte skabelon</legend>");
    out.push_str(TEMPLATE_SELECT);
    let text_fields = [
        ("tpl_up_number", Slot::UpNumber),
        ("tpl_down_number", Slot::DownNumber),
        ("tpl_upleft_date", Slot::UpLeftDate),
        ("tpl_upright_date", Slot::UpRightDate),
        ("tpl_downleft_date", Slot::DownLeftDate),
        ("tpl_downright_date", Slot::DownRightDate),
    ];
    for (field, slot) in text_fields {
        write!(out, r#"<div><label>{} <input name="{}"></label>"#, slot, field).unwrap();
        let defaults = [
            ("x0", 0.0),
            ("y0", 0.0),
            ("x1", 100.0),
            ("y1", 50.0),
            ("off_x", 0.0),
            ("off_y", 0.0),
        ];
        for (suffix, value) in defaults {
            number_input(out, &format!("tpl_{}_{}", slot.prefix(), suffix), value);
        }
        out.push_str("</div>");
    }
    number_input(out, "tpl_number_fontsize", 63.0);
    number_input(out, "tpl_date_fontsize", 10.0);
    out.push_str(
        r#"<button type="submit" name="action" value="download_template">Hent skabelon</button>"#,
    );
    out.push_str("</fieldset>");
}

pub fn render(ctx: &PageContext) -> String {
    let edit = ctx
        .edit
        .clone()
        .unwrap_or_else(|| FreeformEdit::with_defaults("", ""));

    let mut out = String::from(HEAD);

    if let Some(png) = &ctx.preview_png {
        write!(
            out,
            r#"<h2>Forhåndsvisning</h2><img class="preview" alt="preview" src="{}{}">"#,
            PNG_DATA_URL,
            encode_double_quoted_attribute(png)
        )
        .unwrap();
    }

    out.push_str(r#"<form method="post" action="/" enctype="multipart/form-data">"#);
    out.push_str(r#"<p><input type="file" name="pdf_file" accept="application/pdf"></p>"#);

    out.push_str("<fieldset><legend>Navn</legend>");
    write!(
        out,
        r#"<textarea name="top_name" rows="3" cols="50">{}</textarea><br>"#,
        encode_text(&edit.top_name)
    )
    .unwrap();
    placement_inputs(&mut out, "r1", &edit.name);
    number_input(&mut out, "main_top_fontsize", edit.name_font_size);
    out.push_str("</fieldset>");

    out.push_str("<fieldset><legend>Dato</legend>");
    write!(
        out,
        r#"<input name="second_section" size="50" value="{}"><br>"#,
        encode_double_quoted_attribute(&edit.second_section)
    )
    .unwrap();
    placement_inputs(&mut out, "r2", &edit.date);
    number_input(&mut out, "main_date_fontsize", edit.date_font_size);
    out.push_str("</fieldset>");

    out.push_str(r#"<button type="submit" name="action" value="preview">Forhåndsvis</button> "#);
    out.push_str(r#"<button type="submit" name="action" value="download">Hent PDF</button>"#);

    direct_template_fieldset(&mut out);
    out.push_str("</form>");

    out.push_str(CALIBRATION);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_page_has_freeform_defaults() {
        let html = render(&PageContext::default());
        assert!(html.contains(r#"name="r1_x0" value="100""#));
        assert!(html.contains(r#"name="r2_y1" value="560""#));
        assert!(html.contains(r#"name="main_top_fontsize" value="14""#));
        assert!(!html.contains("data:image/png"));
    }

    #[test]
    fn test_echoed_values_are_escaped() {
        let ctx = PageContext {
            edit: Some(FreeformEdit::with_defaults("<b>Ole</b>", r#"1" onload="x"#)),
            preview_png: Some("iVBORw0".into()),
        };
        let html = render(&ctx);
        assert!(html.contains("&lt;b&gt;Ole&lt;/b&gt;"));
        assert!(!html.contains(r#"1" onload"#));
        assert!(html.contains("data:image/png;base64,iVBORw0"));
    }

    #[test]
    fn test_direct_template_fields_present() {
        let html = render(&PageContext::default());
        for field in ["tpl_up_number", "tpl_dr_off_y", "tpl_number_fontsize"] {
            assert!(html.contains(&format!(r#"name="{}""#, field)), "missing {}", field);
        }
    }
}
