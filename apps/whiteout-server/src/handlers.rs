//! Route handlers
//!
//! Every PDF operation is CPU-bound and synchronous, so it runs on the
//! blocking pool. Handlers only parse input, pick assets and shape the
//! response.

use std::path::PathBuf;

use axum::{
    extract::State,
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use whiteout_core::{
    apply_freeform, extract_fields_from_pdf, fill_direct_template, generate_template,
    DirectTemplateFill, ExtractedFields, FreeformEdit, RenderedPage, TemplateFill, TemplateKind,
};

use crate::error::ServerError;
use crate::form::SubmittedForm;
use crate::page::{self, PageContext};
use crate::AppState;

/// Run document work on the blocking pool.
async fn blocking<T, F>(work: F) -> Result<T, ServerError>
where
    T: Send + 'static,
    F: FnOnce() -> whiteout_core::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(ServerError::from)
}

fn pdf_attachment(bytes: Vec<u8>, file_name: &str) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Keep only `[A-Za-z0-9_-]`; an empty result becomes `output`.
pub fn download_stem(plate_number: &str) -> String {
    let stem: String = plate_number
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();
    if stem.is_empty() {
        "output".to_string()
    } else {
        stem
    }
}

fn template_path(state: &AppState, kind: TemplateKind) -> PathBuf {
    state.assets_dir.join(kind.file_name())
}

async fn read_template(state: &AppState, kind: TemplateKind) -> Result<Vec<u8>, ServerError> {
    let path = template_path(state, kind);
    match tokio::fs::read(&path).await {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ServerError::TemplateNotFound(kind.file_name().to_string()))
        }
        Err(e) => Err(ServerError::Internal(format!("{}: {}", path.display(), e))),
    }
}

/// Handler: GET /health
pub async fn health() -> &'static str {
    "OK"
}

/// Handler: GET /
pub async fn index() -> Html<String> {
    Html(page::render(&PageContext::default()))
}

/// Handler: POST /
///
/// `action` selects `preview`, `download_template` or (default) `download`.
pub async fn submit(
    State(state): State<AppState>,
    form: SubmittedForm,
) -> Result<Response, ServerError> {
    let upload = form.require_upload()?.clone();
    let action = form.fields.get("action").unwrap_or("download").to_string();
    info!("POST / action={} upload={:?}", action, upload.file_name);

    match action.as_str() {
        "download_template" => {
            let fill = DirectTemplateFill::from_form(&form.fields).into_inner();
            let template = read_template(&state, fill.kind).await?;
            let font = state.template_font.clone();
            let bytes = blocking(move || fill_direct_template(&template, &fill, &font)).await?;
            Ok(pdf_attachment(bytes, "template_output.pdf"))
        }
        "preview" => {
            let edit = FreeformEdit::from_form(&form.fields).into_inner();
            let font = state.freeform_font.clone();
            let rasterizer = state.rasterizer.clone();
            let work_edit = edit.clone();
            let rendered = blocking(move || {
                let edited = apply_freeform(&upload.bytes, &work_edit, &font)?;
                rasterizer.render_first_page(&edited)
            })
            .await?;
            let ctx = PageContext {
                edit: Some(edit),
                preview_png: Some(rendered.png_base64()),
            };
            Ok(Html(page::render(&ctx)).into_response())
        }
        _ => {
            let edit = FreeformEdit::from_form(&form.fields).into_inner();
            let font = state.freeform_font.clone();
            let bytes = blocking(move || apply_freeform(&upload.bytes, &edit, &font)).await?;
            Ok(pdf_attachment(bytes, "edited_output.pdf"))
        }
    }
}

/// Preview image response
#[derive(Debug, Serialize, Deserialize)]
pub struct RenderResponse {
    /// Base64 PNG
    pub image: String,
    pub width: f64,
    pub height: f64,
}

impl From<RenderedPage> for RenderResponse {
    fn from(page: RenderedPage) -> Self {
        Self {
            image: page.png_base64(),
            width: page.width,
            height: page.height,
        }
    }
}

/// Preview plus suggested calibration values
#[derive(Debug, Serialize, Deserialize)]
pub struct RenderPageResponse {
    #[serde(flatten)]
    pub page: RenderResponse,
    #[serde(flatten)]
    pub fields: ExtractedFields,
}

/// Handler: POST /render_page
pub async fn render_page(
    State(state): State<AppState>,
    form: SubmittedForm,
) -> Result<Json<RenderPageResponse>, ServerError> {
    let upload = form.require_upload()?.clone();
    let rasterizer = state.rasterizer.clone();

    let (rendered, fields) = blocking(move || {
        let rendered = rasterizer.render_first_page(&upload.bytes)?;
        let fields = extract_fields_from_pdf(&upload.bytes);
        Ok((rendered, fields))
    })
    .await?;
    debug!("Suggested fields: {:?}", fields);

    Ok(Json(RenderPageResponse {
        page: rendered.into(),
        fields,
    }))
}

/// Handler: POST /render_template
pub async fn render_template(
    State(state): State<AppState>,
    form: SubmittedForm,
) -> Result<Json<RenderResponse>, ServerError> {
    let kind = TemplateKind::from_form(form.fields.get("template_type"));
    let template = read_template(&state, kind).await?;
    let rasterizer = state.rasterizer.clone();
    let rendered = blocking(move || rasterizer.render_first_page(&template)).await?;
    Ok(Json(rendered.into()))
}

/// Handler: POST /generate_template
pub async fn generate_template_pdf(
    State(state): State<AppState>,
    form: SubmittedForm,
) -> Result<Response, ServerError> {
    let fill = TemplateFill::from_form(&form.fields).into_inner();
    let template = read_template(&state, fill.kind).await?;
    let file_name = format!(
        "template_{}_{}.pdf",
        fill.kind,
        download_stem(&fill.plate_number)
    );

    let font = state.template_font.clone();
    let bytes = blocking(move || generate_template(&template, &fill, &font)).await?;
    info!("Generated {}", file_name);
    Ok(pdf_attachment(bytes, &file_name))
}
