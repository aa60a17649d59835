//! Form body extraction
//!
//! The browser form posts `multipart/form-data` (it carries the upload);
//! the calibration endpoints are also called with plain urlencoded bodies.
//! Both end up as [`SubmittedForm`].

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use tracing::debug;
use whiteout_core::FormValues;

use crate::error::ServerError;

/// Name of the file input on every form.
pub const UPLOAD_FIELD: &str = "pdf_file";

#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct SubmittedForm {
    pub fields: FormValues,
    pub upload: Option<Upload>,
}

impl SubmittedForm {
    /// The uploaded document, or a 400 naming what is missing.
    pub fn require_upload(&self) -> Result<&Upload, ServerError> {
        let upload = self
            .upload
            .as_ref()
            .ok_or_else(|| ServerError::BadRequest("No file uploaded".into()))?;
        if upload.file_name.is_empty() {
            return Err(ServerError::BadRequest("No file selected".into()));
        }
        Ok(upload)
    }
}

#[async_trait]
impl<S> FromRequest<S> for SubmittedForm
where
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if !is_multipart {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ServerError::BadRequest(e.body_text()))?;
            return Ok(Self {
                fields: fields.into(),
                upload: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?;

        let mut form = SubmittedForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == UPLOAD_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.body_text()))?;
                debug!("Received upload {:?} ({} bytes)", file_name, bytes.len());
                form.upload = Some(Upload {
                    file_name,
                    bytes: bytes.to_vec(),
                });
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(e.body_text()))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str) -> SubmittedForm {
        SubmittedForm {
            fields: FormValues::new(),
            upload: Some(Upload {
                file_name: name.into(),
                bytes: b"%PDF".to_vec(),
            }),
        }
    }

    #[test]
    fn test_missing_upload_is_rejected() {
        let err = SubmittedForm::default().require_upload().unwrap_err();
        assert_eq!(err.to_string(), "No file uploaded");
    }

    #[test]
    fn test_unnamed_upload_is_rejected() {
        let err = upload("").require_upload().unwrap_err();
        assert_eq!(err.to_string(), "No file selected");
    }

    #[test]
    fn test_named_upload_is_accepted() {
        assert_eq!(upload("cert.pdf").require_upload().unwrap().bytes, b"%PDF");
    }
}
