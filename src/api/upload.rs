//! PDF upload endpoint

use crate::api::ApiError;
use crate::api::upload::schemas::ExtractedText;
use crate::infrastructure::traits::TextExtractor;
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use di_axum::Inject;
use log::{error, info};
use unicode_normalization::UnicodeNormalization;

const FILE_FIELD: &str = "file";

pub fn router(max_upload_bytes: usize) -> Router {
    Router::new().route(
        "/upload",
        post(upload_pdf).layer(DefaultBodyLimit::max(max_upload_bytes)),
    )
}

async fn upload_pdf(
    Inject(extractor): Inject<dyn TextExtractor>,
    mut multipart: Multipart,
) -> Result<Json<ExtractedText>, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        // parts without a filename are plain form values, not files
        let Some(file_name) = field
            .file_name()
            .filter(|_| field.name() == Some(FILE_FIELD))
            .map(str::to_owned)
        else {
            continue;
        };
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) = upload.ok_or_else(|| ApiError::bad_request("No file part"))?;
    if file_name.is_empty() {
        return Err(ApiError::bad_request("No selected file"));
    }

    let file_name = secure_filename(&file_name);
    if !file_name.to_ascii_lowercase().ends_with(".pdf") {
        return Err(ApiError::bad_request("Only PDF files are allowed"));
    }

    let text = extractor.extract(data.to_vec()).await.map_err(|e| {
        error!("Error reading PDF {file_name}: {e}");
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Error processing PDF: {e}"),
        )
    })?;

    if text.trim().is_empty() {
        return Err(ApiError::bad_request("No readable text found in PDF"));
    }

    info!(
        "extracted {} characters from {file_name} ({} bytes)",
        text.chars().count(),
        data.len()
    );
    Ok(Json(ExtractedText { text }))
}

fn multipart_error(e: MultipartError) -> ApiError {
    ApiError::new(e.status(), e.body_text())
}

/// Reduces a client-supplied file name to a safe basename.
fn secure_filename(raw: &str) -> String {
    let basename = raw.rsplit(['/', '\\']).next().unwrap_or_default();

    basename
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect::<String>()
        .trim_matches(['.', '_'])
        .to_owned()
}

pub mod schemas {
    use serde::Serialize;

    #[derive(Serialize, Debug)]
    pub struct ExtractedText {
        pub text: String,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("lecture notes.pdf"), "lecture_notes.pdf");
        assert_eq!(secure_filename("../../etc/passwd"), "passwd");
        assert_eq!(secure_filename("C:\\Users\\me\\Report.PDF"), "Report.PDF");
        assert_eq!(secure_filename(".hidden.pdf"), "hidden.pdf");
        assert_eq!(secure_filename("résumé.pdf"), "resume.pdf");
        assert_eq!(secure_filename("ﬁnal ｎｏｔｅｓ.pdf"), "final_notes.pdf");
    }

    #[test]
    fn test_only_special_characters() {
        assert_eq!(secure_filename("../.."), "");
    }
}
