use axum::{
    body::Bytes,
    extract::{Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use galleria_core::{config::ImageDisposition, CoreError};
use tracing::{error, info, warn};

use crate::{
    error::{ServerError, ServerResult},
    flash::Flash,
    routes::AppState,
};

/// The `file` part of an upload form
#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Accept an image upload, then redirect to the gallery with a flash message.
///
/// Every outcome, including store failures, ends in the same redirect.
pub async fn upload_file(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let message = match read_file_part(&mut multipart).await {
        Ok(Some(file)) => {
            match state
                .gallery
                .upload(&file.filename, &file.data, file.content_type.as_deref())
                .await
            {
                Ok(record) => {
                    info!("Uploaded {} titled {:?}", file.filename, record.title);
                    Flash::info("File successfully uploaded and processed")
                }
                Err(ServerError::Core(CoreError::Validation(msg))) => {
                    warn!("Rejected upload {:?}: {}", file.filename, msg);
                    Flash::warning(msg)
                }
                Err(e) => {
                    error!("Upload of {} failed: {}", file.filename, e);
                    Flash::error(format!("Error processing file: {}", e))
                }
            }
        }
        Ok(None) => Flash::warning("No file part"),
        Err(e) => {
            warn!("Unreadable upload form: {}", e);
            Flash::error(format!("Error processing file: {}", e))
        }
    };

    state.flash.redirect(&[message], "/")
}

async fn read_file_part(multipart: &mut Multipart) -> ServerResult<Option<UploadedFile>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Invalid multipart data: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().map(|ct| ct.to_string());
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Failed to read file data: {}", e)))?;

        return Ok(Some(UploadedFile {
            filename,
            content_type,
            data,
        }));
    }

    Ok(None)
}

/// Serve the raw bytes of a stored image
pub async fn serve_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> ServerResult<Response> {
    let image = state.gallery.image(&filename).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&image.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(image.data.len()));
    headers.insert(
        header::CONTENT_DISPOSITION,
        content_disposition(state.image_disposition, &filename),
    );

    Ok((StatusCode::OK, headers, image.data).into_response())
}

/// `Content-Disposition` suggesting `filename` for client-side saves.
///
/// Non-ASCII names get an RFC 5987 `filename*` alongside an ASCII fallback.
pub fn content_disposition(disposition: ImageDisposition, filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let value = if fallback == filename {
        format!("{}; filename=\"{}\"", disposition.as_str(), filename)
    } else {
        format!(
            "{}; filename=\"{}\"; filename*=UTF-8''{}",
            disposition.as_str(),
            fallback,
            urlencoding::encode(filename)
        )
    };

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_plain_name() {
        assert_eq!(
            content_disposition(ImageDisposition::Attachment, "cat.png"),
            "attachment; filename=\"cat.png\""
        );
        assert_eq!(
            content_disposition(ImageDisposition::Inline, "my cat.png"),
            "inline; filename=\"my cat.png\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii_name() {
        let value = content_disposition(ImageDisposition::Attachment, "chat\u{e9}.png");
        assert_eq!(
            value,
            "attachment; filename=\"chat_.png\"; filename*=UTF-8''chat%C3%A9.png"
        );
    }

    #[test]
    fn test_content_disposition_quotes_are_replaced() {
        let value = content_disposition(ImageDisposition::Attachment, "say\"hi\".gif");
        assert!(value.to_str().unwrap().contains("filename=\"say_hi_.gif\""));
    }
}
