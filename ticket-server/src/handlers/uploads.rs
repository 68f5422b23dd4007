use actix_multipart::Field;
use actix_web::{web, HttpRequest, HttpResponse};
use futures::TryStreamExt;
use std::path::Path;

use ticket_common::threadrand::SecureRng;
use ticket_common::validators;

use crate::env;
use crate::handlers::error::HttpErrorResponse;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Drains a multipart file field to the uploads directory and returns the
/// stored filename. The name is prefixed with a random nonce so uploads
/// never collide or overwrite each other.
pub async fn store_uploaded_file(field: &mut Field) -> Result<String, HttpErrorResponse> {
    let original_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .unwrap_or("file");
    let stored_name = format!(
        "{:032x}_{}",
        SecureRng::next_u128(),
        validators::sanitize_filename(original_name),
    );

    let mut contents: Vec<u8> = Vec::new();

    while let Some(chunk) = field.try_next().await.map_err(|_| {
        HttpErrorResponse::ValidationError(String::from("Invalid multipart payload"))
    })? {
        if contents.len() + chunk.len() > MAX_UPLOAD_BYTES {
            return Err(HttpErrorResponse::InputTooLarge(String::from(
                "Uploaded file is too large",
            )));
        }

        contents.extend_from_slice(&chunk);
    }

    let dest = Path::new(&env::CONF.uploads_dir).join(&stored_name);
    match web::block(move || std::fs::write(dest, contents)).await? {
        Ok(_) => (),
        Err(e) => {
            log::error!("{e}");
            return Err(HttpErrorResponse::InternalError(String::from(
                "Failed to store uploaded file",
            )));
        }
    };

    Ok(stored_name)
}

pub async fn serve_upload(
    req: HttpRequest,
    filename: web::Path<String>,
) -> Result<HttpResponse, HttpErrorResponse> {
    let filename = validators::sanitize_filename(&filename);
    let path = Path::new(&env::CONF.uploads_dir).join(filename);

    let file = actix_files::NamedFile::open(path)
        .map_err(|_| HttpErrorResponse::DoesNotExist(String::from("No such file")))?;

    Ok(file.into_response(&req))
}
