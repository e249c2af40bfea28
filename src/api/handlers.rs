// HTTP request handlers for API endpoints

use crate::api::auth::Identity;
use crate::api::models::{ApiError, ApiResponse, HealthResponse};
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::engine::Engine;
use crate::has_csv_extension;
use crate::store::ProductStore;

use actix_multipart::{Multipart, MultipartError};
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpRequest, HttpResponse};
use futures::StreamExt;
use std::sync::Arc;

pub type SharedEngine = Engine<Arc<dyn ProductStore>>;

pub const REPORT_FILENAME: &str = "summary_report.csv";

/// Form field carrying the CSV in a multipart upload.
pub const UPLOAD_FIELD: &str = "file";

/// Largest accepted upload, registered as app data next to `PayloadConfig`.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimit(pub usize);

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(HealthResponse {
        status: "healthy".to_string(),
    }))
}

/// Bulk import of products from a raw CSV request body.
pub async fn import_products(
    engine: web::Data<SharedEngine>,
    identity: web::ReqData<Identity>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    run_import(engine, identity.into_inner(), body).await
}

/// Bulk import of products from a `multipart/form-data` form whose `file`
/// part holds a `.csv` file.
pub async fn upload_products(
    engine: web::Data<SharedEngine>,
    identity: web::ReqData<Identity>,
    req: HttpRequest,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    let limit = req
        .app_data::<UploadLimit>()
        .map_or(DEFAULT_MAX_UPLOAD_BYTES, |l| l.0);
    let body = read_csv_part(&mut payload, limit).await?;
    run_import(engine, identity.into_inner(), body).await
}

fn upload_error(e: MultipartError) -> ApiError {
    ApiError::Upload(e.to_string())
}

async fn read_csv_part(payload: &mut Multipart, limit: usize) -> Result<web::Bytes, ApiError> {
    while let Some(field) = payload.next().await {
        let mut field = field.map_err(upload_error)?;
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        if !has_csv_extension(&filename) {
            return Err(ApiError::Upload(format!(
                "`{}` must be a .csv file, got {:?}",
                UPLOAD_FIELD, filename
            )));
        }

        let mut body = web::BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(upload_error)?;
            if body.len() + chunk.len() > limit {
                return Err(ApiError::Upload(format!(
                    "upload exceeds {} bytes",
                    limit
                )));
            }
            body.extend_from_slice(&chunk);
        }
        return Ok(body.freeze());
    }

    Err(ApiError::Upload(format!(
        "missing `{}` part in upload form",
        UPLOAD_FIELD
    )))
}

async fn run_import(
    engine: web::Data<SharedEngine>,
    identity: Identity,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let subject = identity.subject;
    tracing::info!(subject = %subject, bytes = body.len(), "Product upload received");

    let engine = engine.into_inner();
    let result = tokio::task::spawn_blocking(move || engine.import_csv(body.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    match result {
        Ok(summary) => {
            tracing::info!(
                subject = %subject,
                created = summary.created,
                updated = summary.updated,
                "Product upload applied"
            );
            Ok(HttpResponse::NoContent().finish())
        }
        Err(e) => {
            tracing::warn!(subject = %subject, error = %e, "Product upload rejected");
            Err(e.into())
        }
    }
}

/// Per-category summary as a CSV attachment.
pub async fn summary_report(engine: web::Data<SharedEngine>) -> Result<HttpResponse, ApiError> {
    let engine = engine.into_inner();
    let csv = tokio::task::spawn_blocking(move || engine.summary_csv())
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(REPORT_FILENAME.to_string())],
        })
        .body(csv))
}
