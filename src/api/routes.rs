// API route configuration

use crate::api::handlers;
use actix_web::{guard, http::header, web};

/// Matches `multipart/form-data` requests, whatever their boundary.
fn multipart_form() -> impl guard::Guard {
    guard::fn_guard(|ctx| {
        ctx.head()
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.to_ascii_lowercase().starts_with("multipart/form-data"))
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health check (no auth required)
        .route("/health", web::get().to(handlers::health_check))
        // Product routes (all require authentication)
        .service(
            web::scope("/api/products")
                .route("/", web::post().guard(multipart_form()).to(handlers::upload_products))
                .route("", web::post().guard(multipart_form()).to(handlers::upload_products))
                .route("/", web::post().to(handlers::import_products))
                .route("", web::post().to(handlers::import_products))
                .route("/summary/", web::get().to(handlers::summary_report))
                .route("/summary", web::get().to(handlers::summary_report)),
        );
}
