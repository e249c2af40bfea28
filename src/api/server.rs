// API server implementation using actix-web

use crate::api::auth::{Auth, TokenKeys};
use crate::api::handlers::{SharedEngine, UploadLimit};
use crate::api::routes;
use crate::config::Config;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;

pub struct ApiServer {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    keys: Arc<TokenKeys>,
}

impl ApiServer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let secret = config.require_secret()?;

        Ok(Self {
            host: config.host.clone(),
            port: config.port,
            max_upload_bytes: config.max_upload_bytes,
            keys: Arc::new(TokenKeys::new(secret)),
        })
    }

    /// Start the HTTP server
    pub async fn run(self, engine: SharedEngine) -> Result<()> {
        let bind_addr = format!("{}:{}", self.host, self.port);

        tracing::info!(host = %self.host, port = self.port, "Starting product API server");

        let engine = web::Data::new(engine);
        let keys = self.keys.clone();
        let max_upload_bytes = self.max_upload_bytes;

        HttpServer::new(move || {
            App::new()
                .app_data(engine.clone())
                .app_data(web::PayloadConfig::new(max_upload_bytes))
                .app_data(UploadLimit(max_upload_bytes))
                .wrap(Auth::new(keys.clone()))
                .wrap(Logger::default())
                .configure(routes::configure_routes)
        })
        .bind(&bind_addr)
        .with_context(|| format!("Failed to bind to {}", bind_addr))?
        .run()
        .await
        .context("HTTP server error")?;

        Ok(())
    }
}
