// HTTP surface: bulk product import and summary report

pub mod auth;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
