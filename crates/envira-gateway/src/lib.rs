//! Envira Gateway
//!
//! HTTP service for the Envira sensor platform, handling:
//! - Device ingestion and statistics (`/api/v1/sensor/*`)
//! - Dashboard data for authenticated users
//! - The health assistant chat with windowed conversation context

pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod router;
pub mod seed;
pub mod server;
pub mod state;

pub use auth::{AuthError, AuthenticatedUser, Claims, JwtConfig};
pub use config::{ConfigError, GatewayConfig};
pub use error::ApiError;
pub use router::build_routes;
pub use server::build_app;
pub use state::{AppState, ChatSettings};
