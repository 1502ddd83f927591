mod app_config;
mod s3_config;

pub use app_config::{
    AppConfig, AuthConfig, BootstrapAdmin, CorsConfig, DatabaseConfig, ServerConfig,
    StorageBackend, StorageConfig,
};
pub use s3_config::*;
