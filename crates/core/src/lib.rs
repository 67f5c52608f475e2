pub mod catalog;
pub mod config;
pub mod error;
pub mod payload;
pub mod subscription;

pub use config::AppConfig;
pub use error::{PromoError, PromoResult};
