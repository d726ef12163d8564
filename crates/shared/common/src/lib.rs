//! Common utilities shared by the account service and the HTTP host.
//!
//! This crate provides:
//! - Unified error handling with HTTP rendering
//! - Process-wide settings
//! - Pagination helpers

pub mod error;
pub mod pagination;
pub mod settings;

pub use error::{AppError, AppResult, OptionExt};
pub use pagination::{Page, PageMeta, PageRequest};
pub use settings::{
    AutoField, ConfigError, DatabaseEngine, DatabaseSettings, InstalledApp, LocaleSettings,
    MiddlewareKind, Settings, StaticSettings, TemplateSettings,
};
