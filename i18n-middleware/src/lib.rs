//! Locale detection and translation binding for axum applications.
//!
//! For every request the middleware collects locale candidates from the
//! configured sources (subdomain, cookie, header, query, url, tld or custom
//! detectors), resolves one supported locale, loads its translation file and
//! hands handlers a [`Translator`] plus the [`Resolution`] snapshot.

pub mod config;
pub mod middleware;
pub mod services;
pub mod utils;

pub use config::{Config, I18nConfig, I18nConfigBuilder, I18nOptions};
pub use middleware::{I18n, i18n_middleware};
pub use services::{Candidate, DetectionSource, LocaleMethod, Resolution, ResolvedBy, UnrewrittenUri};
pub use utils::{ConfigError, I18nError, Translator};

#[cfg(test)]
mod tests;
