use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Installation-time configuration failures.
///
/// These are raised while building an [`crate::config::I18nConfig`] and are
/// meant to stop startup rather than surface at request time.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("At least one locale must be configured")]
    EmptyLocales,

    #[error("Invalid locale code '{0}'")]
    InvalidLocale(String),

    #[error("Default locale '{0}' is not one of the supported locales")]
    DefaultLocaleNotSupported(String),

    #[error("Mapping '{from}' -> '{to}' targets a locale that is not supported")]
    MappingTargetNotSupported { from: String, to: String },

    #[error("Failed to build rewrite pattern for locale '{locale}': {source}")]
    RewritePattern {
        locale: String,
        #[source]
        source: regex::Error,
    },
}

/// Why a locale data file could not be used.
///
/// Only produced by [`crate::services::LocaleLoader::try_load`]; the
/// request path goes through the fail-soft `load`, which logs these.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Locale '{0}' cannot be used as a file name")]
    InvalidLocale(String),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected a JSON object at the top level of {}, found {found}", path.display())]
    NotAnObject { path: PathBuf, found: &'static str },
}

/// Request-time failure raised by the locale extractors.
#[derive(Error, Debug)]
pub enum I18nError {
    #[error("Locale state is missing from the request (is the i18n middleware installed?)")]
    MissingLocaleState,

    #[error("Translator is missing from the request (is the i18n middleware installed?)")]
    MissingTranslator,
}

impl I18nError {
    pub fn error_code(&self) -> i32 {
        match self {
            Self::MissingLocaleState => 5101,
            Self::MissingTranslator => 5102,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: i32,
    pub message: String,
}

impl IntoResponse for I18nError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        let response = ErrorResponse { code: self.error_code(), message: self.to_string() };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(response)).into_response()
    }
}

pub type I18nResult<T> = Result<T, I18nError>;
