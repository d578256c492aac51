//! Translation utilities for request handlers
//!
//! The middleware resolves a locale per request and stores two things in
//! the request extensions: the [`Resolution`] snapshot and a [`Translator`]
//! bound to the effective locale. Both can be pulled into handlers as
//! extractors.

use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::Value;

use super::error::{I18nError, I18nResult};
use crate::services::{LocaleLoader, Resolution};

/// Parsed content of one locale file: translation key to string (or nested object).
pub type LocaleData = serde_json::Map<String, Value>;

/// Key lookup bound to a single locale.
#[derive(Debug, Clone)]
pub struct Translator {
    locale: String,
    data: Arc<LocaleData>,
    loader: LocaleLoader,
}

impl Translator {
    pub fn new(locale: impl Into<String>, data: Arc<LocaleData>, loader: LocaleLoader) -> Self {
        Self { locale: locale.into(), data, loader }
    }

    /// Build a translator for `locale`, loading its data through `loader`.
    pub async fn load(locale: &str, loader: &LocaleLoader) -> Self {
        let data = loader.load(locale).await;
        Self::new(locale, data, loader.clone())
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Switch to another locale, reloading its data (cached loads are reused).
    pub async fn set_locale(&mut self, locale: &str) {
        tracing::debug!("Translator switching locale {} -> {}", self.locale, locale);
        self.data = self.loader.load(locale).await;
        self.locale = locale.to_string();
    }

    /// Raw value for `key`: the flat key first, then a walk through nested
    /// objects split on `.`.
    pub fn lookup(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(key) {
            return Some(value);
        }

        let mut segments = key.split('.');
        let mut current = self.data.get(segments.next()?)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Translate `key`. Missing keys come back unchanged; non-string values
    /// are rendered as JSON text.
    pub fn t(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => {
                tracing::debug!("Missing translation for key '{}' in locale {}", key, self.locale);
                key.to_string()
            },
        }
    }

    /// Alias of [`Translator::t`], the conventional gettext-style name.
    pub fn __(&self, key: &str) -> String {
        self.t(key)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Translator
where
    S: Send + Sync,
{
    type Rejection = I18nError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> I18nResult<Self> {
        parts.extensions.get::<Translator>().cloned().ok_or(I18nError::MissingTranslator)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Resolution
where
    S: Send + Sync,
{
    type Rejection = I18nError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> I18nResult<Self> {
        parts.extensions.get::<Resolution>().cloned().ok_or(I18nError::MissingLocaleState)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn translator(data: Value) -> Translator {
        let data = match data {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        };
        Translator::new("en", Arc::new(data), LocaleLoader::new("/nonexistent", ".json", false))
    }

    #[test]
    fn test_flat_key_wins_over_nested_path() {
        let t = translator(json!({
            "locales.en": "flat",
            "locales": { "en": "nested" }
        }));
        assert_eq!(t.t("locales.en"), "flat");
    }

    #[test]
    fn test_nested_lookup() {
        let t = translator(json!({ "locales": { "en": "English", "zh-CN": "Chinese(Simplified)" } }));
        assert_eq!(t.t("locales.en"), "English");
        assert_eq!(t.__("locales.zh-CN"), "Chinese(Simplified)");
    }

    #[test]
    fn test_missing_key_returns_key() {
        let t = translator(json!({ "greeting": "Hello" }));
        assert_eq!(t.t("farewell"), "farewell");
        assert_eq!(t.t("greeting.deeper"), "greeting.deeper");
        assert_eq!(t.t(""), "");
    }

    #[test]
    fn test_non_string_values_render_as_json() {
        let t = translator(json!({ "count": 3, "menu": { "a": "A" } }));
        assert_eq!(t.t("count"), "3");
        assert_eq!(t.t("menu"), r#"{"a":"A"}"#);
    }

    #[tokio::test]
    async fn test_set_locale_reloads_data() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("en.json"), r#"{"greeting":"Hello"}"#).unwrap();
        std::fs::write(dir.path().join("fr.json"), r#"{"greeting":"Bonjour"}"#).unwrap();

        let loader = LocaleLoader::new(dir.path(), ".json", false);
        let mut t = Translator::load("en", &loader).await;
        assert_eq!(t.t("greeting"), "Hello");

        t.set_locale("fr").await;
        assert_eq!(t.locale(), "fr");
        assert_eq!(t.t("greeting"), "Bonjour");
    }
}
