//! Locale data loading
//!
//! One JSON file per locale, named `<locale><extension>` inside the
//! configured directory. Loading is fail-soft: any problem with the file is
//! logged and an empty mapping is returned, so a broken locale file only
//! degrades translations to their keys.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

use crate::utils::{LoadError, LocaleData};

#[derive(Debug, Clone)]
pub struct LocaleLoader {
    directory: PathBuf,
    extension: String,
    /// Successful loads, kept for the life of the process when caching is on.
    cache: Option<Arc<DashMap<String, Arc<LocaleData>>>>,
}

impl LocaleLoader {
    pub fn new(directory: impl Into<PathBuf>, extension: impl Into<String>, memory_cache: bool) -> Self {
        Self {
            directory: directory.into(),
            extension: extension.into(),
            cache: memory_cache.then(|| Arc::new(DashMap::new())),
        }
    }

    pub fn path_for(&self, locale: &str) -> PathBuf {
        self.directory.join(format!("{}{}", locale, self.extension))
    }

    pub fn is_cached(&self, locale: &str) -> bool {
        self.cache.as_ref().is_some_and(|cache| cache.contains_key(locale))
    }

    /// Load the data for `locale`, never failing.
    ///
    /// Failed loads are not cached, so a file fixed on disk is picked up on
    /// the next request.
    pub async fn load(&self, locale: &str) -> Arc<LocaleData> {
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(locale)
        {
            return Arc::clone(hit.value());
        }

        match self.try_load(locale).await {
            Ok(data) => {
                tracing::debug!("Loaded {} translation keys for locale {}", data.len(), locale);
                let data = Arc::new(data);
                match &self.cache {
                    Some(cache) => Arc::clone(
                        cache.entry(locale.to_string()).or_insert_with(|| Arc::clone(&data)).value(),
                    ),
                    None => data,
                }
            },
            Err(err) => {
                tracing::error!(
                    "Unable to load locale data for {} (maybe {} is empty, unreadable or not JSON?): {}",
                    locale,
                    self.path_for(locale).display(),
                    err
                );
                Arc::new(LocaleData::new())
            },
        }
    }

    /// Fallible load, bypassing the cache.
    pub async fn try_load(&self, locale: &str) -> Result<LocaleData, LoadError> {
        if locale.is_empty() || locale.contains(['/', '\\']) || locale.contains("..") {
            return Err(LoadError::InvalidLocale(locale.to_string()));
        }

        let path = self.path_for(locale);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| LoadError::Io { path: path.clone(), source })?;

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(LoadError::NotAnObject { path, found: json_kind(&other) }),
            Err(source) => Err(LoadError::Parse { path, source }),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
