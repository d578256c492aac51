//! Locale prefix rewriting
//!
//! `/zh-CN/users` is routed as `/users` when `zh-CN` is the effective
//! locale. Only a whole leading segment is stripped: `/en` and `/en/...`
//! qualify, `/english` does not.

use std::collections::HashMap;

use axum::http::{Uri, uri::PathAndQuery};
use regex::Regex;

use crate::utils::ConfigError;

/// URI of the request before the locale prefix was stripped.
///
/// Inserted into the request extensions for downstream handlers and into
/// the response extensions once the downstream chain has completed, so
/// layers wrapped around the middleware see the path the client sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnrewrittenUri(pub Uri);

/// One prefix pattern per supported locale, compiled at installation time.
#[derive(Debug, Clone)]
pub struct PathRewriter {
    patterns: HashMap<String, Regex>,
}

impl PathRewriter {
    pub fn new<I, L>(locales: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let patterns = locales
            .into_iter()
            .map(|locale| {
                let locale = locale.as_ref();
                Regex::new(&format!(r"^/{}(/|$)", regex::escape(locale)))
                    .map(|pattern| (locale.to_string(), pattern))
                    .map_err(|source| ConfigError::RewritePattern { locale: locale.to_string(), source })
            })
            .collect::<Result<_, _>>()?;

        Ok(Self { patterns })
    }

    /// Path with the `/<locale>` prefix replaced by `/`, or `None` when the
    /// path does not start with that locale segment.
    pub fn strip(&self, path: &str, locale: &str) -> Option<String> {
        let pattern = self.patterns.get(locale)?;
        pattern.is_match(path).then(|| pattern.replace(path, "/").into_owned())
    }

    /// Same as [`PathRewriter::strip`], applied to a full URI; the query string is kept.
    pub fn rewrite_uri(&self, uri: &Uri, locale: &str) -> Option<Uri> {
        let path = self.strip(uri.path(), locale)?;
        let path_and_query = match uri.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path,
        };

        let mut parts = uri.clone().into_parts();
        parts.path_and_query = Some(PathAndQuery::try_from(path_and_query).ok()?);
        Uri::from_parts(parts).ok()
    }
}
