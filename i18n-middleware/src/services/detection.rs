//! Locale detection sources
//!
//! A detection source looks at a request and yields a candidate locale: a
//! single value, an ordered list of preferences (Accept-Language), or
//! nothing. Sources are either one of the built-in [`LocaleMethod`]s or a
//! caller-supplied detector function.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use axum::{
    extract::{Query, Request},
    http::header::{ACCEPT_LANGUAGE, COOKIE, HOST},
};
use serde::Serialize;

/// Value produced by a detection source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Candidate {
    One(String),
    /// Ordered by preference, most preferred first.
    Many(Vec<String>),
}

impl Candidate {
    /// Equality for a single value, containment for a list.
    pub fn matches(&self, locale: &str) -> bool {
        match self {
            Self::One(value) => value == locale,
            Self::Many(values) => values.iter().any(|value| value == locale),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(value) => value.is_empty(),
            Self::Many(values) => values.iter().all(String::is_empty),
        }
    }

    /// Drop empty values; `None` when nothing usable remains.
    pub fn non_empty(self) -> Option<Self> {
        match self {
            Self::One(value) if value.is_empty() => None,
            Self::Many(values) => {
                let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
                (!values.is_empty()).then_some(Self::Many(values))
            },
            other => Some(other),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        let values: &[String] = match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        };
        values.iter().map(String::as_str)
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<String> for Candidate {
    fn from(value: String) -> Self {
        Self::One(value)
    }
}

impl From<Vec<String>> for Candidate {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One(value) => f.write_str(value),
            Self::Many(values) => f.write_str(&values.join(",")),
        }
    }
}

/// Parameters shared by the built-in accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectOptions {
    /// Query parameter and cookie name carrying the locale.
    pub key: String,
    /// Number of trailing host labels that are not subdomains.
    pub subdomain_offset: usize,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self { key: "locale".to_string(), subdomain_offset: 2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LocaleMethod {
    Subdomain,
    Cookie,
    Header,
    Query,
    Url,
    Tld,
}

impl LocaleMethod {
    pub const ALL: [LocaleMethod; 6] = [
        LocaleMethod::Subdomain,
        LocaleMethod::Cookie,
        LocaleMethod::Header,
        LocaleMethod::Query,
        LocaleMethod::Url,
        LocaleMethod::Tld,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subdomain => "subdomain",
            Self::Cookie => "cookie",
            Self::Header => "header",
            Self::Query => "query",
            Self::Url => "url",
            Self::Tld => "tld",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|method| method.as_str().eq_ignore_ascii_case(name))
    }

    pub fn detect(&self, req: &Request, options: &DetectOptions) -> Option<Candidate> {
        let candidate = match self {
            Self::Subdomain => locale_from_subdomain(req, options.subdomain_offset),
            Self::Cookie => locale_from_cookie(req, &options.key),
            Self::Header => locale_from_header(req),
            Self::Query => locale_from_query(req, &options.key),
            Self::Url => locale_from_url(req),
            Self::Tld => locale_from_tld(req),
        };
        candidate.and_then(Candidate::non_empty)
    }
}

impl fmt::Display for LocaleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied detector.
pub type DetectorFn = dyn Fn(&Request) -> Option<Candidate> + Send + Sync;

#[derive(Clone)]
pub enum DetectionSource {
    Builtin(LocaleMethod),
    Custom { name: String, detector: Arc<DetectorFn> },
}

impl DetectionSource {
    pub fn custom<F>(name: impl Into<String>, detector: F) -> Self
    where
        F: Fn(&Request) -> Option<Candidate> + Send + Sync + 'static,
    {
        Self::Custom { name: name.into(), detector: Arc::new(detector) }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(method) => method.as_str(),
            Self::Custom { name, .. } => name,
        }
    }

    pub fn detect(&self, req: &Request, options: &DetectOptions) -> Option<Candidate> {
        match self {
            Self::Builtin(method) => method.detect(req, options),
            Self::Custom { detector, .. } => detector(req).and_then(Candidate::non_empty),
        }
    }
}

impl fmt::Debug for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(method) => f.debug_tuple("Builtin").field(method).finish(),
            Self::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish_non_exhaustive(),
        }
    }
}

// ============================================================================
// Request accessors
// ============================================================================

/// Host name without port, from the Host header or the request URI.
fn hostname(req: &Request) -> Option<String> {
    let host = req
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|authority| authority.host().to_string()))?;

    let host = host.trim();
    let name = if let Some(rest) = host.strip_prefix('[') {
        // IPv6 literal, possibly followed by a port
        rest.split(']').next().unwrap_or(rest)
    } else {
        host.split(':').next().unwrap_or(host)
    };

    (!name.is_empty()).then(|| name.to_string())
}

fn locale_from_subdomain(req: &Request, offset: usize) -> Option<Candidate> {
    let host = hostname(req)?;
    if host.parse::<IpAddr>().is_ok() {
        return None;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= offset {
        return None;
    }
    labels.first().map(|label| Candidate::from(*label))
}

fn locale_from_tld(req: &Request) -> Option<Candidate> {
    let host = hostname(req)?;
    host.rsplit('.').next().map(Candidate::from)
}

fn locale_from_url(req: &Request) -> Option<Candidate> {
    let path = req.uri().path();
    let path = path.strip_prefix('/').unwrap_or(path);
    path.split('/').next().map(Candidate::from)
}

fn locale_from_query(req: &Request, key: &str) -> Option<Candidate> {
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(req.uri()).ok()?;
    let values: Vec<String> = pairs.into_iter().filter(|(name, _)| name == key).map(|(_, value)| value).collect();

    match values.len() {
        0 => None,
        1 => values.into_iter().next().map(Candidate::One),
        _ => Some(Candidate::Many(values)),
    }
}

fn locale_from_cookie(req: &Request, key: &str) -> Option<Candidate> {
    req.headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name.trim() != key {
                return None;
            }
            let value = value.trim().trim_matches('"');
            let value = urlencoding::decode(value).map(|v| v.into_owned()).unwrap_or_else(|_| value.to_string());
            Some(Candidate::One(value))
        })
}

fn locale_from_header(req: &Request) -> Option<Candidate> {
    let header = req
        .headers()
        .get_all(ACCEPT_LANGUAGE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join(",");

    let languages = parse_accept_language(&header);
    (!languages.is_empty()).then_some(Candidate::Many(languages))
}

/// Language tags from an Accept-Language value, most preferred first.
///
/// Entries with `q=0`, the `*` wildcard and empty ranges are skipped;
/// equal weights keep header order.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut ranges: Vec<(String, f32)> = accept_language::parse_with_quality(header)
        .into_iter()
        .filter(|(tag, quality)| !tag.is_empty() && tag != "*" && *quality > 0.0)
        .collect();

    ranges.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranges.into_iter().map(|(tag, _)| tag).collect()
}
