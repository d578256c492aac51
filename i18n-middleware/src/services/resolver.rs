//! Locale resolution
//!
//! Precedence is locale-first: supported locales are tried in configured
//! order, and for each one every active source is checked in declared
//! order. The first hit wins, so locale order dominates source order. When
//! nothing matches, the first non-empty candidate (the "detected" value) is
//! looked up in the mapping table, and failing that the default locale is
//! used.

use std::collections::BTreeMap;

use serde::Serialize;

use super::detection::{Candidate, LocaleMethod};
use crate::config::I18nConfig;

/// Candidate produced by one active source, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceCandidate {
    pub source: String,
    pub candidate: Option<Candidate>,
}

impl SourceCandidate {
    pub fn new(source: impl Into<String>, candidate: Option<Candidate>) -> Self {
        Self { source: source.into(), candidate }
    }
}

/// How the effective locale was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    /// A source candidate equals (or contains) a supported locale.
    Match,
    /// The detected value was mapped onto a supported locale.
    Mapping,
    /// Nothing usable; the default locale.
    Default,
}

/// Per-request outcome, attached to the request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// Effective locale, always one of the configured locales.
    pub locale: String,
    /// First non-empty candidate among the active sources.
    pub detected: Option<Candidate>,
    /// Source that decided the locale; `None` when the default was used.
    pub source: Option<String>,
    pub resolved_by: ResolvedBy,
    /// Active sources and their candidates, in declared order.
    pub candidates: Vec<SourceCandidate>,
    /// Every built-in method's candidate, whether active or not.
    pub locale_map: BTreeMap<LocaleMethod, Option<Candidate>>,
}

/// Pick the effective locale from the candidates of the active sources.
pub fn resolve(
    config: &I18nConfig,
    candidates: Vec<SourceCandidate>,
    locale_map: BTreeMap<LocaleMethod, Option<Candidate>>,
) -> Resolution {
    let detected = candidates
        .iter()
        .find_map(|entry| entry.candidate.as_ref().map(|candidate| (entry.source.clone(), candidate.clone())));

    let matched = config.locales().iter().find_map(|locale| {
        candidates
            .iter()
            .find(|entry| entry.candidate.as_ref().is_some_and(|candidate| candidate.matches(locale)))
            .map(|entry| (locale.clone(), entry.source.clone()))
    });

    let (locale, source, resolved_by) = match (matched, &detected) {
        (Some((locale, source)), _) => (locale, Some(source), ResolvedBy::Match),
        (None, Some((source, value))) => match map_detected(config, value) {
            Some(mapped) => (mapped, Some(source.clone()), ResolvedBy::Mapping),
            None => (config.default_locale().to_string(), None, ResolvedBy::Default),
        },
        (None, None) => (config.default_locale().to_string(), None, ResolvedBy::Default),
    };

    tracing::debug!(
        "Resolved locale {} ({:?}, source={:?}, detected={:?})",
        locale,
        resolved_by,
        source,
        detected.as_ref().map(|(_, value)| value.to_string())
    );

    Resolution {
        locale,
        detected: detected.map(|(_, value)| value),
        source,
        resolved_by,
        candidates,
        locale_map,
    }
}

/// Mapping target for the detected value; list entries are tried in preference order.
fn map_detected(config: &I18nConfig, detected: &Candidate) -> Option<String> {
    detected.values().find_map(|value| config.mappings().get(value).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> I18nConfig {
        I18nConfig::builder()
            .locales(["zh-CN", "en", "zh-TW"])
            .default_locale("zh-CN")
            .mapping("zh-HK", "zh-TW")
            .mapping("en-US", "en")
            .build()
            .unwrap()
    }

    fn one(source: &str, value: &str) -> SourceCandidate {
        SourceCandidate::new(source, Some(Candidate::from(value)))
    }

    fn many(source: &str, values: &[&str]) -> SourceCandidate {
        SourceCandidate::new(source, Some(Candidate::Many(values.iter().map(|v| v.to_string()).collect())))
    }

    fn none(source: &str) -> SourceCandidate {
        SourceCandidate::new(source, None)
    }

    fn run(candidates: Vec<SourceCandidate>) -> Resolution {
        resolve(&config(), candidates, BTreeMap::new())
    }

    #[test]
    fn test_no_candidates_falls_back_to_default() {
        let resolution = run(vec![none("cookie"), none("header")]);
        assert_eq!(resolution.locale, "zh-CN");
        assert_eq!(resolution.detected, None);
        assert_eq!(resolution.source, None);
        assert_eq!(resolution.resolved_by, ResolvedBy::Default);

        let resolution = run(vec![]);
        assert_eq!(resolution.locale, "zh-CN");
        assert_eq!(resolution.detected, None);
    }

    #[test]
    fn test_single_source_selects_each_supported_locale() {
        for locale in ["zh-CN", "en", "zh-TW"] {
            let resolution = run(vec![one("query", locale)]);
            assert_eq!(resolution.locale, locale);
            assert_eq!(resolution.source.as_deref(), Some("query"));
            assert_eq!(resolution.resolved_by, ResolvedBy::Match);
        }
    }

    #[test]
    fn test_unsupported_value_uses_mapping() {
        let resolution = run(vec![one("header", "zh-HK")]);
        assert_eq!(resolution.locale, "zh-TW");
        assert_eq!(resolution.detected, Some(Candidate::from("zh-HK")));
        assert_eq!(resolution.source.as_deref(), Some("header"));
        assert_eq!(resolution.resolved_by, ResolvedBy::Mapping);
    }

    #[test]
    fn test_unsupported_unmapped_value_uses_default() {
        let resolution = run(vec![one("query", "fr")]);
        assert_eq!(resolution.locale, "zh-CN");
        assert_eq!(resolution.detected, Some(Candidate::from("fr")));
        assert_eq!(resolution.source, None);
        assert_eq!(resolution.resolved_by, ResolvedBy::Default);
    }

    #[test]
    fn test_list_candidate_matches_by_containment() {
        let resolution = run(vec![many("header", &["fr", "de", "en", "ja"])]);
        assert_eq!(resolution.locale, "en");
        assert_eq!(resolution.source.as_deref(), Some("header"));
    }

    #[test]
    fn test_locale_order_dominates_source_order() {
        // header is declared first but `zh-CN` precedes `en` in the locale list
        let resolution = run(vec![one("header", "en"), one("cookie", "zh-CN")]);
        assert_eq!(resolution.locale, "zh-CN");
        assert_eq!(resolution.source.as_deref(), Some("cookie"));
        assert_eq!(resolution.detected, Some(Candidate::from("en")));
    }

    #[test]
    fn test_source_order_breaks_ties_for_the_same_locale() {
        let resolution = run(vec![one("cookie", "en"), many("header", &["en"])]);
        assert_eq!(resolution.locale, "en");
        assert_eq!(resolution.source.as_deref(), Some("cookie"));
    }

    #[test]
    fn test_detected_is_first_non_empty_candidate() {
        let resolution = run(vec![none("subdomain"), one("url", "fr"), one("query", "en")]);
        assert_eq!(resolution.detected, Some(Candidate::from("fr")));
        assert_eq!(resolution.locale, "en");
    }

    #[test]
    fn test_mapping_only_consults_detected_value() {
        // `zh-HK` is not the first non-empty candidate, so it is never mapped
        let resolution = run(vec![one("url", "fr"), one("query", "zh-HK")]);
        assert_eq!(resolution.locale, "zh-CN");
        assert_eq!(resolution.resolved_by, ResolvedBy::Default);
    }

    #[test]
    fn test_list_detected_value_maps_first_mapped_entry() {
        let resolution = run(vec![many("header", &["fr", "en-US", "zh-HK"])]);
        assert_eq!(resolution.locale, "en");
        assert_eq!(resolution.resolved_by, ResolvedBy::Mapping);
    }

    #[test]
    fn test_effective_locale_is_always_supported() {
        let config = config();
        let inputs = [
            vec![one("query", "en")],
            vec![one("query", "xx")],
            vec![many("header", &["zh-HK"])],
            vec![none("cookie")],
            vec![one("url", "api"), one("query", "zh-TW")],
        ];
        for candidates in inputs {
            let resolution = resolve(&config, candidates, BTreeMap::new());
            assert!(config.locales().contains(&resolution.locale), "{}", resolution.locale);
        }
    }
}
