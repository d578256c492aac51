//! Locale detection middleware
//!
//! Resolves the effective locale for each request, binds a [`Translator`]
//! to it and, when rewriting is enabled, strips the locale segment from
//! the path before handing the request on.
//!
//! Rewriting has to happen before routing, so the middleware wraps the
//! router instead of being added with `Router::layer`:
//!
//! ```rust,ignore
//! let i18n = I18n::new(config)?;
//! let app = i18n.localize(Router::new().route("/users", get(list_users)));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use tower::Layer;

use crate::config::I18nConfig;
use crate::services::{
    Candidate, DetectionSource, LocaleLoader, LocaleMethod, PathRewriter, Resolution, SourceCandidate, UnrewrittenUri,
    resolve,
};
use crate::utils::{ConfigError, Translator};

/// Shared handle to an installed i18n configuration.
#[derive(Clone)]
pub struct I18n {
    inner: Arc<I18nInner>,
}

struct I18nInner {
    config: I18nConfig,
    loader: LocaleLoader,
    rewriter: PathRewriter,
}

impl I18n {
    pub fn new(config: I18nConfig) -> Result<Self, ConfigError> {
        let rewriter = PathRewriter::new(config.locales())?;
        let loader = LocaleLoader::new(config.directory(), config.extension(), config.memory_cache());

        tracing::info!(
            "i18n installed: locales={:?}, default={}, modes={:?}, rewrite={}",
            config.locales(),
            config.default_locale(),
            config.sources().iter().map(|s| s.name()).collect::<Vec<_>>(),
            config.rewrite()
        );

        Ok(Self { inner: Arc::new(I18nInner { config, loader, rewriter }) })
    }

    pub fn config(&self) -> &I18nConfig {
        &self.inner.config
    }

    pub fn loader(&self) -> &LocaleLoader {
        &self.inner.loader
    }

    /// Candidates of the active sources, in declared order.
    pub fn detect(&self, req: &Request) -> Vec<SourceCandidate> {
        let options = self.config().detect_options();
        self.config()
            .sources()
            .iter()
            .map(|source| SourceCandidate::new(source.name(), source.detect(req, options)))
            .collect()
    }

    /// Candidates of every built-in method, active or not.
    pub fn locale_map(&self, req: &Request) -> BTreeMap<LocaleMethod, Option<Candidate>> {
        let options = self.config().detect_options();
        LocaleMethod::ALL.into_iter().map(|method| (method, method.detect(req, options))).collect()
    }

    /// Resolve the request locale, running each built-in accessor once.
    pub fn resolve(&self, req: &Request) -> Resolution {
        let locale_map = self.locale_map(req);
        let options = self.config().detect_options();
        let candidates = self
            .config()
            .sources()
            .iter()
            .map(|source| {
                let candidate = match source {
                    DetectionSource::Builtin(method) => locale_map.get(method).cloned().flatten(),
                    DetectionSource::Custom { .. } => source.detect(req, options),
                };
                SourceCandidate::new(source.name(), candidate)
            })
            .collect();
        resolve(self.config(), candidates, locale_map)
    }

    pub async fn translator(&self, locale: &str) -> Translator {
        Translator::load(locale, self.loader()).await
    }

    /// Wrap `router` so every request passes through [`i18n_middleware`] before routing.
    pub fn localize(&self, router: Router) -> Router {
        let service = middleware::from_fn_with_state(self.clone(), i18n_middleware).layer(router);
        Router::new().fallback_service(service)
    }
}

/// Middleware resolving the request locale and exposing it to handlers
///
/// 1. Collect candidates from the active detection sources
/// 2. Resolve the effective locale and store the [`Resolution`] in request extensions
/// 3. Store a [`Translator`] bound to the locale in request extensions
/// 4. Strip the `/<locale>` path prefix when rewriting is enabled
pub async fn i18n_middleware(State(i18n): State<I18n>, mut req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let resolution = i18n.resolve(&req);
    tracing::debug!(
        "i18n middleware {} {}: locale={} source={:?}",
        method,
        uri,
        resolution.locale,
        resolution.source
    );

    let translator = i18n.translator(&resolution.locale).await;
    let rewritten = if i18n.config().rewrite() {
        i18n.inner.rewriter.rewrite_uri(&uri, &resolution.locale)
    } else {
        None
    };

    req.extensions_mut().insert(resolution);
    req.extensions_mut().insert(translator);

    let Some(rewritten) = rewritten else {
        return next.run(req).await;
    };

    tracing::debug!("Rewriting {} -> {}", uri.path(), rewritten.path());
    *req.uri_mut() = rewritten;
    req.extensions_mut().insert(UnrewrittenUri(uri.clone()));

    // Error responses come back through here as well
    let mut response = next.run(req).await;
    response.extensions_mut().insert(UnrewrittenUri(uri));
    response
}
