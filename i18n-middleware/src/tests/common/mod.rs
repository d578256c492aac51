// Common test utilities and helpers

use axum::{
    Router,
    body::{Body, to_bytes},
    extract::Request,
    http::StatusCode,
    response::Response,
    routing::get,
};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::I18nConfigBuilder;
use crate::middleware::I18n;
use crate::services::{Resolution, UnrewrittenUri};
use crate::utils::Translator;

/// Locale files shared by the scenario tests
pub struct LocaleFixtures {
    pub dir: TempDir,
}

impl LocaleFixtures {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let files = [
            (
                "en.json",
                r#"{"greeting":"Hello","locales":{"en":"English","zh-CN":"Chinese(Simplified)","zh-TW":"Chinese(Traditional)"}}"#,
            ),
            (
                "zh-CN.json",
                r#"{"greeting":"你好","locales":{"en":"英文","zh-CN":"简体中文","zh-TW":"繁体中文"}}"#,
            ),
            (
                "zh-TW.json",
                r#"{"greeting":"您好","locales":{"en":"英文(繁體)","zh-CN":"簡體中文","zh-TW":"繁體中文"}}"#,
            ),
        ];
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).expect("Failed to write locale fixture");
        }
        Self { dir }
    }

    /// Builder pre-filled with the fixture directory and `zh-CN`, `en`, `zh-TW`
    pub fn builder(&self) -> I18nConfigBuilder {
        crate::config::I18nConfig::builder()
            .directory(self.dir.path())
            .locales(["zh-CN", "en", "zh-TW"])
            .default_locale("zh-CN")
    }
}

pub fn i18n(builder: I18nConfigBuilder) -> I18n {
    I18n::new(builder.build().expect("Invalid test config")).expect("Failed to install i18n")
}

/// Routes used by most scenarios:
/// - `/t/{key}` translates `key`
/// - `/state` prints `<locale>|<detected>|<source>`
/// - `/path` and `/foo` echo the path the handler saw
/// - `/fail` answers 500 after reading the path
pub fn routes() -> Router {
    Router::new()
        .route(
            "/t/:key",
            get(|t: Translator, axum::extract::Path(key): axum::extract::Path<String>| async move { t.t(&key) }),
        )
        .route(
            "/state",
            get(|r: Resolution| async move {
                format!(
                    "{}|{}|{}",
                    r.locale,
                    r.detected.map(|d| d.to_string()).unwrap_or_default(),
                    r.source.unwrap_or_default()
                )
            }),
        )
        .route("/path", get(|req: Request| async move { req.uri().path().to_string() }))
        .route("/foo", get(|req: Request| async move { req.uri().path().to_string() }))
        .route(
            "/fail",
            get(|req: Request| async move {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("failed at {}", req.uri().path()))
            }),
        )
}

pub fn app(builder: I18nConfigBuilder) -> Router {
    i18n(builder).localize(routes())
}

pub fn get_request(uri: &str) -> axum::http::request::Builder {
    Request::builder().method("GET").uri(uri)
}

pub async fn send(app: Router, request: axum::http::request::Builder) -> Response {
    app.oneshot(request.body(Body::empty()).expect("Invalid request"))
        .await
        .expect("Router is infallible")
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}

/// Status and body of a GET
pub async fn get_text(app: Router, request: axum::http::request::Builder) -> (StatusCode, String) {
    let response = send(app, request).await;
    (response.status(), body_text(response).await)
}

pub fn unrewritten_path(response: &Response) -> Option<String> {
    response.extensions().get::<UnrewrittenUri>().map(|uri| uri.0.path().to_string())
}
