use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::services::{DetectOptions, DetectionSource, LocaleMethod};
use crate::utils::ConfigError;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub i18n: I18nOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// Raw i18n settings as they appear in `config.toml` (`[i18n]` section).
///
/// Turned into a validated [`I18nConfig`] with [`I18nOptions::build`] or,
/// when custom detectors are needed, [`I18nOptions::into_builder`].
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct I18nOptions {
    /// Supported locales; must contain `default_locale`
    pub locales: Vec<String>,
    pub default_locale: String,
    /// Directory holding one `<locale><extension>` file per locale
    pub directory: PathBuf,
    /// The file content must be JSON regardless of the extension
    pub extension: String,
    /// Detection sources, searched in order
    /// (`subdomain`, `cookie`, `header`, `query`, `url`, `tld`)
    pub modes: Vec<String>,
    /// Unsupported locale -> supported locale, e.g. `zh-HK = "zh-TW"`
    pub mappings: HashMap<String, String>,
    /// Keep locale data in memory after the first successful load
    pub memory_cache: bool,
    /// Strip the locale segment from the path before routing: `/zh-CN/x` => `/x`
    pub rewrite: bool,
    /// Query parameter and cookie name read by the `query` and `cookie` modes
    pub key: String,
    /// Host labels that are not subdomains (`example.com` => 2)
    pub subdomain_offset: usize,
}

impl Default for I18nOptions {
    fn default() -> Self {
        Self {
            locales: vec!["zh-CN".to_string()],
            default_locale: "zh-CN".to_string(),
            directory: PathBuf::from("locales"),
            extension: ".json".to_string(),
            modes: Vec::new(),
            mappings: HashMap::new(),
            memory_cache: true,
            rewrite: true,
            key: "locale".to_string(),
            subdomain_offset: 2,
        }
    }
}

impl I18nOptions {
    pub fn into_builder(self) -> I18nConfigBuilder {
        let modes = self.modes.into_iter().map(Mode::Named).collect();
        I18nConfigBuilder { options: I18nOptions { modes: Vec::new(), ..self }, modes }
    }

    pub fn build(self) -> Result<I18nConfig, ConfigError> {
        self.into_builder().build()
    }
}

/// A `modes` entry before validation.
#[derive(Debug, Clone)]
enum Mode {
    Named(String),
    Custom(DetectionSource),
}

/// Programmatic construction of an [`I18nConfig`].
#[derive(Debug, Clone, Default)]
pub struct I18nConfigBuilder {
    options: I18nOptions,
    modes: Vec<Mode>,
}

impl I18nConfigBuilder {
    pub fn locales<I, L>(mut self, locales: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        self.options.locales = locales.into_iter().map(Into::into).collect();
        self
    }

    pub fn default_locale(mut self, locale: impl Into<String>) -> Self {
        self.options.default_locale = locale.into();
        self
    }

    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.options.directory = directory.into();
        self
    }

    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.options.extension = extension.into();
        self
    }

    /// Append a built-in mode by name.
    pub fn mode(mut self, name: impl Into<String>) -> Self {
        self.modes.push(Mode::Named(name.into()));
        self
    }

    /// Append a caller-supplied detector; it keeps its position among the named modes.
    pub fn detector<F>(mut self, name: impl Into<String>, detector: F) -> Self
    where
        F: Fn(&axum::extract::Request) -> Option<crate::services::Candidate> + Send + Sync + 'static,
    {
        self.modes.push(Mode::Custom(DetectionSource::custom(name, detector)));
        self
    }

    pub fn mapping(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.options.mappings.insert(from.into(), to.into());
        self
    }

    pub fn memory_cache(mut self, enabled: bool) -> Self {
        self.options.memory_cache = enabled;
        self
    }

    pub fn rewrite(mut self, enabled: bool) -> Self {
        self.options.rewrite = enabled;
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.options.key = key.into();
        self
    }

    pub fn subdomain_offset(mut self, offset: usize) -> Self {
        self.options.subdomain_offset = offset;
        self
    }

    /// Validate and freeze the configuration.
    ///
    /// Unknown mode names are dropped with a warning; an unsupported default
    /// locale or mapping target is an error.
    pub fn build(self) -> Result<I18nConfig, ConfigError> {
        let I18nConfigBuilder { options, modes } = self;

        let mut locales: Vec<String> = Vec::with_capacity(options.locales.len());
        for locale in options.locales {
            let locale = locale.trim().to_string();
            if locale.is_empty() || locale.contains(['/', '\\', '?', '#']) {
                return Err(ConfigError::InvalidLocale(locale));
            }
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }
        if locales.is_empty() {
            return Err(ConfigError::EmptyLocales);
        }

        if !locales.contains(&options.default_locale) {
            return Err(ConfigError::DefaultLocaleNotSupported(options.default_locale));
        }

        let mut mappings = HashMap::with_capacity(options.mappings.len());
        for (from, to) in options.mappings {
            if !locales.contains(&to) {
                return Err(ConfigError::MappingTargetNotSupported { from, to });
            }
            if locales.contains(&from) {
                tracing::warn!("Ignoring mapping '{}' -> '{}': '{}' is already supported", from, to, from);
                continue;
            }
            mappings.insert(from, to);
        }

        let mut sources: Vec<DetectionSource> = Vec::with_capacity(modes.len());
        for mode in modes {
            match mode {
                Mode::Named(name) => match LocaleMethod::from_name(&name) {
                    Some(method) => {
                        let duplicate = sources
                            .iter()
                            .any(|s| matches!(s, DetectionSource::Builtin(m) if *m == method));
                        if !duplicate {
                            sources.push(DetectionSource::Builtin(method));
                        }
                    },
                    None => tracing::warn!("Ignoring unknown locale detection mode '{}'", name),
                },
                Mode::Custom(source) => sources.push(source),
            }
        }

        Ok(I18nConfig {
            locales,
            default_locale: options.default_locale,
            directory: options.directory,
            extension: options.extension,
            sources,
            mappings,
            memory_cache: options.memory_cache,
            rewrite: options.rewrite,
            detect: DetectOptions { key: options.key, subdomain_offset: options.subdomain_offset },
        })
    }
}

/// Validated, immutable i18n configuration.
#[derive(Debug, Clone)]
pub struct I18nConfig {
    locales: Vec<String>,
    default_locale: String,
    directory: PathBuf,
    extension: String,
    sources: Vec<DetectionSource>,
    mappings: HashMap<String, String>,
    memory_cache: bool,
    rewrite: bool,
    detect: DetectOptions,
}

impl I18nConfig {
    pub fn builder() -> I18nConfigBuilder {
        I18nConfigBuilder::default()
    }

    pub fn locales(&self) -> &[String] {
        &self.locales
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Active detection sources in precedence order.
    pub fn sources(&self) -> &[DetectionSource] {
        &self.sources
    }

    pub fn mappings(&self) -> &HashMap<String, String> {
        &self.mappings
    }

    pub fn memory_cache(&self) -> bool {
        self.memory_cache
    }

    pub fn rewrite(&self) -> bool {
        self.rewrite
    }

    pub fn detect_options(&self) -> &DetectOptions {
        &self.detect
    }
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from the given path, or the first config.toml found
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load(path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let config_path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) => Self::from_toml(&path)?,
            None => {
                tracing::warn!("Configuration file not found, using defaults");
                Config::default()
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_LOG_LEVEL: Logging level (e.g., "info,i18n_middleware=debug")
    /// - APP_LOG_FILE: Log file path; empty disables file logging
    /// - APP_I18N_DIRECTORY: Locale data directory
    /// - APP_I18N_LOCALES: Comma separated supported locales
    /// - APP_I18N_DEFAULT_LOCALE
    /// - APP_I18N_MODES: Comma separated detection modes
    /// - APP_I18N_REWRITE / APP_I18N_MEMORY_CACHE: true/false
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Ok(port) = std::env::var("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Ok(file) = std::env::var("APP_LOG_FILE") {
            self.logging.file = (!file.trim().is_empty()).then_some(file);
            tracing::info!("Override logging.file from env: {:?}", self.logging.file);
        }

        if let Ok(directory) = std::env::var("APP_I18N_DIRECTORY") {
            self.i18n.directory = PathBuf::from(directory);
            tracing::info!("Override i18n.directory from env: {}", self.i18n.directory.display());
        }

        if let Ok(locales) = std::env::var("APP_I18N_LOCALES") {
            self.i18n.locales = split_list(&locales);
            tracing::info!("Override i18n.locales from env: {:?}", self.i18n.locales);
        }

        if let Ok(locale) = std::env::var("APP_I18N_DEFAULT_LOCALE") {
            self.i18n.default_locale = locale;
            tracing::info!("Override i18n.default_locale from env: {}", self.i18n.default_locale);
        }

        if let Ok(modes) = std::env::var("APP_I18N_MODES") {
            self.i18n.modes = split_list(&modes);
            tracing::info!("Override i18n.modes from env: {:?}", self.i18n.modes);
        }

        if let Ok(rewrite) = std::env::var("APP_I18N_REWRITE")
            && let Ok(val) = rewrite.parse()
        {
            self.i18n.rewrite = val;
            tracing::info!("Override i18n.rewrite from env: {}", self.i18n.rewrite);
        }

        if let Ok(cache) = std::env::var("APP_I18N_MEMORY_CACHE")
            && let Ok(val) = cache.parse()
        {
            self.i18n.memory_cache = val;
            tracing::info!("Override i18n.memory_cache from env: {}", self.i18n.memory_cache);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if !self.i18n.directory.is_dir() {
            tracing::warn!(
                "Locale directory {} does not exist; every locale will load empty",
                self.i18n.directory.display()
            );
        }

        // Surface i18n errors at startup rather than when the middleware is built
        self.i18n.clone().build()?;

        Ok(())
    }

    fn find_config_file() -> Option<PathBuf> {
        let possible_paths = ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        possible_paths.iter().map(PathBuf::from).find(|path| path.exists())
    }

    fn from_toml(path: &Path) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,i18n_middleware=debug".to_string(), file: None }
    }
}

fn split_list(input: &str) -> Vec<String> {
    input.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}
