pub mod error;
pub mod i18n;

pub use error::{ConfigError, ErrorResponse, I18nError, I18nResult, LoadError};
pub use i18n::{LocaleData, Translator};
