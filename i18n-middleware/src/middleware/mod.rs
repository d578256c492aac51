pub mod locale;

pub use locale::{I18n, i18n_middleware};
