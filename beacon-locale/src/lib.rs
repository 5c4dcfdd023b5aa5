pub mod error;
pub mod patch;
pub mod validate;

pub use error::LocaleError;
pub use patch::{PatchReport, patch_file, patch_quiz_results};
pub use validate::{DEFAULT_LANGUAGES, ValidationReport, load_keys, validate_locales};
