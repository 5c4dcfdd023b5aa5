use crate::error::{LocaleError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Languages the translation set ships with.
pub const DEFAULT_LANGUAGES: &[&str] = &[
    "en", "es", "fr", "de", "it", "pt", "ru", "zh", "ja", "ar", "hi",
];

/// Missing dotted keys per language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub missing: BTreeMap<String, Vec<String>>,
    pub checked_keys: usize,
}

impl ValidationReport {
    pub fn total_missing(&self) -> usize {
        self.missing.values().map(Vec::len).sum()
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Load a newline-delimited list of dotted translation keys.
pub fn load_keys(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Walk a dotted key path through nested objects.
pub fn key_exists(doc: &Value, dotted: &str) -> bool {
    let mut current = doc;
    for part in dotted.split('.') {
        match current.get(part) {
            Some(next) => current = next,
            None => return false,
        }
    }
    true
}

/// Check every key against every `<lang>.json` file in `locales_dir`.
///
/// A missing or malformed locale file is fatal; a missing key is a finding.
pub fn validate_locales(
    locales_dir: &Path,
    languages: &[String],
    keys: &[String],
) -> Result<ValidationReport> {
    let mut report = ValidationReport {
        checked_keys: keys.len(),
        ..Default::default()
    };

    for language in languages {
        let path = locales_dir.join(format!("{language}.json"));
        if !path.exists() {
            return Err(LocaleError::MissingFile(path.display().to_string()));
        }

        let raw = fs::read_to_string(&path)?;
        let doc: Value = serde_json::from_str(&raw)?;

        let missing: Vec<String> = keys
            .iter()
            .filter(|key| !key_exists(&doc, key))
            .cloned()
            .collect();

        debug!(
            "{}: {} of {} keys missing",
            language,
            missing.len(),
            keys.len()
        );

        if !missing.is_empty() {
            report.missing.insert(language.clone(), missing);
        }
    }

    Ok(report)
}
