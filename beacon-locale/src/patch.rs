use crate::error::{LocaleError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Quiz whose results block the patch targets.
const QUIZ_KEY: &str = "relationshipQuiz";

/// Result entry inserted when missing.
const PERFECT_MATCH_KEY: &str = "perfectMatch";

/// Fixed `message` strings for result entries that predate the field.
const RESULT_MESSAGES: &[(&str, &str)] = &[
    (
        "thriving",
        "Blühende Beziehung! Sie haben eine gesunde, unterstützende Partnerschaft aufgebaut.",
    ),
    (
        "solid",
        "Solide Beziehung! Sie haben eine starke Beziehung mit kleineren Bereichen zur Verbesserung.",
    ),
    (
        "developing",
        "Sich Entwickelnde Beziehung! Ihre Beziehung hat Potenzial, aber mehrere Bereiche brauchen Aufmerksamkeit.",
    ),
    (
        "challenging",
        "Herausfordernde Beziehung! Ihre Beziehung steht vor erheblichen Herausforderungen.",
    ),
];

fn perfect_match_entry() -> Value {
    json!({
        "title": "Perfekte Übereinstimmung 🌟",
        "description": "Sie haben eine außergewöhnliche Beziehung mit starker Ausrichtung in allen Bereichen. Ihre Verbindung ist tiefgreifend und ausgewogen.",
        "message": "Perfekte Übereinstimmung! Ihre Beziehung zeigt starke Grundlagen in allen Kernbereichen.",
        "strengths": [
            "Herausragende Kommunikation über Ziele",
            "Vollständiges Vertrauen und Verständnis",
            "Perfekt abgestimmte Zukunftsziele",
            "Natürliche Konfliktlösung",
        ],
        "tips": [
            "Pflegen Sie diese schöne Verbindung",
            "Teilen Sie Ihre Erkenntnisse mit anderen Paaren",
            "Bleiben Sie dankbar für das, was Sie haben",
            "Wachsen Sie weiterhin zusammen",
        ],
    })
}

/// What a patch run changed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatchReport {
    pub added_perfect_match: bool,
    pub backfilled_messages: Vec<String>,
}

impl PatchReport {
    pub fn changed_anything(&self) -> bool {
        self.added_perfect_match || !self.backfilled_messages.is_empty()
    }
}

/// Apply the quiz-results patch to a loaded locale document.
///
/// The document must contain a `quizzes` object. When it holds a
/// `relationshipQuiz` with a `results` object that lacks `perfectMatch`, the
/// fixed entry is inserted and the `message` field is backfilled on the four
/// known sibling entries. A results block that already carries `perfectMatch`
/// is left entirely alone, so re-running the patch is a no-op. Siblings that
/// do not exist are never created.
pub fn patch_quiz_results(doc: &mut Value) -> Result<PatchReport> {
    let quizzes = doc
        .get_mut("quizzes")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            LocaleError::UnexpectedStructure("document has no `quizzes` object".to_string())
        })?;

    let mut report = PatchReport::default();

    let Some(results) = quizzes
        .get_mut(QUIZ_KEY)
        .and_then(|quiz| quiz.get_mut("results"))
        .and_then(Value::as_object_mut)
    else {
        debug!("No {} results block, nothing to patch", QUIZ_KEY);
        return Ok(report);
    };

    if results.contains_key(PERFECT_MATCH_KEY) {
        debug!("{} already present, leaving results alone", PERFECT_MATCH_KEY);
        return Ok(report);
    }

    results.insert(PERFECT_MATCH_KEY.to_string(), perfect_match_entry());
    report.added_perfect_match = true;

    for (key, message) in RESULT_MESSAGES {
        if let Some(entry) = results.get_mut(*key).and_then(Value::as_object_mut)
            && !entry.contains_key("message")
        {
            entry.insert("message".to_string(), Value::String((*message).to_string()));
            report.backfilled_messages.push((*key).to_string());
        }
    }

    Ok(report)
}

/// Load, patch and rewrite a locale file in place.
///
/// The file is rewritten pretty-printed even when nothing changed.
/// serde_json leaves non-ASCII characters unescaped, so the German strings
/// survive byte-for-byte.
pub fn patch_file(path: &Path) -> Result<PatchReport> {
    info!("Patching locale file {}", path.display());

    let raw = fs::read_to_string(path)?;
    let mut doc: Value = serde_json::from_str(&raw)?;

    let report = patch_quiz_results(&mut doc)?;

    let mut out = serde_json::to_string_pretty(&doc)?;
    out.push('\n');
    fs::write(path, out)?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_document() -> Value {
        json!({
            "quizzes": {
                "relationshipQuiz": {
                    "title": "Beziehungsquiz",
                    "results": {
                        "thriving": { "title": "Blühend" },
                        "solid": { "title": "Solide", "message": "schon vorhanden" },
                        "developing": { "title": "In Entwicklung" },
                        "challenging": { "title": "Herausfordernd" },
                    },
                },
            },
        })
    }

    #[test]
    fn test_inserts_perfect_match_when_absent() {
        let mut doc = full_document();
        let report = patch_quiz_results(&mut doc).unwrap();

        assert!(report.added_perfect_match);
        let entry = &doc["quizzes"]["relationshipQuiz"]["results"]["perfectMatch"];
        assert_eq!(entry["title"], "Perfekte Übereinstimmung 🌟");
        assert_eq!(entry["strengths"].as_array().unwrap().len(), 4);
        assert_eq!(entry["tips"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_backfills_messages_without_clobbering() {
        let mut doc = full_document();
        let report = patch_quiz_results(&mut doc).unwrap();

        // `solid` already carried a message and keeps it.
        assert_eq!(
            report.backfilled_messages,
            vec!["thriving", "developing", "challenging"]
        );
        let results = &doc["quizzes"]["relationshipQuiz"]["results"];
        assert_eq!(results["solid"]["message"], "schon vorhanden");
        assert_eq!(
            results["thriving"]["message"],
            "Blühende Beziehung! Sie haben eine gesunde, unterstützende Partnerschaft aufgebaut."
        );
    }

    #[test]
    fn test_existing_perfect_match_left_unchanged() {
        // Even the message backfill stays off once perfectMatch is present.
        let mut doc = json!({
            "quizzes": {
                "relationshipQuiz": {
                    "results": {
                        "perfectMatch": { "title": "bereits da" },
                        "thriving": { "title": "Blühend" },
                    },
                },
            },
        });
        let before = doc.clone();

        let report = patch_quiz_results(&mut doc).unwrap();
        assert!(!report.added_perfect_match);
        assert!(report.backfilled_messages.is_empty());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_minimal_document_gains_only_thriving_message() {
        let mut doc = json!({
            "quizzes": {
                "relationshipQuiz": {
                    "results": {
                        "thriving": { "title": "Blühend" },
                    },
                },
            },
        });

        let report = patch_quiz_results(&mut doc).unwrap();
        assert_eq!(report.backfilled_messages, vec!["thriving"]);

        let results = doc["quizzes"]["relationshipQuiz"]["results"]
            .as_object()
            .unwrap();
        assert_eq!(
            results["thriving"]["message"],
            "Blühende Beziehung! Sie haben eine gesunde, unterstützende Partnerschaft aufgebaut."
        );
        // No other sibling keys get created.
        let mut keys: Vec<&str> = results.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["perfectMatch", "thriving"]);
    }

    #[test]
    fn test_patch_is_idempotent() {
        let mut doc = full_document();
        patch_quiz_results(&mut doc).unwrap();
        let after_first = doc.clone();

        let report = patch_quiz_results(&mut doc).unwrap();
        assert!(!report.changed_anything());
        assert_eq!(doc, after_first);
    }

    #[test]
    fn test_missing_quizzes_object_is_fatal() {
        let mut doc = json!({ "settings": {} });
        let result = patch_quiz_results(&mut doc);
        assert!(matches!(
            result,
            Err(LocaleError::UnexpectedStructure(_))
        ));
    }

    #[test]
    fn test_missing_quiz_is_a_no_op() {
        let mut doc = json!({ "quizzes": { "otherQuiz": { "results": {} } } });
        let before = doc.clone();

        let report = patch_quiz_results(&mut doc).unwrap();
        assert!(!report.changed_anything());
        assert_eq!(doc, before);
    }
}
