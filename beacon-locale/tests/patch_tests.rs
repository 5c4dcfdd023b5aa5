// Tests for locale file patching

use beacon_locale::patch::patch_file;
use std::fs;
use std::io::Write;
use tempfile::NamedTempFile;

const SAMPLE: &str = r#"{
  "quizzes": {
    "relationshipQuiz": {
      "title": "Beziehungsquiz",
      "results": {
        "thriving": { "title": "Blühend" },
        "solid": { "title": "Solide" },
        "developing": { "title": "In Entwicklung" },
        "challenging": { "title": "Herausfordernd" }
      }
    }
  }
}
"#;

#[test]
fn test_patch_file_inserts_and_backfills() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", SAMPLE).unwrap();

    let report = patch_file(file.path()).unwrap();
    assert!(report.added_perfect_match);
    assert_eq!(
        report.backfilled_messages,
        vec!["thriving", "solid", "developing", "challenging"]
    );

    let written = fs::read_to_string(file.path()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&written).unwrap();
    let results = &doc["quizzes"]["relationshipQuiz"]["results"];
    assert_eq!(results["perfectMatch"]["title"], "Perfekte Übereinstimmung 🌟");
    assert_eq!(
        results["challenging"]["message"],
        "Herausfordernde Beziehung! Ihre Beziehung steht vor erheblichen Herausforderungen."
    );
}

#[test]
fn test_patch_file_preserves_non_ascii_unescaped() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", SAMPLE).unwrap();

    patch_file(file.path()).unwrap();

    let written = fs::read_to_string(file.path()).unwrap();
    assert!(written.contains("Perfekte Übereinstimmung 🌟"));
    assert!(written.contains("Blühende Beziehung!"));
    assert!(!written.contains("\\u"));
}

#[test]
fn test_patch_file_twice_yields_identical_bytes() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", SAMPLE).unwrap();

    let first = patch_file(file.path()).unwrap();
    assert!(first.changed_anything());
    let after_first = fs::read_to_string(file.path()).unwrap();

    let second = patch_file(file.path()).unwrap();
    assert!(!second.changed_anything());
    let after_second = fs::read_to_string(file.path()).unwrap();

    assert_eq!(after_first, after_second);
}

#[test]
fn test_patch_file_key_order_survives_rewrite() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", SAMPLE).unwrap();

    patch_file(file.path()).unwrap();

    let written = fs::read_to_string(file.path()).unwrap();
    // Input order is kept; the new entry lands at the end of the results block.
    let thriving = written.find("\"thriving\"").unwrap();
    let solid = written.find("\"solid\"").unwrap();
    let perfect = written.find("\"perfectMatch\"").unwrap();
    assert!(thriving < solid);
    assert!(solid < perfect);
}

#[test]
fn test_patch_file_missing_file_is_fatal() {
    let result = patch_file(std::path::Path::new("does/not/exist.json"));
    assert!(result.is_err());
}

#[test]
fn test_patch_file_malformed_json_is_fatal() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{ not json").unwrap();

    let result = patch_file(file.path());
    assert!(result.is_err());
}
