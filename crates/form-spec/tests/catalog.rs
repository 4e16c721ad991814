use serde_json::json;

use form_spec::{CatalogError, QuestionCatalog, QuestionKind};

fn fixture() -> &'static str {
    include_str!("../tests/fixtures/sample_catalog.json")
}

#[test]
fn sample_catalog_parses_in_order() {
    let catalog = QuestionCatalog::from_json_str(fixture()).expect("catalog");
    let ids: Vec<_> = catalog.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["hair_type", "concerns", "guide", "email", "scalp_photo"]
    );
    assert_eq!(catalog.title(), Some("Hair care questionnaire"));
    assert_eq!(catalog.len(), 5);
    assert_eq!(catalog.last_index(), 4);
    assert_eq!(catalog.position("email"), Some(3));
    assert!(catalog.find("missing").is_none());
}

#[test]
fn upload_overrides_replace_defaults() {
    let catalog = QuestionCatalog::from_json_str(fixture()).expect("catalog");
    let question = catalog.find("scalp_photo").expect("question");
    match &question.kind {
        QuestionKind::ImageUpload {
            max_size_mb,
            accepted_formats,
        } => {
            assert_eq!(*max_size_mb, 2.0);
            assert_eq!(accepted_formats.len(), 2);
        }
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn duplicate_ids_are_rejected() {
    let doc = json!({
        "questions": [
            { "id": "q1", "type": "input", "title": "First" },
            { "id": "q1", "type": "input", "title": "Again" }
        ]
    });
    let err = QuestionCatalog::from_json_str(&doc.to_string()).expect_err("duplicate");
    assert!(matches!(err, CatalogError::DuplicateId(id) if id == "q1"));
}

#[test]
fn empty_ids_are_rejected() {
    let doc = json!({
        "questions": [ { "id": " ", "type": "input", "title": "Blank" } ]
    });
    let err = QuestionCatalog::from_json_str(&doc.to_string()).expect_err("empty id");
    assert!(matches!(err, CatalogError::EmptyId(0)));
}

#[test]
fn broken_patterns_are_rejected_at_load() {
    let doc = json!({
        "questions": [
            {
                "id": "code",
                "type": "input",
                "title": "Code",
                "validation": { "pattern": "([a-z" }
            }
        ]
    });
    let err = QuestionCatalog::from_json_str(&doc.to_string()).expect_err("bad pattern");
    assert!(matches!(
        err,
        CatalogError::InvalidPattern { question_id, .. } if question_id == "code"
    ));
}

#[test]
fn repeated_option_values_are_rejected() {
    let doc = json!({
        "questions": [
            {
                "id": "pick",
                "type": "single-choice",
                "title": "Pick",
                "options": [
                    { "id": "a", "label": "A", "value": "same" },
                    { "id": "b", "label": "B", "value": "same" }
                ]
            }
        ]
    });
    let err = QuestionCatalog::from_json_str(&doc.to_string()).expect_err("duplicate option");
    assert!(matches!(err, CatalogError::DuplicateOption { value, .. } if value == "same"));
}

#[test]
fn unknown_question_type_fails_to_parse() {
    let doc = json!({
        "questions": [ { "id": "q1", "type": "slider", "title": "Slide" } ]
    });
    let err = QuestionCatalog::from_json_str(&doc.to_string()).expect_err("unknown type");
    assert!(matches!(err, CatalogError::Parse(_)));
}

#[test]
fn catalog_serializes_back_to_document_shape() {
    let catalog = QuestionCatalog::from_json_str(fixture()).expect("catalog");
    let value = serde_json::to_value(&catalog).expect("serialize");
    assert_eq!(value["questions"][1]["maxSelections"], 2);
    assert_eq!(value["questions"][4]["maxSizeMB"], 2.0);
    let reparsed: QuestionCatalog = serde_json::from_value(value).expect("reparse");
    assert_eq!(reparsed, catalog);
}
