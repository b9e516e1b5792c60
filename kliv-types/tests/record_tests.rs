use kliv_types::{Error, Record, ROW_ID, SYSTEM_FIELDS};
use pretty_assertions::assert_eq;
use serde_json::json;

fn sample_post() -> Record {
    Record::try_from(json!({
        "_row_id": 7,
        "title": "Bike for sale",
        "status": "active",
        "_created_at": 1_700_000_000,
        "_updated_at": "1700000100",
        "_deleted": 0,
        "_created_by": "user-1"
    }))
    .unwrap()
}

// ── System fields ───────────────────────────────────────────────

#[test]
fn system_field_accessors() {
    let post = sample_post();
    assert_eq!(post.row_id(), Some(&json!(7)));
    assert_eq!(post.created_at(), Some(1_700_000_000));
    assert_eq!(post.updated_at(), Some(1_700_000_100));
    assert_eq!(post.created_by(), Some("user-1"));
    assert!(!post.is_deleted());
}

#[test]
fn missing_system_fields_read_as_none() {
    let record = Record::new().with("title", "x");
    assert_eq!(record.row_id(), None);
    assert_eq!(record.created_at(), None);
    assert_eq!(record.created_by(), None);
    assert!(!record.is_deleted());
}

#[test]
fn deleted_flag_variants() {
    assert!(Record::new().with("_deleted", 1).is_deleted());
    assert!(Record::new().with("_deleted", true).is_deleted());
    assert!(Record::new().with("_deleted", "1").is_deleted());
    assert!(!Record::new().with("_deleted", "0").is_deleted());
    assert!(!Record::new().with("_deleted", false).is_deleted());
}

#[test]
fn user_fields_exclude_system_columns() {
    let post = sample_post();
    let keys: Vec<_> = post.user_fields().map(|(k, _)| k).collect();
    assert_eq!(keys, vec!["title", "status"]);
    assert!(SYSTEM_FIELDS.contains(&ROW_ID));
}

// ── Serialization ───────────────────────────────────────────────

#[test]
fn serialization_preserves_key_order() {
    let record = Record::new()
        .with("zeta", 1)
        .with("alpha", "two")
        .with("mid", json!({"nested": true}));
    let text = serde_json::to_string(&record).unwrap();
    assert_eq!(text, r#"{"zeta":1,"alpha":"two","mid":{"nested":true}}"#);
}

#[test]
fn deserializes_from_object() {
    let record: Record = serde_json::from_str(r#"{"b":1,"a":2}"#).unwrap();
    assert_eq!(record.keys().collect::<Vec<_>>(), vec!["b", "a"]);
}

#[test]
fn deserialize_rejects_non_object() {
    assert!(serde_json::from_str::<Record>("[1,2]").is_err());
}

#[test]
fn try_from_non_object_reports_kind() {
    let err = Record::try_from(json!([1])).unwrap_err();
    assert!(matches!(err, Error::NotAnObject("array")));
    assert!(err.to_string().contains("array"));
}

#[test]
fn from_serialize_accepts_struct() {
    #[derive(serde::Serialize)]
    struct Category {
        name: String,
        sort_order: u32,
    }
    let record = Record::from_serialize(&Category { name: "Jobs".into(), sort_order: 3 }).unwrap();
    assert_eq!(record.get_str("name"), Some("Jobs"));
    assert_eq!(record.get("sort_order"), Some(&json!(3)));
}

#[test]
fn from_serialize_rejects_scalar() {
    assert!(Record::from_serialize(&5).is_err());
}

// ── Mutation ────────────────────────────────────────────────────

#[test]
fn insert_and_remove() {
    let mut record = Record::new();
    assert_eq!(record.insert("a", 1), None);
    assert_eq!(record.insert("a", 2), Some(json!(1)));
    assert!(record.contains_key("a"));
    assert_eq!(record.remove("a"), Some(json!(2)));
    assert!(record.is_empty());
}

#[test]
fn into_value_roundtrip() {
    let post = sample_post();
    let value: serde_json::Value = post.clone().into();
    assert_eq!(Record::try_from(value).unwrap(), post);
}
