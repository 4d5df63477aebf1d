#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::{TimeZone, Utc};
use eventkit_fixtures::generated::contacts::types::{
    self, Contact, ContactKind, DEFAULT_GROUP, Folder,
};
use eventkit_fixtures::generated::secrets::types::Secret;

/// Stops compiling when `ContactKind` gains, loses or renames a member.
fn kind_label(kind: ContactKind) -> &'static str {
    match types::contact_kind_exhaustive_60eefc63(kind) {
        ContactKind::Person => "Person",
        ContactKind::Company => "Company",
    }
}

#[test]
fn test_enum_wire_values() {
    assert_eq!(ContactKind::ALL, [ContactKind::Person, ContactKind::Company]);
    assert_eq!(ContactKind::Company.as_str(), "company");
    assert_eq!(ContactKind::Person.to_string(), "person");
    assert_eq!(
        serde_json::to_string(&ContactKind::Company).unwrap(),
        "\"company\""
    );
    assert!(serde_json::from_str::<ContactKind>("\"Company\"").is_err());
    assert_eq!(kind_label(ContactKind::Person), "Person");
}

#[test]
fn test_string_const() {
    assert_eq!(DEFAULT_GROUP, "friends");
}

#[test]
fn test_nullable_and_list_fields() {
    let contact: Contact =
        serde_json::from_str(r#"{"kind":"company","name":"Acme","tags":["b2b"]}"#).unwrap();

    assert_eq!(contact.email, None);
    assert_eq!(contact.kind, ContactKind::Company);
    assert_eq!(contact.tags, vec!["b2b"]);
    assert!(serde_json::from_str::<Contact>(r#"{"kind":"company","name":"Acme"}"#).is_err());
}

#[test]
fn test_recursion_through_list() {
    let folder: Folder = serde_json::from_str(
        r#"{"name":"root","children":[{"name":"a","children":[{"name":"b","children":[]}]}]}"#,
    )
    .unwrap();

    assert_eq!(folder.children[0].children[0].name, "b");
}

#[test]
fn test_cross_module_and_datetime_fields() {
    let secret: Secret = serde_json::from_str(
        r#"{"title":"Gmail","created":"2024-01-02T03:04:05Z",
            "owner":{"email":null,"kind":"person","name":"Ann","tags":[]}}"#,
    )
    .unwrap();

    assert_eq!(
        secret.created,
        Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
    );
    assert_eq!(secret.owner.map(|o| o.name), Some("Ann".to_string()));
}
