//! Schema model: the declarative definition every emitter consumes.
//!
//! A schema module is a directory holding up to three JSON documents:
//! - `types.json`: string constants, enums, named types and REST endpoints
//! - `commands.json`: command specs
//! - `events.json`: event specs
//!
//! The model is immutable once loaded. [`validate`] checks every invariant the
//! emitters rely on, so rendering never meets an unresolvable name.

mod load;
mod validate;

pub use load::{load_module, load_schema_dir};
pub use validate::{validate_module, validate_schema_set};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::SchemaError;
use crate::naming::{is_identifier, to_pascal_case, to_snake_case};

/// Recursive type node. Exactly one of primitive name, custom name, list or
/// object determines its shape; see [`DatatypeDef::shape`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatatypeDef {
    #[serde(rename = "_")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of: Option<Box<DatatypeDef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, DatatypeDef>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Boolean,
    Integer,
    Datetime,
}

/// Reference to a named type or enum, optionally qualified by module id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomRef<'a> {
    pub module: Option<&'a str>,
    pub name: &'a str,
}

impl CustomRef<'_> {
    /// Whether the reference points into `module_id`.
    pub fn is_local_to(&self, module_id: &str) -> bool {
        self.module.is_none_or(|m| m == module_id)
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Shape<'a> {
    Primitive(Primitive),
    List(&'a DatatypeDef),
    Object(&'a BTreeMap<String, DatatypeDef>),
    Custom(CustomRef<'a>),
}

impl DatatypeDef {
    pub fn primitive(name: &str) -> Self {
        Self {
            name: name.to_string(),
            of: None,
            fields: None,
            nullable: false,
        }
    }

    pub fn list_of(of: Self) -> Self {
        Self {
            name: "list".into(),
            of: Some(Box::new(of)),
            fields: None,
            nullable: false,
        }
    }

    pub fn object(fields: impl IntoIterator<Item = (String, Self)>) -> Self {
        Self {
            name: "object".into(),
            of: None,
            fields: Some(fields.into_iter().collect()),
            nullable: false,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Classify this node, rejecting combinations that have no single shape.
    pub fn shape(&self) -> Result<Shape<'_>, SchemaError> {
        let malformed = |reason| SchemaError::MalformedDatatype {
            name: self.name.clone(),
            reason,
        };

        match (self.name.as_str(), self.of.as_deref(), self.fields.as_ref()) {
            ("list", Some(of), None) => Ok(Shape::List(of)),
            ("list", None, _) => Err(malformed("list requires \"of\"")),
            ("list", Some(_), Some(_)) => Err(malformed("list cannot have \"fields\"")),
            ("object", None, Some(fields)) => Ok(Shape::Object(fields)),
            ("object", _, None) => Err(malformed("object requires \"fields\"")),
            ("object", Some(_), Some(_)) => Err(malformed("object cannot have \"of\"")),
            (_, Some(_), _) => Err(malformed("only list can have \"of\"")),
            (_, _, Some(_)) => Err(malformed("only object can have \"fields\"")),
            ("string", None, None) => Ok(Shape::Primitive(Primitive::String)),
            ("boolean", None, None) => Ok(Shape::Primitive(Primitive::Boolean)),
            ("integer", None, None) => Ok(Shape::Primitive(Primitive::Integer)),
            ("datetime", None, None) => Ok(Shape::Primitive(Primitive::Datetime)),
            (name, None, None) => parse_custom(name)
                .map(Shape::Custom)
                .ok_or_else(|| malformed("not a primitive or a type name")),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.shape(), Ok(Shape::Custom(_)))
    }

    /// The custom reference this node names, if any.
    pub fn custom_ref(&self) -> Option<CustomRef<'_>> {
        match self.shape() {
            Ok(Shape::Custom(custom)) => Some(custom),
            _ => None,
        }
    }
}

fn parse_custom(name: &str) -> Option<CustomRef<'_>> {
    match name.split_once('.') {
        Some((module, name)) if is_identifier(module) && is_identifier(name) => Some(CustomRef {
            module: Some(module),
            name,
        }),
        None if is_identifier(name) => Some(CustomRef { module: None, name }),
        _ => None,
    }
}

/// A type emitted as a standalone record. Its `type` must be an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamedDatatypeDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DatatypeDef,
}

/// Closed set of string members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnumDef {
    pub name: String,
    pub string_members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumMember {
    /// Exported key, PascalCase of the value.
    pub key: String,
    pub value: String,
}

impl EnumDef {
    pub fn members(&self) -> Vec<EnumMember> {
        self.string_members
            .iter()
            .map(|value| EnumMember {
                key: to_pascal_case(value),
                value: value.clone(),
            })
            .collect()
    }

    /// First 8 hex chars of SHA-256 over the `key=value` member lines.
    ///
    /// Renaming, adding, removing or reordering a member changes it.
    pub fn members_digest(&self) -> String {
        let mut hasher = Sha256::new();
        for member in self.members() {
            hasher.update(member.key.as_bytes());
            hasher.update(b"=");
            hasher.update(member.value.as_bytes());
            hasher.update(b"\n");
        }
        let digest = hex::encode(hasher.finalize());
        digest[..8].to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StringConstDef {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointDefinition {
    pub method: HttpMethod,
    pub path: String,
    pub name: String,
    pub chain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumes: Option<DatatypeDef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub produces: Option<DatatypeDef>,
}

/// One piece of a parsed endpoint path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart<'a> {
    Static(&'a str),
    Placeholder(&'a str),
}

impl EndpointDefinition {
    /// Split the path into static text and `{placeholder}` segments.
    ///
    /// Each placeholder must be a whole path segment holding an identifier.
    pub fn path_parts(&self) -> Result<Vec<PathPart<'_>>, SchemaError> {
        let malformed = |reason: &str| SchemaError::MalformedPath {
            path: self.path.clone(),
            reason: reason.to_string(),
        };

        let Some(rest) = self.path.strip_prefix('/') else {
            return Err(malformed("must start with '/'"));
        };

        let segments: Vec<&str> = rest.split('/').collect();
        let mut parts = Vec::new();
        let mut literal_start = 0;
        let mut offset = 1;

        for (i, segment) in segments.iter().enumerate() {
            if segment.is_empty() && i + 1 < segments.len() {
                return Err(malformed("empty path segment"));
            }

            if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if !is_identifier(inner) {
                    return Err(malformed("placeholder must be {identifier}"));
                }
                parts.push(PathPart::Static(&self.path[literal_start..offset]));
                parts.push(PathPart::Placeholder(inner));
                literal_start = offset + segment.len();
            } else if let Some(c) = segment
                .chars()
                .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')))
            {
                return Err(match c {
                    '{' | '}' => malformed("placeholder must fill a whole segment"),
                    '?' => malformed("query strings are not supported"),
                    _ => malformed(&format!("unsupported character {c:?}")),
                });
            }

            offset += segment.len() + 1;
        }

        if literal_start < self.path.len() {
            parts.push(PathPart::Static(&self.path[literal_start..]));
        }
        Ok(parts)
    }

    /// Ordered placeholder names. Each one becomes a string argument.
    pub fn placeholders(&self) -> Result<Vec<&str>, SchemaError> {
        Ok(self
            .path_parts()?
            .into_iter()
            .filter_map(|part| match part {
                PathPart::Placeholder(name) => Some(name),
                PathPart::Static(_) => None,
            })
            .collect())
    }
}

/// Contents of a module's `types.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ApplicationTypesDefinition {
    #[serde(default)]
    pub string_consts: Vec<StringConstDef>,
    #[serde(default)]
    pub enums: Vec<EnumDef>,
    #[serde(default)]
    pub types: Vec<NamedDatatypeDef>,
    #[serde(default)]
    pub endpoints: Vec<EndpointDefinition>,
}

impl ApplicationTypesDefinition {
    pub fn find_type(&self, name: &str) -> Option<&NamedDatatypeDef> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn find_enum(&self, name: &str) -> Option<&EnumDef> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Whether `name` is a declared type or enum.
    pub fn declares(&self, name: &str) -> bool {
        self.find_type(name).is_some() || self.find_enum(name).is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudNature {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Multiline,
    Password,
    Checkbox,
    Integer,
}

impl FieldKind {
    pub fn is_string(self) -> bool {
        matches!(self, Self::Text | Self::Multiline | Self::Password)
    }

    /// Length limit applied when the field declares none.
    pub fn default_max_length(self) -> Option<usize> {
        match self {
            Self::Text => Some(128),
            Self::Password => Some(1024),
            Self::Multiline => Some(4096),
            Self::Checkbox | Self::Integer => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Multiline => "multiline",
            Self::Password => "password",
            Self::Checkbox => "checkbox",
            Self::Integer => "integer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommandFieldSpec {
    pub key: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub validation_regex: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub help: Option<String>,
    #[serde(default)]
    pub hide_if_default_value: bool,
}

impl CommandFieldSpec {
    /// Declared limit, else the kind's default. `None` for non-string kinds.
    pub fn effective_max_length(&self) -> Option<usize> {
        if !self.kind.is_string() {
            return None;
        }
        self.max_length.or(self.kind.default_max_length())
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommandSpec {
    /// Wire discriminator, e.g. `account.ChangeUsername`.
    pub command: String,
    pub title: String,
    pub chain: String,
    #[serde(default)]
    pub crud_nature: Option<CrudNature>,
    #[serde(default)]
    pub additional_confirmation: Option<String>,
    #[serde(default)]
    pub fields: Vec<CommandFieldSpec>,
}

impl CommandSpec {
    /// `account.ChangeUsername` → `AccountChangeUsername`.
    pub fn struct_name(&self) -> String {
        to_pascal_case(&self.command)
    }

    /// `account.ChangeUsername` → `account_change_username`.
    pub fn handler_method(&self) -> String {
        to_snake_case(&self.command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventFieldSpec {
    pub key: String,
    #[serde(rename = "type")]
    pub ty: DatatypeDef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventSpec {
    /// Wire discriminator, e.g. `account.Created`.
    pub event: String,
    #[serde(default)]
    pub fields: Vec<EventFieldSpec>,
}

impl EventSpec {
    pub fn struct_name(&self) -> String {
        to_pascal_case(&self.event)
    }

    /// `account.Created` → `apply_account_created`.
    pub fn apply_method(&self) -> String {
        format!("apply_{}", to_snake_case(&self.event))
    }
}

/// One schema module: everything declared under `<schema_dir>/<id>/`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSchema {
    pub id: String,
    pub types: ApplicationTypesDefinition,
    pub commands: Vec<CommandSpec>,
    pub events: Vec<EventSpec>,
}

impl ModuleSchema {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// Every module of one generation run, sorted by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSet {
    modules: Vec<ModuleSchema>,
}

impl SchemaSet {
    pub fn new(mut modules: Vec<ModuleSchema>) -> Self {
        modules.sort_by(|a, b| a.id.cmp(&b.id));
        Self { modules }
    }

    pub fn modules(&self) -> &[ModuleSchema] {
        &self.modules
    }

    pub fn module(&self, id: &str) -> Option<&ModuleSchema> {
        self.modules.iter().find(|m| m.id == id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn endpoint(path: &str) -> EndpointDefinition {
        EndpointDefinition {
            method: HttpMethod::Get,
            path: path.into(),
            name: "x".into(),
            chain: "public".into(),
            description: None,
            consumes: None,
            produces: None,
        }
    }

    #[test]
    fn test_shape() {
        assert!(matches!(
            DatatypeDef::primitive("string").shape().unwrap(),
            Shape::Primitive(Primitive::String)
        ));
        assert!(matches!(
            DatatypeDef::list_of(DatatypeDef::primitive("integer")).shape().unwrap(),
            Shape::List(_)
        ));
        assert!(matches!(
            DatatypeDef::primitive("contacts.Contact").shape().unwrap(),
            Shape::Custom(CustomRef {
                module: Some("contacts"),
                name: "Contact"
            })
        ));
    }

    #[test]
    fn test_shape_rejects_mixed_nodes() {
        let mut list = DatatypeDef::primitive("list");
        assert!(list.shape().is_err());

        list.of = Some(Box::new(DatatypeDef::primitive("string")));
        list.fields = Some(BTreeMap::new());
        assert!(list.shape().is_err());

        let mut string = DatatypeDef::primitive("string");
        string.of = Some(Box::new(DatatypeDef::primitive("string")));
        assert!(string.shape().is_err());

        assert!(DatatypeDef::primitive("not a name").shape().is_err());
        assert!(DatatypeDef::primitive("a.b.c").shape().is_err());
    }

    #[test]
    fn test_datatype_json() {
        let dt: DatatypeDef = serde_json::from_str(
            r#"{"_":"list","of":{"_":"object","fields":{"id":{"_":"string"}}},"nullable":true}"#,
        )
        .unwrap();
        assert!(dt.nullable);
        assert!(matches!(dt.shape().unwrap(), Shape::List(_)));

        assert!(serde_json::from_str::<DatatypeDef>(r#"{"_":"string","extra":1}"#).is_err());
    }

    #[test]
    fn test_path_parts() {
        let e = endpoint("/users/{id}/addresses/{idx}");
        assert_eq!(
            e.path_parts().unwrap(),
            vec![
                PathPart::Static("/users/"),
                PathPart::Placeholder("id"),
                PathPart::Static("/addresses/"),
                PathPart::Placeholder("idx"),
            ]
        );
        assert_eq!(e.placeholders().unwrap(), vec!["id", "idx"]);

        assert_eq!(endpoint("/contacts").placeholders().unwrap(), Vec::<&str>::new());
        assert_eq!(
            endpoint("/").path_parts().unwrap(),
            vec![PathPart::Static("/")]
        );
    }

    #[test]
    fn test_path_parts_rejects_malformed() {
        for path in [
            "users",
            "/users/{id",
            "/users/x{id}",
            "/users/{}",
            "/users//x",
            "/search?q={q}",
            "/files/{*rest}",
        ] {
            assert!(
                matches!(endpoint(path).path_parts(), Err(SchemaError::MalformedPath { .. })),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_enum_digest_tracks_membership() {
        let mut kinds = EnumDef {
            name: "SecretKind".into(),
            string_members: vec!["password".into(), "ssh_key".into()],
        };
        let before = kinds.members_digest();
        assert_eq!(before.len(), 8);
        assert_eq!(before, kinds.members_digest());

        kinds.string_members.push("otp_token".into());
        let added = kinds.members_digest();
        assert_ne!(before, added);

        kinds.string_members[2] = "totp_token".into();
        assert_ne!(added, kinds.members_digest());
    }

    #[test]
    fn test_command_names() {
        let spec: CommandSpec = serde_json::from_str(
            r#"{"command":"account.ChangeUsername","title":"Change username","chain":"authenticated","fields":[{"key":"Username","type":"text"}]}"#,
        )
        .unwrap();
        assert_eq!(spec.struct_name(), "AccountChangeUsername");
        assert_eq!(spec.handler_method(), "account_change_username");
        assert_eq!(spec.fields[0].effective_max_length(), Some(128));
        assert_eq!(spec.fields[0].title(), "Username");
    }
}
