//! Projection of schema types onto Rust and TypeScript type expressions.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::config::GeneratorConfig;
use crate::error::SchemaError;
use crate::frontend::ts::{TsPrimitive, TsProp, TsType};
use crate::naming::{field_ident, to_pascal_case};
use crate::schema::{DatatypeDef, Primitive, Shape};

/// Name of the frontend alias every `datetime` maps to.
pub const DATETIME_ALIAS: &str = "datetimeRFC3339";

/// Which generated file the Rust type expression will appear in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Site {
    /// `types.rs` itself: local names need no path.
    Types,
    /// A sibling of `types.rs` in the same module.
    Sibling,
}

/// A struct the mapper derived from an inline `object` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RustRecord {
    pub name: String,
    pub fields: Vec<RustField>,
}

/// A record field: Rust identifier, JSON key and Rust type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RustField {
    pub ident: String,
    pub wire_name: String,
    pub ty: String,
}

/// Maps datatypes to Rust types, collecting the records inline objects need.
///
/// Record names are `<Owner><Field>` and must not collide with anything else
/// emitted into the same file.
#[derive(Debug)]
pub struct RustTypeMapper<'a> {
    module_id: &'a str,
    config: &'a GeneratorConfig,
    site: Site,
    taken: HashSet<String>,
    records: Vec<RustRecord>,
}

impl<'a> RustTypeMapper<'a> {
    /// `taken` holds names already declared in the target file; derived
    /// records never reuse them.
    pub fn new(
        module_id: &'a str,
        config: &'a GeneratorConfig,
        site: Site,
        taken: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            module_id,
            config,
            site,
            taken: taken.into_iter().collect(),
            records: Vec::new(),
        }
    }

    /// Rust type of `dt`. An object node becomes a record named `owner`.
    pub fn map(&mut self, dt: &DatatypeDef, owner: &str) -> Result<String, SchemaError> {
        let ty = match dt.shape()? {
            Shape::Primitive(Primitive::String) => "String".to_string(),
            Shape::Primitive(Primitive::Boolean) => "bool".to_string(),
            Shape::Primitive(Primitive::Integer) => "i64".to_string(),
            Shape::Primitive(Primitive::Datetime) => "chrono::DateTime<chrono::Utc>".to_string(),
            Shape::List(of) => format!("Vec<{}>", self.map(of, owner)?),
            Shape::Custom(custom) => match custom.module.filter(|m| *m != self.module_id) {
                Some(module) => format!("{}::{}", self.config.backend_types_path(module), custom.name),
                None if self.site == Site::Types => custom.name.to_string(),
                None => format!("super::types::{}", custom.name),
            },
            Shape::Object(fields) => {
                self.record(owner, fields)?;
                owner.to_string()
            }
        };

        Ok(if dt.nullable { format!("Option<{ty}>") } else { ty })
    }

    /// Register `name` as a record built from `fields`. Named types enter
    /// through here directly.
    pub fn record(
        &mut self,
        name: &str,
        fields: &BTreeMap<String, DatatypeDef>,
    ) -> Result<(), SchemaError> {
        if !self.taken.insert(name.to_string()) {
            return Err(SchemaError::Duplicate {
                kind: "generated type",
                name: name.to_string(),
            });
        }

        let mut out = Vec::with_capacity(fields.len());
        for (key, dt) in fields {
            let ident = field_ident(key).ok_or_else(|| SchemaError::InvalidIdentifier {
                name: key.clone(),
                reason: "field keys must map to a Rust identifier",
            })?;
            let ty = self.map(dt, &format!("{name}{}", to_pascal_case(key)))?;
            out.push(RustField {
                ident,
                wire_name: key.clone(),
                ty,
            });
        }

        self.records.push(RustRecord {
            name: name.to_string(),
            fields: out,
        });
        Ok(())
    }

    /// Records derived so far, dependencies before dependents.
    pub fn into_records(self) -> Vec<RustRecord> {
        self.records
    }
}

/// TypeScript type of `dt`. Foreign names stay bare; the caller imports them.
pub fn ts_type(dt: &DatatypeDef) -> Result<TsType, SchemaError> {
    let ty = match dt.shape()? {
        Shape::Primitive(Primitive::String) => TsType::string(),
        Shape::Primitive(Primitive::Boolean) => TsType::Primitive(TsPrimitive::Boolean),
        Shape::Primitive(Primitive::Integer) => TsType::Primitive(TsPrimitive::Number),
        Shape::Primitive(Primitive::Datetime) => TsType::named(DATETIME_ALIAS),
        Shape::List(of) => TsType::array_of(ts_type(of)?),
        Shape::Custom(custom) => TsType::named(custom.name),
        Shape::Object(fields) => TsType::Object(ts_props(fields)?),
    };

    Ok(if dt.nullable { ty.or_null() } else { ty })
}

/// Properties of an object node, in key order.
pub fn ts_props(fields: &BTreeMap<String, DatatypeDef>) -> Result<Vec<TsProp>, SchemaError> {
    fields
        .iter()
        .map(|(key, dt)| {
            Ok(TsProp::required(key.clone(), ts_type(dt)?))
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::frontend::emit::Emit;

    fn field(key: &str, dt: DatatypeDef) -> (String, DatatypeDef) {
        (key.to_string(), dt)
    }

    #[test]
    fn test_rust_primitives_and_wrappers() {
        let config = GeneratorConfig::default();
        let mut mapper = RustTypeMapper::new("contacts", &config, Site::Sibling, []);

        let cases = [
            (DatatypeDef::primitive("string"), "String"),
            (DatatypeDef::primitive("boolean"), "bool"),
            (DatatypeDef::primitive("integer").nullable(), "Option<i64>"),
            (DatatypeDef::primitive("datetime"), "chrono::DateTime<chrono::Utc>"),
            (
                DatatypeDef::list_of(DatatypeDef::primitive("Contact")).nullable(),
                "Option<Vec<super::types::Contact>>",
            ),
            (
                DatatypeDef::primitive("contacts.Contact"),
                "super::types::Contact",
            ),
            (
                DatatypeDef::primitive("accounts.User"),
                "crate::generated::accounts::types::User",
            ),
        ];
        for (dt, expected) in cases {
            assert_eq!(mapper.map(&dt, "Unused").unwrap(), expected);
        }
        assert!(mapper.into_records().is_empty());
    }

    #[test]
    fn test_rust_local_name_in_types_file() {
        let config = GeneratorConfig::default();
        let mut mapper = RustTypeMapper::new("contacts", &config, Site::Types, []);
        assert_eq!(mapper.map(&DatatypeDef::primitive("Contact"), "X").unwrap(), "Contact");
    }

    #[test]
    fn test_inline_objects_become_records() {
        let config = GeneratorConfig::default();
        let mut mapper = RustTypeMapper::new("contacts", &config, Site::Types, []);

        let fields = [
            field("Name", DatatypeDef::primitive("string")),
            field(
                "Geo",
                DatatypeDef::object([field("Lat", DatatypeDef::primitive("integer"))]).nullable(),
            ),
        ]
        .into_iter()
        .collect();
        mapper.record("Address", &fields).unwrap();

        let records = mapper.into_records();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["AddressGeo", "Address"]);

        let address = &records[1];
        assert_eq!(address.fields[0].ident, "geo");
        assert_eq!(address.fields[0].wire_name, "Geo");
        assert_eq!(address.fields[0].ty, "Option<AddressGeo>");
    }

    #[test]
    fn test_record_name_collision() {
        let config = GeneratorConfig::default();
        let mut mapper =
            RustTypeMapper::new("contacts", &config, Site::Types, ["AddressGeo".to_string()]);

        let fields = [field(
            "Geo",
            DatatypeDef::object([field("Lat", DatatypeDef::primitive("integer"))]),
        )]
        .into_iter()
        .collect();
        let err = mapper.record("Address", &fields).unwrap_err();
        assert!(matches!(err, SchemaError::Duplicate { .. }));
    }

    #[test]
    fn test_ts_projection() {
        let dt = DatatypeDef::object([
            field("Tags", DatatypeDef::list_of(DatatypeDef::primitive("string").nullable())),
            field("Seen", DatatypeDef::primitive("datetime")),
            field("Owner", DatatypeDef::primitive("accounts.User").nullable()),
        ]);
        assert_eq!(
            ts_type(&dt).unwrap().emit(),
            "{ Owner: User | null; Seen: datetimeRFC3339; Tags: (string | null)[] }"
        );
    }
}
