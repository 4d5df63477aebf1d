//! Module-level declarations: string constants, string enums and records,
//! plus the exhaustiveness helper every enum carries.

use serde::Serialize;

use super::Renderer;
use crate::error::{CodegenError, SchemaError};
use crate::generate::{EmitContext, Emitter, GENERATED_HEADER, GeneratedFile, Target};
use crate::mapper::{RustRecord, RustTypeMapper, Site};
use crate::naming::{rust_ident, to_screaming_snake_case, to_snake_case};
use crate::schema::{EnumDef, Shape};

/// `<module>/types.rs`: constants, enums and records. Always emitted.
#[derive(Debug)]
pub struct TypesEmitter<'r> {
    renderer: &'r Renderer,
}

impl<'r> TypesEmitter<'r> {
    /// Emitter rendering through `renderer`.
    pub fn new(renderer: &'r Renderer) -> Self {
        Self { renderer }
    }
}

/// Everything `types.rs.tera` renders, in emission order.
#[derive(Serialize)]
struct TypesView {
    header: &'static str,
    consts: Vec<ConstView>,
    enums: Vec<EnumView>,
    records: Vec<RustRecord>,
}

#[derive(Serialize)]
struct ConstView {
    name: String,
    value: String,
}

#[derive(Serialize)]
struct EnumView {
    name: String,
    exhaustive_fn: String,
    members: Vec<EnumMemberView>,
}

#[derive(Serialize)]
struct EnumMemberView {
    variant: String,
    value: String,
}

fn enum_view(e: &EnumDef) -> EnumView {
    EnumView {
        name: e.name.clone(),
        exhaustive_fn: format!("{}_exhaustive_{}", to_snake_case(&e.name), e.members_digest()),
        members: e
            .members()
            .into_iter()
            .map(|m| EnumMemberView {
                variant: rust_ident(&m.key),
                value: m.value,
            })
            .collect(),
    }
}

fn types_view(ctx: &EmitContext<'_>) -> Result<TypesView, SchemaError> {
    let module = ctx.module;
    let types = &module.types;
    let mut mapper = RustTypeMapper::new(
        &module.id,
        ctx.config,
        Site::Types,
        types.enums.iter().map(|e| e.name.clone()),
    );

    for t in &types.types {
        if let Shape::Object(fields) = t.ty.shape()? {
            mapper
                .record(&t.name, fields)
                .map_err(|e| e.at(format!("type {}", t.name)))?;
        }
    }

    Ok(TypesView {
        header: GENERATED_HEADER,
        consts: types
            .string_consts
            .iter()
            .map(|c| ConstView {
                name: to_screaming_snake_case(&c.key),
                value: c.value.clone(),
            })
            .collect(),
        enums: types.enums.iter().map(enum_view).collect(),
        records: mapper.into_records(),
    })
}

impl Emitter for TypesEmitter<'_> {
    fn name(&self) -> &'static str {
        "backend types"
    }

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
        let view = types_view(ctx).map_err(|e| CodegenError::schema(&ctx.module.id, e))?;
        let content = self.renderer.render("types.rs", &view)?;
        Ok(vec![GeneratedFile::new(
            Target::Backend,
            format!("{}/types.rs", ctx.module.id),
            content,
        )])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::schema::{ModuleSchema, SchemaSet};

    fn render(module: ModuleSchema) -> String {
        let renderer = Renderer::new().unwrap();
        let schema = SchemaSet::new(vec![module.clone()]);
        let config = GeneratorConfig::default();
        let ctx = EmitContext {
            module: &module,
            schema: &schema,
            config: &config,
        };
        let mut files = TypesEmitter::new(&renderer).emit(&ctx).unwrap();
        files.remove(0).content
    }

    fn contacts() -> ModuleSchema {
        let mut module = ModuleSchema::new("contacts");
        module.types = serde_json::from_str(
            r#"{
                "stringConsts": [{"key": "defaultGroup", "value": "say \"hi\""}],
                "enums": [{"name": "ContactKind", "stringMembers": ["person", "self"]}],
                "types": [
                    {"name": "Contact", "type": {"_": "object", "fields": {
                        "Name": {"_": "string"},
                        "Kind": {"_": "ContactKind"},
                        "Owner": {"_": "accounts.User", "nullable": true},
                        "Geo": {"_": "object", "fields": {"Lat": {"_": "integer"}}}
                    }}}
                ]
            }"#,
        )
        .unwrap();
        module
    }

    #[test]
    fn test_consts_are_escaped() {
        let out = render(contacts());
        assert!(out.contains("pub const DEFAULT_GROUP: &str = \"say \\\"hi\\\"\";\n"));
    }

    #[test]
    fn test_enum() {
        let out = render(contacts());
        let digest = contacts().types.enums[0].members_digest();

        assert!(out.contains("pub enum ContactKind {\n    #[serde(rename = \"person\")]\n    Person,\n    #[serde(rename = \"self\")]\n    Self_,\n}\n"));
        assert!(out.contains("pub const ALL: [Self; 2] = [Self::Person, Self::Self_];"));
        assert!(out.contains("Self::Self_ => \"self\","));
        assert!(out.contains(&format!(
            "pub const fn contact_kind_exhaustive_{digest}(value: ContactKind) -> ContactKind {{\n    value\n}}\n"
        )));
    }

    #[test]
    fn test_records() {
        let out = render(contacts());

        let geo = out.find("pub struct ContactGeo {").unwrap();
        let contact = out.find("pub struct Contact {").unwrap();
        assert!(geo < contact);

        assert!(out.contains("#[serde(deny_unknown_fields)]\npub struct Contact {\n    #[serde(rename = \"Geo\")]\n    pub geo: ContactGeo,\n"));
        assert!(out.contains("    pub kind: ContactKind,\n"));
        assert!(out.contains(
            "    pub owner: Option<crate::generated::accounts::types::User>,\n"
        ));
    }

    #[test]
    fn test_empty_module() {
        let out = render(ModuleSchema::new("empty"));
        assert_eq!(out, format!("{GENERATED_HEADER}\n"));
    }
}
