use serde::Serialize;

use super::Renderer;
use crate::error::{CodegenError, SchemaError};
use crate::generate::{EmitContext, Emitter, GENERATED_HEADER, GeneratedFile, Target};
use crate::mapper::{RustRecord, RustTypeMapper, Site};
use crate::naming::{field_ident, to_pascal_case};
use crate::schema::EventSpec;

/// Names the events template declares itself.
const TEMPLATE_NAMES: [&str; 3] = ["AnyEvent", "EventListener", "Allocator"];

/// `<module>/events.rs`, only for modules declaring events.
#[derive(Debug)]
pub struct EventsEmitter<'r> {
    renderer: &'r Renderer,
}

impl<'r> EventsEmitter<'r> {
    /// Emitter rendering through `renderer`.
    pub fn new(renderer: &'r Renderer) -> Self {
        Self { renderer }
    }
}

#[derive(Serialize)]
struct EventsView {
    header: &'static str,
    events: Vec<EventView>,
    /// Records for inline object fields.
    records: Vec<RustRecord>,
}

#[derive(Serialize)]
struct EventView {
    struct_name: String,
    meta_type: String,
    apply_method: String,
    allocator_fn: String,
    fields: Vec<EventFieldView>,
}

#[derive(Serialize)]
struct EventFieldView {
    ident: String,
    wire_name: String,
    ty: String,
}

fn events_view(ctx: &EmitContext<'_>) -> Result<EventsView, SchemaError> {
    let module = ctx.module;
    let struct_names: Vec<String> = module.events.iter().map(EventSpec::struct_name).collect();

    let mut mapper = RustTypeMapper::new(
        &module.id,
        ctx.config,
        Site::Sibling,
        struct_names
            .iter()
            .cloned()
            .chain(TEMPLATE_NAMES.map(String::from)),
    );

    let mut events = Vec::with_capacity(module.events.len());
    for (spec, struct_name) in module.events.iter().zip(struct_names) {
        let mut fields = Vec::with_capacity(spec.fields.len());
        for field in &spec.fields {
            let ident = field_ident(&field.key).ok_or_else(|| SchemaError::InvalidIdentifier {
                name: field.key.clone(),
                reason: "field keys must map to a Rust identifier",
            })?;
            let owner = format!("{struct_name}{}", to_pascal_case(&field.key));
            let ty = mapper
                .map(&field.ty, &owner)
                .map_err(|e| e.at(format!("event {} field {}", spec.event, field.key)))?;
            fields.push(EventFieldView {
                ident,
                wire_name: field.key.clone(),
                ty,
            });
        }

        let apply_method = spec.apply_method();
        events.push(EventView {
            allocator_fn: format!("allocate_{}", &apply_method["apply_".len()..]),
            apply_method,
            meta_type: spec.event.clone(),
            struct_name,
            fields,
        });
    }

    Ok(EventsView {
        header: GENERATED_HEADER,
        events,
        records: mapper.into_records(),
    })
}

impl Emitter for EventsEmitter<'_> {
    fn name(&self) -> &'static str {
        "backend events"
    }

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
        if ctx.module.events.is_empty() {
            return Ok(Vec::new());
        }

        let view = events_view(ctx).map_err(|e| CodegenError::schema(&ctx.module.id, e))?;
        Ok(vec![GeneratedFile::new(
            Target::Backend,
            format!("{}/events.rs", ctx.module.id),
            self.renderer.render("events.rs", &view)?,
        )])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::schema::{ModuleSchema, SchemaSet};

    fn render(module: &ModuleSchema) -> Result<Vec<GeneratedFile>, CodegenError> {
        let renderer = Renderer::new().unwrap();
        let schema = SchemaSet::new(vec![module.clone()]);
        let config = GeneratorConfig::default();
        let ctx = EmitContext {
            module,
            schema: &schema,
            config: &config,
        };
        EventsEmitter::new(&renderer).emit(&ctx)
    }

    fn secrets() -> ModuleSchema {
        let mut module = ModuleSchema::new("secrets");
        module.events = serde_json::from_str(
            r#"[
                {"event": "account.Created", "fields": [
                    {"key": "Title", "type": {"_": "string"}},
                    {"key": "Owner", "type": {"_": "contacts.Contact", "nullable": true}},
                    {"key": "Location", "type": {"_": "object", "fields": {"Url": {"_": "string"}}}}
                ]},
                {"event": "account.Deleted", "fields": []}
            ]"#,
        )
        .unwrap();
        module
    }

    #[test]
    fn test_no_events_no_file() {
        assert!(render(&ModuleSchema::new("contacts")).unwrap().is_empty());
    }

    #[test]
    fn test_event_record() {
        let out = render(&secrets()).unwrap().remove(0).content;

        assert!(out.contains("pub struct AccountCreated {\n    #[serde(skip)]\n    pub meta: EventMeta,\n    #[serde(rename = \"Title\")]\n    pub title: String,\n"));
        assert!(out.contains(
            "    pub owner: Option<crate::generated::contacts::types::Contact>,\n"
        ));
        assert!(out.contains("    pub location: AccountCreatedLocation,\n"));
        assert!(out.contains("pub struct AccountCreatedLocation {\n"));
        assert!(out.contains("    pub const META_TYPE: &'static str = \"account.Created\";\n"));
        assert!(out.contains("        self.meta.encode_envelope(self)\n"));
        assert!(!out.contains("deny_unknown_fields"));
    }

    #[test]
    fn test_event_without_fields() {
        let out = render(&secrets()).unwrap().remove(0).content;

        assert!(out.contains("pub struct AccountDeleted {\n    #[serde(skip)]\n    pub meta: EventMeta,\n}\n"));
        assert!(out.contains("    pub fn new(meta: EventMeta) -> Self {\n        Self { meta }\n    }\n"));
    }

    #[test]
    fn test_listener_and_dispatch() {
        let out = render(&secrets()).unwrap().remove(0).content;

        assert!(out.contains("    fn apply_account_created(&mut self, event: &AccountCreated) -> Result<(), Self::Error>;\n"));
        assert!(out.contains("    fn handle_unknown_event(&mut self, event: &UnknownEvent) -> Result<(), Self::Error>;\n"));
        assert!(out.contains("        AnyEvent::AccountDeleted(inner) => listener.apply_account_deleted(inner),\n        AnyEvent::Unknown(inner) => listener.handle_unknown_event(inner),\n"));
        assert!(out.contains("(\"account.Deleted\", allocate_account_deleted as Allocator),"));
    }

    #[test]
    fn test_inline_record_collision() {
        let mut module = secrets();
        module.events.push(
            serde_json::from_str(r#"{"event": "account.CreatedLocation", "fields": []}"#).unwrap(),
        );
        let err = render(&module).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::Schema {
                source: SchemaError::At { .. },
                ..
            }
        ));
    }
}
