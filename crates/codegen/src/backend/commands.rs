use serde::Serialize;

use super::Renderer;
use crate::error::{CodegenError, SchemaError};
use crate::generate::{EmitContext, Emitter, GENERATED_HEADER, GeneratedFile, Target};
use crate::naming::field_ident;
use crate::schema::{CommandFieldSpec, CommandSpec, FieldKind};

/// `<module>/commands.rs`, only for modules declaring commands.
#[derive(Debug)]
pub struct CommandsEmitter<'r> {
    renderer: &'r Renderer,
}

impl<'r> CommandsEmitter<'r> {
    /// Emitter rendering through `renderer`.
    pub fn new(renderer: &'r Renderer) -> Self {
        Self { renderer }
    }
}

#[derive(Serialize)]
struct CommandsView {
    header: &'static str,
    commands: Vec<CommandView>,
}

#[derive(Serialize)]
struct CommandView {
    struct_name: String,
    key: String,
    title: String,
    chain: String,
    handler_method: String,
    allocator_fn: String,
    fields: Vec<FieldView>,
    rules: Vec<Rule>,
}

#[derive(Serialize)]
struct FieldView {
    ident: String,
    wire_name: String,
    ty: &'static str,
    /// Absent from the body means the zero value.
    default: bool,
}

/// One line of the generated `validate` body.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Rule {
    NonEmpty {
        ident: String,
        field: String,
    },
    MaxLength {
        ident: String,
        field: String,
        max: usize,
    },
    Pattern {
        ident: String,
        field: String,
        pattern: String,
        skip_empty: bool,
    },
}

fn rust_type(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text | FieldKind::Multiline | FieldKind::Password => "String",
        FieldKind::Checkbox => "bool",
        FieldKind::Integer => "i64",
    }
}

fn ident(field: &CommandFieldSpec) -> Result<String, SchemaError> {
    field_ident(&field.key).ok_or_else(|| SchemaError::InvalidIdentifier {
        name: field.key.clone(),
        reason: "field keys must map to a Rust identifier",
    })
}

fn rules(field: &CommandFieldSpec, ident: &str) -> Vec<Rule> {
    let mut rules = Vec::new();
    if !field.kind.is_string() {
        return rules;
    }

    if !field.optional {
        rules.push(Rule::NonEmpty {
            ident: ident.to_string(),
            field: field.key.clone(),
        });
    }
    if let Some(max) = field.effective_max_length() {
        rules.push(Rule::MaxLength {
            ident: ident.to_string(),
            field: field.key.clone(),
            max,
        });
    }
    if let Some(pattern) = &field.validation_regex {
        rules.push(Rule::Pattern {
            ident: ident.to_string(),
            field: field.key.clone(),
            pattern: pattern.clone(),
            skip_empty: field.optional,
        });
    }
    rules
}

fn command_view(spec: &CommandSpec) -> Result<CommandView, SchemaError> {
    let mut fields = Vec::with_capacity(spec.fields.len());
    let mut all_rules = Vec::new();

    for field in &spec.fields {
        let ident = ident(field)?;
        all_rules.extend(rules(field, &ident));
        fields.push(FieldView {
            wire_name: field.key.clone(),
            ty: rust_type(field.kind),
            default: field.optional || field.kind == FieldKind::Checkbox,
            ident,
        });
    }

    let handler_method = spec.handler_method();
    Ok(CommandView {
        struct_name: spec.struct_name(),
        key: spec.command.clone(),
        title: spec.title.replace(['\n', '\r'], " "),
        chain: spec.chain.clone(),
        allocator_fn: format!("allocate_{handler_method}"),
        handler_method,
        fields,
        rules: all_rules,
    })
}

impl Emitter for CommandsEmitter<'_> {
    fn name(&self) -> &'static str {
        "backend commands"
    }

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
        let module = ctx.module;
        if module.commands.is_empty() {
            return Ok(Vec::new());
        }

        let commands = module
            .commands
            .iter()
            .map(|spec| command_view(spec).map_err(|e| e.at(format!("command {}", spec.command))))
            .collect::<Result<_, _>>()
            .map_err(|e| CodegenError::schema(&module.id, e))?;

        let view = CommandsView {
            header: GENERATED_HEADER,
            commands,
        };
        Ok(vec![GeneratedFile::new(
            Target::Backend,
            format!("{}/commands.rs", module.id),
            self.renderer.render("commands.rs", &view)?,
        )])
    }
}
