//! Load-time checks. Any violation aborts the run before anything is rendered.

use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;

use super::{
    CommandSpec, DatatypeDef, EndpointDefinition, EventSpec, ModuleSchema, PathPart, SchemaSet,
    Shape,
};
use crate::error::{CodegenError, SchemaError};
use crate::mapper::DATETIME_ALIAS;
use crate::naming::{
    TS_RESERVED_WORDS, field_ident, is_identifier, to_screaming_snake_case, to_snake_case,
};

/// Names taken by the generated handler signatures and TS call parameters.
const RESERVED_PLACEHOLDERS: &[&str] = &["rctx", "input", "body", "options", "self"];

/// Globals and locals the generated TypeScript client refers to by name.
const CLIENT_BODY_NAMES: &[&str] = &[
    "fetch",
    "res",
    "encodeURIComponent",
    "JSON",
    "ApiError",
    "defaultErrorHandler",
    "alert",
    "Error",
    "String",
];

const RESERVED_COMMAND_NAMES: &[&str] = &[
    "AnyCommand",
    "CommandHandlers",
    "Allocator",
    "Command",
    "CommandError",
    "Ctx",
];

const RESERVED_EVENT_NAMES: &[&str] = &[
    "AnyEvent",
    "EventListener",
    "Allocator",
    "Event",
    "EventError",
    "EventMeta",
    "UnknownEvent",
];

/// Validate every module, then the by-value type graph across modules.
pub fn validate_schema_set(schema: &SchemaSet) -> Result<(), CodegenError> {
    for module in schema.modules() {
        validate_module(module, schema).map_err(|e| CodegenError::schema(&module.id, e))?;
    }
    check_value_cycles(schema)
}

/// Validate one module. Cross-module references resolve against `schema`.
pub fn validate_module(module: &ModuleSchema, schema: &SchemaSet) -> Result<(), SchemaError> {
    let resolver = Resolver { module, schema };

    if !super::load::is_valid_module_id(&module.id) {
        return Err(SchemaError::InvalidIdentifier {
            name: module.id.clone(),
            reason: "module ids must match [a-z][a-z0-9_]* and not be a keyword",
        });
    }
    check_consts(module)?;
    check_enums(module)?;
    check_types(module, &resolver)?;
    check_endpoints(module, &resolver)?;
    check_client_exports(module)?;
    check_commands(&module.commands)?;
    check_events(&module.events, &resolver)?;
    check_foreign_names(module)
}

struct Resolver<'a> {
    module: &'a ModuleSchema,
    schema: &'a SchemaSet,
}

impl Resolver<'_> {
    /// Check shape and name resolution of `dt` and everything below it.
    fn check_datatype(&self, dt: &DatatypeDef) -> Result<(), SchemaError> {
        match dt.shape()? {
            Shape::Primitive(_) => Ok(()),
            Shape::List(of) => self.check_datatype(of),
            Shape::Object(fields) => self.check_fields(fields),
            Shape::Custom(custom) => {
                let target = match custom.module {
                    Some(id) if id != self.module.id => self.schema.module(id),
                    _ => Some(self.module),
                };
                if target.is_some_and(|m| m.types.declares(custom.name)) {
                    Ok(())
                } else {
                    Err(SchemaError::UnknownType {
                        name: dt.name.clone(),
                    })
                }
            }
        }
    }

    fn check_fields(&self, fields: &BTreeMap<String, DatatypeDef>) -> Result<(), SchemaError> {
        unique_idents(fields.keys().map(String::as_str))?;
        for (key, dt) in fields {
            self.check_datatype(dt)
                .map_err(|e| e.at(format!("field {key}")))?;
        }
        Ok(())
    }
}

fn unique<'a>(kind: &'static str, names: impl IntoIterator<Item = &'a str>) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(SchemaError::Duplicate {
                kind,
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Field keys must map to distinct Rust identifiers.
fn unique_idents<'a>(keys: impl IntoIterator<Item = &'a str>) -> Result<(), SchemaError> {
    let mut seen = HashMap::new();
    for key in keys {
        let ident = field_ident(key).ok_or_else(|| SchemaError::InvalidIdentifier {
            name: key.to_string(),
            reason: "field keys must map to a Rust identifier",
        })?;
        if let Some(previous) = seen.insert(ident, key) {
            return Err(SchemaError::Duplicate {
                kind: "field",
                name: format!("{key} (same identifier as {previous})"),
            });
        }
    }
    Ok(())
}

/// Prelude names the generated Rust refers to unqualified.
const RESERVED_TYPE_NAMES: &[&str] = &["Self", "String", "Vec", "Option", "Box", "Result"];

fn type_name(name: &str) -> Result<(), SchemaError> {
    if !is_identifier(name) || !name.starts_with(|c: char| c.is_ascii_uppercase()) {
        return Err(SchemaError::InvalidIdentifier {
            name: name.to_string(),
            reason: "type names must be PascalCase identifiers",
        });
    }
    if RESERVED_TYPE_NAMES.contains(&name) {
        return Err(SchemaError::InvalidIdentifier {
            name: name.to_string(),
            reason: "shadows a prelude type",
        });
    }
    Ok(())
}

/// `account.ChangeUsername`: dot-separated identifiers.
fn discriminator(key: &str) -> Result<(), SchemaError> {
    if key.is_empty() || !key.split('.').all(is_identifier) {
        return Err(SchemaError::InvalidIdentifier {
            name: key.to_string(),
            reason: "keys must be dot-separated identifiers",
        });
    }
    Ok(())
}

fn check_consts(module: &ModuleSchema) -> Result<(), SchemaError> {
    let consts = &module.types.string_consts;

    for c in consts {
        if !is_identifier(&c.key) || TS_RESERVED_WORDS.contains(c.key.as_str()) {
            return Err(SchemaError::InvalidIdentifier {
                name: c.key.clone(),
                reason: "constant keys must be identifiers",
            });
        }
    }

    unique("constant", consts.iter().map(|c| c.key.as_str()))?;
    let screaming: Vec<String> = consts.iter().map(|c| to_screaming_snake_case(&c.key)).collect();
    unique("constant", screaming.iter().map(String::as_str))
}

fn check_enums(module: &ModuleSchema) -> Result<(), SchemaError> {
    let enums = &module.types.enums;
    unique("enum", enums.iter().map(|e| e.name.as_str()))?;

    for e in enums {
        let context = || format!("enum {}", e.name);
        type_name(&e.name).map_err(|err| err.at(context()))?;

        if e.string_members.is_empty() {
            return Err(SchemaError::Unsupported("enum must have at least one member".into())
                .at(context()));
        }

        unique("enum member", e.string_members.iter().map(String::as_str))
            .map_err(|err| err.at(context()))?;

        let members = e.members();
        for member in &members {
            if !is_identifier(&member.key) {
                return Err(SchemaError::InvalidIdentifier {
                    name: member.value.clone(),
                    reason: "enum members must map to an identifier",
                }
                .at(context()));
            }
        }
        unique("enum member key", members.iter().map(|m| m.key.as_str()))
            .map_err(|err| err.at(context()))?;
    }
    Ok(())
}

fn check_types(module: &ModuleSchema, resolver: &Resolver<'_>) -> Result<(), SchemaError> {
    let types = &module.types;
    unique("type", types.types.iter().map(|t| t.name.as_str()))?;
    unique(
        "type or enum",
        types
            .types
            .iter()
            .map(|t| t.name.as_str())
            .chain(types.enums.iter().map(|e| e.name.as_str())),
    )?;

    for t in &types.types {
        let context = || format!("type {}", t.name);
        type_name(&t.name).map_err(|err| err.at(context()))?;

        let Shape::Object(fields) = t.ty.shape().map_err(|err| err.at(context()))? else {
            return Err(SchemaError::MalformedDatatype {
                name: t.ty.name.clone(),
                reason: "named types must be objects",
            }
            .at(context()));
        };
        resolver.check_fields(fields).map_err(|err| err.at(context()))?;
    }
    Ok(())
}

fn check_endpoints(module: &ModuleSchema, resolver: &Resolver<'_>) -> Result<(), SchemaError> {
    let endpoints = &module.types.endpoints;
    unique("endpoint", endpoints.iter().map(|e| e.name.as_str()))?;

    let snake: Vec<String> = endpoints.iter().map(|e| to_snake_case(&e.name)).collect();
    unique("endpoint", snake.iter().map(String::as_str))?;

    let mut routes = HashSet::new();
    let mut shapes: HashMap<String, &str> = HashMap::new();

    for e in endpoints {
        check_endpoint(e, resolver).map_err(|err| err.at(format!("endpoint {}", e.name)))?;

        if !routes.insert((e.method, e.path.as_str())) {
            return Err(SchemaError::Duplicate {
                kind: "route",
                name: format!("{} {}", e.method.as_str(), e.path),
            });
        }

        // The router cannot tell `/a/{x}` from `/a/{y}`.
        let shape = route_shape(e)?;
        if let Some(other) = shapes.insert(shape, e.path.as_str())
            && other != e.path
        {
            return Err(SchemaError::MalformedPath {
                path: e.path.clone(),
                reason: format!("conflicts with {other}"),
            });
        }
    }
    Ok(())
}

fn check_endpoint(e: &EndpointDefinition, resolver: &Resolver<'_>) -> Result<(), SchemaError> {
    if !is_identifier(&e.name) || TS_RESERVED_WORDS.contains(e.name.as_str()) {
        return Err(SchemaError::InvalidIdentifier {
            name: e.name.clone(),
            reason: "endpoint names must be identifiers",
        });
    }
    if CLIENT_BODY_NAMES.contains(&e.name.as_str()) {
        return Err(SchemaError::InvalidIdentifier {
            name: e.name.clone(),
            reason: "name is used by the generated client",
        });
    }
    if e.chain.is_empty() {
        return Err(SchemaError::Unsupported("middleware chain name is empty".into()));
    }

    let placeholders = e.placeholders()?;
    unique("placeholder", placeholders.iter().copied())?;
    unique_idents(placeholders.iter().copied())?;
    for name in &placeholders {
        if RESERVED_PLACEHOLDERS.contains(name)
            || CLIENT_BODY_NAMES.contains(name)
            || TS_RESERVED_WORDS.contains(*name)
        {
            return Err(SchemaError::InvalidIdentifier {
                name: (*name).to_string(),
                reason: "reserved placeholder name",
            });
        }
    }

    if let Some(consumes) = &e.consumes {
        resolver
            .check_datatype(consumes)
            .map_err(|err| err.at("consumes"))?;
    }
    if let Some(produces) = &e.produces {
        resolver
            .check_datatype(produces)
            .map_err(|err| err.at("produces"))?;
    }
    Ok(())
}

/// Everything `<module>_api.ts` exports shares one scope.
fn check_client_exports(module: &ModuleSchema) -> Result<(), SchemaError> {
    let types = &module.types;
    let mut names: Vec<String> = vec![
        DATETIME_ALIAS.to_string(),
        "ApiError".to_string(),
        "defaultErrorHandler".to_string(),
    ];
    names.extend(types.string_consts.iter().map(|c| c.key.clone()));
    names.extend(types.types.iter().map(|t| t.name.clone()));
    for e in &types.enums {
        names.push(e.name.clone());
        names.push(format!("{}Exhaustive{}", e.name, e.members_digest()));
    }
    for e in &types.endpoints {
        names.push(e.name.clone());
        names.push(format!("{}Url", e.name));
    }
    unique("TypeScript export", names.iter().map(String::as_str))
}

fn route_shape(e: &EndpointDefinition) -> Result<String, SchemaError> {
    Ok(e.path_parts()?
        .into_iter()
        .map(|part| match part {
            PathPart::Static(s) => s,
            PathPart::Placeholder(_) => "{}",
        })
        .collect())
}

fn check_commands(commands: &[CommandSpec]) -> Result<(), SchemaError> {
    unique("command", commands.iter().map(|c| c.command.as_str()))?;
    let names: Vec<String> = commands.iter().map(CommandSpec::struct_name).collect();
    unique("command struct", names.iter().map(String::as_str))?;

    for (c, name) in commands.iter().zip(&names) {
        let context = || format!("command {}", c.command);
        discriminator(&c.command).map_err(|err| err.at(context()))?;

        if RESERVED_COMMAND_NAMES.contains(&name.as_str()) {
            return Err(SchemaError::InvalidIdentifier {
                name: c.command.clone(),
                reason: "maps to a reserved generated name",
            });
        }
        if c.chain.is_empty() {
            return Err(SchemaError::Unsupported("middleware chain name is empty".into())
                .at(context()));
        }

        unique("field", c.fields.iter().map(|f| f.key.as_str())).map_err(|err| err.at(context()))?;
        unique_idents(c.fields.iter().map(|f| f.key.as_str())).map_err(|err| err.at(context()))?;

        for f in &c.fields {
            let field_context = || format!("{} field {}", context(), f.key);

            if !f.kind.is_string() && (f.max_length.is_some() || f.validation_regex.is_some()) {
                return Err(SchemaError::Unsupported(format!(
                    "maxLength and validationRegex only apply to string fields, not {}",
                    f.kind.as_str()
                ))
                .at(field_context()));
            }
            if let Some(pattern) = &f.validation_regex {
                Regex::new(pattern).map_err(|source| {
                    SchemaError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    }
                    .at(field_context())
                })?;
            }
        }
    }
    Ok(())
}

fn check_events(events: &[EventSpec], resolver: &Resolver<'_>) -> Result<(), SchemaError> {
    unique("event", events.iter().map(|e| e.event.as_str()))?;
    let names: Vec<String> = events.iter().map(EventSpec::struct_name).collect();
    unique("event struct", names.iter().map(String::as_str))?;

    for (e, name) in events.iter().zip(&names) {
        let context = || format!("event {}", e.event);
        discriminator(&e.event).map_err(|err| err.at(context()))?;

        if RESERVED_EVENT_NAMES.contains(&name.as_str()) {
            return Err(SchemaError::InvalidIdentifier {
                name: e.event.clone(),
                reason: "maps to a reserved generated name",
            });
        }

        unique("field", e.fields.iter().map(|f| f.key.as_str())).map_err(|err| err.at(context()))?;
        unique_idents(
            e.fields
                .iter()
                .map(|f| f.key.as_str())
                .chain(std::iter::once("meta")),
        )
        .map_err(|err| err.at(context()))?;

        for f in &e.fields {
            resolver
                .check_datatype(&f.ty)
                .map_err(|err| err.at(format!("{} field {}", context(), f.key)))?;
        }
    }
    Ok(())
}

/// Names imported from other modules land in one TypeScript scope with the
/// module's own declarations, so they must not clash.
fn check_foreign_names(module: &ModuleSchema) -> Result<(), SchemaError> {
    let mut nodes = Vec::new();
    for root in crate::resolve::module_datatypes(module) {
        crate::resolve::walk(root, &mut |node| nodes.push(node));
    }

    let mut imported: HashMap<&str, &str> = HashMap::new();
    for dt in nodes {
        let Some(custom) = dt.custom_ref() else {
            continue;
        };
        let Some(foreign) = custom.module.filter(|m| *m != module.id) else {
            continue;
        };
        if module.types.declares(custom.name) {
            return Err(SchemaError::Unsupported(format!(
                "{} clashes with the local declaration {}",
                dt.name, custom.name
            )));
        }
        if let Some(other) = imported.insert(custom.name, foreign)
            && other != foreign
        {
            return Err(SchemaError::Unsupported(format!(
                "{} clashes with {other}.{}",
                dt.name, custom.name
            )));
        }
    }
    Ok(())
}

/// Reject named types that contain themselves without a list in between.
fn check_value_cycles(schema: &SchemaSet) -> Result<(), CodegenError> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Mark {
        Visiting,
        Done,
    }

    type Node = (String, String);

    fn edges(schema: &SchemaSet, (module_id, name): &Node) -> Vec<Node> {
        let mut out = Vec::new();
        let Some(ty) = schema
            .module(module_id)
            .and_then(|m| m.types.find_type(name))
        else {
            return out;
        };
        collect_by_value(&ty.ty, module_id, schema, &mut out);
        out
    }

    fn collect_by_value(dt: &DatatypeDef, module_id: &str, schema: &SchemaSet, out: &mut Vec<Node>) {
        match dt.shape() {
            Ok(Shape::Object(fields)) => {
                for field in fields.values() {
                    collect_by_value(field, module_id, schema, out);
                }
            }
            Ok(Shape::Custom(custom)) => {
                let target = custom.module.unwrap_or(module_id);
                let is_type = schema
                    .module(target)
                    .is_some_and(|m| m.types.find_type(custom.name).is_some());
                if is_type {
                    out.push((target.to_string(), custom.name.to_string()));
                }
            }
            Ok(Shape::Primitive(_) | Shape::List(_)) | Err(_) => {}
        }
    }

    fn visit(
        schema: &SchemaSet,
        node: &Node,
        marks: &mut HashMap<Node, Mark>,
        stack: &mut Vec<Node>,
    ) -> Result<(), CodegenError> {
        match marks.get(node) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| n == node).unwrap_or(0);
                let path = stack[start..]
                    .iter()
                    .chain(std::iter::once(node))
                    .map(|(m, n)| format!("{m}.{n}"))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(CodegenError::schema(
                    &node.0,
                    SchemaError::ValueCycle {
                        name: node.1.clone(),
                        path,
                    },
                ));
            }
            None => {}
        }

        marks.insert(node.clone(), Mark::Visiting);
        stack.push(node.clone());
        for next in edges(schema, node) {
            visit(schema, &next, marks, stack)?;
        }
        stack.pop();
        marks.insert(node.clone(), Mark::Done);
        Ok(())
    }

    let mut marks = HashMap::new();
    for module in schema.modules() {
        for ty in &module.types.types {
            let node = (module.id.clone(), ty.name.clone());
            visit(schema, &node, &mut marks, &mut Vec::new())?;
        }
    }
    Ok(())
}
