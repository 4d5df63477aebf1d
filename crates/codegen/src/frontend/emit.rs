//! Rendering of [`super::ts`] nodes to source text.
//!
//! Indentation is two spaces. Every declaration ends with a newline; the
//! module adds a blank line between declarations.

use std::fmt::Write as _;

use super::ts::{
    FnForm, TemplatePart, TsConst, TsExpr, TsFunction, TsLiteral, TsModule, TsParam, TsPrimitive,
    TsProp, TsStmt, TsType, TsTypeDef, TypeDefKind, TypeImport,
};
use crate::naming::{escape_js_string, quote_if_needed};

const INDENT: &str = "  ";

/// A node that renders itself as TypeScript source.
pub trait Emit {
    fn emit(&self) -> String;
}

fn join<T: Emit>(items: &[T], sep: &str) -> String {
    items.iter().map(Emit::emit).collect::<Vec<_>>().join(sep)
}

/// `: T`, or nothing.
fn annotation(ty: Option<&TsType>) -> String {
    ty.map_or_else(String::new, |ty| format!(": {}", ty.emit()))
}

fn quoted(s: &str) -> String {
    format!("\"{}\"", escape_js_string(s))
}

impl Emit for TsPrimitive {
    fn emit(&self) -> String {
        let keyword = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Void => "void",
            Self::Unknown => "unknown",
        };
        keyword.to_string()
    }
}

impl Emit for TsLiteral {
    fn emit(&self) -> String {
        match self {
            Self::String(s) => quoted(s),
            Self::Int(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_string(),
        }
    }
}

impl Emit for TsType {
    fn emit(&self) -> String {
        match self {
            Self::Primitive(p) => p.emit(),
            Self::Array(item) if matches!(**item, Self::Union(_)) => format!("({})[]", item.emit()),
            Self::Array(item) => format!("{}[]", item.emit()),
            Self::Union(members) => join(members, " | "),
            Self::Object(props) if props.is_empty() => "{}".to_string(),
            Self::Object(props) => format!("{{ {} }}", join(props, "; ")),
            Self::Record { key, value } => format!("Record<{}, {}>", key.emit(), value.emit()),
            Self::StringLiteral(s) => quoted(s),
            Self::Named(name) => name.clone(),
        }
    }
}

impl Emit for TsProp {
    fn emit(&self) -> String {
        format!(
            "{}{}: {}",
            quote_if_needed(&self.name),
            if self.optional { "?" } else { "" },
            self.ty.emit()
        )
    }
}

impl Emit for TsTypeDef {
    fn emit(&self) -> String {
        let name = &self.name;
        match &self.kind {
            TypeDefKind::Alias { ty } => format!("export type {name} = {};\n", ty.emit()),
            TypeDefKind::Interface { properties } => {
                let mut out = format!("export interface {name} {{\n");
                for prop in properties {
                    let _ = writeln!(out, "{INDENT}{};", prop.emit());
                }
                out.push_str("}\n");
                out
            }
            TypeDefKind::Enum { members } => {
                let mut out = format!("export enum {name} {{\n");
                for (key, value) in members {
                    let _ = writeln!(out, "{INDENT}{key} = {},", quoted(value));
                }
                out.push_str("}\n");
                out
            }
        }
    }
}

impl Emit for TsConst {
    fn emit(&self) -> String {
        format!(
            "export const {}{} = {};\n",
            self.name,
            annotation(self.ty.as_ref()),
            self.value.emit()
        )
    }
}

fn object_entry((key, value): &(String, TsExpr)) -> String {
    match value {
        TsExpr::Ident(name) if name == key => key.clone(),
        TsExpr::Spread(_) => value.emit(),
        _ => format!("{}: {}", quote_if_needed(key), value.emit()),
    }
}

/// Multi-line literal: one entry per line at `depth + 1`, closing bracket at
/// `depth`. Empty input collapses to `open close`.
fn block(open: char, close: char, entries: Vec<String>, depth: usize) -> String {
    if entries.is_empty() {
        return format!("{open}{close}");
    }
    let inner = INDENT.repeat(depth + 1);
    let mut out = format!("{open}\n");
    for entry in entries {
        let _ = writeln!(out, "{inner}{entry},");
    }
    out.push_str(&INDENT.repeat(depth));
    out.push(close);
    out
}

fn template(parts: &[TemplatePart]) -> String {
    let mut out = String::from('`');
    for part in parts {
        match part {
            TemplatePart::Static(s) => out.push_str(&s.replace('\\', "\\\\").replace('`', "\\`")),
            TemplatePart::Dynamic(expr) => {
                let _ = write!(out, "${{{}}}", expr.emit());
            }
        }
    }
    out.push('`');
    out
}

impl Emit for TsExpr {
    fn emit(&self) -> String {
        match self {
            Self::Ident(name) | Self::Raw(name) => name.clone(),
            Self::Literal(lit) => lit.emit(),
            Self::Call { callee, args } => format!("{callee}({})", join(args, ", ")),
            Self::Thunk(body) => format!("() => {}", body.emit()),
            Self::Object(props) if props.is_empty() => "{}".to_string(),
            Self::Object(props) => format!(
                "{{ {} }}",
                props.iter().map(object_entry).collect::<Vec<_>>().join(", ")
            ),
            Self::ObjectBlock { props, depth } => {
                block('{', '}', props.iter().map(object_entry).collect(), *depth)
            }
            Self::ArrayBlock { items, depth } => {
                block('[', ']', items.iter().map(Emit::emit).collect(), *depth)
            }
            Self::Template(parts) => template(parts),
            Self::Spread(inner) => format!("...{}", inner.emit()),
        }
    }
}

impl Emit for TsParam {
    fn emit(&self) -> String {
        let mut out = self.name.clone();
        if self.optional {
            out.push('?');
        }
        let _ = write!(out, ": {}", self.ty.emit());
        if let Some(default) = &self.default {
            let _ = write!(out, " = {}", default.emit());
        }
        out
    }
}

impl TsStmt {
    /// Render at `depth` levels of indentation.
    pub fn emit_at(&self, depth: usize) -> String {
        let pad = INDENT.repeat(depth);
        match self {
            Self::Const { name, ty, init } => format!(
                "{pad}const {name}{} = {};\n",
                annotation(ty.as_ref()),
                init.emit()
            ),
            Self::Return(None) => format!("{pad}return;\n"),
            Self::Return(Some(expr)) => format!("{pad}return {};\n", expr.emit()),
            Self::Raw(code) => reindent(code, &pad),
        }
    }
}

fn reindent(code: &str, pad: &str) -> String {
    let mut out = String::new();
    for line in code.lines() {
        if !line.is_empty() {
            out.push_str(pad);
            out.push_str(line);
        }
        out.push('\n');
    }
    out
}

impl Emit for TsFunction {
    fn emit(&self) -> String {
        let name = &self.name;
        let signature = format!(
            "({}){}",
            join(&self.params, ", "),
            annotation(self.return_type.as_ref())
        );
        let (mut out, close) = match self.form {
            FnForm::Declaration => (format!("export function {name}{signature} {{\n"), "}\n"),
            FnForm::Arrow => (format!("export const {name} = {signature} => {{\n"), "};\n"),
            FnForm::AsyncArrow => (
                format!("export const {name} = async {signature} => {{\n"),
                "};\n",
            ),
        };
        for stmt in &self.body {
            out.push_str(&stmt.emit_at(1));
        }
        out.push_str(close);
        out
    }
}

impl Emit for TypeImport {
    fn emit(&self) -> String {
        format!(
            "import type {{ {} }} from {};\n",
            self.names.join(", "),
            quoted(&self.from)
        )
    }
}

impl Emit for TsModule {
    fn emit(&self) -> String {
        let mut sections: Vec<String> = Vec::new();
        if !self.header.is_empty() {
            sections.push(format!("{}\n", self.header));
        }
        if !self.imports.is_empty() {
            sections.push(self.imports.iter().map(Emit::emit).collect());
        }
        if !self.consts.is_empty() {
            sections.push(self.consts.iter().map(Emit::emit).collect());
        }
        sections.extend(self.types.iter().map(Emit::emit));
        sections.extend(self.blocks.iter().map(|code| reindent(code, "")));
        sections.extend(self.functions.iter().map(Emit::emit));
        if !self.trailer.is_empty() {
            sections.push(self.trailer.iter().map(Emit::emit).collect());
        }

        let mut out = sections.join("\n");
        out.truncate(out.trim_end().len());
        out.push('\n');
        out
    }
}
