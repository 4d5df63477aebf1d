//! Rust artifacts, rendered from `tera` templates fed with serializable views.
//!
//! Templates never see raw schema strings in literal position: every string
//! that lands inside Rust quotes goes through the `rust_str` filter.

mod commands;
mod events;
mod rest;
mod types;

use std::collections::HashMap;

use serde::Serialize;
use tera::{Context, Tera, Value};

pub use commands::CommandsEmitter;
pub use events::EventsEmitter;
pub use rest::RestEmitter;
pub use types::TypesEmitter;

use crate::error::CodegenError;
use crate::naming::rust_string_literal;

const TEMPLATES: [(&str, &str); 5] = [
    ("macros.rs", include_str!("../../templates/macros.rs.tera")),
    ("types.rs", include_str!("../../templates/types.rs.tera")),
    ("commands.rs", include_str!("../../templates/commands.rs.tera")),
    ("events.rs", include_str!("../../templates/events.rs.tera")),
    ("rest.rs", include_str!("../../templates/rest.rs.tera")),
];

/// Compiled backend templates.
#[derive(Debug)]
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    /// Compile every template. Fails only if a template does not parse.
    pub fn new() -> Result<Self, CodegenError> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);
        tera.register_filter("rust_str", rust_str);
        tera.add_raw_templates(TEMPLATES)
            .map_err(|source| CodegenError::Render {
                template: "backend templates".into(),
                source,
            })?;
        Ok(Self { tera })
    }

    /// Render `template` with `view` and normalize the layout.
    pub fn render<V: Serialize>(&self, template: &str, view: &V) -> Result<String, CodegenError> {
        let render_err = |source| CodegenError::Render {
            template: template.to_string(),
            source,
        };
        let context = Context::from_serialize(view).map_err(render_err)?;
        let output = self.tera.render(template, &context).map_err(render_err)?;
        Ok(tidy(&output))
    }
}

/// `{{ value | rust_str }}`: a quoted, escaped Rust string literal.
fn rust_str(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("rust_str expects a string"))?;
    Ok(Value::String(rust_string_literal(s)))
}

/// Layout cleanup for template output.
///
/// Strips trailing whitespace, collapses blank-line runs, drops blank lines
/// right after `{` or before `}`, and ends with exactly one newline.
fn tidy(source: &str) -> String {
    let lines: Vec<&str> = source.lines().map(str::trim_end).collect();
    let mut out: Vec<&str> = Vec::with_capacity(lines.len());

    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            let after_open = out.last().is_none_or(|prev| prev.is_empty() || prev.ends_with('{'));
            let before_close = lines[i + 1..]
                .iter()
                .find(|l| !l.is_empty())
                .is_none_or(|next| next.trim_start().starts_with('}'));
            if after_open || before_close {
                continue;
            }
        }
        out.push(line);
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}
