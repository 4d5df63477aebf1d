//! Identifier conversion shared by the Rust and TypeScript emitters.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Words a TypeScript binding or enum member may not be named.
pub static TS_RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "break",
        "case",
        "catch",
        "class",
        "const",
        "continue",
        "debugger",
        "default",
        "delete",
        "do",
        "else",
        "enum",
        "export",
        "extends",
        "false",
        "finally",
        "for",
        "function",
        "if",
        "import",
        "in",
        "instanceof",
        "new",
        "null",
        "return",
        "super",
        "switch",
        "this",
        "throw",
        "true",
        "try",
        "typeof",
        "var",
        "void",
        "while",
        "with",
        "yield",
        "let",
        "static",
        "implements",
        "interface",
        "package",
        "private",
        "protected",
        "public",
        "await",
        "async",
    ]
    .into_iter()
    .collect()
});

/// Rust strict and reserved keywords (2024 edition).
static RUST_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
        "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
        "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
        "trait", "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box",
        "do", "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual",
        "yield",
    ]
    .into_iter()
    .collect()
});

/// Strict and reserved Rust keywords, `self` and `Self` included.
pub fn is_rust_keyword(name: &str) -> bool {
    RUST_KEYWORDS.contains(name)
}

/// Whether `name` is an ASCII identifier: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split an identifier-ish string into words on separators and case changes.
///
/// `FolderId` → `Folder`, `Id`; `SSHKey` → `SSH`, `Key`; `ssh-key` → `ssh`, `key`.
fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();

    for part in s.split(|c: char| !c.is_ascii_alphanumeric()) {
        let chars: Vec<char> = part.chars().collect();
        let mut current = String::new();

        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && c.is_ascii_uppercase() {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                let boundary = prev.is_ascii_lowercase() || (prev.is_ascii_uppercase() && next_is_lower);
                if boundary && !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(c);
        }

        if !current.is_empty() {
            words.push(current);
        }
    }

    words
}

/// `secret` → `Secret`; other characters untouched.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// `listContacts` becomes `list_contacts`.
pub fn to_snake_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// `list_contacts` becomes `ListContacts`.
pub fn to_pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize_first(w)).collect()
}

/// `maxLength` becomes `MAX_LENGTH`.
pub fn to_screaming_snake_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_ascii_uppercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Make `name` usable as a Rust identifier, raw-escaping keywords.
///
/// `self`, `Self`, `super` and `crate` cannot be raw identifiers and get an
/// underscore suffix instead.
pub fn rust_ident(name: &str) -> String {
    if !RUST_KEYWORDS.contains(name) {
        return name.to_string();
    }
    match name {
        "self" | "Self" | "super" | "crate" => format!("{name}_"),
        _ => format!("r#{name}"),
    }
}

/// Rust field identifier for a wire key, or `None` if it has no usable form.
pub fn field_ident(key: &str) -> Option<String> {
    let snake = to_snake_case(key);
    is_identifier(&snake).then(|| rust_ident(&snake))
}

/// Rust string literal for `value`, quotes included.
pub fn rust_string_literal(value: &str) -> String {
    format!("{value:?}")
}

/// Whether `name` must be quoted as an object key.
pub fn needs_quoting(name: &str) -> bool {
    name.is_empty()
        || !name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        || !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Body of a double-quoted TypeScript string, without the quotes.
pub fn escape_js_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// `name` as an object key, quoted only when required.
pub fn quote_if_needed(name: &str) -> String {
    if needs_quoting(name) {
        format!("\"{}\"", escape_js_string(name))
    } else {
        name.to_string()
    }
}
