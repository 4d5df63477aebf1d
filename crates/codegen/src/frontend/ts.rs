//! Syntax tree for the TypeScript files.
//!
//! Only the constructs the client and command emitters produce are modelled;
//! anything else goes through a `Raw` node.

#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    Primitive(TsPrimitive),
    /// `T[]`
    Array(Box<TsType>),
    /// `A | B`
    Union(Vec<TsType>),
    /// Inline `{ a: T; b?: U }`
    Object(Vec<TsProp>),
    /// `Record<K, V>`
    Record {
        key: Box<TsType>,
        value: Box<TsType>,
    },
    /// `"text"` used as a type.
    StringLiteral(String),
    /// A declared or global name, generic arguments included, e.g. `Promise<void>`.
    Named(String),
}

impl TsType {
    pub fn string() -> Self {
        Self::Primitive(TsPrimitive::String)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn array_of(item: Self) -> Self {
        Self::Array(Box::new(item))
    }

    /// `T | null`
    pub fn or_null(self) -> Self {
        Self::Union(vec![self, Self::Primitive(TsPrimitive::Null)])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    String,
    Number,
    Boolean,
    Null,
    Void,
    Unknown,
}

/// Interface member or inline object member.
#[derive(Debug, Clone, PartialEq)]
pub struct TsProp {
    pub name: String,
    pub ty: TsType,
    pub optional: bool,
}

impl TsProp {
    pub fn required(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsLiteral {
    String(String),
    Int(i64),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TsExpr {
    Ident(String),
    Literal(TsLiteral),
    Call {
        callee: String,
        args: Vec<TsExpr>,
    },
    /// `() => body`
    Thunk(Box<TsExpr>),
    /// Single-line object literal. A value that is an identifier equal to its
    /// key is written in shorthand.
    Object(Vec<(String, TsExpr)>),
    /// Object literal laid out one property per line. `depth` is the
    /// indentation level of the line the literal starts on.
    ObjectBlock {
        props: Vec<(String, TsExpr)>,
        depth: usize,
    },
    /// Array literal laid out like [`TsExpr::ObjectBlock`].
    ArrayBlock { items: Vec<TsExpr>, depth: usize },
    /// Backtick template.
    Template(Vec<TemplatePart>),
    /// `...expr`, only meaningful inside an object literal.
    Spread(Box<TsExpr>),
    Raw(String),
}

impl TsExpr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal(TsLiteral::String(value.into()))
    }

    /// A string literal, or `null` when absent.
    pub fn opt_string(value: Option<&str>) -> Self {
        value.map_or(Self::Literal(TsLiteral::Null), Self::string)
    }

    pub fn call(callee: impl Into<String>, args: Vec<TsExpr>) -> Self {
        Self::Call {
            callee: callee.into(),
            args,
        }
    }

    pub fn spread(inner: Self) -> Self {
        Self::Spread(Box::new(inner))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Static(String),
    /// `${expr}`
    Dynamic(TsExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsParam {
    pub name: String,
    pub ty: TsType,
    pub optional: bool,
    pub default: Option<TsExpr>,
}

impl TsParam {
    pub fn new(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            default: None,
        }
    }
}

/// `import type { A, B } from "from";`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeImport {
    pub names: Vec<String>,
    pub from: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDefKind {
    Interface { properties: Vec<TsProp> },
    Alias { ty: TsType },
    /// String enum, `(key, value)` in declaration order.
    Enum { members: Vec<(String, String)> },
}

/// An exported type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TsTypeDef {
    pub name: String,
    pub kind: TypeDefKind,
}

/// `export const NAME: T = value;`
#[derive(Debug, Clone, PartialEq)]
pub struct TsConst {
    pub name: String,
    pub ty: Option<TsType>,
    pub value: TsExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TsStmt {
    Const {
        name: String,
        ty: Option<TsType>,
        init: TsExpr,
    },
    Return(Option<TsExpr>),
    /// Multi-line code, re-indented to the statement's depth.
    Raw(String),
}

/// How an exported function is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FnForm {
    /// `export function f(..) { .. }`
    Declaration,
    /// `export const f = (..) => { .. };`
    Arrow,
    /// `export const f = async (..) => { .. };`
    AsyncArrow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TsFunction {
    pub name: String,
    pub form: FnForm,
    pub params: Vec<TsParam>,
    pub return_type: Option<TsType>,
    pub body: Vec<TsStmt>,
}

/// One emitted `.ts` file, written in field order. `blocks` is verbatim
/// module-level code such as classes. `trailer` comes last so it may refer to
/// any function eagerly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TsModule {
    pub header: String,
    pub imports: Vec<TypeImport>,
    pub consts: Vec<TsConst>,
    pub types: Vec<TsTypeDef>,
    pub blocks: Vec<String>,
    pub functions: Vec<TsFunction>,
    pub trailer: Vec<TsConst>,
}
