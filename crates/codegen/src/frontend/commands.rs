//! `<module>_commands.ts`: command form definitions for the browser UI.

use super::ts::{
    FnForm, TsConst, TsExpr, TsFunction, TsLiteral, TsModule, TsParam, TsPrimitive, TsProp, TsStmt,
    TsType, TsTypeDef, TypeDefKind,
};
use crate::generate::{EmitContext, GENERATED_HEADER};
use crate::schema::{CommandFieldSpec, CommandSpec, CrudNature, FieldKind};

const FIELD_KINDS: [FieldKind; 5] = [
    FieldKind::Text,
    FieldKind::Multiline,
    FieldKind::Password,
    FieldKind::Checkbox,
    FieldKind::Integer,
];

/// Build the command definitions module, or `None` without commands.
pub fn codegen_commands(ctx: &EmitContext<'_>) -> Option<TsModule> {
    let commands = &ctx.module.commands;
    if commands.is_empty() {
        return None;
    }

    let mut types = shared_types();
    types.extend(commands.iter().map(values_interface));

    let functions = commands.iter().map(definition_factory).collect();

    let table = commands
        .iter()
        .map(|c| {
            (
                c.command.clone(),
                TsExpr::Thunk(Box::new(TsExpr::call(c.struct_name(), Vec::new()))),
            )
        })
        .collect();

    Some(TsModule {
        header: GENERATED_HEADER.into(),
        types,
        functions,
        trailer: vec![TsConst {
            name: "commandDefinitions".into(),
            ty: Some(TsType::Record {
                key: Box::new(TsType::string()),
                value: Box::new(TsType::named("() => CommandDefinition")),
            }),
            value: TsExpr::ObjectBlock {
                props: table,
                depth: 0,
            },
        }],
        ..TsModule::default()
    })
}

fn string_union<'a>(values: impl IntoIterator<Item = &'a str>) -> TsType {
    TsType::Union(
        values
            .into_iter()
            .map(|v| TsType::StringLiteral(v.to_string()))
            .collect(),
    )
}

fn crud_nature_str(nature: CrudNature) -> &'static str {
    match nature {
        CrudNature::Create => "create",
        CrudNature::Update => "update",
        CrudNature::Delete => "delete",
    }
}

fn shared_types() -> Vec<TsTypeDef> {
    let number = || TsType::Primitive(TsPrimitive::Number);
    let boolean = || TsType::Primitive(TsPrimitive::Boolean);

    vec![
        TsTypeDef {
            name: "CommandFieldKind".into(),
            kind: TypeDefKind::Alias {
                ty: string_union(FIELD_KINDS.map(FieldKind::as_str)),
            },
        },
        TsTypeDef {
            name: "CrudNature".into(),
            kind: TypeDefKind::Alias {
                ty: string_union(
                    [CrudNature::Create, CrudNature::Update, CrudNature::Delete].map(crud_nature_str),
                ),
            },
        },
        TsTypeDef {
            name: "CommandFieldDefinition".into(),
            kind: TypeDefKind::Interface {
                properties: vec![
                    TsProp::required("key", TsType::string()),
                    TsProp::required("title", TsType::string()),
                    TsProp::required("kind", TsType::named("CommandFieldKind")),
                    TsProp::required("optional", boolean()),
                    TsProp::required("maxLength", number().or_null()),
                    TsProp::required("validationRegex", TsType::string().or_null()),
                    TsProp::required("placeholder", TsType::string().or_null()),
                    TsProp::required("help", TsType::string().or_null()),
                    TsProp::required("hideIfDefaultValue", boolean()),
                ],
            },
        },
        TsTypeDef {
            name: "CommandDefinition".into(),
            kind: TypeDefKind::Interface {
                properties: vec![
                    TsProp::required("key", TsType::string()),
                    TsProp::required("title", TsType::string()),
                    TsProp::required("chain", TsType::string()),
                    TsProp::required("crudNature", TsType::named("CrudNature").or_null()),
                    TsProp::required("additionalConfirmation", TsType::string().or_null()),
                    TsProp::required(
                        "fields",
                        TsType::array_of(TsType::named("CommandFieldDefinition")),
                    ),
                    TsProp::required(
                        "prefill",
                        TsType::Record {
                            key: Box::new(TsType::string()),
                            value: Box::new(TsType::Primitive(TsPrimitive::Unknown)),
                        },
                    ),
                ],
            },
        },
    ]
}

fn values_interface_name(spec: &CommandSpec) -> String {
    format!("{}Values", spec.struct_name())
}

fn value_type(kind: FieldKind) -> TsType {
    match kind {
        FieldKind::Text | FieldKind::Multiline | FieldKind::Password => TsType::string(),
        FieldKind::Checkbox => TsType::Primitive(TsPrimitive::Boolean),
        FieldKind::Integer => TsType::Primitive(TsPrimitive::Number),
    }
}

/// Field values as the backend command record expects them.
fn values_interface(spec: &CommandSpec) -> TsTypeDef {
    TsTypeDef {
        name: values_interface_name(spec),
        kind: TypeDefKind::Interface {
            properties: spec
                .fields
                .iter()
                .map(|f| TsProp::required(&f.key, value_type(f.kind)))
                .collect(),
        },
    }
}

fn field_definition(field: &CommandFieldSpec) -> TsExpr {
    let max_length = field
        .effective_max_length()
        .and_then(|n| i64::try_from(n).ok())
        .map_or(TsExpr::Literal(TsLiteral::Null), |n| TsExpr::Literal(TsLiteral::Int(n)));

    TsExpr::Object(vec![
        ("key".into(), TsExpr::string(field.key.clone())),
        ("title".into(), TsExpr::string(field.title())),
        ("kind".into(), TsExpr::string(field.kind.as_str())),
        ("optional".into(), TsExpr::Literal(TsLiteral::Bool(field.optional))),
        ("maxLength".into(), max_length),
        ("validationRegex".into(), TsExpr::opt_string(field.validation_regex.as_deref())),
        ("placeholder".into(), TsExpr::opt_string(field.placeholder.as_deref())),
        ("help".into(), TsExpr::opt_string(field.help.as_deref())),
        (
            "hideIfDefaultValue".into(),
            TsExpr::Literal(TsLiteral::Bool(field.hide_if_default_value)),
        ),
    ])
}

/// `export const AccountCreate = (prefill: Partial<AccountCreateValues> = {}): CommandDefinition => { ... };`
fn definition_factory(spec: &CommandSpec) -> TsFunction {
    let fields = TsExpr::ArrayBlock {
        items: spec.fields.iter().map(field_definition).collect(),
        depth: 1,
    };

    let definition = TsExpr::ObjectBlock {
        props: vec![
            ("key".into(), TsExpr::string(spec.command.clone())),
            ("title".into(), TsExpr::string(spec.title.clone())),
            ("chain".into(), TsExpr::string(spec.chain.clone())),
            (
                "crudNature".into(),
                TsExpr::opt_string(spec.crud_nature.map(crud_nature_str)),
            ),
            (
                "additionalConfirmation".into(),
                TsExpr::opt_string(spec.additional_confirmation.as_deref()),
            ),
            ("fields".into(), TsExpr::ident("fields")),
            ("prefill".into(), TsExpr::ident("prefill")),
        ],
        depth: 1,
    };

    TsFunction {
        name: spec.struct_name(),
        form: FnForm::Arrow,
        params: vec![TsParam {
            default: Some(TsExpr::Object(Vec::new())),
            ..TsParam::new(
                "prefill",
                TsType::named(format!("Partial<{}>", values_interface_name(spec))),
            )
        }],
        return_type: Some(TsType::named("CommandDefinition")),
        body: vec![
            TsStmt::Const {
                name: "fields".into(),
                ty: Some(TsType::array_of(TsType::named("CommandFieldDefinition"))),
                init: fields,
            },
            TsStmt::Return(Some(definition)),
        ],
    }
}
