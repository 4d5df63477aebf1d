//! `<module>_api.ts`: mirrored types, enums, constants and one typed fetch
//! call per endpoint.

use super::emit::Emit;
use super::ts::{
    FnForm, TemplatePart, TsConst, TsExpr, TsFunction, TsModule, TsParam, TsPrimitive, TsStmt,
    TsType, TsTypeDef, TypeDefKind, TypeImport,
};
use crate::error::SchemaError;
use crate::generate::{EmitContext, GENERATED_HEADER};
use crate::mapper::{DATETIME_ALIAS, ts_props, ts_type};
use crate::resolve::{foreign_api_imports, uses_datetime};
use crate::schema::{EndpointDefinition, EnumDef, PathPart, Shape};

/// Build the client module of `ctx.module`.
pub fn codegen_client(ctx: &EmitContext<'_>) -> Result<TsModule, SchemaError> {
    let types = &ctx.module.types;

    let imports = foreign_api_imports(&ctx.module.id, types)
        .into_iter()
        .map(|(module, names)| TypeImport {
            names: names.into_iter().map(str::to_string).collect(),
            from: ctx.config.frontend_api_path(module),
        })
        .collect();

    let consts = types
        .string_consts
        .iter()
        .map(|c| TsConst {
            name: c.key.clone(),
            ty: None,
            value: TsExpr::string(c.value.clone()),
        })
        .collect();

    let mut defs = Vec::new();
    if uses_datetime(types) {
        defs.push(TsTypeDef {
            name: DATETIME_ALIAS.into(),
            kind: TypeDefKind::Alias { ty: TsType::string() },
        });
    }
    for e in &types.enums {
        defs.push(TsTypeDef {
            name: e.name.clone(),
            kind: TypeDefKind::Enum {
                members: e.members().into_iter().map(|m| (m.key, m.value)).collect(),
            },
        });
    }
    for t in &types.types {
        let Shape::Object(fields) = t.ty.shape()? else {
            continue;
        };
        defs.push(TsTypeDef {
            name: t.name.clone(),
            kind: TypeDefKind::Interface {
                properties: ts_props(fields)?,
            },
        });
    }

    let blocks = if types.endpoints.is_empty() {
        Vec::new()
    } else {
        vec![API_ERROR_CLASS.to_string(), DEFAULT_ERROR_HANDLER.to_string()]
    };

    let mut functions: Vec<TsFunction> = types.enums.iter().map(codegen_exhaustive).collect();
    for e in &types.endpoints {
        functions.push(codegen_url_function(e)?);
        functions.push(codegen_fetch_function(e)?);
    }

    Ok(TsModule {
        header: GENERATED_HEADER.into(),
        imports,
        consts,
        types: defs,
        blocks,
        functions,
        trailer: Vec::new(),
    })
}

const API_ERROR_CLASS: &str = r#"export class ApiError extends Error {
  status: number;
  statusText: string;
  body: unknown;

  constructor(status: number, statusText: string, body: unknown) {
    super(`HTTP ${status}: ${statusText}`);
    this.name = "ApiError";
    this.status = status;
    this.statusText = statusText;
    this.body = body;
  }
}"#;

const DEFAULT_ERROR_HANDLER: &str = r"export function defaultErrorHandler(err: unknown): void {
  alert(err instanceof Error ? err.message : String(err));
}";

/// Identity function whose name changes with the member set, so every
/// caller must be revisited when the enum changes.
fn codegen_exhaustive(e: &EnumDef) -> TsFunction {
    TsFunction {
        name: format!("{}Exhaustive{}", e.name, e.members_digest()),
        form: FnForm::Declaration,
        params: vec![TsParam::new("value", TsType::named(e.name.clone()))],
        return_type: Some(TsType::named(e.name.clone())),
        body: vec![TsStmt::Return(Some(TsExpr::ident("value")))],
    }
}

fn placeholder_params(e: &EndpointDefinition) -> Result<Vec<TsParam>, SchemaError> {
    Ok(e.placeholders()?
        .into_iter()
        .map(|name| TsParam::new(name, TsType::string()))
        .collect())
}

/// Path expression with every placeholder percent-encoded.
fn path_expr(e: &EndpointDefinition) -> Result<TsExpr, SchemaError> {
    let parts = e.path_parts()?;
    if parts.iter().all(|p| matches!(p, PathPart::Static(_))) {
        return Ok(TsExpr::string(e.path.clone()));
    }

    Ok(TsExpr::Template(
        parts
            .into_iter()
            .map(|part| match part {
                PathPart::Static(s) => TemplatePart::Static(s.to_string()),
                PathPart::Placeholder(name) => TemplatePart::Dynamic(TsExpr::call(
                    "encodeURIComponent",
                    vec![TsExpr::ident(name)],
                )),
            })
            .collect(),
    ))
}

fn url_function_name(e: &EndpointDefinition) -> String {
    format!("{}Url", e.name)
}

/// `export const <name>Url = (id: string): string => { ... };`
fn codegen_url_function(e: &EndpointDefinition) -> Result<TsFunction, SchemaError> {
    Ok(TsFunction {
        name: url_function_name(e),
        form: FnForm::Arrow,
        params: placeholder_params(e)?,
        return_type: Some(TsType::string()),
        body: vec![TsStmt::Return(Some(path_expr(e)?))],
    })
}

/// `export const <name> = async (id: string, body: T, options?: RequestInit): Promise<P> => { ... };`
fn codegen_fetch_function(e: &EndpointDefinition) -> Result<TsFunction, SchemaError> {
    let placeholders = e.placeholders()?;
    let mut params = placeholder_params(e)?;

    let mut fetch_options = vec![
        ("options".to_string(), TsExpr::spread(TsExpr::ident("options"))),
        ("method".to_string(), TsExpr::string(e.method.as_str())),
    ];

    if let Some(consumes) = &e.consumes {
        params.push(TsParam::new("body", ts_type(consumes)?));
        fetch_options.push((
            "headers".to_string(),
            TsExpr::Object(vec![
                ("Content-Type".to_string(), TsExpr::string("application/json")),
                (
                    "options".to_string(),
                    TsExpr::spread(TsExpr::Raw("options?.headers".into())),
                ),
            ]),
        ));
        fetch_options.push((
            "body".to_string(),
            TsExpr::call("JSON.stringify", vec![TsExpr::ident("body")]),
        ));
    }

    params.push(TsParam {
        optional: true,
        ..TsParam::new("options", TsType::named("RequestInit"))
    });

    let url_call = TsExpr::call(
        url_function_name(e),
        placeholders.iter().map(|p| TsExpr::ident(*p)).collect(),
    );

    let mut body = vec![
        TsStmt::Const {
            name: "res".into(),
            ty: None,
            init: TsExpr::Raw(format!(
                "await fetch({}, {})",
                url_call.emit(),
                TsExpr::Object(fetch_options).emit()
            )),
        },
        TsStmt::Raw(
            r"if (!res.ok) {
  const text = await res.text();
  let parsed: unknown;
  try { parsed = JSON.parse(text); } catch { parsed = text; }
  throw new ApiError(res.status, res.statusText, parsed);
}"
            .into(),
        ),
    ];

    let return_type = match &e.produces {
        Some(produces) => {
            let ty = ts_type(produces)?;
            body.push(TsStmt::Return(Some(TsExpr::Raw(format!(
                "(await res.json()) as {}",
                ty.emit()
            )))));
            TsType::named(format!("Promise<{}>", ty.emit()))
        }
        None => {
            body.push(TsStmt::Return(None));
            TsType::named(format!("Promise<{}>", TsPrimitive::Void.emit()))
        }
    };

    Ok(TsFunction {
        name: e.name.clone(),
        form: FnForm::AsyncArrow,
        params,
        return_type: Some(return_type),
        body,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::schema::{
        DatatypeDef, HttpMethod, ModuleSchema, NamedDatatypeDef, SchemaSet, StringConstDef,
    };

    fn endpoint(
        method: HttpMethod,
        path: &str,
        name: &str,
        consumes: Option<DatatypeDef>,
        produces: Option<DatatypeDef>,
    ) -> EndpointDefinition {
        EndpointDefinition {
            method,
            path: path.into(),
            name: name.into(),
            chain: "authenticated".into(),
            description: None,
            consumes,
            produces,
        }
    }

    fn contacts() -> ModuleSchema {
        let mut module = ModuleSchema::new("contacts");
        module.types.string_consts = vec![StringConstDef {
            key: "RootFolderId".into(),
            value: "root".into(),
        }];
        module.types.enums = vec![EnumDef {
            name: "ContactKind".into(),
            string_members: vec!["person".into(), "company".into()],
        }];
        module.types.types = vec![NamedDatatypeDef {
            name: "Contact".into(),
            ty: DatatypeDef::object([
                ("name".to_string(), DatatypeDef::primitive("string")),
                ("email".to_string(), DatatypeDef::primitive("string")),
                ("owner".to_string(), DatatypeDef::primitive("accounts.User").nullable()),
                ("added".to_string(), DatatypeDef::primitive("datetime")),
            ]),
        }];
        module.types.endpoints = vec![
            endpoint(
                HttpMethod::Post,
                "/contacts",
                "addContact",
                Some(DatatypeDef::primitive("Contact")),
                Some(DatatypeDef::primitive("Contact")),
            ),
            endpoint(
                HttpMethod::Get,
                "/users/{id}/addresses/{idx}",
                "getAddress",
                None,
                Some(DatatypeDef::list_of(DatatypeDef::primitive("string"))),
            ),
        ];
        module
    }

    fn emit(module: &ModuleSchema) -> String {
        let schema = SchemaSet::new(vec![module.clone()]);
        let config = GeneratorConfig::default();
        let ctx = EmitContext {
            module,
            schema: &schema,
            config: &config,
        };
        codegen_client(&ctx).unwrap().emit()
    }

    #[test]
    fn test_client_declarations() {
        let out = emit(&contacts());

        assert!(out.starts_with(GENERATED_HEADER));
        assert!(out.contains("import type { User } from \"generated/accounts_api\";\n"));
        assert!(out.contains("export const RootFolderId = \"root\";\n"));
        assert!(out.contains("export type datetimeRFC3339 = string;\n"));
        assert!(out.contains(
            "export enum ContactKind {\n  Person = \"person\",\n  Company = \"company\",\n}\n"
        ));
        assert!(out.contains(
            "export interface Contact {\n  added: datetimeRFC3339;\n  email: string;\n  name: string;\n  owner: User | null;\n}\n"
        ));

        let digest = contacts().types.enums[0].members_digest();
        assert!(out.contains(&format!(
            "export function ContactKindExhaustive{digest}(value: ContactKind): ContactKind {{\n  return value;\n}}\n"
        )));
        assert!(out.contains("export class ApiError extends Error {"));
        assert!(out.contains("export function defaultErrorHandler(err: unknown): void {"));
    }

    #[test]
    fn test_path_placeholders_become_string_args() {
        let out = emit(&contacts());

        assert!(out.contains(
            "export const getAddressUrl = (id: string, idx: string): string => {\n  return `/users/${encodeURIComponent(id)}/addresses/${encodeURIComponent(idx)}`;\n};\n"
        ));
        assert!(out.contains(
            "export const getAddress = async (id: string, idx: string, options?: RequestInit): Promise<string[]> => {\n  const res = await fetch(getAddressUrl(id, idx), { ...options, method: \"GET\" });\n"
        ));
        assert!(out.contains("  return (await res.json()) as string[];\n"));
    }

    #[test]
    fn test_body_parameter_follows_placeholders() {
        let out = emit(&contacts());

        assert!(out.contains(
            "export const addContact = async (body: Contact, options?: RequestInit): Promise<Contact> => {"
        ));
        assert!(out.contains(
            "await fetch(addContactUrl(), { ...options, method: \"POST\", headers: { \"Content-Type\": \"application/json\", ...options?.headers }, body: JSON.stringify(body) });"
        ));
        assert!(out.contains("  return \"/contacts\";\n"));
    }

    #[test]
    fn test_void_endpoint() {
        let mut module = ModuleSchema::new("contacts");
        module.types.endpoints = vec![endpoint(HttpMethod::Delete, "/contacts/{id}", "removeContact", None, None)];
        let out = emit(&module);

        assert!(out.contains(
            "export const removeContact = async (id: string, options?: RequestInit): Promise<void> => {"
        ));
        assert!(out.contains("  return;\n};\n"));
        assert!(!out.contains("datetimeRFC3339"));
    }
}
