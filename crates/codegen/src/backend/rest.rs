use serde::Serialize;

use super::Renderer;
use crate::error::{CodegenError, SchemaError};
use crate::generate::{EmitContext, Emitter, GENERATED_HEADER, GeneratedFile, Target};
use crate::mapper::{RustRecord, RustTypeMapper, Site};
use crate::naming::{field_ident, rust_ident, to_pascal_case, to_snake_case};
use crate::schema::EndpointDefinition;

/// Names the rest template declares or imports.
const TEMPLATE_NAMES: [&str; 10] = [
    "Handlers",
    "Future",
    "Arc",
    "Router",
    "Request",
    "Response",
    "MethodFilter",
    "MiddlewareChainMap",
    "RequestContext",
    "RouteError",
];

/// `<module>/rest.rs`, only for modules declaring endpoints.
#[derive(Debug)]
pub struct RestEmitter<'r> {
    renderer: &'r Renderer,
}

impl<'r> RestEmitter<'r> {
    /// Emitter rendering through `renderer`.
    pub fn new(renderer: &'r Renderer) -> Self {
        Self { renderer }
    }
}

#[derive(Serialize)]
struct RestView {
    header: &'static str,
    endpoints: Vec<EndpointView>,
    /// Endpoints grouped by path, in first-declaration order.
    routes: Vec<RouteView>,
    records: Vec<RustRecord>,
}

#[derive(Serialize, Clone)]
struct EndpointView {
    method: &'static str,
    route: String,
    chain: String,
    handler: String,
    chain_var: String,
    description: Option<String>,
    params: Vec<String>,
    input: Option<String>,
    output: Option<String>,
    /// Pattern binding `request.into_parts()`.
    parts_binding: &'static str,
    path: Option<PathView>,
    /// Arguments of the trait method call.
    call_args: String,
}

/// Path parameter binding and the type it is extracted as.
#[derive(Serialize, Clone)]
struct PathView {
    binding: &'static str,
    ty: String,
}

#[derive(Serialize)]
struct RouteView {
    path: String,
    endpoints: Vec<EndpointView>,
}

fn endpoint_view(
    e: &EndpointDefinition,
    mapper: &mut RustTypeMapper<'_>,
) -> Result<EndpointView, SchemaError> {
    let params: Vec<String> = e
        .placeholders()?
        .into_iter()
        .map(|p| {
            field_ident(p).ok_or_else(|| SchemaError::InvalidIdentifier {
                name: p.to_string(),
                reason: "placeholders must map to a Rust identifier",
            })
        })
        .collect::<Result<_, _>>()?;

    let pascal = to_pascal_case(&e.name);
    let input = e
        .consumes
        .as_ref()
        .map(|dt| mapper.map(dt, &format!("{pascal}Input")))
        .transpose()?;
    let output = e
        .produces
        .as_ref()
        .map(|dt| mapper.map(dt, &format!("{pascal}Output")))
        .transpose()?;

    let mut call_args = vec!["rctx".to_string()];
    let path = match params.len() {
        0 => None,
        1 => {
            call_args.push("param".into());
            Some(PathView {
                binding: "param",
                ty: "String".into(),
            })
        }
        n => {
            call_args.extend((0..n).map(|i| format!("params.{i}")));
            Some(PathView {
                binding: "params",
                ty: format!("({})", vec!["String"; n].join(", ")),
            })
        }
    };
    if input.is_some() {
        call_args.push("input".into());
    }
    let parts_binding = match (path.is_some(), input.is_some()) {
        (true, true) => "(mut parts, body)",
        (true, false) => "(mut parts, _)",
        (false, true) => "(parts, body)",
        (false, false) => "(parts, _)",
    };

    let handler = rust_ident(&to_snake_case(&e.name));
    Ok(EndpointView {
        method: e.method.as_str(),
        route: e.path.clone(),
        chain: e.chain.clone(),
        chain_var: format!("{}_chain", to_snake_case(&e.name)),
        handler,
        description: e
            .description
            .as_ref()
            .map(|d| d.replace(['\n', '\r'], " ")),
        params,
        input,
        output,
        parts_binding,
        path,
        call_args: call_args.join(", "),
    })
}

fn rest_view(ctx: &EmitContext<'_>) -> Result<RestView, SchemaError> {
    let module = ctx.module;
    let mut mapper = RustTypeMapper::new(
        &module.id,
        ctx.config,
        Site::Sibling,
        TEMPLATE_NAMES.map(String::from),
    );

    let mut endpoints = Vec::with_capacity(module.types.endpoints.len());
    for e in &module.types.endpoints {
        let view = endpoint_view(e, &mut mapper)
            .map_err(|err| err.at(format!("endpoint {}", e.name)))?;
        endpoints.push(view);
    }

    let mut routes: Vec<RouteView> = Vec::new();
    for e in &endpoints {
        match routes.iter_mut().find(|r| r.path == e.route) {
            Some(route) => route.endpoints.push(e.clone()),
            None => routes.push(RouteView {
                path: e.route.clone(),
                endpoints: vec![e.clone()],
            }),
        }
    }

    Ok(RestView {
        header: GENERATED_HEADER,
        endpoints,
        routes,
        records: mapper.into_records(),
    })
}

impl Emitter for RestEmitter<'_> {
    fn name(&self) -> &'static str {
        "backend rest"
    }

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
        if ctx.module.types.endpoints.is_empty() {
            return Ok(Vec::new());
        }

        let view = rest_view(ctx).map_err(|e| CodegenError::schema(&ctx.module.id, e))?;
        Ok(vec![GeneratedFile::new(
            Target::Backend,
            format!("{}/rest.rs", ctx.module.id),
            self.renderer.render("rest.rs", &view)?,
        )])
    }
}
