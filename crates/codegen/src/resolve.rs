//! Type graph traversal over a validated schema.

use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{ApplicationTypesDefinition, DatatypeDef, ModuleSchema};

/// Visit `dt` and every node below it, depth first.
pub fn walk<'a>(dt: &'a DatatypeDef, visit: &mut impl FnMut(&'a DatatypeDef)) {
    visit(dt);
    if let Some(of) = dt.of.as_deref() {
        walk(of, visit);
    }
    if let Some(fields) = &dt.fields {
        for field in fields.values() {
            walk(field, visit);
        }
    }
}

/// Root nodes of the frontend-visible part of a module: named types and
/// endpoint payloads.
pub fn api_datatypes(types: &ApplicationTypesDefinition) -> Vec<&DatatypeDef> {
    let mut roots: Vec<&DatatypeDef> = types.types.iter().map(|t| &t.ty).collect();
    for e in &types.endpoints {
        roots.extend(e.consumes.iter());
        roots.extend(e.produces.iter());
    }
    roots
}

/// Every root node a module declares, events included.
pub fn module_datatypes(module: &ModuleSchema) -> Vec<&DatatypeDef> {
    let mut roots = api_datatypes(&module.types);
    for event in &module.events {
        roots.extend(event.fields.iter().map(|f| &f.ty));
    }
    roots
}

/// Custom types reachable from the fields of declared types, deduplicated by
/// raw name and sorted by it. Primitives are never included.
pub fn flatten(types: &ApplicationTypesDefinition) -> Vec<&DatatypeDef> {
    let mut found: BTreeMap<&str, &DatatypeDef> = BTreeMap::new();
    for t in &types.types {
        walk(&t.ty, &mut |node| {
            if node.is_custom() {
                found.entry(node.name.as_str()).or_insert(node);
            }
        });
    }
    found.into_values().collect()
}

/// Names of custom types transitively reachable from endpoint payloads.
///
/// Local names are bare, foreign ones module-qualified. Named types of the
/// same module are followed into their fields.
pub fn reachable_from_endpoints(module: &ModuleSchema) -> Vec<String> {
    let mut seen = BTreeSet::new();
    for e in &module.types.endpoints {
        for dt in e.consumes.iter().chain(e.produces.iter()) {
            visit_reachable(module, dt, &mut seen);
        }
    }
    seen.into_iter().collect()
}

fn visit_reachable(module: &ModuleSchema, dt: &DatatypeDef, seen: &mut BTreeSet<String>) {
    let mut named = Vec::new();
    walk(dt, &mut |node| {
        let Some(custom) = node.custom_ref() else {
            return;
        };
        if custom.is_local_to(&module.id) {
            if seen.insert(custom.name.to_string())
                && let Some(t) = module.types.find_type(custom.name)
            {
                named.push(&t.ty);
            }
        } else {
            seen.insert(node.name.clone());
        }
    });

    for ty in named {
        visit_reachable(module, ty, seen);
    }
}

/// Other modules this module refers to by qualified name, sorted.
pub fn module_dependencies(module: &ModuleSchema) -> Vec<String> {
    let mut deps = BTreeSet::new();
    for root in module_datatypes(module) {
        walk(root, &mut |node| {
            if let Some(custom) = node.custom_ref()
                && let Some(dep) = custom.module.filter(|m| *m != module.id)
            {
                deps.insert(dep.to_string());
            }
        });
    }
    deps.into_iter().collect()
}

/// Foreign names used by the frontend-visible part of a module, grouped by
/// module id.
pub fn foreign_api_imports<'a>(
    module_id: &str,
    types: &'a ApplicationTypesDefinition,
) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
    let mut imports: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for root in api_datatypes(types) {
        walk(root, &mut |node| {
            if let Some(custom) = node.custom_ref()
                && let Some(dep) = custom.module.filter(|m| *m != module_id)
            {
                imports.entry(dep).or_default().insert(custom.name);
            }
        });
    }
    imports
}

/// Whether the frontend-visible part of a module uses `datetime`.
pub fn uses_datetime(types: &ApplicationTypesDefinition) -> bool {
    let mut found = false;
    for root in api_datatypes(types) {
        walk(root, &mut |node| found |= node.name == "datetime");
    }
    found
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::schema::{EndpointDefinition, HttpMethod, NamedDatatypeDef};

    fn named(name: &str, fields: &[(&str, DatatypeDef)]) -> NamedDatatypeDef {
        NamedDatatypeDef {
            name: name.into(),
            ty: DatatypeDef::object(fields.iter().map(|(k, v)| ((*k).to_string(), v.clone()))),
        }
    }

    fn endpoint(name: &str, consumes: Option<DatatypeDef>, produces: Option<DatatypeDef>) -> EndpointDefinition {
        EndpointDefinition {
            method: HttpMethod::Post,
            path: format!("/{name}"),
            name: name.into(),
            chain: "public".into(),
            description: None,
            consumes,
            produces,
        }
    }

    fn custom(name: &str) -> DatatypeDef {
        DatatypeDef::primitive(name)
    }

    fn address_book() -> ModuleSchema {
        let mut module = ModuleSchema::new("contacts");
        module.types.types = vec![
            named(
                "Contact",
                &[
                    ("Name", DatatypeDef::primitive("string")),
                    ("Address", custom("Address").nullable()),
                    ("Tags", DatatypeDef::list_of(custom("Tag"))),
                ],
            ),
            named(
                "Address",
                &[
                    ("Street", DatatypeDef::primitive("string")),
                    (
                        "Geo",
                        DatatypeDef::object([("Zone".to_string(), custom("Zone"))]),
                    ),
                ],
            ),
            named("Tag", &[("Label", DatatypeDef::primitive("string"))]),
            named("Zone", &[("Code", DatatypeDef::primitive("string"))]),
            named(
                "Folder",
                &[
                    ("Children", DatatypeDef::list_of(custom("Folder"))),
                    ("Owner", custom("accounts.User")),
                ],
            ),
        ];
        module
    }

    #[test]
    fn test_flatten_dedups_and_excludes_primitives() {
        let module = address_book();
        let names: Vec<&str> = flatten(&module.types).iter().map(|dt| dt.name.as_str()).collect();
        assert_eq!(names, vec!["Address", "Folder", "Tag", "Zone", "accounts.User"]);
    }

    #[test]
    fn test_flatten_empty() {
        assert!(flatten(&ApplicationTypesDefinition::default()).is_empty());
    }

    #[test]
    fn test_reachable_from_endpoints_follows_named_types() {
        let mut module = address_book();
        module.types.endpoints = vec![
            endpoint("addContact", Some(custom("Contact")), None),
            endpoint("listFolders", None, Some(DatatypeDef::list_of(custom("Folder")))),
        ];

        assert_eq!(
            reachable_from_endpoints(&module),
            vec!["Address", "Contact", "Folder", "Tag", "Zone", "accounts.User"]
        );
    }

    #[test]
    fn test_reachable_from_endpoints_skips_unreferenced() {
        let mut module = address_book();
        module.types.endpoints = vec![endpoint("addTag", Some(custom("Tag")), None)];
        assert_eq!(reachable_from_endpoints(&module), vec!["Tag"]);
    }

    #[test]
    fn test_module_dependencies() {
        let mut module = address_book();
        module.types.endpoints = vec![endpoint("self", Some(custom("contacts.Contact")), None)];
        assert_eq!(module_dependencies(&module), vec!["accounts"]);

        let imports = foreign_api_imports("contacts", &module.types);
        assert_eq!(imports.len(), 1);
        assert!(imports["accounts"].contains("User"));
    }

    #[test]
    fn test_uses_datetime() {
        let mut module = address_book();
        assert!(!uses_datetime(&module.types));

        module.types.endpoints =
            vec![endpoint("since", None, Some(DatatypeDef::primitive("datetime")))];
        assert!(uses_datetime(&module.types));
    }
}
