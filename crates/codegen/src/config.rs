/// How generated backend modules reach their files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BackendLayout {
    /// `mod.rs` files with `pub mod` declarations, for a checked-in tree.
    #[default]
    ModuleTree,
    /// One wrapper file that `include!`s every artifact from `OUT_DIR`.
    Include,
}

/// Settings that shape the generated code rather than where it is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Rust path of the directory holding every generated module,
    /// e.g. `crate::generated`.
    pub backend_module_prefix: String,
    /// Import prefix for sibling frontend modules, e.g. `generated/`.
    pub frontend_module_prefix: String,
    pub backend_layout: BackendLayout,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend_module_prefix: "crate::generated".into(),
            frontend_module_prefix: "generated/".into(),
            backend_layout: BackendLayout::ModuleTree,
        }
    }
}

impl GeneratorConfig {
    /// Rust path of a module's `types` file.
    pub fn backend_types_path(&self, module_id: &str) -> String {
        format!("{}::{module_id}::types", self.backend_module_prefix)
    }

    /// Import specifier of a module's frontend client file.
    pub fn frontend_api_path(&self, module_id: &str) -> String {
        format!("{}{module_id}_api", self.frontend_module_prefix)
    }
}
