//! TypeScript artifacts, built as an AST and rendered through [`emit::Emit`].

mod client;
mod commands;
pub mod emit;
pub mod ts;

use emit::Emit;

use crate::error::CodegenError;
use crate::generate::{EmitContext, Emitter, GeneratedFile, Target};

/// `<module>_api.ts`
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientEmitter;

impl Emitter for ClientEmitter {
    fn name(&self) -> &'static str {
        "frontend client"
    }

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
        let module = client::codegen_client(ctx)
            .map_err(|e| CodegenError::schema(&ctx.module.id, e))?;
        Ok(vec![GeneratedFile::new(
            Target::Frontend,
            format!("{}_api.ts", ctx.module.id),
            module.emit(),
        )])
    }
}

/// `<module>_commands.ts`, only for modules declaring commands.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandDefinitionsEmitter;

impl Emitter for CommandDefinitionsEmitter {
    fn name(&self) -> &'static str {
        "frontend commands"
    }

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Vec<GeneratedFile>, CodegenError> {
        Ok(commands::codegen_commands(ctx)
            .map(|module| {
                GeneratedFile::new(
                    Target::Frontend,
                    format!("{}_commands.ts", ctx.module.id),
                    module.emit(),
                )
            })
            .into_iter()
            .collect())
    }
}
