//! Fixture schemas under `schema/`, compiled by `build.rs`.
//!
//! Nothing here is hand-written beyond the include; the tests under `tests/`
//! exercise the generated modules directly.

pub mod generated {
    include!(concat!(env!("OUT_DIR"), "/eventkit_generated.rs"));
}

/// TypeScript emitted next to the Rust modules, by file name.
pub mod frontend {
    pub const CONTACTS_API: &str =
        include_str!(concat!(env!("OUT_DIR"), "/frontend/contacts_api.ts"));
    pub const SECRETS_API: &str = include_str!(concat!(env!("OUT_DIR"), "/frontend/secrets_api.ts"));
    pub const SECRETS_COMMANDS: &str =
        include_str!(concat!(env!("OUT_DIR"), "/frontend/secrets_commands.ts"));
}
