//! Runtime support for code generated by `eventkit-codegen`.
//!
//! Generated backend modules only compile against this crate. It provides the
//! base capabilities the generated scaffolding plugs into:
//! - `command`: the [`command::Command`] trait, handler context, execution order
//! - `event`: the [`event::Event`] trait, metadata and the shared JSON envelope
//! - `registry`: immutable string-keyed allocator maps
//! - `validation`: per-field rules called from generated `validate` bodies
//! - `httpauth`: named middleware chains and JSON body helpers for axum routes

pub mod command;
pub mod event;
pub mod httpauth;
pub mod registry;
pub mod validation;
