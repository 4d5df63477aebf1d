//! Command base capabilities and execution order.

use std::fmt;

use tracing::debug;

use crate::event::{Event, EventMeta};
use crate::registry::AllocatorMap;
use crate::validation::ValidationError;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unsupported command: {0}")]
    Unsupported(String),

    #[error("malformed command body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Handler(String),
}

impl CommandError {
    /// Error raised by handler business logic.
    pub fn handler(message: impl Into<String>) -> Self {
        Self::Handler(message.into())
    }
}

/// Base capability of every generated command.
///
/// `Handlers` is the generated capability trait of the command's module, so a
/// handler bundle missing a method fails to compile instead of failing a
/// runtime cast.
pub trait Command: fmt::Debug {
    type Handlers: ?Sized;

    /// Wire discriminator, e.g. `account.Create`.
    fn key(&self) -> &'static str;

    /// Name of the middleware chain the command must pass first.
    fn middleware_chain(&self) -> &'static str;

    /// Check the declared field rules.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Call the handler method matching this command. Use [`execute`]
    /// instead of calling this directly.
    fn invoke(&self, ctx: &mut Ctx, handlers: &Self::Handlers) -> Result<(), CommandError>;
}

/// Per-invocation context handed to command handlers.
#[derive(Debug)]
pub struct Ctx {
    meta: EventMeta,
    remote_addr: Option<String>,
    raised: Vec<Box<dyn Event + Send>>,
}

impl Ctx {
    pub fn new(meta: EventMeta) -> Self {
        Self {
            meta,
            remote_addr: None,
            raised: Vec::new(),
        }
    }

    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = Some(remote_addr.into());
        self
    }

    /// Metadata to stamp on events raised by this invocation.
    pub fn meta(&self) -> &EventMeta {
        &self.meta
    }

    pub fn remote_addr(&self) -> Option<&str> {
        self.remote_addr.as_deref()
    }

    /// Record an event for the caller to append after the handler returns.
    pub fn raise(&mut self, event: impl Event + Send + 'static) {
        self.raised.push(Box::new(event));
    }

    pub fn raised(&self) -> &[Box<dyn Event + Send>] {
        &self.raised
    }

    /// Raised events in the order the handler raised them.
    pub fn into_raised(self) -> Vec<Box<dyn Event + Send>> {
        self.raised
    }
}

/// Validate `command`, then invoke its handler.
///
/// A command that fails validation never reaches `invoke`.
pub fn execute<C>(command: &C, ctx: &mut Ctx, handlers: &C::Handlers) -> Result<(), CommandError>
where
    C: Command + ?Sized,
{
    if let Err(err) = command.validate() {
        debug!(command = command.key(), error = %err, "Command rejected by validation.");
        return Err(err.into());
    }

    debug!(
        command = command.key(),
        chain = command.middleware_chain(),
        "Invoking command handler."
    );
    command.invoke(ctx, handlers)
}

/// Decoder stored in a generated command registry. Every call builds a fresh
/// instance from the inbound JSON body.
pub type Allocator<C> = fn(serde_json::Value) -> Result<C, serde_json::Error>;

/// Decode an inbound body by its discriminator.
pub fn decode<C>(
    allocators: &AllocatorMap<Allocator<C>>,
    key: &str,
    body: serde_json::Value,
) -> Result<C, CommandError> {
    let allocate = allocators
        .get(key)
        .ok_or_else(|| CommandError::Unsupported(key.to_string()))?;
    Ok(allocate(body)?)
}

/// Decode, validate and invoke in one step.
pub fn dispatch<C>(
    allocators: &AllocatorMap<Allocator<C>>,
    key: &str,
    body: serde_json::Value,
    ctx: &mut Ctx,
    handlers: &C::Handlers,
) -> Result<(), CommandError>
where
    C: Command,
{
    let command = decode(allocators, key, body)?;
    execute(&command, ctx, handlers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    trait Greeter {
        fn greet(&self, cmd: &Greet, ctx: &mut Ctx) -> Result<(), CommandError>;
    }

    #[derive(Debug, Default, serde::Deserialize)]
    struct Greet {
        name: String,
    }

    impl Command for Greet {
        type Handlers = dyn Greeter;

        fn key(&self) -> &'static str {
            "greeting.Greet"
        }

        fn middleware_chain(&self) -> &'static str {
            "public"
        }

        fn validate(&self) -> Result<(), ValidationError> {
            crate::validation::non_empty("name", &self.name)
        }

        fn invoke(&self, ctx: &mut Ctx, handlers: &Self::Handlers) -> Result<(), CommandError> {
            handlers.greet(self, ctx)
        }
    }

    #[derive(Default)]
    struct Recorder {
        seen: RefCell<Vec<String>>,
    }

    impl Greeter for Recorder {
        fn greet(&self, cmd: &Greet, _ctx: &mut Ctx) -> Result<(), CommandError> {
            self.seen.borrow_mut().push(cmd.name.clone());
            Ok(())
        }
    }

    fn allocate_greet(body: serde_json::Value) -> Result<Greet, serde_json::Error> {
        serde_json::from_value(body)
    }

    fn registry() -> AllocatorMap<Allocator<Greet>> {
        AllocatorMap::new([("greeting.Greet", allocate_greet as Allocator<Greet>)])
    }

    #[test]
    fn test_invalid_command_never_reaches_handler() {
        let recorder = Recorder::default();
        let handlers: &(dyn Greeter + 'static) = &recorder;
        let mut ctx = Ctx::new(EventMeta::default());

        let result = execute(&Greet::default(), &mut ctx, handlers);
        assert!(matches!(result, Err(CommandError::Validation(_))));
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn test_dispatch_decodes_and_invokes() {
        let recorder = Recorder::default();
        let handlers: &(dyn Greeter + 'static) = &recorder;
        let mut ctx = Ctx::new(EventMeta::default());

        dispatch(
            &registry(),
            "greeting.Greet",
            serde_json::json!({ "name": "joonas" }),
            &mut ctx,
            handlers,
        )
        .unwrap();
        assert_eq!(*recorder.seen.borrow(), vec!["joonas".to_string()]);
    }

    #[test]
    fn test_dispatch_unknown_key() {
        let recorder = Recorder::default();
        let handlers: &(dyn Greeter + 'static) = &recorder;
        let mut ctx = Ctx::new(EventMeta::default());

        let result = dispatch(
            &registry(),
            "greeting.Wave",
            serde_json::json!({}),
            &mut ctx,
            handlers,
        );
        assert!(matches!(result, Err(CommandError::Unsupported(key)) if key == "greeting.Wave"));
    }
}
