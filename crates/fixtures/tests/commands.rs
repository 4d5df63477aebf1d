//! Generated command scaffolding for the `secrets` fixture module.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::cell::RefCell;

use eventkit_fixtures::generated::secrets::commands::{
    self, AccountCreate, AccountDelete, AnyCommand, CommandHandlers,
};
use eventkit_fixtures::generated::secrets::events::{AccountCreated, AccountCreatedLocation};
use eventkit_runtime::command::{Command, CommandError, Ctx, execute};
use eventkit_runtime::event::{Event, EventMeta};
use eventkit_runtime::validation::ValidationError;
use serde_json::json;

#[derive(Default)]
struct Recorder {
    calls: RefCell<Vec<String>>,
}

impl CommandHandlers for Recorder {
    fn account_create(&self, command: &AccountCreate, ctx: &mut Ctx) -> Result<(), CommandError> {
        self.calls.borrow_mut().push(format!("create {}", command.title));
        let meta = ctx.meta().clone();
        ctx.raise(AccountCreated::new(
            command.title.clone(),
            None,
            AccountCreatedLocation {
                url: "https://mail.example".into(),
            },
            meta,
        ));
        Ok(())
    }

    fn account_delete(&self, command: &AccountDelete, _ctx: &mut Ctx) -> Result<(), CommandError> {
        self.calls.borrow_mut().push(format!("delete {}", command.reason));
        Ok(())
    }
}

fn ctx() -> Ctx {
    Ctx::new(EventMeta::now("u1"))
}

#[test]
fn test_dispatch_invokes_handler_and_raises() {
    let recorder = Recorder::default();
    let mut ctx = ctx();

    commands::dispatch(
        "account.Create",
        json!({"Title": "Gmail", "Starred": true}),
        &mut ctx,
        &recorder,
    )
    .unwrap();

    assert_eq!(*recorder.calls.borrow(), vec!["create Gmail"]);
    assert_eq!(ctx.raised().len(), 1);
    assert_eq!(ctx.raised()[0].meta_type(), "account.Created");
    assert_eq!(ctx.raised()[0].meta().user_id, "u1");
}

#[test]
fn test_optional_fields_default() {
    let command = commands::decode("account.Create", json!({"Title": "Gmail"})).unwrap();

    let AnyCommand::AccountCreate(create) = command else {
        panic!("expected AccountCreate");
    };
    assert_eq!(create.pin, "");
    assert_eq!(create.note, "");
    assert!(!create.starred);
    assert_eq!(create.retries, 0);
}

#[test]
fn test_invalid_command_never_reaches_handler() {
    let recorder = Recorder::default();

    let err = commands::dispatch("account.Create", json!({"Title": ""}), &mut ctx(), &recorder)
        .unwrap_err();

    assert!(matches!(
        err,
        CommandError::Validation(ValidationError::Empty { field: "Title" })
    ));
    assert!(recorder.calls.borrow().is_empty());
}

#[test]
fn test_length_limits() {
    let too_long_title = AccountCreate {
        title: "x".repeat(129),
        ..AccountCreate::default()
    };
    assert_eq!(
        too_long_title.validate(),
        Err(ValidationError::TooLong {
            field: "Title",
            max: 128
        })
    );

    let too_long_note = AccountCreate {
        title: "Gmail".into(),
        note: "x".repeat(17),
        ..AccountCreate::default()
    };
    assert_eq!(
        too_long_note.validate(),
        Err(ValidationError::TooLong {
            field: "Note",
            max: 16
        })
    );
}

#[test]
fn test_pattern_only_checked_when_present() {
    let mut command = AccountCreate {
        title: "Gmail".into(),
        ..AccountCreate::default()
    };
    assert_eq!(command.validate(), Ok(()));

    command.pin = "12ab".into();
    assert!(matches!(
        command.validate(),
        Err(ValidationError::PatternMismatch { field: "Pin", .. })
    ));

    command.pin = "1234".into();
    assert_eq!(command.validate(), Ok(()));
}

#[test]
fn test_execute_on_typed_command() {
    let recorder = Recorder::default();
    let handlers: &(dyn CommandHandlers + 'static) = &recorder;
    let command = AccountDelete {
        reason: "moved".into(),
    };

    assert_eq!(command.key(), "account.Delete");
    assert_eq!(command.middleware_chain(), "authenticated");
    execute(&command, &mut ctx(), handlers).unwrap();
    assert_eq!(*recorder.calls.borrow(), vec!["delete moved"]);
}

#[test]
fn test_unknown_key_and_malformed_body() {
    let recorder = Recorder::default();

    assert!(matches!(
        commands::dispatch("account.Rename", json!({}), &mut ctx(), &recorder),
        Err(CommandError::Unsupported(key)) if key == "account.Rename"
    ));
    assert!(matches!(
        commands::dispatch("account.Delete", json!({"Why": "x"}), &mut ctx(), &recorder),
        Err(CommandError::Decode(_))
    ));
    assert!(recorder.calls.borrow().is_empty());
}

#[test]
fn test_registry_holds_every_command() {
    let keys: Vec<_> = commands::ALLOCATORS.keys().collect();
    assert_eq!(keys, vec!["account.Create", "account.Delete"]);
}
