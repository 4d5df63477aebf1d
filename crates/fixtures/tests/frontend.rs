//! TypeScript emitted alongside the Rust modules.

use eventkit_fixtures::frontend::{CONTACTS_API, SECRETS_API, SECRETS_COMMANDS};

const HEADER: &str = "// Code generated by eventkit-codegen. DO NOT EDIT.";

#[test]
fn test_every_file_carries_header() {
    for content in [CONTACTS_API, SECRETS_API, SECRETS_COMMANDS] {
        assert!(content.starts_with(HEADER));
    }
}

#[test]
fn test_contacts_client() {
    assert!(CONTACTS_API.contains("export const DefaultGroup = \"friends\";\n"));
    assert!(CONTACTS_API.contains(
        "export enum ContactKind {\n  Person = \"person\",\n  Company = \"company\",\n}\n"
    ));
    assert!(CONTACTS_API.contains("export function ContactKindExhaustive60eefc63("));
    assert!(CONTACTS_API.contains("export interface Folder {\n  children: Folder[];\n  name: string;\n}\n"));
    assert!(CONTACTS_API.contains(
        "export const getAddressUrl = (userId: string, idx: string): string => {\n  return `/users/${encodeURIComponent(userId)}/addresses/${encodeURIComponent(idx)}`;\n};\n"
    ));
    assert!(CONTACTS_API.contains(
        "export const addContact = async (body: Contact, options?: RequestInit): Promise<Contact> => {"
    ));
    assert!(CONTACTS_API.contains(
        "export const removeContact = async (id: string, options?: RequestInit): Promise<void> => {"
    ));
}

#[test]
fn test_cross_module_import() {
    assert!(SECRETS_API.contains("import type { Contact } from \"generated/contacts_api\";\n"));
    assert!(!CONTACTS_API.contains("import type"));
}

#[test]
fn test_command_definitions() {
    assert!(SECRETS_COMMANDS.contains(
        "    { key: \"Title\", title: \"Title\", kind: \"text\", optional: false, maxLength: 128, validationRegex: null, placeholder: \"Gmail\", help: null, hideIfDefaultValue: false },\n"
    ));
    assert!(SECRETS_COMMANDS.contains("kind: \"multiline\", optional: true, maxLength: 16"));
    assert!(SECRETS_COMMANDS.contains("    crudNature: \"delete\",\n    additionalConfirmation: \"This cannot be undone\",\n"));
    assert!(SECRETS_COMMANDS.ends_with(
        "export const commandDefinitions: Record<string, () => CommandDefinition> = {\n  \"account.Create\": () => AccountCreate(),\n  \"account.Delete\": () => AccountDelete(),\n};\n"
    ));
}
