//! Canonical definition → mutation inputs.
//!
//! The inverse of [`crate::normalize`]: every elided default is filled back
//! in, so the service always receives a fully specified definition. Inputs
//! are built from definitions whose references are already resolved to ids
//! (see [`crate::resolve::resolve_definition`]).

use metadef_core::types::{
    Access, AdminAccess, Capabilities, Definition, FieldDefinition, TypeKey, ValidationValue,
};

use crate::normalize::{default_display_name_key, title_case};
use crate::remote::{
    AccessInput, CapabilitiesInput, DefinitionCreateInput, DefinitionUpdateInput,
    FieldCreateInput, FieldOperation, FieldUpdateInput, OnlineStoreData, RemoteOnlineStore,
    RemoteRenderable, RemoteValidation, RenderableData, Toggle,
};

/// Input for creating `type_key`; every field is created.
pub fn create_input(
    type_key: &TypeKey,
    definition: &Definition,
) -> Result<DefinitionCreateInput, serde_json::Error> {
    let field_definitions = definition
        .field_definitions
        .iter()
        .map(|(key, field)| field_create_input(key, field))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DefinitionCreateInput {
        type_key: type_key.to_string(),
        name: definition_name(type_key, definition),
        description: definition.description.clone().filter(|d| !d.is_empty()),
        display_name_key: display_name_key(definition),
        access: access_input(definition.access.as_ref()),
        capabilities: capabilities_input(definition.capabilities.as_ref()),
        field_definitions,
    })
}

/// Input for updating `type_key` with the given field operations.
pub fn update_input(
    type_key: &TypeKey,
    definition: &Definition,
    field_operations: Vec<FieldOperation>,
) -> DefinitionUpdateInput {
    DefinitionUpdateInput {
        name: definition_name(type_key, definition),
        description: definition.description.clone().unwrap_or_default(),
        display_name_key: display_name_key(definition),
        access: access_input(definition.access.as_ref()),
        capabilities: capabilities_input(definition.capabilities.as_ref()),
        field_definitions: field_operations,
    }
}

pub fn field_create_input(
    key: &str,
    field: &FieldDefinition,
) -> Result<FieldCreateInput, serde_json::Error> {
    Ok(FieldCreateInput {
        key: key.to_string(),
        value_type: field.value_type.clone(),
        name: field_name(key, field),
        description: field.description.clone().filter(|d| !d.is_empty()),
        required: field.required,
        validations: validation_inputs(field)?,
    })
}

pub fn field_update_input(
    key: &str,
    field: &FieldDefinition,
) -> Result<FieldUpdateInput, serde_json::Error> {
    Ok(FieldUpdateInput {
        key: key.to_string(),
        name: field_name(key, field),
        description: field.description.clone().unwrap_or_default(),
        required: field.required,
        validations: validation_inputs(field)?,
    })
}

pub fn validation_inputs(field: &FieldDefinition) -> Result<Vec<RemoteValidation>, serde_json::Error> {
    field
        .validations
        .iter()
        .map(|(name, value)| {
            encode_validation(value).map(|value| RemoteValidation {
                name: name.clone(),
                value,
            })
        })
        .collect()
}

/// Encode a validation value as the service's JSON text.
///
/// A string is sent bare (ids, patterns) unless the bare form would itself
/// parse as JSON, in which case it is quoted so it reads back as a string.
pub fn encode_validation(value: &ValidationValue) -> Result<String, serde_json::Error> {
    match value {
        ValidationValue::Text(raw) => {
            if serde_json::from_str::<serde_json::Value>(raw).is_ok() {
                serde_json::to_string(raw)
            } else {
                Ok(raw.clone())
            }
        }
        other => serde_json::to_string(&other.to_json()),
    }
}

pub fn access_input(access: Option<&Access>) -> AccessInput {
    let access = access.cloned().unwrap_or_default();
    // Only the merchant levels are accepted as input; the rest is platform-managed.
    let admin = match access.admin_or_default() {
        level @ (AdminAccess::MerchantRead | AdminAccess::MerchantReadWrite) => Some(level),
        _ => None,
    };
    AccessInput {
        admin,
        storefront: access.storefront_or_default(),
    }
}

/// Every capability is sent; absent means disabled.
pub fn capabilities_input(capabilities: Option<&Capabilities>) -> CapabilitiesInput {
    let capabilities = capabilities.cloned().unwrap_or_default();
    CapabilitiesInput {
        online_store: RemoteOnlineStore {
            enabled: capabilities.online_store.is_some(),
            data: capabilities.online_store.map(|o| OnlineStoreData {
                can_create_redirects: o.can_create_redirects,
                url_handle: o.url_handle,
            }),
        },
        publishable: Toggle {
            enabled: capabilities.publishable,
        },
        renderable: RemoteRenderable {
            enabled: capabilities.renderable.is_some(),
            data: capabilities.renderable.map(|r| RenderableData {
                meta_description_key: r.meta_description_key,
                meta_title_key: r.meta_title_key,
            }),
        },
        translatable: Toggle {
            enabled: capabilities.translatable,
        },
    }
}

fn definition_name(type_key: &TypeKey, definition: &Definition) -> String {
    definition
        .display_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| title_case(type_key.as_str()))
}

fn field_name(key: &str, field: &FieldDefinition) -> String {
    field
        .display_name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| title_case(key))
}

fn display_name_key(definition: &Definition) -> Option<String> {
    definition
        .display_name_key
        .clone()
        .filter(|k| !k.is_empty())
        .or_else(|| default_display_name_key(&definition.field_definitions).map(str::to_string))
}
