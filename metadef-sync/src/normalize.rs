//! Remote record → canonical definition.
//!
//! Normalization elides every value that equals its derivable default so a
//! definition reads the same whichever environment it was pulled from:
//!
//! | Value              | Default                                            |
//! |--------------------|----------------------------------------------------|
//! | definition name    | title case of the type key                         |
//! | field name         | title case of the field key                        |
//! | `displayNameKey`   | first single-line text field, in field key order   |
//! | admin access       | `PUBLIC_READ_WRITE`                                |
//! | storefront access  | `PUBLIC_READ`                                      |
//! | each capability    | disabled                                           |
//!
//! The `displayNameKey` default follows field key order, not the order the
//! listing returns fields in. Canonical field maps are sorted by key, so a
//! listing-order rule could not be recomputed from a declaration file and the
//! elided key would not survive a pull/push round trip.
//!
//! [`canonicalize`] applies the same elision to a hand-written local
//! definition, so spelling out a default never reads as a change.
//!
//! References are left in their remote `*_id` form here; see
//! [`crate::resolve`].

use std::collections::BTreeMap;

use metadef_core::types::{
    Access, AdminAccess, Capabilities, Definition, FieldDefinition, OnlineStoreCapability,
    RenderableCapability, StorefrontAccess, ValidationValue,
};

use crate::remote::{RemoteCapabilities, RemoteDefinition, RemoteFieldDefinition, RemoteValidation};

/// Value type whose first occurrence supplies the default `displayNameKey`.
pub const SINGLE_LINE_TEXT: &str = "single_line_text_field";

/// `hero_banner` → `Hero Banner`, `call-to-action` → `Call To Action`.
pub fn title_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut word_start = true;
    for c in key.chars() {
        let c = if c == '_' || c == '-' { ' ' } else { c };
        if c.is_whitespace() {
            word_start = true;
            out.push(c);
        } else if word_start {
            out.extend(c.to_uppercase());
            word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// The field key a definition is titled by when none is given: the first
/// single-line text field in key order (not listing order).
pub fn default_display_name_key(fields: &BTreeMap<String, FieldDefinition>) -> Option<&str> {
    fields
        .iter()
        .find(|(_, field)| field.value_type == SINGLE_LINE_TEXT)
        .map(|(key, _)| key.as_str())
}

/// Convert one listing record to canonical form.
pub fn normalize(record: &RemoteDefinition) -> Definition {
    let field_definitions: BTreeMap<String, FieldDefinition> = record
        .field_definitions
        .iter()
        .map(|field| (field.key.clone(), normalize_field(field)))
        .collect();

    let display_name_key = record
        .display_name_key
        .clone()
        .filter(|key| !key.is_empty())
        .filter(|key| Some(key.as_str()) != default_display_name_key(&field_definitions));

    Definition {
        display_name: non_default(&record.name, &record.type_key),
        description: non_empty(record.description.as_deref()),
        access: elide_access(Access {
            admin: Some(record.access.admin),
            storefront: Some(record.access.storefront),
        }),
        capabilities: normalize_capabilities(&record.capabilities),
        display_name_key,
        field_definitions,
    }
}

pub fn normalize_field(field: &RemoteFieldDefinition) -> FieldDefinition {
    FieldDefinition {
        value_type: field.value_type.name.clone(),
        display_name: non_default(&field.name, &field.key),
        description: non_empty(field.description.as_deref()),
        required: field.required,
        validations: field
            .validations
            .iter()
            .map(|v| (v.name.clone(), decode_validation(v)))
            .collect(),
    }
}

/// Remote validation values are JSON text; anything that does not parse is
/// kept verbatim as a string.
pub fn decode_validation(validation: &RemoteValidation) -> ValidationValue {
    serde_json::from_str::<serde_json::Value>(&validation.value)
        .map(ValidationValue::from)
        .unwrap_or_else(|_| ValidationValue::Text(validation.value.clone()))
}

fn normalize_capabilities(remote: &RemoteCapabilities) -> Option<Capabilities> {
    let online_store = remote.online_store.enabled.then(|| {
        let data = remote.online_store.data.clone().unwrap_or_default();
        OnlineStoreCapability {
            can_create_redirects: data.can_create_redirects,
            url_handle: data.url_handle.filter(|h| !h.is_empty()),
        }
    });
    let renderable = remote.renderable.enabled.then(|| {
        let data = remote.renderable.data.clone().unwrap_or_default();
        RenderableCapability {
            meta_description_key: data.meta_description_key.filter(|k| !k.is_empty()),
            meta_title_key: data.meta_title_key.filter(|k| !k.is_empty()),
        }
    });
    let capabilities = Capabilities {
        online_store,
        publishable: remote.publishable.enabled,
        renderable,
        translatable: remote.translatable.enabled,
    };
    (!capabilities.is_empty()).then_some(capabilities)
}

// ---------------------------------------------------------------------------
// Local canonicalization
// ---------------------------------------------------------------------------

/// Elide explicit defaults from a local definition.
pub fn canonicalize(type_key: &str, local: &Definition) -> Definition {
    let field_definitions: BTreeMap<String, FieldDefinition> = local
        .field_definitions
        .iter()
        .map(|(key, field)| (key.clone(), canonicalize_field(key, field)))
        .collect();

    let display_name_key = local
        .display_name_key
        .clone()
        .filter(|key| !key.is_empty())
        .filter(|key| Some(key.as_str()) != default_display_name_key(&field_definitions));

    Definition {
        display_name: local
            .display_name
            .as_deref()
            .and_then(|name| non_default(name, type_key)),
        description: non_empty(local.description.as_deref()),
        access: local.access.clone().and_then(elide_access),
        capabilities: local.capabilities.clone().filter(|c| !c.is_empty()),
        display_name_key,
        field_definitions,
    }
}

fn canonicalize_field(key: &str, field: &FieldDefinition) -> FieldDefinition {
    FieldDefinition {
        value_type: field.value_type.clone(),
        display_name: field
            .display_name
            .as_deref()
            .and_then(|name| non_default(name, key)),
        description: non_empty(field.description.as_deref()),
        required: field.required,
        validations: field.validations.clone(),
    }
}

fn elide_access(access: Access) -> Option<Access> {
    let admin = access.admin.filter(|a| *a != AdminAccess::default());
    let storefront = access
        .storefront
        .filter(|s| *s != StorefrontAccess::default());
    (admin.is_some() || storefront.is_some()).then_some(Access { admin, storefront })
}

fn non_default(name: &str, key: &str) -> Option<String> {
    (!name.is_empty() && name != title_case(key)).then(|| name.to_string())
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.filter(|t| !t.is_empty()).map(str::to_string)
}
