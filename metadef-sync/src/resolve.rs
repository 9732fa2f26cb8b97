//! Reference validations: remote ids ↔ symbolic type keys.
//!
//! Remotely a reference field stores the target definition's opaque id
//! under `metaobject_definition_id` (or a list under
//! `metaobject_definition_ids`). Locally the same validation is stored as
//! the target's type key under `metaobject_definition` /
//! `metaobject_definitions`, so a declaration file works in any shop.
//!
//! The two directions fail differently. Pulling keeps going on an unknown
//! id and reports it; pushing refuses to send a reference it cannot map.

use std::collections::{BTreeMap, HashMap};

use metadef_core::types::{Definition, DefinitionMap, RemoteId, TypeKey, ValidationValue};

use crate::error::SyncError;

pub const REFERENCE: &str = "metaobject_definition";
pub const REFERENCE_LIST: &str = "metaobject_definitions";
pub const REFERENCE_ID: &str = "metaobject_definition_id";
pub const REFERENCE_IDS: &str = "metaobject_definition_ids";

/// An id found in a remote reference validation that names no listed type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub definition: TypeKey,
    pub field: String,
    pub id: String,
}

// ---------------------------------------------------------------------------
// Pull direction
// ---------------------------------------------------------------------------

/// Rewrite remote id references to type keys, in place.
///
/// - A single reference whose id is unknown is left in its `_id` form.
/// - A list keeps its length; an unknown id becomes an empty string.
///
/// Every unknown id is returned and logged.
pub fn resolve_ids_to_types(
    definitions: &mut DefinitionMap,
    types_by_id: &HashMap<RemoteId, TypeKey>,
) -> Vec<UnresolvedReference> {
    let mut unresolved = Vec::new();
    for (type_key, definition) in definitions.iter_mut() {
        for (field_key, field) in definition.field_definitions.iter_mut() {
            let mut report = |id: &str| {
                tracing::warn!(
                    "{type_key}.{field_key}: reference to unknown definition {id}"
                );
                unresolved.push(UnresolvedReference {
                    definition: type_key.clone(),
                    field: field_key.clone(),
                    id: id.to_string(),
                });
            };

            let single = field
                .validations
                .get(REFERENCE_ID)
                .and_then(ValidationValue::as_str)
                .map(str::to_string);
            if let Some(id) = single {
                match types_by_id.get(&RemoteId::from(id.as_str())) {
                    Some(target) => {
                        field.validations.remove(REFERENCE_ID);
                        field
                            .validations
                            .insert(REFERENCE.to_string(), target.as_str().into());
                    }
                    None => report(&id),
                }
            }

            if let Some(ValidationValue::List(ids)) = field.validations.remove(REFERENCE_IDS) {
                let targets = ids
                    .iter()
                    .map(|value| {
                        let id = value.as_str().unwrap_or_default();
                        match types_by_id.get(&RemoteId::from(id)) {
                            Some(target) => ValidationValue::from(target.as_str()),
                            None => {
                                report(id);
                                ValidationValue::from("")
                            }
                        }
                    })
                    .collect();
                field
                    .validations
                    .insert(REFERENCE_LIST.to_string(), ValidationValue::List(targets));
            }
        }
    }
    unresolved
}

// ---------------------------------------------------------------------------
// Push direction
// ---------------------------------------------------------------------------

/// Reject raw `*_id` / `*_ids` references that `is_known` does not accept.
///
/// A pull leaves an unknown id in place, so a declaration can carry an id
/// from another shop or of a deleted definition. It must never be sent.
pub fn check_remote_ids(
    type_key: &TypeKey,
    definition: &Definition,
    is_known: impl Fn(&str) -> bool,
) -> Result<(), SyncError> {
    for (field_key, field) in &definition.field_definitions {
        for (name, value) in &field.validations {
            let ids: Vec<&ValidationValue> = match (name.as_str(), value) {
                (REFERENCE_ID, single) => vec![single],
                (REFERENCE_IDS, ValidationValue::List(items)) => items.iter().collect(),
                (REFERENCE_IDS, _) => {
                    return Err(SyncError::InvalidReference {
                        definition: type_key.clone(),
                        field: field_key.clone(),
                        validation: name.clone(),
                    })
                }
                _ => continue,
            };
            for id in ids {
                let Some(id) = id.as_str() else {
                    return Err(SyncError::InvalidReference {
                        definition: type_key.clone(),
                        field: field_key.clone(),
                        validation: name.clone(),
                    });
                };
                if !is_known(id) {
                    return Err(SyncError::UnknownRemoteId {
                        definition: type_key.clone(),
                        field: field_key.clone(),
                        id: id.to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Rewrite type key references in one definition to remote ids.
///
/// Fails with [`SyncError::UnresolvedType`] on the first type key that has
/// no id, [`SyncError::UnknownRemoteId`] on a raw id that is not one of
/// `ids_by_type`'s values, and [`SyncError::InvalidReference`] when a
/// reference validation is not a string (or list of strings).
pub fn resolve_definition(
    type_key: &TypeKey,
    definition: &Definition,
    ids_by_type: &BTreeMap<TypeKey, RemoteId>,
) -> Result<Definition, SyncError> {
    check_remote_ids(type_key, definition, |id| {
        ids_by_type.values().any(|known| known.as_str() == id)
    })?;
    let mut resolved = definition.clone();
    for (field_key, field) in resolved.field_definitions.iter_mut() {
        let lookup = |target: &str| {
            ids_by_type
                .get(&TypeKey::from(target))
                .map(|id| ValidationValue::from(id.as_str()))
                .ok_or_else(|| SyncError::UnresolvedType {
                    definition: type_key.clone(),
                    field: field_key.clone(),
                    type_key: target.to_string(),
                })
        };
        let invalid = |validation: &str| SyncError::InvalidReference {
            definition: type_key.clone(),
            field: field_key.clone(),
            validation: validation.to_string(),
        };

        if let Some(value) = field.validations.remove(REFERENCE) {
            let target = value.as_str().ok_or_else(|| invalid(REFERENCE))?;
            field
                .validations
                .insert(REFERENCE_ID.to_string(), lookup(target)?);
        }

        if let Some(value) = field.validations.remove(REFERENCE_LIST) {
            let ValidationValue::List(targets) = value else {
                return Err(invalid(REFERENCE_LIST));
            };
            let ids = targets
                .iter()
                .map(|t| {
                    t.as_str()
                        .ok_or_else(|| invalid(REFERENCE_LIST))
                        .and_then(|target| lookup(target))
                })
                .collect::<Result<Vec<_>, _>>()?;
            field
                .validations
                .insert(REFERENCE_IDS.to_string(), ValidationValue::List(ids));
        }
    }
    Ok(resolved)
}

/// Rewrite type key references in a whole set.
pub fn resolve_types_to_ids(
    definitions: &DefinitionMap,
    ids_by_type: &BTreeMap<TypeKey, RemoteId>,
) -> Result<DefinitionMap, SyncError> {
    definitions
        .iter()
        .map(|(type_key, definition)| {
            resolve_definition(type_key, definition, ids_by_type)
                .map(|resolved| (type_key.clone(), resolved))
        })
        .collect()
}

/// Every `(field, type key)` a local definition refers to.
pub fn referenced_types(definition: &Definition) -> Vec<(&str, &str)> {
    let mut refs = Vec::new();
    for (field_key, field) in &definition.field_definitions {
        if let Some(target) = field.validations.get(REFERENCE).and_then(ValidationValue::as_str) {
            refs.push((field_key.as_str(), target));
        }
        if let Some(ValidationValue::List(targets)) = field.validations.get(REFERENCE_LIST) {
            refs.extend(
                targets
                    .iter()
                    .filter_map(ValidationValue::as_str)
                    .map(|target| (field_key.as_str(), target)),
            );
        }
    }
    refs
}
