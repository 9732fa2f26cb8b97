//! Reconciliation planning.
//!
//! Field operations are planned by set difference on field keys:
//!
//! - local only → create
//! - both sides → update (the whole field is resubmitted)
//! - remote only → delete
//!
//! Whole definitions are only ever created or updated. A type that exists
//! remotely but not locally is left alone.

use std::collections::BTreeMap;

use metadef_core::types::{Definition, DefinitionMap, RemoteId, TypeKey};

use crate::denormalize::{create_input, field_create_input, field_update_input, update_input};
use crate::diff::has_changed;
use crate::error::SyncError;
use crate::normalize::{canonicalize, default_display_name_key};
use crate::remote::{DefinitionCreateInput, DefinitionUpdateInput, FieldDeleteInput, FieldOperation};
use crate::resolve::{check_remote_ids, referenced_types, resolve_definition};
use crate::snapshot::RemoteSnapshot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldAction {
    Create(String),
    Update(String),
    Delete(String),
}

impl FieldAction {
    pub fn key(&self) -> &str {
        match self {
            FieldAction::Create(k) | FieldAction::Update(k) | FieldAction::Delete(k) => k,
        }
    }
}

/// Field actions turning `remote` into `local`, in key order with deletes last.
pub fn plan_field_actions(local: &Definition, remote: &Definition) -> Vec<FieldAction> {
    let mut actions: Vec<FieldAction> = local
        .field_definitions
        .keys()
        .map(|key| {
            if remote.field_definitions.contains_key(key) {
                FieldAction::Update(key.clone())
            } else {
                FieldAction::Create(key.clone())
            }
        })
        .collect();
    actions.extend(
        remote
            .field_definitions
            .keys()
            .filter(|key| !local.field_definitions.contains_key(*key))
            .map(|key| FieldAction::Delete(key.clone())),
    );
    actions
}

/// Create input for a local type, with references resolved through `ids`.
pub fn plan_create(
    type_key: &TypeKey,
    local: &Definition,
    ids: &BTreeMap<TypeKey, RemoteId>,
) -> Result<DefinitionCreateInput, SyncError> {
    let resolved = resolve_definition(type_key, local, ids)?;
    Ok(create_input(type_key, &resolved)?)
}

/// Update input for a type present on both sides, or `None` when the
/// canonical forms already match. `local` must be canonical.
pub fn plan_update(
    type_key: &TypeKey,
    local: &Definition,
    remote: &Definition,
    ids: &BTreeMap<TypeKey, RemoteId>,
) -> Result<Option<DefinitionUpdateInput>, SyncError> {
    if !has_changed(local, remote)? {
        return Ok(None);
    }

    let resolved = resolve_definition(type_key, local, ids)?;
    let mut operations = Vec::new();
    for (key, field) in &resolved.field_definitions {
        let operation = match remote.field_definitions.get(key) {
            Some(before) => {
                if before.value_type != field.value_type {
                    tracing::warn!(
                        "{type_key}.{key}: type change {} -> {} cannot be applied by update",
                        before.value_type,
                        field.value_type
                    );
                }
                FieldOperation::Update(field_update_input(key, field)?)
            }
            None => FieldOperation::Create(field_create_input(key, field)?),
        };
        operations.push(operation);
    }
    operations.extend(
        remote
            .field_definitions
            .keys()
            .filter(|key| !resolved.field_definitions.contains_key(*key))
            .map(|key| FieldOperation::Delete(FieldDeleteInput { key: key.clone() })),
    );
    Ok(Some(update_input(type_key, &resolved, operations)))
}

// ---------------------------------------------------------------------------
// Whole-set plan (dry run)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Create {
        fields: Vec<String>,
        display_name_key: Option<String>,
    },
    Update {
        fields: Vec<FieldAction>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub type_key: TypeKey,
    pub action: PlannedAction,
}

/// What a push would do, creates first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
    pub unchanged: Vec<TypeKey>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Canonicalize every local definition.
pub fn canonicalize_all(local: &DefinitionMap) -> DefinitionMap {
    local
        .iter()
        .map(|(type_key, def)| (type_key.clone(), canonicalize(type_key.as_str(), def)))
        .collect()
}

/// Plan a push of canonical `local` onto `snapshot`.
pub fn plan(local: &DefinitionMap, snapshot: &RemoteSnapshot) -> Result<Plan, SyncError> {
    let mut result = Plan::default();
    for (type_key, definition) in local.iter().filter(|(k, _)| !snapshot.contains(k)) {
        let display_name_key = definition.display_name_key.clone().or_else(|| {
            default_display_name_key(&definition.field_definitions).map(str::to_string)
        });
        result.changes.push(PlannedChange {
            type_key: type_key.clone(),
            action: PlannedAction::Create {
                fields: definition.field_definitions.keys().cloned().collect(),
                display_name_key,
            },
        });
    }
    for (type_key, definition) in local {
        let Some(remote) = snapshot.get(type_key) else {
            continue;
        };
        if has_changed(definition, remote)? {
            result.changes.push(PlannedChange {
                type_key: type_key.clone(),
                action: PlannedAction::Update {
                    fields: plan_field_actions(definition, remote),
                },
            });
        } else {
            result.unchanged.push(type_key.clone());
        }
    }
    Ok(result)
}

/// Check every local reference names a type that exists remotely or is
/// declared locally, and every raw id names a listed definition, before
/// anything is mutated.
pub fn preflight(local: &DefinitionMap, snapshot: &RemoteSnapshot) -> Result<(), SyncError> {
    for (type_key, definition) in local {
        check_remote_ids(type_key, definition, |id| {
            snapshot.ids.values().any(|known| known.as_str() == id)
        })?;
        for (field, target) in referenced_types(definition) {
            let target_key = TypeKey::from(target);
            if !snapshot.contains(&target_key) && !local.contains_key(&target_key) {
                return Err(SyncError::UnresolvedType {
                    definition: type_key.clone(),
                    field: field.to_string(),
                    type_key: target.to_string(),
                });
            }
        }
    }
    Ok(())
}
