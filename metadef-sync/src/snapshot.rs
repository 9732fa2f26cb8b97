//! A complete, normalized view of the remote definition set.

use std::collections::{BTreeMap, HashMap};

use metadef_core::types::{Definition, DefinitionMap, RemoteId, TypeKey};

use crate::error::RemoteError;
use crate::normalize::normalize;
use crate::remote::{list_all, RemoteDefinition, SchemaService};
use crate::resolve::{resolve_ids_to_types, UnresolvedReference};

/// Remote definitions in canonical form plus the id of each.
///
/// Built only from a fully drained listing, never from a partial page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSnapshot {
    pub definitions: DefinitionMap,
    pub ids: BTreeMap<TypeKey, RemoteId>,
    pub unresolved: Vec<UnresolvedReference>,
}

impl RemoteSnapshot {
    /// Normalize listing records and resolve their references.
    pub fn from_records(records: &[RemoteDefinition]) -> Self {
        let mut definitions = DefinitionMap::new();
        let mut ids = BTreeMap::new();
        let mut types_by_id = HashMap::with_capacity(records.len());
        for record in records {
            let type_key = TypeKey::from(record.type_key.as_str());
            definitions.insert(type_key.clone(), normalize(record));
            ids.insert(type_key.clone(), record.id.clone());
            types_by_id.insert(record.id.clone(), type_key);
        }
        let unresolved = resolve_ids_to_types(&mut definitions, &types_by_id);
        Self {
            definitions,
            ids,
            unresolved,
        }
    }

    /// List every remote definition and build the snapshot.
    pub fn fetch<S: SchemaService + ?Sized>(
        service: &S,
        page_size: u32,
    ) -> Result<Self, RemoteError> {
        let records = list_all(service, page_size)?;
        Ok(Self::from_records(&records))
    }

    pub fn contains(&self, type_key: &TypeKey) -> bool {
        self.definitions.contains_key(type_key)
    }

    pub fn get(&self, type_key: &TypeKey) -> Option<&Definition> {
        self.definitions.get(type_key)
    }

    pub fn id(&self, type_key: &TypeKey) -> Option<&RemoteId> {
        self.ids.get(type_key)
    }
}
