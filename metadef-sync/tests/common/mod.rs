//! In-memory schema service for engine tests.

#![allow(dead_code)]

use std::cell::RefCell;

use metadef_core::types::{AdminAccess, RemoteId};
use metadef_sync::remote::{
    DefinitionCreateInput, DefinitionPage, DefinitionUpdateInput, FieldCreateInput,
    FieldOperation, MutationOutcome, PageInfo, RemoteAccess, RemoteCapabilities,
    RemoteDefinition, RemoteFieldDefinition, SchemaService, UserError, ValueTypeRef,
};
use metadef_sync::RemoteError;

#[derive(Debug, Clone)]
pub enum Call {
    List { first: u32, after: Option<String> },
    Create(DefinitionCreateInput),
    Update(RemoteId, DefinitionUpdateInput),
}

#[derive(Default)]
struct State {
    records: Vec<RemoteDefinition>,
    next_id: u32,
    calls: Vec<Call>,
    reject: Option<String>,
}

/// Stores definitions in listing order, mints ids, pages by index cursor.
#[derive(Default)]
pub struct FakeService {
    state: RefCell<State>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<RemoteDefinition>) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state.borrow_mut();
            state.next_id = records.len() as u32;
            state.records = records;
        }
        fake
    }

    /// Answer every mutation of `type_key` with a user error.
    pub fn reject(self, type_key: &str) -> Self {
        self.state.borrow_mut().reject = Some(type_key.to_string());
        self
    }

    pub fn records(&self) -> Vec<RemoteDefinition> {
        self.state.borrow().records.clone()
    }

    pub fn record(&self, type_key: &str) -> Option<RemoteDefinition> {
        self.state
            .borrow()
            .records
            .iter()
            .find(|r| r.type_key == type_key)
            .cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn list_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::List { .. }))
            .count()
    }

    pub fn creates(&self) -> Vec<DefinitionCreateInput> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Create(input) => Some(input),
                _ => None,
            })
            .collect()
    }

    pub fn updates(&self) -> Vec<(RemoteId, DefinitionUpdateInput)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(id, input) => Some((id, input)),
                _ => None,
            })
            .collect()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| !matches!(c, Call::List { .. }))
            .count()
    }
}

fn rejected(type_key: &str) -> MutationOutcome {
    MutationOutcome {
        id: None,
        user_errors: vec![UserError {
            field: Some(vec!["definition".to_string(), "type".to_string()]),
            message: format!("{type_key} is not allowed"),
            code: Some("INVALID".to_string()),
        }],
    }
}

fn stored_field(input: &FieldCreateInput) -> RemoteFieldDefinition {
    RemoteFieldDefinition {
        key: input.key.clone(),
        name: input.name.clone(),
        description: input.description.clone(),
        required: input.required,
        value_type: ValueTypeRef {
            name: input.value_type.clone(),
        },
        validations: input.validations.clone(),
    }
}

impl SchemaService for FakeService {
    fn list_definitions(
        &self,
        first: u32,
        after: Option<&str>,
    ) -> Result<DefinitionPage, RemoteError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::List {
            first,
            after: after.map(str::to_string),
        });
        let start = match after {
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|e| RemoteError::Decode(e.to_string()))?,
            None => 0,
        };
        let end = (start + first as usize).min(state.records.len());
        Ok(DefinitionPage {
            nodes: state.records[start..end].to_vec(),
            page_info: PageInfo {
                has_next_page: end < state.records.len(),
                end_cursor: Some(end.to_string()),
            },
        })
    }

    fn create_definition(
        &self,
        input: &DefinitionCreateInput,
    ) -> Result<MutationOutcome, RemoteError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Create(input.clone()));
        if state.reject.as_deref() == Some(input.type_key.as_str()) {
            return Ok(rejected(&input.type_key));
        }

        state.next_id += 1;
        let id = RemoteId::from(format!(
            "gid://shopify/MetaobjectDefinition/{}",
            state.next_id
        ));
        state.records.push(RemoteDefinition {
            id: id.clone(),
            type_key: input.type_key.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            display_name_key: input.display_name_key.clone(),
            access: RemoteAccess {
                admin: input.access.admin.unwrap_or(AdminAccess::PublicReadWrite),
                storefront: input.access.storefront,
            },
            capabilities: RemoteCapabilities {
                online_store: input.capabilities.online_store.clone(),
                publishable: input.capabilities.publishable,
                renderable: input.capabilities.renderable.clone(),
                translatable: input.capabilities.translatable,
            },
            field_definitions: input.field_definitions.iter().map(stored_field).collect(),
        });
        Ok(MutationOutcome {
            id: Some(id),
            user_errors: Vec::new(),
        })
    }

    fn update_definition(
        &self,
        id: &RemoteId,
        input: &DefinitionUpdateInput,
    ) -> Result<MutationOutcome, RemoteError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(Call::Update(id.clone(), input.clone()));
        let reject = state.reject.clone();
        let Some(record) = state.records.iter_mut().find(|r| &r.id == id) else {
            return Err(RemoteError::GraphQl(vec![format!("no definition {id}")]));
        };
        if reject.as_deref() == Some(record.type_key.as_str()) {
            return Ok(rejected(&record.type_key));
        }

        record.name = input.name.clone();
        record.description = Some(input.description.clone()).filter(|d| !d.is_empty());
        record.display_name_key = input.display_name_key.clone();
        record.access = RemoteAccess {
            admin: input.access.admin.unwrap_or(AdminAccess::PublicReadWrite),
            storefront: input.access.storefront,
        };
        record.capabilities = RemoteCapabilities {
            online_store: input.capabilities.online_store.clone(),
            publishable: input.capabilities.publishable,
            renderable: input.capabilities.renderable.clone(),
            translatable: input.capabilities.translatable,
        };
        for operation in &input.field_definitions {
            match operation {
                FieldOperation::Create(field) => record.field_definitions.push(stored_field(field)),
                FieldOperation::Update(field) => {
                    if let Some(stored) =
                        record.field_definitions.iter_mut().find(|f| f.key == field.key)
                    {
                        // Keys left out of the update keep their stored value.
                        let sent = serde_json::to_value(field)
                            .map_err(|e| RemoteError::Decode(e.to_string()))?;
                        stored.name = field.name.clone();
                        if let Some(description) = sent.get("description").and_then(|d| d.as_str()) {
                            stored.description =
                                Some(description.to_string()).filter(|d| !d.is_empty());
                        }
                        stored.required = field.required;
                        stored.validations = field.validations.clone();
                    }
                }
                FieldOperation::Delete(field) => {
                    record.field_definitions.retain(|f| f.key != field.key)
                }
            }
        }
        Ok(MutationOutcome {
            id: Some(id.clone()),
            user_errors: Vec::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// Record builders
// ---------------------------------------------------------------------------

pub fn remote_field(key: &str, value_type: &str) -> RemoteFieldDefinition {
    RemoteFieldDefinition {
        key: key.to_string(),
        name: metadef_sync::normalize::title_case(key),
        description: None,
        required: false,
        value_type: ValueTypeRef {
            name: value_type.to_string(),
        },
        validations: Vec::new(),
    }
}

pub fn remote_record(id: &str, type_key: &str, fields: Vec<RemoteFieldDefinition>) -> RemoteDefinition {
    RemoteDefinition {
        id: RemoteId::from(id),
        type_key: type_key.to_string(),
        name: metadef_sync::normalize::title_case(type_key),
        description: None,
        display_name_key: None,
        access: RemoteAccess::default(),
        capabilities: RemoteCapabilities::default(),
        field_definitions: fields,
    }
}
