//! Remote schema service port and wire types.
//!
//! The wire types mirror the Admin API shapes one to one: listing records
//! come back verbose (every default spelled out, references as opaque ids),
//! and mutation inputs are sent fully specified. [`SchemaService`] is the
//! seam between the engine and a transport; the CLI implements it over HTTP,
//! tests implement it in memory.

use std::fmt;

use serde::{Deserialize, Serialize};

use metadef_core::types::{AdminAccess, RemoteId, StorefrontAccess};

use crate::error::RemoteError;

// ---------------------------------------------------------------------------
// Listing records
// ---------------------------------------------------------------------------

/// One definition exactly as the listing returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteDefinition {
    pub id: RemoteId,
    #[serde(rename = "type")]
    pub type_key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub display_name_key: Option<String>,
    #[serde(default)]
    pub access: RemoteAccess,
    #[serde(default)]
    pub capabilities: RemoteCapabilities,
    #[serde(default)]
    pub field_definitions: Vec<RemoteFieldDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RemoteAccess {
    pub admin: AdminAccess,
    pub storefront: StorefrontAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCapabilities {
    #[serde(default)]
    pub online_store: RemoteOnlineStore,
    #[serde(default)]
    pub publishable: Toggle,
    #[serde(default)]
    pub renderable: RemoteRenderable,
    #[serde(default)]
    pub translatable: Toggle,
}

/// A capability that is only on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Toggle {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RemoteOnlineStore {
    pub enabled: bool,
    #[serde(default)]
    pub data: Option<OnlineStoreData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OnlineStoreData {
    #[serde(default)]
    pub can_create_redirects: bool,
    #[serde(default)]
    pub url_handle: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RemoteRenderable {
    pub enabled: bool,
    #[serde(default)]
    pub data: Option<RenderableData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenderableData {
    #[serde(default)]
    pub meta_description_key: Option<String>,
    #[serde(default)]
    pub meta_title_key: Option<String>,
}

/// One field exactly as the listing returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFieldDefinition {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type")]
    pub value_type: ValueTypeRef,
    #[serde(default)]
    pub validations: Vec<RemoteValidation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTypeRef {
    pub name: String,
}

/// A validation as a name and a JSON-encoded string value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteValidation {
    pub name: String,
    pub value: String,
}

/// One page of the definition listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionPage {
    pub nodes: Vec<RemoteDefinition>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    #[serde(default)]
    pub end_cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Mutation inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionCreateInput {
    #[serde(rename = "type")]
    pub type_key: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name_key: Option<String>,
    pub access: AccessInput,
    pub capabilities: CapabilitiesInput,
    pub field_definitions: Vec<FieldCreateInput>,
}

/// Full replacement of a definition's header plus per-field operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionUpdateInput {
    pub name: String,
    /// Always sent; an empty string clears the remote description.
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name_key: Option<String>,
    pub access: AccessInput,
    pub capabilities: CapabilitiesInput,
    pub field_definitions: Vec<FieldOperation>,
}

/// Admin access is only sent when it restricts merchants; storefront always.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminAccess>,
    pub storefront: StorefrontAccess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesInput {
    pub online_store: RemoteOnlineStore,
    pub publishable: Toggle,
    pub renderable: RemoteRenderable,
    pub translatable: Toggle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldCreateInput {
    pub key: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub validations: Vec<RemoteValidation>,
}

/// Whole-field replacement; the value type of an existing field is fixed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldUpdateInput {
    pub key: String,
    pub name: String,
    /// Always sent; an empty string clears the field description.
    pub description: String,
    pub required: bool,
    pub validations: Vec<RemoteValidation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDeleteInput {
    pub key: String,
}

/// One field sub-operation of an update, serialized as
/// `{"create": {...}}`, `{"update": {...}}` or `{"delete": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldOperation {
    Create(FieldCreateInput),
    Update(FieldUpdateInput),
    Delete(FieldDeleteInput),
}

impl FieldOperation {
    pub fn key(&self) -> &str {
        match self {
            FieldOperation::Create(f) => &f.key,
            FieldOperation::Update(f) => &f.key,
            FieldOperation::Delete(f) => &f.key,
        }
    }
}

// ---------------------------------------------------------------------------
// Mutation results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserError {
    #[serde(default)]
    pub field: Option<Vec<String>>,
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl fmt::Display for UserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(field) = self.field.as_ref().filter(|f| !f.is_empty()) {
            write!(f, "{}: ", field.join("."))?;
        }
        f.write_str(&self.message)?;
        if let Some(code) = &self.code {
            write!(f, " ({code})")?;
        }
        Ok(())
    }
}

/// Result of a create or update call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MutationOutcome {
    /// Id of the created or updated definition, when the service returned one.
    pub id: Option<RemoteId>,
    pub user_errors: Vec<UserError>,
}

// ---------------------------------------------------------------------------
// Service port
// ---------------------------------------------------------------------------

/// The remote schema service.
///
/// Every call blocks until the service answers. Implementations report
/// transport and protocol failures as [`RemoteError`]; input rejections come
/// back as `user_errors` on an otherwise successful [`MutationOutcome`].
pub trait SchemaService {
    fn list_definitions(
        &self,
        first: u32,
        after: Option<&str>,
    ) -> Result<DefinitionPage, RemoteError>;

    fn create_definition(
        &self,
        input: &DefinitionCreateInput,
    ) -> Result<MutationOutcome, RemoteError>;

    fn update_definition(
        &self,
        id: &RemoteId,
        input: &DefinitionUpdateInput,
    ) -> Result<MutationOutcome, RemoteError>;
}

impl<S: SchemaService + ?Sized> SchemaService for &S {
    fn list_definitions(
        &self,
        first: u32,
        after: Option<&str>,
    ) -> Result<DefinitionPage, RemoteError> {
        (**self).list_definitions(first, after)
    }

    fn create_definition(
        &self,
        input: &DefinitionCreateInput,
    ) -> Result<MutationOutcome, RemoteError> {
        (**self).create_definition(input)
    }

    fn update_definition(
        &self,
        id: &RemoteId,
        input: &DefinitionUpdateInput,
    ) -> Result<MutationOutcome, RemoteError> {
        (**self).update_definition(id, input)
    }
}

/// Drain every page of the listing, in listing order.
pub fn list_all<S: SchemaService + ?Sized>(
    service: &S,
    page_size: u32,
) -> Result<Vec<RemoteDefinition>, RemoteError> {
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;
    loop {
        let page = service.list_definitions(page_size, cursor.as_deref())?;
        pages += 1;
        records.extend(page.nodes);
        if !page.page_info.has_next_page {
            break;
        }
        match page.page_info.end_cursor {
            Some(next) if cursor.as_deref() != Some(next.as_str()) => cursor = Some(next),
            _ => return Err(RemoteError::Pagination),
        }
    }
    tracing::debug!("listed {} definition(s) in {pages} page(s)", records.len());
    Ok(records)
}
