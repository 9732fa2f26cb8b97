//! Canonical schema model.
//!
//! These types are the environment-portable form of a metaobject definition:
//! defaults are elided, schema-to-schema references are symbolic type keys,
//! and every map is ordered so serialization is deterministic. The same
//! types are read from and written to local declaration files.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable symbolic identifier of a definition (the remote `type`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(pub String);

impl TypeKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TypeKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TypeKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Opaque identifier the remote service assigns to a definition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub String);

impl RemoteId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RemoteId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RemoteId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A full definition set keyed by type key.
pub type DefinitionMap = BTreeMap<TypeKey, Definition>;

// ---------------------------------------------------------------------------
// Access
// ---------------------------------------------------------------------------

/// Admin API access level of a definition's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAccess {
    MerchantRead,
    MerchantReadWrite,
    Private,
    PublicRead,
    #[default]
    PublicReadWrite,
}

impl fmt::Display for AdminAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminAccess::MerchantRead => write!(f, "MERCHANT_READ"),
            AdminAccess::MerchantReadWrite => write!(f, "MERCHANT_READ_WRITE"),
            AdminAccess::Private => write!(f, "PRIVATE"),
            AdminAccess::PublicRead => write!(f, "PUBLIC_READ"),
            AdminAccess::PublicReadWrite => write!(f, "PUBLIC_READ_WRITE"),
        }
    }
}

/// Storefront API access level of a definition's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorefrontAccess {
    None,
    #[default]
    PublicRead,
}

impl fmt::Display for StorefrontAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorefrontAccess::None => write!(f, "NONE"),
            StorefrontAccess::PublicRead => write!(f, "PUBLIC_READ"),
        }
    }
}

/// Non-default access settings. A `None` side means the platform default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Access {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminAccess>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storefront: Option<StorefrontAccess>,
}

impl Access {
    /// Effective admin access, with the default filled in.
    pub fn admin_or_default(&self) -> AdminAccess {
        self.admin.unwrap_or_default()
    }

    /// Effective storefront access, with the default filled in.
    pub fn storefront_or_default(&self) -> StorefrontAccess {
        self.storefront.unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Online store capability settings; presence means the capability is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OnlineStoreCapability {
    #[serde(default, skip_serializing_if = "is_false")]
    pub can_create_redirects: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_handle: Option<String>,
}

/// Renderable capability settings; presence means the capability is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenderableCapability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_title_key: Option<String>,
}

/// Enabled capabilities. Everything absent is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_store: Option<OnlineStoreCapability>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub publishable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renderable: Option<RenderableCapability>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub translatable: bool,
}

impl Capabilities {
    /// `true` when no capability is enabled.
    pub fn is_empty(&self) -> bool {
        self.online_store.is_none()
            && !self.publishable
            && self.renderable.is_none()
            && !self.translatable
    }
}

// ---------------------------------------------------------------------------
// Validation values
// ---------------------------------------------------------------------------

/// A field validation value, carrying the JSON shape it was declared with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<ValidationValue>),
    Map(BTreeMap<String, ValidationValue>),
}

impl ValidationValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ValidationValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert back to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            ValidationValue::Null => Value::Null,
            ValidationValue::Bool(b) => Value::Bool(*b),
            ValidationValue::Number(n) => Value::Number(n.clone()),
            ValidationValue::Text(s) => Value::String(s.clone()),
            ValidationValue::List(items) => {
                Value::Array(items.iter().map(ValidationValue::to_json).collect())
            }
            ValidationValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for ValidationValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => ValidationValue::Null,
            Value::Bool(b) => ValidationValue::Bool(b),
            Value::Number(n) => ValidationValue::Number(n),
            Value::String(s) => ValidationValue::Text(s),
            Value::Array(items) => {
                ValidationValue::List(items.into_iter().map(ValidationValue::from).collect())
            }
            Value::Object(entries) => ValidationValue::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, ValidationValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ValidationValue {
    fn from(s: &str) -> Self {
        ValidationValue::Text(s.to_owned())
    }
}

impl From<String> for ValidationValue {
    fn from(s: String) -> Self {
        ValidationValue::Text(s)
    }
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// One field of a definition, in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Value type name, e.g. `single_line_text_field`.
    #[serde(rename = "type")]
    pub value_type: String,
    /// Omitted when equal to the title-cased field key.
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub validations: BTreeMap<String, ValidationValue>,
}

impl FieldDefinition {
    /// A bare field of the given value type.
    pub fn of_type(value_type: impl Into<String>) -> Self {
        Self {
            value_type: value_type.into(),
            ..Self::default()
        }
    }
}

/// One metaobject definition, in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    /// Omitted when equal to the title-cased type key.
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<Access>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
    /// Omitted when equal to the derived default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name_key: Option<String>,
    #[serde(default)]
    pub field_definitions: BTreeMap<String, FieldDefinition>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
