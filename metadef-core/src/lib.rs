//! metadef core library: canonical schema model, local declaration store,
//! configuration.
//!
//! - [`types`]: canonical definition types and newtypes
//! - [`store`]: load / save declaration files and directories
//! - [`config`]: `.metaobjectsrc.yaml` lookup and [`SessionConfig`]
//! - [`error`]: [`StoreError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::SessionConfig;
pub use error::{ConfigError, StoreError};
pub use types::{
    Access, AdminAccess, Capabilities, Definition, DefinitionMap, FieldDefinition,
    OnlineStoreCapability, RemoteId, RenderableCapability, StorefrontAccess, TypeKey,
    ValidationValue,
};
