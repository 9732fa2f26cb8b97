//! Error types for metadef-sync.

use std::fmt;

use thiserror::Error;

use metadef_core::types::TypeKey;

use crate::pipeline::PushReport;
use crate::remote::UserError;

/// Failures of the remote schema service itself (not of a submitted input).
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Network or connection failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Top-level GraphQL `errors` in an otherwise successful response.
    #[error("GraphQL error: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// Response body did not have the expected shape.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// `hasNextPage` without an `endCursor`; draining would never finish.
    #[error("listing reported another page but returned no cursor")]
    Pagination,
}

/// All errors that can arise from reconciliation.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// A local reference names a type with no known remote id.
    #[error("{definition}.{field}: referenced type '{type_key}' does not exist remotely")]
    UnresolvedType {
        definition: TypeKey,
        field: String,
        type_key: String,
    },

    /// A reference validation holds something other than type key strings.
    #[error("{definition}.{field}: validation '{validation}' must hold type key strings")]
    InvalidReference {
        definition: TypeKey,
        field: String,
        validation: String,
    },

    /// A local declaration still carries a raw id that names no listed definition.
    #[error("{definition}.{field}: reference id '{id}' matches no remote definition; declare it by type key")]
    UnknownRemoteId {
        definition: TypeKey,
        field: String,
        id: String,
    },

    /// The service answered a mutation with user errors.
    #[error("{action} of '{type_key}' rejected: {}", UserErrors(.errors))]
    Rejected {
        type_key: TypeKey,
        action: &'static str,
        errors: Vec<UserError>,
    },

    /// A definition expected on the remote side is missing from the listing.
    #[error("definition '{0}' missing from remote listing")]
    MissingDefinition(TypeKey),

    /// Canonical text serialization error.
    #[error("canonical serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Validation value encoding error.
    #[error("validation encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// A push stopped part-way; `report` holds what was applied before.
    #[error("push aborted{}: {source}", AbortedAt(.type_key.as_ref()))]
    Aborted {
        type_key: Option<TypeKey>,
        report: PushReport,
        #[source]
        source: Box<SyncError>,
    },
}

struct UserErrors<'a>(&'a [UserError]);

impl fmt::Display for UserErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

struct AbortedAt<'a>(Option<&'a TypeKey>);

impl fmt::Display for AbortedAt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(type_key) => write!(f, " at '{type_key}'"),
            None => Ok(()),
        }
    }
}
