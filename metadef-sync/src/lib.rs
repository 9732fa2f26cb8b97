//! # metadef-sync
//!
//! Reconciliation engine between local declarations and the remote
//! definition set.
//!
//! - [`normalize`] / [`denormalize`]: remote records ↔ canonical form
//! - [`resolve`]: reference validations, ids ↔ type keys
//! - [`diff`]: canonical text comparison and line deltas
//! - [`plan`]: field set-difference planning and push preflight
//! - [`pipeline`]: [`pull`], [`diff()`], [`dry_run`] and two-phase [`push`]
//!
//! The remote side is reached through the [`SchemaService`] trait.

pub mod denormalize;
pub mod diff;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod plan;
pub mod remote;
pub mod resolve;
pub mod snapshot;

pub use error::{RemoteError, SyncError};
pub use pipeline::{
    diff, diff_against, dry_run, pull, push, DefinitionDiff, DefinitionOutcome, DiffReport,
    DiffStatus, Outcome, PullResult, PushReport, SyncOptions,
};
pub use plan::{FieldAction, Plan, PlannedAction, PlannedChange};
pub use remote::{
    DefinitionCreateInput, DefinitionPage, DefinitionUpdateInput, MutationOutcome,
    RemoteDefinition, SchemaService, UserError,
};
pub use resolve::UnresolvedReference;
pub use snapshot::RemoteSnapshot;
