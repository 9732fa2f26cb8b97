//! Engine entrypoints used by the CLI: pull, diff, dry run and push.
//!
//! Each call takes its service and [`SyncOptions`] explicitly and builds
//! every map it needs from one fully drained listing; nothing is shared
//! between runs.

use std::fmt;

use metadef_core::types::{DefinitionMap, RemoteId, TypeKey};
use metadef_core::SessionConfig;

use crate::diff::{delta, DefinitionDelta};
use crate::error::SyncError;
use crate::normalize::canonicalize;
use crate::plan::{canonicalize_all, plan, plan_create, plan_update, preflight, Plan};
use crate::remote::{MutationOutcome, SchemaService};
use crate::resolve::UnresolvedReference;
use crate::snapshot::RemoteSnapshot;

/// Listing page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: u32 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    pub page_size: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<&SessionConfig> for SyncOptions {
    fn from(session: &SessionConfig) -> Self {
        Self {
            page_size: session.page_size,
        }
    }
}

// ---------------------------------------------------------------------------
// Pull
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PullResult {
    pub definitions: DefinitionMap,
    /// Ids that named no listed definition; see [`crate::resolve`].
    pub unresolved: Vec<UnresolvedReference>,
}

/// Fetch every remote definition in canonical form.
pub fn pull<S: SchemaService + ?Sized>(
    service: &S,
    options: &SyncOptions,
) -> Result<PullResult, SyncError> {
    let snapshot = RemoteSnapshot::fetch(service, options.page_size)?;
    tracing::info!(
        "pulled {} definition(s), {} unresolved reference(s)",
        snapshot.definitions.len(),
        snapshot.unresolved.len()
    );
    Ok(PullResult {
        definitions: snapshot.definitions,
        unresolved: snapshot.unresolved,
    })
}

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffStatus {
    /// Declared locally, absent remotely.
    New,
    Modified,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionDiff {
    pub type_key: TypeKey,
    pub status: DiffStatus,
    pub delta: DefinitionDelta,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DiffReport {
    pub diffs: Vec<DefinitionDiff>,
    pub unchanged: Vec<TypeKey>,
    /// Remote types with no local declaration. Push never touches these.
    pub unmanaged: Vec<TypeKey>,
}

impl DiffReport {
    pub fn is_clean(&self) -> bool {
        self.diffs.is_empty()
    }
}

/// Compare local declarations with the remote set. No mutation is made.
pub fn diff<S: SchemaService + ?Sized>(
    service: &S,
    local: &DefinitionMap,
    options: &SyncOptions,
) -> Result<DiffReport, SyncError> {
    let snapshot = RemoteSnapshot::fetch(service, options.page_size)?;
    diff_against(local, &snapshot)
}

/// [`diff`] against an already fetched snapshot.
pub fn diff_against(
    local: &DefinitionMap,
    snapshot: &RemoteSnapshot,
) -> Result<DiffReport, SyncError> {
    let mut report = DiffReport::default();
    for (type_key, definition) in local {
        let canonical = canonicalize(type_key.as_str(), definition);
        let remote = snapshot.get(type_key);
        let changes = delta(type_key.as_str(), remote, &canonical)?;
        if changes.is_empty() {
            report.unchanged.push(type_key.clone());
            continue;
        }
        let status = if remote.is_some() {
            DiffStatus::Modified
        } else {
            DiffStatus::New
        };
        report.diffs.push(DefinitionDiff {
            type_key: type_key.clone(),
            status,
            delta: changes,
        });
    }
    report.unmanaged = snapshot
        .definitions
        .keys()
        .filter(|k| !local.contains_key(*k))
        .cloned()
        .collect();
    Ok(report)
}

// ---------------------------------------------------------------------------
// Push
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
    Failed,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created => write!(f, "created"),
            Outcome::Updated => write!(f, "updated"),
            Outcome::Unchanged => write!(f, "unchanged"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionOutcome {
    pub type_key: TypeKey,
    pub outcome: Outcome,
}

/// Per-definition outcomes, in the order they were reached.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PushReport {
    pub outcomes: Vec<DefinitionOutcome>,
}

impl PushReport {
    pub fn outcome(&self, type_key: &TypeKey) -> Option<Outcome> {
        self.outcomes
            .iter()
            .find(|o| &o.type_key == type_key)
            .map(|o| o.outcome)
    }

    pub fn count(&self, outcome: Outcome) -> usize {
        self.outcomes.iter().filter(|o| o.outcome == outcome).count()
    }

    fn record(&mut self, type_key: &TypeKey, outcome: Outcome) {
        match self.outcomes.iter_mut().find(|o| &o.type_key == type_key) {
            Some(existing) => existing.outcome = outcome,
            None => self.outcomes.push(DefinitionOutcome {
                type_key: type_key.clone(),
                outcome,
            }),
        }
    }

    fn abort(mut self, type_key: Option<&TypeKey>, source: SyncError) -> SyncError {
        if let Some(type_key) = type_key {
            self.record(type_key, Outcome::Failed);
        }
        SyncError::Aborted {
            type_key: type_key.cloned(),
            report: self,
            source: Box::new(source),
        }
    }
}

/// Plan a push without mutating anything.
pub fn dry_run<S: SchemaService + ?Sized>(
    service: &S,
    local: &DefinitionMap,
    options: &SyncOptions,
) -> Result<Plan, SyncError> {
    let snapshot = RemoteSnapshot::fetch(service, options.page_size)?;
    let local = canonicalize_all(local);
    preflight(&local, &snapshot)?;
    plan(&local, &snapshot)
}

/// Reconcile the remote set with `local` in two passes.
///
/// 1. Create every local type missing remotely, in type key order. Ids
///    minted by earlier creates are visible to later ones.
/// 2. Re-list, then update every local type whose canonical form differs.
///
/// Stops at the first failure. Mutations already made are not undone; the
/// returned [`SyncError::Aborted`] carries the report so far.
pub fn push<S: SchemaService + ?Sized>(
    service: &S,
    local: &DefinitionMap,
    options: &SyncOptions,
) -> Result<PushReport, SyncError> {
    let local = canonicalize_all(local);
    let snapshot = RemoteSnapshot::fetch(service, options.page_size)?;
    preflight(&local, &snapshot)?;

    let mut report = PushReport::default();
    let mut ids = snapshot.ids.clone();

    for (type_key, definition) in local.iter().filter(|(k, _)| !snapshot.contains(k)) {
        let created = plan_create(type_key, definition, &ids)
            .and_then(|input| service.create_definition(&input).map_err(SyncError::from))
            .and_then(|outcome| accept(type_key, "create", outcome));
        match created {
            Ok(id) => {
                tracing::info!("created {type_key}");
                if let Some(id) = id {
                    ids.insert(type_key.clone(), id);
                }
                report.record(type_key, Outcome::Created);
            }
            Err(e) => return Err(report.abort(Some(type_key), e)),
        }
    }

    let snapshot = match RemoteSnapshot::fetch(service, options.page_size) {
        Ok(snapshot) => snapshot,
        Err(e) => return Err(report.abort(None, e.into())),
    };

    for (type_key, definition) in &local {
        let created = report.outcome(type_key) == Some(Outcome::Created);
        let Some(remote) = snapshot.get(type_key) else {
            return Err(report.abort(
                Some(type_key),
                SyncError::MissingDefinition(type_key.clone()),
            ));
        };

        let update = match plan_update(type_key, definition, remote, &snapshot.ids) {
            Ok(update) => update,
            Err(e) => return Err(report.abort(Some(type_key), e)),
        };
        let Some(input) = update else {
            tracing::debug!("{type_key} unchanged");
            if !created {
                report.record(type_key, Outcome::Unchanged);
            }
            continue;
        };
        let Some(id) = snapshot.id(type_key) else {
            return Err(report.abort(
                Some(type_key),
                SyncError::MissingDefinition(type_key.clone()),
            ));
        };

        let updated = service
            .update_definition(id, &input)
            .map_err(SyncError::from)
            .and_then(|outcome| accept(type_key, "update", outcome));
        match updated {
            Ok(_) => {
                tracing::info!(
                    "updated {type_key} ({} field operation(s))",
                    input.field_definitions.len()
                );
                if !created {
                    report.record(type_key, Outcome::Updated);
                }
            }
            Err(e) => return Err(report.abort(Some(type_key), e)),
        }
    }

    Ok(report)
}

fn accept(
    type_key: &TypeKey,
    action: &'static str,
    outcome: MutationOutcome,
) -> Result<Option<RemoteId>, SyncError> {
    if outcome.user_errors.is_empty() {
        Ok(outcome.id)
    } else {
        Err(SyncError::Rejected {
            type_key: type_key.clone(),
            action,
            errors: outcome.user_errors,
        })
    }
}
