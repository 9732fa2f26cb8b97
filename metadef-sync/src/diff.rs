//! Change detection between canonical definitions.
//!
//! Both sides are serialized to their canonical YAML text (keys in sorted
//! order) and compared. Plain string equality decides "changed"; the line
//! diff from `similar` is only computed to display what changed.

use similar::{ChangeTag, TextDiff};

use metadef_core::types::Definition;

/// Deterministic text form of a definition.
pub fn canonical_text(definition: &Definition) -> Result<String, serde_yaml::Error> {
    serde_yaml::to_string(definition)
}

/// `true` when the canonical texts differ.
pub fn has_changed(a: &Definition, b: &Definition) -> Result<bool, serde_yaml::Error> {
    Ok(canonical_text(a)? != canonical_text(b)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    Equal,
    Insert,
    Delete,
}

/// A run of consecutive lines with the same kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaSpan {
    pub kind: DeltaKind,
    pub text: String,
}

/// What changed between the remote and local canonical text of one type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DefinitionDelta {
    pub spans: Vec<DeltaSpan>,
    /// Inserted line count.
    pub insertions: usize,
    /// Deleted line count.
    pub deletions: usize,
    /// `a/<type>` → `b/<type>` unified diff with three lines of context.
    pub unified: String,
}

impl DefinitionDelta {
    pub fn is_empty(&self) -> bool {
        self.insertions == 0 && self.deletions == 0
    }
}

/// Diff `local` against `remote`; a missing remote side diffs against
/// nothing, so every local line is an insertion.
pub fn delta(
    type_key: &str,
    remote: Option<&Definition>,
    local: &Definition,
) -> Result<DefinitionDelta, serde_yaml::Error> {
    let old = match remote {
        Some(remote) => canonical_text(remote)?,
        None => String::new(),
    };
    let new = canonical_text(local)?;
    if old == new {
        return Ok(DefinitionDelta {
            spans: vec![DeltaSpan {
                kind: DeltaKind::Equal,
                text: new,
            }],
            ..DefinitionDelta::default()
        });
    }

    let diff = TextDiff::from_lines(&old, &new);
    let mut result = DefinitionDelta::default();
    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => DeltaKind::Equal,
            ChangeTag::Insert => {
                result.insertions += 1;
                DeltaKind::Insert
            }
            ChangeTag::Delete => {
                result.deletions += 1;
                DeltaKind::Delete
            }
        };
        match result.spans.last_mut() {
            Some(span) if span.kind == kind => span.text.push_str(change.value()),
            _ => result.spans.push(DeltaSpan {
                kind,
                text: change.value().to_string(),
            }),
        }
    }

    let old_header = format!("a/{type_key}");
    let new_header = format!("b/{type_key}");
    result.unified = diff
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();
    Ok(result)
}
