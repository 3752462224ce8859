//! Pure text patching: apply a [`DesiredState`] to file content.

use regex::NoExpand;
use serde::Serialize;

use super::rule::{DesiredState, Replacement};

/// What happened to a single rewrite rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleStatus {
    /// The pattern matched and the text changed.
    Applied,
    /// Nothing to do: the match already equals its replacement, or the
    /// rule's satisfied pattern is present.
    Satisfied,
    /// Neither the pattern nor the satisfied pattern occurs. Either the
    /// vendor format changed or the directive was never there.
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleReport {
    pub id: &'static str,
    pub status: RuleStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockReport {
    pub id: &'static str,
    pub inserted: bool,
}

/// Result of patching a text.
#[derive(Debug, Clone)]
pub struct PatchOutcome {
    /// The patched text (equal to the input when nothing changed).
    pub content: String,
    pub rules: Vec<RuleReport>,
    pub blocks: Vec<BlockReport>,
    changed: bool,
}

impl PatchOutcome {
    /// Whether any rule applied or any block was inserted.
    pub fn changed(&self) -> bool {
        self.changed
    }

    pub fn applied(&self, id: &str) -> bool {
        self.rules
            .iter()
            .any(|r| r.id == id && r.status == RuleStatus::Applied)
    }

    pub fn inserted(&self, id: &str) -> bool {
        self.blocks.iter().any(|b| b.id == id && b.inserted)
    }

    pub fn applied_count(&self) -> usize {
        self.rules
            .iter()
            .filter(|r| r.status == RuleStatus::Applied)
            .count()
    }

    pub fn inserted_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.inserted).count()
    }

    pub fn unrecognized(&self) -> Vec<&'static str> {
        self.rules
            .iter()
            .filter(|r| r.status == RuleStatus::Unrecognized)
            .map(|r| r.id)
            .collect()
    }
}

/// Apply every rule in order, then every append block in order.
///
/// Append markers are checked against the already-patched text, so a rule
/// that introduces a marker suppresses the matching block in the same pass.
/// Applying the returned content again yields no changes.
pub fn apply(text: &str, state: &DesiredState) -> PatchOutcome {
    let mut content = text.to_string();
    let mut rules = Vec::with_capacity(state.rules().len());

    for rule in state.rules() {
        let status = if rule.pattern().is_match(&content) {
            let replaced = match rule.replacement() {
                Replacement::Literal(text) => rule.pattern().replace_all(&content, NoExpand(text)),
                Replacement::Captures(template) => {
                    rule.pattern().replace_all(&content, template.as_str())
                }
            };
            if replaced.as_ref() == content.as_str() {
                RuleStatus::Satisfied
            } else {
                let next = replaced.into_owned();
                content = next;
                RuleStatus::Applied
            }
        } else if rule.is_satisfied_by(&content) {
            RuleStatus::Satisfied
        } else {
            RuleStatus::Unrecognized
        };
        rules.push(RuleReport {
            id: rule.id(),
            status,
        });
    }

    let mut blocks = Vec::with_capacity(state.blocks().len());
    for block in state.blocks() {
        let inserted = !content.contains(block.marker());
        if inserted {
            if !content.is_empty() {
                if !content.ends_with('\n') {
                    content.push('\n');
                }
                content.push('\n');
            }
            content.push_str(block.text().trim_matches('\n'));
            content.push('\n');
        }
        blocks.push(BlockReport {
            id: block.id(),
            inserted,
        });
    }

    let changed = content != text;
    PatchOutcome {
        content,
        rules,
        blocks,
        changed,
    }
}
