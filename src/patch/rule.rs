//! Declarative rewrite rules and desired file state.

use regex::Regex;

use crate::error::{ProvisionError, ProvisionResult};

/// How the matched text is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    /// Inserted verbatim; `$` has no special meaning.
    Literal(String),
    /// Expanded with capture references (`$1`, `${name}`), carrying
    /// preserved fragments of the match forward unchanged.
    Captures(String),
}

/// A pattern over the file text and what to replace each match with.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    id: &'static str,
    pattern: Regex,
    replacement: Replacement,
    satisfied: Option<Regex>,
}

impl RewriteRule {
    /// Compile a rule. A malformed pattern is reported as
    /// [`ProvisionError::InvalidRule`]; rule tables are built at startup so
    /// this never surfaces mid-run.
    pub fn new(id: &'static str, pattern: &str, replacement: Replacement) -> ProvisionResult<Self> {
        Ok(Self {
            id,
            pattern: compile(id, pattern)?,
            replacement,
            satisfied: None,
        })
    }

    /// Literal replacement.
    pub fn literal(id: &'static str, pattern: &str, text: impl Into<String>) -> ProvisionResult<Self> {
        Self::new(id, pattern, Replacement::Literal(text.into()))
    }

    /// Capture-preserving replacement.
    pub fn with_captures(
        id: &'static str,
        pattern: &str,
        template: impl Into<String>,
    ) -> ProvisionResult<Self> {
        Self::new(id, pattern, Replacement::Captures(template.into()))
    }

    /// Pattern whose presence means the rule's goal is already met even
    /// though `pattern` no longer matches (e.g. a line already commented
    /// out).
    pub fn satisfied_when(mut self, pattern: &str) -> ProvisionResult<Self> {
        self.satisfied = Some(compile(self.id, pattern)?);
        Ok(self)
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn replacement(&self) -> &Replacement {
        &self.replacement
    }

    pub(crate) fn is_satisfied_by(&self, text: &str) -> bool {
        self.satisfied.as_ref().is_some_and(|re| re.is_match(text))
    }
}

fn compile(id: &'static str, pattern: &str) -> ProvisionResult<Regex> {
    Regex::new(pattern).map_err(|e| ProvisionError::InvalidRule {
        rule: id.to_string(),
        message: e.to_string(),
    })
}

/// Literal text appended to the end of a file unless `marker` already
/// occurs anywhere in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendBlock {
    id: &'static str,
    marker: String,
    text: String,
}

impl AppendBlock {
    pub fn new(id: &'static str, marker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            marker: marker.into(),
            text: text.into(),
        }
    }

    /// A block whose marker is the block text itself (single-line includes).
    pub fn line(id: &'static str, line: impl Into<String>) -> Self {
        let line = line.into();
        Self::new(id, line.clone(), line)
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Everything a managed file should satisfy: ordered rules, then
/// append-if-absent blocks.
#[derive(Debug, Clone, Default)]
pub struct DesiredState {
    rules: Vec<RewriteRule>,
    blocks: Vec<AppendBlock>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn append(mut self, block: AppendBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn blocks(&self) -> &[AppendBlock] {
        &self.blocks
    }

    /// Keep only the named rules and blocks.
    pub fn only(&self, ids: &[&str]) -> Self {
        Self {
            rules: self
                .rules
                .iter()
                .filter(|r| ids.contains(&r.id()))
                .cloned()
                .collect(),
            blocks: self
                .blocks
                .iter()
                .filter(|b| ids.contains(&b.id()))
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_pattern_is_invalid_rule() {
        let err = RewriteRule::literal("broken", r"(unclosed", "x").unwrap_err();
        match err {
            ProvisionError::InvalidRule { rule, .. } => assert_eq!(rule, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_malformed_satisfied_pattern() {
        let rule = RewriteRule::literal("ok", r"^a", "b").unwrap();
        assert!(rule.satisfied_when(r"[").is_err());
    }

    #[test]
    fn test_only_filters_by_id() {
        let state = DesiredState::new()
            .rule(RewriteRule::literal("a", "a", "b").unwrap())
            .rule(RewriteRule::literal("c", "c", "d").unwrap())
            .append(AppendBlock::line("inc", "Include x"));

        let subset = state.only(&["c", "inc"]);
        assert_eq!(subset.rules().len(), 1);
        assert_eq!(subset.rules()[0].id(), "c");
        assert_eq!(subset.blocks().len(), 1);
    }
}
