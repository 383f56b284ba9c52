//! Human-facing proposal summaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::patch::{OpKind, Operation};

use super::types::Conflict;

/// Section key for operations that target the document root.
pub const ROOT_SECTION: &str = "(root)";

/// Counts for one top-level section of the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSummary {
    pub adds: usize,
    pub removes: usize,
    pub replaces: usize,
    pub conflicts: usize,
}

impl SectionSummary {
    fn count(&mut self, kind: OpKind) {
        match kind {
            OpKind::Add => self.adds += 1,
            OpKind::Remove => self.removes += 1,
            OpKind::Replace => self.replaces += 1,
        }
    }
}

/// `adds`/`removes`/`replaces` count applicable operations only; conflicts
/// are counted separately.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummary {
    pub total_changes: usize,
    pub adds: usize,
    pub removes: usize,
    pub replaces: usize,
    pub conflicts: usize,
    pub section_breakdown: BTreeMap<String, SectionSummary>,
    pub headline: String,
}

fn section_of(op: &Operation) -> String {
    curate_pointer::top_level(op.path())
        .unwrap_or(ROOT_SECTION)
        .to_string()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

fn headline(totals: &SectionSummary) -> String {
    let changes = totals.adds + totals.removes + totals.replaces;
    if changes == 0 && totals.conflicts == 0 {
        return "No changes".to_string();
    }
    let mut text = plural(changes, "change");
    let parts: Vec<String> = [
        (totals.adds, "add"),
        (totals.removes, "remove"),
        (totals.replaces, "replace"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, word)| format!("{n} {word}"))
    .collect();
    if !parts.is_empty() {
        text.push_str(&format!(" ({})", parts.join(", ")));
    }
    if totals.conflicts > 0 {
        text.push_str(", ");
        text.push_str(&plural(totals.conflicts, "conflict"));
    }
    text
}

/// Summarise a partitioned diff, grouping by top-level path segment.
pub fn summarize(patch: &[Operation], conflicts: &[Conflict]) -> ProposalSummary {
    let mut totals = SectionSummary::default();
    let mut sections: BTreeMap<String, SectionSummary> = BTreeMap::new();

    for op in patch {
        totals.count(op.kind());
        sections.entry(section_of(op)).or_default().count(op.kind());
    }
    for conflict in conflicts {
        totals.conflicts += 1;
        sections
            .entry(section_of(&conflict.operation))
            .or_default()
            .conflicts += 1;
    }

    ProposalSummary {
        total_changes: patch.len(),
        adds: totals.adds,
        removes: totals.removes,
        replaces: totals.replaces,
        conflicts: totals.conflicts,
        headline: headline(&totals),
        section_breakdown: sections,
    }
}
