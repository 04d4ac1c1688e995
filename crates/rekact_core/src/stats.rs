//! Derived counts over a parsed kact.

use serde::Serialize;
use std::fmt;

use crate::act::KeyAct;
use crate::key::ActKind;

const RULE: &str = "===========================";

/// Per-kind act counts and submissions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct KactSummary {
    pub total: usize,
    pub key_downs: usize,
    pub key_presses: usize,
    pub key_ups: usize,
    pub submissions: usize,
}

impl KactSummary {
    pub fn from_acts(acts: &[KeyAct]) -> Self {
        let count = |kind: ActKind| acts.iter().filter(|a| a.kind() == kind).count();
        Self {
            total: acts.len(),
            key_downs: count(ActKind::KeyDown),
            key_presses: count(ActKind::KeyPress),
            key_ups: count(ActKind::KeyUp),
            submissions: count_submissions(acts),
        }
    }
}

impl fmt::Display for KactSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{RULE}")?;
        writeln!(f, "Total Acts: {}", self.total)?;
        writeln!(f, "Total Key Downs: {}", self.key_downs)?;
        writeln!(f, "Total Key Presses: {}", self.key_presses)?;
        writeln!(f, "Total Key Ups: {}", self.key_ups)?;
        writeln!(f, "Submissions: {}", self.submissions)?;
        write!(f, "{RULE}")
    }
}

/// Number of acts that trigger a submission.
pub fn count_submissions(acts: &[KeyAct]) -> usize {
    acts.iter().filter(|a| a.is_submission()).count()
}

/// Number of character-producing acts replay must satisfy.
pub fn count_required_chars(acts: &[KeyAct]) -> usize {
    acts.iter().filter(|a| a.kind() == ActKind::KeyPress).count()
}

/// Key states left open at the end of a replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Leftovers {
    /// Masked-character KeyDowns never matched by a KeyPress.
    pub key_press: usize,
    /// KeyDowns never matched by a KeyUp.
    pub key_up: usize,
}

impl Leftovers {
    pub fn is_clean(&self) -> bool {
        self.key_press == 0 && self.key_up == 0
    }
}
