// Verification report types (spec.md §4.6)

use std::fmt;

/// One verification finding against a global protocol or one of its CFSMs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub check: Check,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    Connectedness,
    SelfCommunication,
    ChoiceDeterminism,
    RaceFreedom,
    Progress,
    WellFormedRecursion,
    RoleArityAndScope,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The protocol is rejected; projection or simulation must not proceed.
    Fatal,
    /// The protocol is accepted but the finding is surfaced to the caller.
    Warning,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{:?}] {}", self.check, self.severity, self.message)
    }
}

/// The accumulated result of running every check in spec.md §4.6's table.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub findings: Vec<Finding>,
}

impl VerificationReport {
    pub fn is_accepted(&self) -> bool {
        !self.findings.iter().any(|f| f.severity == Severity::Fatal)
    }

    pub fn fatal(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Fatal)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning)
    }

    pub fn push(&mut self, check: Check, severity: Severity, message: impl Into<String>) {
        self.findings.push(Finding { check, severity, message: message.into() });
    }
}
