//! Execution status classification.
//!
//! Status tokens come from the pipeline engine as upper-snake-case strings.
//! Classification is an exact, case-sensitive set lookup; anything outside
//! the known sets counts toward totals only, never toward the
//! success/failure breakdowns.

const SUCCESS_STATUSES: &[&str] = &["SUCCESS"];

const FAILURE_STATUSES: &[&str] = &["FAILED", "ABORTED", "EXPIRED", "IGNOREFAILED", "ERRORED"];

const ACTIVE_STATUSES: &[&str] = &[
    "RUNNING",
    "ASYNCWAITING",
    "TASKWAITING",
    "TIMEDWAITING",
    "PAUSED",
];

const PENDING_STATUSES: &[&str] = &[
    "INTERVENTIONWAITING",
    "APPROVALWAITING",
    "WAITING",
    "RESOURCEWAITING",
];

/// Coarse class of a raw execution status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    Success,
    Failure,
    Active,
    Pending,
    Unclassified,
}

impl StatusClass {
    pub fn classify(status: &str) -> StatusClass {
        if SUCCESS_STATUSES.contains(&status) {
            StatusClass::Success
        } else if FAILURE_STATUSES.contains(&status) {
            StatusClass::Failure
        } else if ACTIVE_STATUSES.contains(&status) {
            StatusClass::Active
        } else if PENDING_STATUSES.contains(&status) {
            StatusClass::Pending
        } else {
            StatusClass::Unclassified
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_statuses() {
        assert_eq!(StatusClass::classify("SUCCESS"), StatusClass::Success);
        assert_eq!(StatusClass::classify("FAILED"), StatusClass::Failure);
        assert_eq!(StatusClass::classify("IGNOREFAILED"), StatusClass::Failure);
        assert_eq!(StatusClass::classify("RUNNING"), StatusClass::Active);
        assert_eq!(StatusClass::classify("PAUSED"), StatusClass::Active);
        assert_eq!(
            StatusClass::classify("APPROVALWAITING"),
            StatusClass::Pending
        );
    }

    #[test]
    fn test_unknown_statuses_unclassified() {
        assert_eq!(StatusClass::classify("QUEUED"), StatusClass::Unclassified);
        assert_eq!(StatusClass::classify(""), StatusClass::Unclassified);
        // Case-sensitive by contract.
        assert_eq!(StatusClass::classify("success"), StatusClass::Unclassified);
    }

    #[test]
    fn test_sets_are_disjoint() {
        let all: Vec<&str> = SUCCESS_STATUSES
            .iter()
            .chain(FAILURE_STATUSES)
            .chain(ACTIVE_STATUSES)
            .chain(PENDING_STATUSES)
            .copied()
            .collect();
        let unique: std::collections::HashSet<&str> = all.iter().copied().collect();
        assert_eq!(all.len(), unique.len());
    }
}
