use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::homework::Identity;

/// Which part of a submission must change for a new notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareBy {
    /// Only the review status. A flip back to an earlier status of the same
    /// homework notifies again.
    #[default]
    Status,
    /// Homework name and status together.
    Identity,
}

/// Remembers what the chat was last told about.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    compare_by: CompareBy,
    last: Option<Identity>,
}

impl ChangeDetector {
    pub fn new(compare_by: CompareBy) -> Self {
        Self {
            compare_by,
            last: None,
        }
    }

    pub fn last_notified(&self) -> Option<&Identity> {
        self.last.as_ref()
    }

    pub fn should_notify(&self, current: &Identity) -> bool {
        match (&self.last, self.compare_by) {
            (None, _) => true,
            (Some(last), CompareBy::Status) => last.status != current.status,
            (Some(last), CompareBy::Identity) => last != current,
        }
    }

    /// Records `current` and returns true when a notification is due.
    /// State is left untouched when nothing changed.
    pub fn observe(&mut self, current: &Identity) -> bool {
        if !self.should_notify(current) {
            debug!(status = current.status.as_str(), "status unchanged");
            return false;
        }
        debug!(
            previous = ?self.last.as_ref().map(|i| i.status.as_str()),
            current = current.status.as_str(),
            "status changed"
        );
        self.last = Some(current.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::homework::ReviewStatus;

    fn id(name: &str, status: ReviewStatus) -> Identity {
        Identity {
            name: name.into(),
            status,
        }
    }

    #[test]
    fn first_submission_always_notifies() {
        let mut detector = ChangeDetector::default();
        assert!(detector.last_notified().is_none());
        assert!(detector.observe(&id("HW1", ReviewStatus::Reviewing)));
        assert_eq!(
            detector.last_notified(),
            Some(&id("HW1", ReviewStatus::Reviewing))
        );
    }

    #[test]
    fn same_status_twice_notifies_once() {
        let mut detector = ChangeDetector::default();
        assert!(detector.observe(&id("HW1", ReviewStatus::Reviewing)));
        assert!(!detector.observe(&id("HW1", ReviewStatus::Reviewing)));
    }

    #[test]
    fn status_flip_back_notifies_each_time() {
        let mut detector = ChangeDetector::default();
        assert!(detector.observe(&id("HW1", ReviewStatus::Reviewing)));
        assert!(detector.observe(&id("HW1", ReviewStatus::Rejected)));
        assert!(detector.observe(&id("HW1", ReviewStatus::Reviewing)));
    }

    // Status-only comparison ignores a new homework that lands in the status
    // the previous one already had.
    #[test]
    fn status_key_ignores_name_change() {
        let mut detector = ChangeDetector::new(CompareBy::Status);
        assert!(detector.observe(&id("HW1", ReviewStatus::Approved)));
        assert!(!detector.observe(&id("HW2", ReviewStatus::Approved)));
        assert_eq!(detector.last_notified().unwrap().name, "HW1");
    }

    #[test]
    fn identity_key_notifies_on_name_change() {
        let mut detector = ChangeDetector::new(CompareBy::Identity);
        assert!(detector.observe(&id("HW1", ReviewStatus::Approved)));
        assert!(detector.observe(&id("HW2", ReviewStatus::Approved)));
        assert!(!detector.observe(&id("HW2", ReviewStatus::Approved)));
    }

    #[test]
    fn compare_by_deserializes_snake_case() {
        let parsed: CompareBy = serde_yaml::from_str("identity").unwrap();
        assert_eq!(parsed, CompareBy::Identity);
        let parsed: CompareBy = serde_yaml::from_str("status").unwrap();
        assert_eq!(parsed, CompareBy::Status);
    }
}
