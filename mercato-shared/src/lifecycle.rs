use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Visibility of a stored record. Removal flips the status to `Deleted`;
/// rows are never physically dropped, and every read filters on this field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Active,
    Deleted,
}

/// Creation/update/removal bookkeeping shared by every persisted aggregate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lifecycle {
    pub record_status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Lifecycle {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            record_status: RecordStatus::Active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    pub fn delete(&mut self, now: DateTime<Utc>) {
        self.record_status = RecordStatus::Deleted;
        self.deleted_at = Some(now);
        self.updated_at = now;
    }

    pub fn is_deleted(&self) -> bool {
        self.record_status == RecordStatus::Deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_marks_record_and_keeps_timestamps() {
        let created = Utc::now();
        let mut lifecycle = Lifecycle::new(created);
        assert!(!lifecycle.is_deleted());

        let removed = created + chrono::Duration::seconds(5);
        lifecycle.delete(removed);

        assert!(lifecycle.is_deleted());
        assert_eq!(lifecycle.created_at, created);
        assert_eq!(lifecycle.deleted_at, Some(removed));
        assert_eq!(lifecycle.updated_at, removed);
    }
}
