use serde::{Deserialize, Serialize};

use super::{new_id, now, RecordId, Timestamp};
use crate::storage::Record;

string_enum! {
    /// Kind of audited change
    pub enum AuditAction {
        /// Record created
        Create => "create",
        /// Record modified
        Update => "update",
        /// Record soft-deleted
        Archive => "archive",
        /// Previous version restored
        Restore => "restore",
        /// Successful sign-in
        Login => "login",
        /// Subscription tier, status or usage changed
        PlanChange => "plan_change",
    }
}

/// Append-only record of a state change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    /// Entry id
    pub id: RecordId,
    /// Account that acted; `None` for anonymous submissions
    pub actor_id: Option<RecordId>,
    /// What happened
    pub action: AuditAction,
    /// Collection name of the affected record
    pub resource: String,
    /// Affected record
    pub resource_id: RecordId,
    /// Free-form context
    pub details: serde_json::Value,
    /// When it happened
    pub created_at: Timestamp,
}

impl AuditLog {
    /// New entry stamped now
    pub fn new(
        actor_id: Option<RecordId>,
        action: AuditAction,
        resource: &str,
        resource_id: RecordId,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: new_id(),
            actor_id,
            action,
            resource: resource.to_string(),
            resource_id,
            details,
            created_at: now(),
        }
    }
}

impl Record for AuditLog {
    const COLLECTION: &'static str = "audit_logs";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}
