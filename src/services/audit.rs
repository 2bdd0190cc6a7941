//! Audit trail

use serde_json::Value;

use crate::core::Result;
use crate::storage::{Record, Store};
use crate::types::{AuditAction, AuditLog, ListParams, Page, RecordId};

/// Append an entry for a change to `record`
///
/// A failed write is logged and swallowed; auditing never fails the request
/// that triggered it.
pub fn record<T: Record>(store: &Store, actor: Option<RecordId>, action: AuditAction, record: &T, details: Value) {
    record_raw(store, actor, action, T::COLLECTION, record.id(), details);
}

/// Append an entry by collection name and id
pub fn record_raw(
    store: &Store,
    actor: Option<RecordId>,
    action: AuditAction,
    resource: &str,
    resource_id: RecordId,
    details: Value,
) {
    let entry = AuditLog::new(actor, action, resource, resource_id, details);
    if let Err(e) = store.audit_logs.insert(entry) {
        tracing::warn!(resource, %resource_id, "failed to write audit entry: {}", e);
    }
}

/// Filters accepted by `GET /api/audit`
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct AuditFilter {
    /// Collection name
    pub resource: Option<String>,
    /// Acting account
    pub actor: Option<RecordId>,
    /// Action kind
    pub action: Option<AuditAction>,
}

/// Newest entries first, filtered and paginated
pub fn list(store: &Store, filter: &AuditFilter, params: &ListParams) -> Result<Page<AuditLog>> {
    let mut entries = store.audit_logs.find(|e| {
        filter.resource.as_deref().map_or(true, |r| e.resource == r)
            && filter.actor.map_or(true, |a| e.actor_id == Some(a))
            && filter.action.map_or(true, |a| e.action == a)
    });
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Page::paginate(entries, params)
}
