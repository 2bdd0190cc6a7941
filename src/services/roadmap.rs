//! Public roadmap

use serde_json::json;

use crate::core::{Error, Result};
use crate::storage::Store;
use crate::system::metrics;
use crate::types::{
    AuditAction, ListParams, Milestone, MilestoneCategory, MilestonePatch, MilestoneStatus, NewMilestone, RecordId,
    Validate,
};

/// Milestones sorted by quarter, then order
///
/// Archived milestones are left out unless asked for by status.
pub fn list(store: &Store, params: &ListParams) -> Result<Vec<Milestone>> {
    let status = ListParams::parse_filter::<MilestoneStatus>(params.status.as_deref(), "status")?;
    let category = ListParams::parse_filter::<MilestoneCategory>(params.category.as_deref(), "category")?;

    let mut milestones = store.milestones.find(|m| {
        let status_matches = match status {
            Some(s) => m.status == s,
            None => m.status != MilestoneStatus::Archived,
        };
        status_matches
            && category.map_or(true, |c| m.category == c)
            && params.matches_search(&[&m.title, &m.description])
    });
    milestones.sort_by_key(Milestone::sort_key);
    Ok(milestones)
}

/// Create a milestone
pub fn create(store: &Store, editor_id: RecordId, input: NewMilestone) -> Result<Milestone> {
    let milestone = Milestone::new(input);
    milestone.validate()?;
    let milestone = store.milestones.insert(milestone)?;

    metrics::record_created("milestones");
    super::audit::record(store, Some(editor_id), AuditAction::Create, &milestone, json!({ "quarter": milestone.quarter }));
    Ok(milestone)
}

/// Apply a partial update
pub fn update(store: &Store, editor_id: RecordId, id: RecordId, patch: MilestonePatch) -> Result<Milestone> {
    let milestone = store.milestones.update(id, |m| {
        patch.apply(m);
        m.validate()
    })?;
    super::audit::record(store, Some(editor_id), AuditAction::Update, &milestone, json!({}));
    Ok(milestone)
}

/// Soft-delete
pub fn archive(store: &Store, admin_id: RecordId, id: RecordId) -> Result<Milestone> {
    let milestone = store.milestones.update(id, |m| {
        if m.status == MilestoneStatus::Archived {
            return Err(Error::conflict("milestone is already archived"));
        }
        m.status = MilestoneStatus::Archived;
        m.updated_at = chrono::Utc::now();
        Ok(())
    })?;
    super::audit::record(store, Some(admin_id), AuditAction::Archive, &milestone, json!({}));
    Ok(milestone)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::new_id;

    fn add(store: &Store, title: &str, quarter: &str, order: i32, category: MilestoneCategory) -> Milestone {
        create(
            store,
            new_id(),
            NewMilestone {
                title: title.into(),
                description: String::new(),
                quarter: quarter.parse().unwrap(),
                category,
                progress: 0,
                status: None,
                order,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_sorted_by_quarter_then_order() {
        let store = Store::new();
        add(&store, "C", "Q1 2026", 0, MilestoneCategory::Platform);
        add(&store, "B", "Q3 2025", 2, MilestoneCategory::Hardware);
        add(&store, "A", "Q3 2025", 1, MilestoneCategory::Platform);

        let titles: Vec<_> = list(&store, &ListParams::default())
            .unwrap()
            .into_iter()
            .map(|m| m.title)
            .collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_archived_hidden_by_default() {
        let store = Store::new();
        let m = add(&store, "Old", "Q1 2024", 0, MilestoneCategory::Research);
        archive(&store, new_id(), m.id).unwrap();
        assert!(list(&store, &ListParams::default()).unwrap().is_empty());

        let archived = ListParams {
            status: Some("archived".into()),
            ..Default::default()
        };
        assert_eq!(list(&store, &archived).unwrap().len(), 1);
        assert_eq!(archive(&store, new_id(), m.id).unwrap_err().status_code(), 409);
    }

    #[test]
    fn test_category_filter() {
        let store = Store::new();
        add(&store, "Gateway v2", "Q2 2025", 0, MilestoneCategory::Hardware);
        add(&store, "Utility API", "Q2 2025", 1, MilestoneCategory::Partnerships);
        let hardware = ListParams {
            category: Some("hardware".into()),
            ..Default::default()
        };
        assert_eq!(list(&store, &hardware).unwrap()[0].title, "Gateway v2");
    }
}
