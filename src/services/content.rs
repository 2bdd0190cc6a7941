//! Case studies and testimonials

use serde_json::json;

use crate::core::Result;
use crate::storage::Store;
use crate::system::metrics;
use crate::types::{
    AuditAction, CaseStudy, CaseStudyPatch, ContentStatus, ListParams, NewCaseStudy, NewTestimonial, Page,
    RecordId, Testimonial, TestimonialPatch, TestimonialStatus, Validate,
};

use super::audit;

/// Case studies, newest first; the public sees published ones only
pub fn list_case_studies(store: &Store, params: &ListParams, include_unpublished: bool) -> Result<Page<CaseStudy>> {
    let status = if include_unpublished {
        ListParams::parse_filter::<ContentStatus>(params.status.as_deref(), "status")?
    } else {
        Some(ContentStatus::Published)
    };
    let industry = params.category.as_deref().map(str::to_lowercase);

    let mut studies = store.case_studies.find(|c| {
        status.map_or(true, |s| c.status == s)
            && industry.as_ref().map_or(true, |i| c.industry.to_lowercase() == *i)
            && params.matches_featured(c.featured)
            && params.matches_search(&[&c.title, &c.client])
    });
    studies.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Page::paginate(studies, params)
}

/// One case study; unpublished ones are hidden from the public
pub fn get_case_study(store: &Store, id: RecordId, include_unpublished: bool) -> Result<CaseStudy> {
    let study = store.case_studies.require(id)?;
    if !include_unpublished && study.status != ContentStatus::Published {
        return Err(crate::core::Error::not_found(format!("case_studies {}", id)));
    }
    Ok(study)
}

/// Create a case study
pub fn create_case_study(store: &Store, editor_id: RecordId, input: NewCaseStudy) -> Result<CaseStudy> {
    let study = CaseStudy::new(input);
    study.validate()?;
    let study = store.case_studies.insert(study)?;

    metrics::record_created("case_studies");
    audit::record(store, Some(editor_id), AuditAction::Create, &study, json!({ "client": study.client }));
    Ok(study)
}

/// Apply a partial update
pub fn update_case_study(store: &Store, editor_id: RecordId, id: RecordId, patch: CaseStudyPatch) -> Result<CaseStudy> {
    let study = store.case_studies.update(id, |c| {
        patch.apply(c);
        c.validate()
    })?;
    audit::record(store, Some(editor_id), AuditAction::Update, &study, json!({}));
    Ok(study)
}

/// Soft-delete
pub fn archive_case_study(store: &Store, admin_id: RecordId, id: RecordId) -> Result<CaseStudy> {
    let study = store.case_studies.update(id, |c| {
        c.status = ContentStatus::Archived;
        c.updated_at = chrono::Utc::now();
        Ok(())
    })?;
    audit::record(store, Some(admin_id), AuditAction::Archive, &study, json!({}));
    Ok(study)
}

/// Testimonials, newest first; the public sees approved ones only
pub fn list_testimonials(store: &Store, params: &ListParams, include_unapproved: bool) -> Result<Page<Testimonial>> {
    let status = if include_unapproved {
        ListParams::parse_filter::<TestimonialStatus>(params.status.as_deref(), "status")?
    } else {
        Some(TestimonialStatus::Approved)
    };

    let mut testimonials = store.testimonials.find(|t| {
        status.map_or(true, |s| t.status == s)
            && params.matches_featured(t.featured)
            && params.matches_search(&[&t.name, t.company.as_deref().unwrap_or_default(), &t.quote])
    });
    testimonials.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Page::paginate(testimonials, params)
}

/// Public submission; always starts pending
pub fn submit_testimonial(store: &Store, submitter: Option<RecordId>, input: NewTestimonial) -> Result<Testimonial> {
    let testimonial = Testimonial::new(input);
    testimonial.validate()?;
    let testimonial = store.testimonials.insert(testimonial)?;

    metrics::record_created("testimonials");
    audit::record(store, submitter, AuditAction::Create, &testimonial, json!({ "rating": testimonial.rating }));
    tracing::info!(testimonial_id = %testimonial.id, "testimonial submitted for moderation");
    Ok(testimonial)
}

/// Apply a partial update
pub fn update_testimonial(
    store: &Store,
    editor_id: RecordId,
    id: RecordId,
    patch: TestimonialPatch,
) -> Result<Testimonial> {
    let testimonial = store.testimonials.update(id, |t| {
        patch.apply(t);
        t.validate()
    })?;
    audit::record(store, Some(editor_id), AuditAction::Update, &testimonial, json!({}));
    Ok(testimonial)
}

/// Moderation: make a testimonial public
pub fn approve_testimonial(store: &Store, admin_id: RecordId, id: RecordId) -> Result<Testimonial> {
    set_testimonial_status(store, admin_id, id, TestimonialStatus::Approved, AuditAction::Update)
}

/// Soft-delete
pub fn archive_testimonial(store: &Store, admin_id: RecordId, id: RecordId) -> Result<Testimonial> {
    set_testimonial_status(store, admin_id, id, TestimonialStatus::Archived, AuditAction::Archive)
}

fn set_testimonial_status(
    store: &Store,
    admin_id: RecordId,
    id: RecordId,
    status: TestimonialStatus,
    action: AuditAction,
) -> Result<Testimonial> {
    let testimonial = store.testimonials.update(id, |t| {
        t.status = status;
        t.updated_at = chrono::Utc::now();
        Ok(())
    })?;
    audit::record(store, Some(admin_id), action, &testimonial, json!({ "status": status }));
    Ok(testimonial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::new_id;

    fn testimonial() -> NewTestimonial {
        NewTestimonial {
            name: "Grace".into(),
            company: Some("Northwind Utilities".into()),
            role: Some("COO".into()),
            quote: "Peak shaving paid for itself in a quarter.".into(),
            rating: 5,
        }
    }

    #[test]
    fn test_testimonial_moderation_flow() {
        let store = Store::new();
        let t = submit_testimonial(&store, None, testimonial()).unwrap();
        assert!(list_testimonials(&store, &ListParams::default(), false).unwrap().items.is_empty());

        approve_testimonial(&store, new_id(), t.id).unwrap();
        assert_eq!(list_testimonials(&store, &ListParams::default(), false).unwrap().meta.total, 1);

        archive_testimonial(&store, new_id(), t.id).unwrap();
        assert!(list_testimonials(&store, &ListParams::default(), false).unwrap().items.is_empty());
        assert_eq!(list_testimonials(&store, &ListParams::default(), true).unwrap().meta.total, 1);
    }

    #[test]
    fn test_short_quote_rejected() {
        let store = Store::new();
        let mut input = testimonial();
        input.quote = "Great!".into();
        assert_eq!(submit_testimonial(&store, None, input).unwrap_err().status_code(), 400);
        assert!(store.testimonials.is_empty());
    }

    #[test]
    fn test_invalid_rating_update_is_not_committed() {
        let store = Store::new();
        let t = submit_testimonial(&store, None, testimonial()).unwrap();
        let patch = TestimonialPatch {
            rating: Some(9),
            ..Default::default()
        };
        assert!(update_testimonial(&store, new_id(), t.id, patch).is_err());
        assert_eq!(store.testimonials.get(t.id).unwrap().rating, 5);
    }

    #[test]
    fn test_case_study_visibility() {
        let store = Store::new();
        let study = create_case_study(
            &store,
            new_id(),
            NewCaseStudy {
                title: "Campus microgrid".into(),
                client: "State University".into(),
                industry: "Education".into(),
                challenge: "Demand charges".into(),
                solution: "Battery dispatch".into(),
                results: vec![],
                image_url: None,
                featured: true,
                status: None,
            },
        )
        .unwrap();

        assert_eq!(get_case_study(&store, study.id, false).unwrap_err().status_code(), 404);
        update_case_study(
            &store,
            new_id(),
            study.id,
            CaseStudyPatch {
                status: Some(ContentStatus::Published),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(get_case_study(&store, study.id, false).is_ok());

        let by_industry = ListParams {
            category: Some("education".into()),
            ..Default::default()
        };
        assert_eq!(list_case_studies(&store, &by_industry, false).unwrap().meta.total, 1);
    }
}
