//! Demo content for local development

use crate::core::{Error, Result};
use crate::storage::Store;
use crate::types::{
    Article, ArticleCategory, CaseStudy, CaseStudyResult, ContentStatus, DeviceType, GeoPoint, Milestone,
    MilestoneCategory, MilestoneStatus, NewArticle, NewCaseStudy, NewMilestone, NewPilot, NewTestimonial, Pilot,
    PilotMetrics, PilotStatus, Quarter, Role, Testimonial, TestimonialStatus, Validate,
};

/// Counts of inserted demo records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Articles inserted
    pub articles: usize,
    /// Case studies inserted
    pub case_studies: usize,
    /// Testimonials inserted
    pub testimonials: usize,
    /// Pilots inserted
    pub pilots: usize,
    /// Milestones inserted
    pub milestones: usize,
}

/// Insert demo content into empty collections; non-empty ones are left alone
pub fn seed_demo_content(store: &Store) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let author = store.users.find_one(|u| u.role == Role::Admin);
    let (author_id, author_name) = match &author {
        Some(admin) => (admin.id, admin.name.as_str()),
        None => (uuid::Uuid::nil(), "Eco-Grid Team"),
    };

    if store.articles.is_empty() {
        for (title, category, tags, featured) in [
            (
                "What Is a Virtual Power Plant?",
                ArticleCategory::Technology,
                vec!["vpp", "basics"],
                true,
            ),
            (
                "Five Ways Home Batteries Cut Peak Demand",
                ArticleCategory::Sustainability,
                vec!["storage", "demand-response"],
                false,
            ),
            (
                "Eco-Grid Joins the Flexible Grid Alliance",
                ArticleCategory::Company,
                vec!["partnerships"],
                false,
            ),
        ] {
            let article = Article::new(
                NewArticle {
                    title: title.to_string(),
                    slug: None,
                    excerpt: format!("{} A short introduction from the Eco-Grid team.", title),
                    content: format!("# {}\n\nDemo content.", title),
                    category,
                    tags: tags.into_iter().map(String::from).collect(),
                    featured,
                    status: Some(ContentStatus::Published),
                },
                author_id,
                author_name,
            );
            article.validate()?;
            store.articles.insert(article)?;
            report.articles += 1;
        }
    }

    if store.case_studies.is_empty() {
        let study = CaseStudy::new(NewCaseStudy {
            title: "Municipal Utility Shaves Winter Peaks".into(),
            client: "Lakeside Municipal Power".into(),
            industry: "Utilities".into(),
            challenge: "Winter evening peaks forced expensive spot purchases.".into(),
            solution: "1,200 home batteries and heat pumps dispatched as one virtual power plant.".into(),
            results: vec![
                CaseStudyResult {
                    label: "Peak reduction".into(),
                    value: "18%".into(),
                },
                CaseStudyResult {
                    label: "Annual savings".into(),
                    value: "$420k".into(),
                },
            ],
            image_url: None,
            featured: true,
            status: Some(ContentStatus::Published),
        });
        study.validate()?;
        store.case_studies.insert(study)?;
        report.case_studies += 1;
    }

    if store.testimonials.is_empty() {
        for (name, company, quote, rating) in [
            ("Maria Jensen", "Nordlys Housing", "Our tenants saw lower bills from the first month.", 5),
            ("Tom Okafor", "Sunbelt Installers", "The API made fleet onboarding painless for our crews.", 4),
        ] {
            let mut testimonial = Testimonial::new(NewTestimonial {
                name: name.into(),
                company: Some(company.into()),
                role: None,
                quote: quote.into(),
                rating,
            });
            testimonial.status = TestimonialStatus::Approved;
            testimonial.validate()?;
            store.testimonials.insert(testimonial)?;
            report.testimonials += 1;
        }
    }

    if store.pilots.is_empty() {
        for (name, city, country, lat, lng, devices, count) in [
            ("Harbour Flats", "Aarhus", "Denmark", 56.15, 10.21, vec![DeviceType::Solar, DeviceType::Battery], 120),
            ("Sunridge Estates", "Phoenix", "United States", 33.45, -112.07, vec![DeviceType::Solar, DeviceType::EvCharger], 340),
            ("Green Valley Farms", "Nakuru", "Kenya", -0.30, 36.08, vec![DeviceType::Solar, DeviceType::SmartMeter], 75),
        ] {
            let pilot = Pilot::new(
                NewPilot {
                    name: name.into(),
                    city: city.into(),
                    country: country.into(),
                    location: GeoPoint { lat, lng },
                    device_types: devices,
                    device_count: count,
                    metrics: PilotMetrics {
                        energy_saved_kwh: f64::from(count) * 310.0,
                        co2_reduced_kg: f64::from(count) * 124.0,
                        cost_saved: f64::from(count) * 52.0,
                    },
                    start_date: None,
                    status: Some(PilotStatus::Active),
                },
                author_id,
            );
            pilot.validate()?;
            store.pilots.insert(pilot)?;
            report.pilots += 1;
        }
    }

    if store.milestones.is_empty() {
        for (title, quarter, category, progress, status) in [
            ("Fleet dispatch API", "Q1 2025", MilestoneCategory::Platform, 100, MilestoneStatus::Completed),
            ("Gateway hardware v2", "Q3 2025", MilestoneCategory::Hardware, 60, MilestoneStatus::InProgress),
            ("Utility DR certification", "Q4 2025", MilestoneCategory::Partnerships, 20, MilestoneStatus::InProgress),
            ("Forecasting research preview", "Q2 2026", MilestoneCategory::Research, 0, MilestoneStatus::Planned),
        ] {
            let quarter = quarter.parse::<Quarter>().map_err(Error::internal)?;
            let milestone = Milestone::new(NewMilestone {
                title: title.into(),
                description: String::new(),
                quarter,
                category,
                progress,
                status: Some(status),
                order: 0,
            });
            milestone.validate()?;
            store.milestones.insert(milestone)?;
            report.milestones += 1;
        }
    }

    tracing::info!(?report, "demo content seeded");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ListParams;

    #[test]
    fn test_seed_is_idempotent() {
        let store = Store::new();
        let first = seed_demo_content(&store).unwrap();
        assert_eq!(first.articles, 3);
        assert_eq!(first.milestones, 4);

        let second = seed_demo_content(&store).unwrap();
        assert_eq!(second, SeedReport::default());
        assert_eq!(store.articles.len(), 3);
    }

    #[test]
    fn test_seeded_content_is_public() {
        let store = Store::new();
        seed_demo_content(&store).unwrap();
        let articles = crate::services::articles::list(&store, &ListParams::default(), false).unwrap();
        assert_eq!(articles.meta.total, 3);
        let testimonials = crate::services::content::list_testimonials(&store, &ListParams::default(), false).unwrap();
        assert_eq!(testimonials.meta.total, 2);
    }
}
