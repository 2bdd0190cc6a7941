//! Marketing content: articles (with version history), case studies and testimonials

use serde::{Deserialize, Serialize};

use super::validation::{is_valid_slug, slugify};
use super::{new_id, now, RecordId, Timestamp, Validate, Violations};
use crate::core::Result;
use crate::storage::Record;

/// Maximum number of tags on an article
pub const MAX_TAGS: usize = 10;

string_enum! {
    /// Publication state shared by articles and case studies
    pub enum ContentStatus {
        /// Visible to staff only
        Draft => "draft",
        /// Publicly listed
        Published => "published",
        /// Soft-deleted
        Archived => "archived",
    }
}

string_enum! {
    /// Blog category
    pub enum ArticleCategory {
        /// Product and platform technology
        Technology => "technology",
        /// Climate and sustainability
        Sustainability => "sustainability",
        /// Energy industry news
        Industry => "industry",
        /// Company announcements
        Company => "company",
        /// Regulation and policy
        Policy => "policy",
    }
}

string_enum! {
    /// Moderation state of a testimonial
    pub enum TestimonialStatus {
        /// Submitted, awaiting moderation
        Pending => "pending",
        /// Publicly shown
        Approved => "approved",
        /// Soft-deleted
        Archived => "archived",
    }
}

/// Blog article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Article id
    pub id: RecordId,
    /// Headline
    pub title: String,
    /// Unique URL slug
    pub slug: String,
    /// Short summary for cards
    pub excerpt: String,
    /// Markdown body
    pub content: String,
    /// Category
    pub category: ArticleCategory,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Author account; kept out of responses
    #[serde(skip_serializing)]
    pub author_id: RecordId,
    /// Author display name at time of writing
    pub author_name: String,
    /// Highlighted on the landing page
    pub featured: bool,
    /// Publication state
    pub status: ContentStatus,
    /// Current version, starting at 1
    pub version: u32,
    /// First time the article was published
    pub published_at: Option<Timestamp>,
    /// Public read counter
    pub views: u64,
    /// Creation time
    pub created_at: Timestamp,
    /// Last modification
    pub updated_at: Timestamp,
}

/// Body of `POST /api/articles`
#[derive(Debug, Clone, Deserialize)]
pub struct NewArticle {
    /// Headline
    pub title: String,
    /// Explicit slug; derived from the title when absent
    pub slug: Option<String>,
    /// Short summary
    #[serde(default)]
    pub excerpt: String,
    /// Markdown body
    pub content: String,
    /// Category
    pub category: ArticleCategory,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Highlighted flag
    #[serde(default)]
    pub featured: bool,
    /// Initial status, draft by default
    pub status: Option<ContentStatus>,
}

/// Body of `PUT /api/articles/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArticlePatch {
    /// New headline
    pub title: Option<String>,
    /// New slug
    pub slug: Option<String>,
    /// New summary
    pub excerpt: Option<String>,
    /// New body
    pub content: Option<String>,
    /// New category
    pub category: Option<ArticleCategory>,
    /// Replacement tag list
    pub tags: Option<Vec<String>>,
    /// New featured flag
    pub featured: Option<bool>,
    /// New status
    pub status: Option<ContentStatus>,
}

impl Article {
    /// Build a new article written by `author`
    pub fn new(input: NewArticle, author_id: RecordId, author_name: &str) -> Self {
        let now = now();
        let status = input.status.unwrap_or(ContentStatus::Draft);
        let slug = input
            .slug
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| slugify(&input.title));

        Self {
            id: new_id(),
            title: input.title.trim().to_string(),
            slug,
            excerpt: input.excerpt.trim().to_string(),
            content: input.content,
            category: input.category,
            tags: normalize_tags(input.tags),
            author_id,
            author_name: author_name.to_string(),
            featured: input.featured,
            status,
            version: 1,
            published_at: (status == ContentStatus::Published).then_some(now),
            views: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Publicly visible
    pub fn is_published(&self) -> bool {
        self.status == ContentStatus::Published
    }

    /// Move to a status, stamping `published_at` on first publication
    pub fn set_status(&mut self, status: ContentStatus) {
        self.status = status;
        if status == ContentStatus::Published && self.published_at.is_none() {
            self.published_at = Some(now());
        }
    }
}

impl ArticlePatch {
    /// True when the patch changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.slug.is_none()
            && self.excerpt.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.featured.is_none()
            && self.status.is_none()
    }

    /// Apply onto an article; version bookkeeping is left to the caller
    pub fn apply(self, article: &mut Article) {
        if let Some(title) = self.title {
            article.title = title.trim().to_string();
        }
        if let Some(slug) = self.slug {
            article.slug = slug.trim().to_string();
        }
        if let Some(excerpt) = self.excerpt {
            article.excerpt = excerpt.trim().to_string();
        }
        if let Some(content) = self.content {
            article.content = content;
        }
        if let Some(category) = self.category {
            article.category = category;
        }
        if let Some(tags) = self.tags {
            article.tags = normalize_tags(tags);
        }
        if let Some(featured) = self.featured {
            article.featured = featured;
        }
        if let Some(status) = self.status {
            article.set_status(status);
        }
        article.updated_at = now();
    }
}

impl Validate for Article {
    fn validate(&self) -> Result<()> {
        Violations::new()
            .length("title", &self.title, 3, 200)
            .check(is_valid_slug(&self.slug), "slug", "must be lower-case words joined by hyphens")
            .max_length("excerpt", Some(&self.excerpt), 500)
            .length("content", &self.content, 1, 100_000)
            .check(self.tags.len() <= MAX_TAGS, "tags", format!("at most {} tags", MAX_TAGS))
            .check(
                self.tags.iter().all(|t| (1..=30).contains(&t.chars().count())),
                "tags",
                "each tag must be between 1 and 30 characters",
            )
            .finish()
    }
}

impl Record for Article {
    const COLLECTION: &'static str = "articles";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Snapshot of an article taken before each update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleVersion {
    /// Snapshot id
    pub id: RecordId,
    /// Article the snapshot belongs to
    pub article_id: RecordId,
    /// Article version captured
    pub version: u32,
    /// Headline at that version
    pub title: String,
    /// Slug at that version
    pub slug: String,
    /// Summary at that version
    pub excerpt: String,
    /// Body at that version
    pub content: String,
    /// Category at that version
    pub category: ArticleCategory,
    /// Tags at that version
    pub tags: Vec<String>,
    /// Account whose edit replaced this version
    pub edited_by: RecordId,
    /// When the snapshot was taken
    pub created_at: Timestamp,
}

impl ArticleVersion {
    /// Capture the current state of `article`
    pub fn snapshot(article: &Article, edited_by: RecordId) -> Self {
        Self {
            id: new_id(),
            article_id: article.id,
            version: article.version,
            title: article.title.clone(),
            slug: article.slug.clone(),
            excerpt: article.excerpt.clone(),
            content: article.content.clone(),
            category: article.category,
            tags: article.tags.clone(),
            edited_by,
            created_at: now(),
        }
    }

    /// Copy the captured fields back onto `article`
    pub fn restore_onto(&self, article: &mut Article) {
        article.title = self.title.clone();
        article.slug = self.slug.clone();
        article.excerpt = self.excerpt.clone();
        article.content = self.content.clone();
        article.category = self.category;
        article.tags = self.tags.clone();
        article.updated_at = now();
    }
}

impl Record for ArticleVersion {
    const COLLECTION: &'static str = "article_versions";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Headline number on a case study, e.g. `"Peak load reduction" / "32%"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStudyResult {
    /// What was measured
    pub label: String,
    /// Display value
    pub value: String,
}

/// Customer case study
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseStudy {
    /// Case study id
    pub id: RecordId,
    /// Headline
    pub title: String,
    /// Customer name
    pub client: String,
    /// Customer industry
    pub industry: String,
    /// Problem statement
    pub challenge: String,
    /// What was deployed
    pub solution: String,
    /// Headline numbers
    pub results: Vec<CaseStudyResult>,
    /// Hero image
    pub image_url: Option<String>,
    /// Highlighted flag
    pub featured: bool,
    /// Publication state
    pub status: ContentStatus,
    /// Creation time
    pub created_at: Timestamp,
    /// Last modification
    pub updated_at: Timestamp,
}

/// Body of `POST /api/case-studies`
#[derive(Debug, Clone, Deserialize)]
pub struct NewCaseStudy {
    /// Headline
    pub title: String,
    /// Customer name
    pub client: String,
    /// Customer industry
    pub industry: String,
    /// Problem statement
    #[serde(default)]
    pub challenge: String,
    /// What was deployed
    #[serde(default)]
    pub solution: String,
    /// Headline numbers
    #[serde(default)]
    pub results: Vec<CaseStudyResult>,
    /// Hero image
    pub image_url: Option<String>,
    /// Highlighted flag
    #[serde(default)]
    pub featured: bool,
    /// Initial status, draft by default
    pub status: Option<ContentStatus>,
}

/// Body of `PUT /api/case-studies/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseStudyPatch {
    /// New headline
    pub title: Option<String>,
    /// New customer name
    pub client: Option<String>,
    /// New industry
    pub industry: Option<String>,
    /// New problem statement
    pub challenge: Option<String>,
    /// New solution text
    pub solution: Option<String>,
    /// Replacement results
    pub results: Option<Vec<CaseStudyResult>>,
    /// New hero image
    pub image_url: Option<String>,
    /// New featured flag
    pub featured: Option<bool>,
    /// New status
    pub status: Option<ContentStatus>,
}

impl CaseStudy {
    /// Build from a creation request
    pub fn new(input: NewCaseStudy) -> Self {
        let now = now();
        Self {
            id: new_id(),
            title: input.title.trim().to_string(),
            client: input.client.trim().to_string(),
            industry: input.industry.trim().to_string(),
            challenge: input.challenge,
            solution: input.solution,
            results: input.results,
            image_url: input.image_url,
            featured: input.featured,
            status: input.status.unwrap_or(ContentStatus::Draft),
            created_at: now,
            updated_at: now,
        }
    }
}

impl CaseStudyPatch {
    /// Apply onto a case study
    pub fn apply(self, study: &mut CaseStudy) {
        if let Some(title) = self.title {
            study.title = title.trim().to_string();
        }
        if let Some(client) = self.client {
            study.client = client.trim().to_string();
        }
        if let Some(industry) = self.industry {
            study.industry = industry.trim().to_string();
        }
        if let Some(challenge) = self.challenge {
            study.challenge = challenge;
        }
        if let Some(solution) = self.solution {
            study.solution = solution;
        }
        if let Some(results) = self.results {
            study.results = results;
        }
        if let Some(image_url) = self.image_url {
            study.image_url = Some(image_url).filter(|u| !u.is_empty());
        }
        if let Some(featured) = self.featured {
            study.featured = featured;
        }
        if let Some(status) = self.status {
            study.status = status;
        }
        study.updated_at = now();
    }
}

impl Validate for CaseStudy {
    fn validate(&self) -> Result<()> {
        Violations::new()
            .length("title", &self.title, 3, 200)
            .length("client", &self.client, 1, 120)
            .length("industry", &self.industry, 1, 80)
            .max_length("challenge", Some(&self.challenge), 5000)
            .max_length("solution", Some(&self.solution), 5000)
            .check(self.results.len() <= 10, "results", "at most 10 results")
            .check(
                self.results
                    .iter()
                    .all(|r| !r.label.trim().is_empty() && !r.value.trim().is_empty()),
                "results",
                "label and value are required",
            )
            .finish()
    }
}

impl Record for CaseStudy {
    const COLLECTION: &'static str = "case_studies";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Customer quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Testimonial {
    /// Testimonial id
    pub id: RecordId,
    /// Person quoted
    pub name: String,
    /// Their company
    pub company: Option<String>,
    /// Their job title
    pub role: Option<String>,
    /// The quote itself
    pub quote: String,
    /// Star rating, 1 to 5
    pub rating: u8,
    /// Highlighted flag
    pub featured: bool,
    /// Moderation state
    pub status: TestimonialStatus,
    /// Creation time
    pub created_at: Timestamp,
    /// Last modification
    pub updated_at: Timestamp,
}

/// Body of `POST /api/testimonials`
#[derive(Debug, Clone, Deserialize)]
pub struct NewTestimonial {
    /// Person quoted
    pub name: String,
    /// Their company
    pub company: Option<String>,
    /// Their job title
    pub role: Option<String>,
    /// The quote
    pub quote: String,
    /// Star rating
    pub rating: u8,
}

/// Body of `PUT /api/testimonials/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TestimonialPatch {
    /// New name
    pub name: Option<String>,
    /// New company
    pub company: Option<String>,
    /// New job title
    pub role: Option<String>,
    /// New quote
    pub quote: Option<String>,
    /// New rating
    pub rating: Option<u8>,
    /// New featured flag
    pub featured: Option<bool>,
}

impl Testimonial {
    /// New submissions always wait for moderation
    pub fn new(input: NewTestimonial) -> Self {
        let now = now();
        Self {
            id: new_id(),
            name: input.name.trim().to_string(),
            company: input.company.filter(|c| !c.trim().is_empty()),
            role: input.role.filter(|r| !r.trim().is_empty()),
            quote: input.quote.trim().to_string(),
            rating: input.rating,
            featured: false,
            status: TestimonialStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TestimonialPatch {
    /// Apply onto a testimonial
    pub fn apply(self, testimonial: &mut Testimonial) {
        if let Some(name) = self.name {
            testimonial.name = name.trim().to_string();
        }
        if let Some(company) = self.company {
            testimonial.company = Some(company).filter(|c| !c.trim().is_empty());
        }
        if let Some(role) = self.role {
            testimonial.role = Some(role).filter(|r| !r.trim().is_empty());
        }
        if let Some(quote) = self.quote {
            testimonial.quote = quote.trim().to_string();
        }
        if let Some(rating) = self.rating {
            testimonial.rating = rating;
        }
        if let Some(featured) = self.featured {
            testimonial.featured = featured;
        }
        testimonial.updated_at = now();
    }
}

impl Validate for Testimonial {
    fn validate(&self) -> Result<()> {
        Violations::new()
            .length("name", &self.name, 1, 100)
            .max_length("company", self.company.as_deref(), 120)
            .max_length("role", self.role.as_deref(), 120)
            .length("quote", &self.quote, 10, 1000)
            .check((1..=5).contains(&self.rating), "rating", "must be between 1 and 5")
            .finish()
    }
}

impl Record for Testimonial {
    const COLLECTION: &'static str = "testimonials";

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Trim, lower-case and de-duplicate tags, keeping first occurrence order
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_article(title: &str) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            slug: None,
            excerpt: String::new(),
            content: "Body".to_string(),
            category: ArticleCategory::Technology,
            tags: vec![" VPP ".into(), "vpp".into(), "Grid".into()],
            featured: false,
            status: None,
        }
    }

    #[test]
    fn test_new_article_defaults() {
        let article = Article::new(new_article("How a VPP Works"), new_id(), "Ada");
        assert_eq!(article.slug, "how-a-vpp-works");
        assert_eq!(article.status, ContentStatus::Draft);
        assert_eq!(article.version, 1);
        assert!(article.published_at.is_none());
        assert_eq!(article.tags, vec!["vpp", "grid"]);
        article.validate().unwrap();
    }

    #[test]
    fn test_publishing_stamps_once() {
        let mut article = Article::new(new_article("Grid edge"), new_id(), "Ada");
        article.set_status(ContentStatus::Published);
        let first = article.published_at.unwrap();
        article.set_status(ContentStatus::Draft);
        article.set_status(ContentStatus::Published);
        assert_eq!(article.published_at, Some(first));
    }

    #[test]
    fn test_article_validation() {
        let mut article = Article::new(new_article("ok title"), new_id(), "Ada");
        article.slug = "Not A Slug".into();
        article.title = "ab".into();
        match article.validate().unwrap_err() {
            crate::core::Error::Validation(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field).collect();
                assert_eq!(names, vec!["title", "slug"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_version_snapshot_round_trip() {
        let mut article = Article::new(new_article("Original"), new_id(), "Ada");
        let snapshot = ArticleVersion::snapshot(&article, article.author_id);

        ArticlePatch {
            title: Some("Rewritten".into()),
            content: Some("New body".into()),
            ..Default::default()
        }
        .apply(&mut article);
        assert_eq!(article.title, "Rewritten");

        snapshot.restore_onto(&mut article);
        assert_eq!(article.title, "Original");
        assert_eq!(article.content, "Body");
    }

    #[test]
    fn test_testimonial_rating_bounds() {
        let mut t = Testimonial::new(NewTestimonial {
            name: "Grace".into(),
            company: Some("".into()),
            role: None,
            quote: "Cut our peak demand charges in half.".into(),
            rating: 5,
        });
        assert_eq!(t.status, TestimonialStatus::Pending);
        assert!(t.company.is_none());
        t.validate().unwrap();

        t.rating = 0;
        assert!(t.validate().is_err());
        t.rating = 6;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_case_study_requires_client() {
        let study = CaseStudy::new(NewCaseStudy {
            title: "Campus microgrid".into(),
            client: "  ".into(),
            industry: "Education".into(),
            challenge: String::new(),
            solution: String::new(),
            results: vec![],
            image_url: None,
            featured: false,
            status: None,
        });
        assert!(study.validate().is_err());
    }
}
