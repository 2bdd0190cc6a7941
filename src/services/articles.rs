//! Blog articles with version history

use serde_json::json;

use crate::core::{Error, Result};
use crate::storage::Store;
use crate::system::metrics;
use crate::types::{
    Article, ArticleCategory, ArticlePatch, ArticleVersion, AuditAction, ContentStatus, Feature,
    ListParams, NewArticle, Page, RecordId, User, Validate,
};

use super::{audit, subscriptions};
use crate::types::validation::slugify;

/// Filtered, newest-first page of articles
///
/// Without `include_unpublished` only published articles are visible and the
/// `status` filter is ignored.
pub fn list(store: &Store, params: &ListParams, include_unpublished: bool) -> Result<Page<Article>> {
    let category = ListParams::parse_filter::<ArticleCategory>(params.category.as_deref(), "category")?;
    let status = if include_unpublished {
        ListParams::parse_filter::<ContentStatus>(params.status.as_deref(), "status")?
    } else {
        Some(ContentStatus::Published)
    };
    let tag = params.tag.as_deref().map(|t| t.trim().to_lowercase());

    let mut articles = store.articles.find(|a| {
        status.map_or(true, |s| a.status == s)
            && category.map_or(true, |c| a.category == c)
            && tag.as_ref().map_or(true, |t| a.tags.contains(t))
            && params.matches_featured(a.featured)
            && params.matches_search(&[&a.title, &a.excerpt])
    });
    articles.sort_by(|a, b| {
        b.published_at
            .cmp(&a.published_at)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });

    Page::paginate(articles, params)
}

/// Article by slug; public reads of a published article count a view
pub fn get_by_slug(store: &Store, slug: &str, include_unpublished: bool) -> Result<Article> {
    let article = store
        .articles
        .find_one(|a| a.slug == slug)
        .filter(|a| include_unpublished || a.is_published())
        .ok_or_else(|| Error::not_found(format!("article {}", slug)))?;

    if !article.is_published() {
        return Ok(article);
    }
    store.articles.update(article.id, |a| {
        a.views += 1;
        Ok(())
    })
}

/// Create an article authored by `author`, counted against the `articles` limit
pub fn create(store: &Store, author: &User, input: NewArticle) -> Result<Article> {
    subscriptions::ensure_feature(store, author.id, Feature::Articles)?;

    let article = Article::new(input, author.id, &author.name);
    article.validate()?;
    ensure_unique_slug(store, &article.slug, None)?;

    let article = store.articles.insert(article)?;
    subscriptions::record_usage(store, author.id, Feature::Articles)?;

    metrics::record_created("articles");
    audit::record(store, Some(author.id), AuditAction::Create, &article, json!({ "slug": article.slug }));
    tracing::info!(article_id = %article.id, slug = %article.slug, "article created");
    Ok(article)
}

/// Snapshot the current article, then apply `patch` and bump the version
///
/// Snapshot and update are two separate writes; a concurrent edit between them
/// can leave a snapshot that does not match the version it names.
pub fn update(store: &Store, editor_id: RecordId, id: RecordId, patch: ArticlePatch) -> Result<Article> {
    if patch.is_empty() {
        return Err(Error::invalid_input("no fields to update"));
    }

    let current = store.articles.require(id)?;
    let mut draft = current.clone();
    patch.clone().apply(&mut draft);
    draft.validate()?;
    if draft.slug != current.slug {
        ensure_unique_slug(store, &draft.slug, Some(id))?;
    }

    store.article_versions.insert(ArticleVersion::snapshot(&current, editor_id))?;
    let updated = store.articles.update(id, |a| {
        patch.apply(a);
        a.version += 1;
        a.validate()
    })?;

    audit::record(store, Some(editor_id), AuditAction::Update, &updated, json!({ "version": updated.version }));
    tracing::debug!(article_id = %id, version = updated.version, "article updated");
    Ok(updated)
}

/// Soft-delete
pub fn archive(store: &Store, admin_id: RecordId, id: RecordId) -> Result<Article> {
    let archived = store.articles.update(id, |a| {
        a.set_status(ContentStatus::Archived);
        a.updated_at = chrono::Utc::now();
        Ok(())
    })?;

    audit::record(store, Some(admin_id), AuditAction::Archive, &archived, json!({}));
    Ok(archived)
}

/// Stored snapshots of an article, newest first
pub fn versions(store: &Store, id: RecordId) -> Result<Vec<ArticleVersion>> {
    store.articles.require(id)?;
    let mut versions = store.article_versions.find(|v| v.article_id == id);
    versions.sort_by(|a, b| b.version.cmp(&a.version).then_with(|| b.created_at.cmp(&a.created_at)));
    Ok(versions)
}

/// Copy a stored version back onto the article; counts as an update
pub fn restore(store: &Store, editor_id: RecordId, id: RecordId, version: u32) -> Result<Article> {
    let current = store.articles.require(id)?;
    let snapshot = store
        .article_versions
        .find(|v| v.article_id == id && v.version == version)
        .into_iter()
        .max_by_key(|v| v.created_at)
        .ok_or_else(|| Error::not_found(format!("version {} of article {}", version, id)))?;

    if snapshot.slug != current.slug {
        ensure_unique_slug(store, &snapshot.slug, Some(id))?;
    }

    store.article_versions.insert(ArticleVersion::snapshot(&current, editor_id))?;
    let restored = store.articles.update(id, |a| {
        snapshot.restore_onto(a);
        a.version += 1;
        a.validate()
    })?;

    audit::record(
        store,
        Some(editor_id),
        AuditAction::Restore,
        &restored,
        json!({ "restored_version": version, "version": restored.version }),
    );
    tracing::info!(article_id = %id, restored_version = version, "article version restored");
    Ok(restored)
}

/// Slug derived from `title`, suffixed with `-2`, `-3`, ... until unused
pub fn available_slug(store: &Store, title: &str) -> String {
    let base = match slugify(title) {
        s if s.is_empty() => "article".to_string(),
        s => s.chars().take(180).collect::<String>().trim_end_matches('-').to_string(),
    };
    let taken = |slug: &str| store.articles.find_one(|a| a.slug == slug).is_some();

    if !taken(&base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{}-{}", base, n);
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn ensure_unique_slug(store: &Store, slug: &str, except: Option<RecordId>) -> Result<()> {
    let taken = store
        .articles
        .find_one(|a| a.slug == slug && Some(a.id) != except)
        .is_some();
    if taken {
        return Err(Error::conflict(format!("slug '{}' is already in use", slug)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::subscriptions::change_tier;
    use crate::types::{Role, Tier};

    fn setup() -> (Store, User) {
        let store = Store::new();
        let editor = store
            .users
            .insert(User::new("ed@eco-grid.io", "Ed", Role::Editor, "s".into(), "h".into()))
            .unwrap();
        change_tier(&store, editor.id, Tier::Professional).unwrap();
        (store, editor)
    }

    fn new_article(title: &str, status: Option<ContentStatus>) -> NewArticle {
        NewArticle {
            title: title.to_string(),
            slug: None,
            excerpt: "Short".into(),
            content: "Body text".into(),
            category: ArticleCategory::Sustainability,
            tags: vec!["vpp".into()],
            featured: false,
            status,
        }
    }

    #[test]
    fn test_duplicate_slug_conflicts() {
        let (store, editor) = setup();
        create(&store, &editor, new_article("Grid Edge", None)).unwrap();
        let err = create(&store, &editor, new_article("Grid edge!", None)).unwrap_err();
        assert_eq!(err.status_code(), 409);
    }

    #[test]
    fn test_free_tier_article_limit() {
        let store = Store::new();
        let author = store
            .users
            .insert(User::new("f@eco-grid.io", "Free", Role::Editor, "s".into(), "h".into()))
            .unwrap();
        for i in 0..3 {
            create(&store, &author, new_article(&format!("Post number {i}"), None)).unwrap();
        }
        let err = create(&store, &author, new_article("One too many", None)).unwrap_err();
        assert_eq!(err.code(), "feature_limit_reached");
    }

    #[test]
    fn test_public_list_hides_drafts() {
        let (store, editor) = setup();
        create(&store, &editor, new_article("Draft post", None)).unwrap();
        create(&store, &editor, new_article("Live post", Some(ContentStatus::Published))).unwrap();

        let public = list(&store, &ListParams::default(), false).unwrap();
        assert_eq!(public.meta.total, 1);
        assert_eq!(public.items[0].title, "Live post");

        let staff = list(&store, &ListParams::default(), true).unwrap();
        assert_eq!(staff.meta.total, 2);
    }

    #[test]
    fn test_slug_read_counts_views_for_published_only() {
        let (store, editor) = setup();
        create(&store, &editor, new_article("Live post", Some(ContentStatus::Published))).unwrap();
        create(&store, &editor, new_article("Draft post", None)).unwrap();

        get_by_slug(&store, "live-post", false).unwrap();
        let read = get_by_slug(&store, "live-post", false).unwrap();
        assert_eq!(read.views, 2);

        assert_eq!(get_by_slug(&store, "draft-post", false).unwrap_err().status_code(), 404);
        assert_eq!(get_by_slug(&store, "draft-post", true).unwrap().views, 0);
    }

    #[test]
    fn test_update_snapshots_and_restore() {
        let (store, editor) = setup();
        let article = create(&store, &editor, new_article("First title", None)).unwrap();

        let updated = update(
            &store,
            editor.id,
            article.id,
            ArticlePatch {
                title: Some("Second title".into()),
                status: Some(ContentStatus::Published),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.version, 2);
        assert!(updated.published_at.is_some());

        let history = versions(&store, article.id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].version, 1);
        assert_eq!(history[0].title, "First title");

        let restored = restore(&store, editor.id, article.id, 1).unwrap();
        assert_eq!(restored.title, "First title");
        assert_eq!(restored.version, 3);
        assert_eq!(versions(&store, article.id).unwrap().len(), 2);

        assert_eq!(restore(&store, editor.id, article.id, 9).unwrap_err().status_code(), 404);
    }

    #[test]
    fn test_invalid_update_leaves_no_snapshot() {
        let (store, editor) = setup();
        let article = create(&store, &editor, new_article("Valid title", None)).unwrap();
        let err = update(
            &store,
            editor.id,
            article.id,
            ArticlePatch {
                title: Some("x".into()),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(versions(&store, article.id).unwrap().is_empty());
    }

    #[test]
    fn test_available_slug_appends_suffix() {
        let (store, editor) = setup();
        assert_eq!(available_slug(&store, "Grid Edge"), "grid-edge");
        create(&store, &editor, new_article("Grid Edge", None)).unwrap();
        assert_eq!(available_slug(&store, "Grid Edge"), "grid-edge-2");
        assert_eq!(available_slug(&store, "!!!"), "article");
    }

    #[test]
    fn test_archive() {
        let (store, editor) = setup();
        let article = create(&store, &editor, new_article("To archive", Some(ContentStatus::Published))).unwrap();
        let archived = archive(&store, editor.id, article.id).unwrap();
        assert_eq!(archived.status, ContentStatus::Archived);
        assert!(list(&store, &ListParams::default(), false).unwrap().items.is_empty());
    }
}
