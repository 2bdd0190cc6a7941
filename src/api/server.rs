//! HTTP server for the Eco-Grid API

use std::future::Future;
use std::net::SocketAddr;

use axum::{
    extract::Request,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    articles, audit, auth, case_studies, pilots, roadmap, subscriptions, system, telemetry, testimonials, tools,
};
use crate::core::{AppState, Result};
use crate::system::metrics::Timer;

/// Routes mounted under `/api`
fn api_routes() -> Router<AppState> {
    Router::new()
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/users", get(auth::list_users))
        .route("/users/:id/role", put(auth::change_role))
        // Articles; GET takes a slug, the rest an id
        .route("/articles", get(articles::list).post(articles::create))
        .route(
            "/articles/:id",
            get(articles::get).put(articles::update).delete(articles::archive),
        )
        .route("/articles/:id/versions", get(articles::versions))
        .route("/articles/:id/versions/:version/restore", post(articles::restore))
        // Case studies and testimonials
        .route("/case-studies", get(case_studies::list).post(case_studies::create))
        .route(
            "/case-studies/:id",
            get(case_studies::get).put(case_studies::update).delete(case_studies::archive),
        )
        .route("/testimonials", get(testimonials::list).post(testimonials::submit))
        .route(
            "/testimonials/:id",
            put(testimonials::update).delete(testimonials::archive),
        )
        .route("/testimonials/:id/approve", post(testimonials::approve))
        // Pilots and roadmap
        .route("/pilots", get(pilots::list).post(pilots::create))
        .route("/pilots/summary", get(pilots::summary))
        .route(
            "/pilots/:id",
            get(pilots::get).put(pilots::update).delete(pilots::archive),
        )
        .route("/roadmap", get(roadmap::list).post(roadmap::create))
        .route("/roadmap/:id", put(roadmap::update).delete(roadmap::archive))
        // Plans and subscriptions
        .route("/plans", get(subscriptions::plans))
        .route(
            "/subscriptions/me",
            get(subscriptions::mine)
                .put(subscriptions::change_tier)
                .delete(subscriptions::cancel),
        )
        .route("/subscriptions/me/features/:feature", get(subscriptions::check_feature))
        .route("/subscriptions/:user_id/reset", post(subscriptions::reset_usage))
        // Tools
        .route("/calculator/savings", post(tools::estimate_savings))
        .route("/chat/sessions", post(tools::create_chat_session))
        .route("/chat/sessions/:id", get(tools::get_chat_session))
        .route("/chat/sessions/:id/messages", post(tools::post_chat_message))
        .route("/ai/generate", post(tools::generate_article))
        // Telemetry and audit
        .route("/telemetry/impact", get(telemetry::impact))
        .route("/telemetry/impact/summary", get(telemetry::impact_summary))
        .route("/telemetry/status", get(telemetry::status))
        .route("/telemetry/security", get(telemetry::security_events))
        .route("/telemetry/security/:id/resolve", post(telemetry::resolve_security_event))
        .route("/audit", get(audit::list))
}

/// Creates the main application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(system::health))
        .route("/info", get(system::info))
        .route("/metrics", get(system::metrics))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(middleware::from_fn(track_request)),
        )
        .with_state(state)
}

/// Bounded label for the request counter: the first segment under `/api`
fn route_class(path: &str) -> &'static str {
    let mut segments = path.trim_start_matches('/').split('/');
    match (segments.next(), segments.next()) {
        (Some("health"), _) => "health",
        (Some("info"), _) => "info",
        (Some("metrics"), _) => "metrics",
        (Some("api"), Some(resource)) => match resource {
            "auth" => "auth",
            "users" => "users",
            "articles" => "articles",
            "case-studies" => "case_studies",
            "testimonials" => "testimonials",
            "pilots" => "pilots",
            "roadmap" => "roadmap",
            "plans" | "subscriptions" => "subscriptions",
            "calculator" => "calculator",
            "chat" => "chat",
            "ai" => "ai",
            "telemetry" => "telemetry",
            "audit" => "audit",
            _ => "other",
        },
        _ => "other",
    }
}

async fn track_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let timer = Timer::start(route_class(req.uri().path()));
    let response = next.run(req).await;
    timer.finish(method.as_str(), response.status().as_u16());
    response
}

/// Serve the router until `shutdown` resolves
pub async fn start_server<F>(addr: SocketAddr, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Eco-Grid API listening on http://{}", listener.local_addr()?);
    tracing::info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_class_is_bounded() {
        assert_eq!(route_class("/api/articles/some-slug"), "articles");
        assert_eq!(route_class("/api/case-studies"), "case_studies");
        assert_eq!(route_class("/api/plans"), "subscriptions");
        assert_eq!(route_class("/health"), "health");
        assert_eq!(route_class("/api/unknown/thing"), "other");
        assert_eq!(route_class("/favicon.ico"), "other");
    }
}
