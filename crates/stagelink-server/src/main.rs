use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use stagelink_api::auth::{self, AppState, AppStateInner};
use stagelink_api::middleware::require_auth;
use stagelink_api::{applications, groups, jobs, media, messages, profiles, venues};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stagelink=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("STAGELINK_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("STAGELINK_DB_PATH").unwrap_or_else(|_| "stagelink.db".into());
    let host = std::env::var("STAGELINK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("STAGELINK_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = stagelink_db::Database::open(&PathBuf::from(&db_path))
        .map_err(|e| anyhow::anyhow!("failed to open database: {}", e))?;

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner { db, jwt_secret });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/profiles/{id}", get(profiles::get_profile))
        .route("/profiles/{id}/media", get(media::list_for_profile))
        .route("/venues", get(venues::list_venues))
        .route("/venues/{id}", get(venues::get_venue))
        .route("/jobs", get(jobs::list_jobs))
        .route("/jobs/{id}", get(jobs::get_job))
        .route("/groups", get(groups::list_groups))
        .route("/groups/{id}", get(groups::get_group))
        .route("/groups/{id}/members", get(groups::list_members))
        .with_state(app_state.clone());

    let protected_routes = Router::new()
        .route("/profiles/me", get(profiles::get_me).patch(profiles::update_me))
        .route("/media", post(media::create_media))
        .route("/media/{id}", delete(media::delete_media))
        .route("/venues", post(venues::create_venue))
        .route(
            "/venues/{id}",
            patch(venues::update_venue).delete(venues::delete_venue),
        )
        .route("/jobs", post(jobs::create_job))
        .route(
            "/jobs/{id}",
            patch(jobs::update_job).delete(jobs::delete_job),
        )
        .route(
            "/jobs/{id}/applications",
            post(applications::apply_to_job).get(applications::applications_for_job),
        )
        .route(
            "/jobs/{id}/group-applications",
            post(applications::apply_as_group),
        )
        .route("/applications/mine", get(applications::my_applications))
        .route(
            "/applications/{id}",
            patch(applications::decide_application),
        )
        .route(
            "/group-applications/{id}",
            patch(applications::decide_group_application),
        )
        .route("/groups", post(groups::create_group))
        .route(
            "/groups/{id}",
            patch(groups::update_group).delete(groups::delete_group),
        )
        .route("/groups/{id}/members", post(groups::add_member))
        .route(
            "/groups/{id}/members/{profile_id}",
            delete(groups::remove_member),
        )
        .route(
            "/groups/{id}/applications",
            get(applications::applications_for_group),
        )
        .route("/messages", post(messages::send_message))
        .route("/conversations", get(messages::list_conversations))
        .route("/conversations/{partner_id}", get(messages::get_conversation))
        .route(
            "/conversations/{partner_id}/read",
            post(messages::mark_read),
        )
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Stagelink server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
