use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post, put},
};
use color_eyre::eyre::{Context, Result, eyre};
use serde_json::{Value, json};
use tower::ServiceBuilder;
#[cfg(not(debug_assertions))]
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    clip_resolver::build_clip_resolver,
    config::Config,
    database::Database,
    http_server::{http_routes, state::AppState},
    services::{
        catalog::DbSongCatalog, quiz::QuizService, song::SongService, user::UserService,
    },
};

async fn root() -> Json<Value> {
    Json(json!({ "message": "API is running" }))
}

#[cfg(debug_assertions)]
fn cors_layer(_allowed_origin: Option<&str>) -> Result<CorsLayer> {
    Ok(CorsLayer::permissive())
}

#[cfg(not(debug_assertions))]
fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    let origin = allowed_origin.ok_or_else(|| eyre!("server.allowed_origin must be set"))?;
    let origin = origin
        .parse::<axum::http::HeaderValue>()
        .wrap_err_with(|| format!("Invalid allowed origin: {origin}"))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods(AllowMethods::any())
        .allow_headers(AllowHeaders::any()))
}

pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/api", get(root))
        .route("/api/songs", get(http_routes::songs::list_songs))
        .route(
            "/api/songs/random-clip",
            get(http_routes::songs::random_clip),
        )
        .route("/api/songs/{id}", get(http_routes::songs::get_song))
        .route("/api/users/create", post(http_routes::users::create_user))
        .route(
            "/api/users/leaderboard",
            get(http_routes::users::leaderboard),
        )
        .route(
            "/api/users/update-score",
            put(http_routes::users::update_score),
        );

    if let Some(directory) = &state.clips_directory {
        app = app.nest_service("/assets/clips", ServeDir::new(directory));
    }

    app.with_state(state)
}

pub fn app_state(config: &Config, database: Arc<Database>) -> Result<Arc<AppState>> {
    let resolver = build_clip_resolver(config)?;

    Ok(Arc::new(AppState {
        quiz: QuizService::new(DbSongCatalog::new(database.clone()), resolver),
        songs: SongService::new(database.clone()),
        users: UserService::new(database),
        leaderboard_size: config.quiz.leaderboard_size,
        clips_directory: config.clips_directory(),
    }))
}

pub async fn start(database: Database, config: Config) -> Result<()> {
    let port = config.server.port;
    let state = app_state(&config, Arc::new(database))?;
    if let Some(directory) = state.clips_directory.as_deref() {
        log::info!("Serving extracted clips from {}", directory.display());
    }

    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(config.server.allowed_origin.as_deref())?),
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .wrap_err_with(|| eyre!("Failed to bind to port {}", port))?;
    log::info!("Listening on {}", config.public_base_url());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Failed to start HTTP server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}
