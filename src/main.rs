//src/main.rs

use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect(&config.database_url)
        .await?;
    tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

    sqlx::migrate!().run(&db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app_state = AppState::new(db_pool, config.jwt_secret.clone());

    if let Some((username, password)) = &config.bootstrap_admin {
        match app_state.auth_service.ensure_bootstrap_admin(username, password).await {
            Ok(Some(user)) => tracing::info!("👤 Gerente inicial '{}' criado", user.username),
            Ok(None) => tracing::debug!("Usuários já existem; bootstrap ignorado"),
            Err(e) => tracing::error!("Falha ao criar o Gerente inicial: {}", e),
        }
    }

    let app = app_router(app_state);

    let listener = TcpListener::bind(&config.addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn app_router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new().route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route(
            "/",
            get(handlers::auth::list_users).post(handlers::auth::create_user),
        )
        .route("/me", get(handlers::auth::get_me));

    let demand_routes = Router::new()
        .route(
            "/",
            get(handlers::demands::list_demands).post(handlers::demands::create_demand),
        )
        .route("/completed", get(handlers::demands::list_completed_demands))
        .route(
            "/{id}",
            get(handlers::demands::get_demand)
                .put(handlers::demands::update_demand)
                .delete(handlers::demands::delete_demand),
        )
        .route("/{id}/status", post(handlers::demands::update_demand_status))
        .route("/{id}/assign", post(handlers::demands::assign_demand));

    let task_routes = Router::new()
        .route(
            "/",
            get(handlers::commission::list_tasks).post(handlers::commission::create_task),
        )
        .route(
            "/{id}",
            get(handlers::commission::get_task)
                .put(handlers::commission::update_task)
                .delete(handlers::commission::delete_task),
        );

    let note_routes = Router::new()
        .route(
            "/",
            get(handlers::notes::list_notes).post(handlers::notes::create_note),
        )
        .route(
            "/{id}",
            get(handlers::notes::get_note)
                .put(handlers::notes::update_note)
                .delete(handlers::notes::delete_note),
        );

    // Tudo abaixo exige um token válido
    let protected = Router::new()
        .nest("/users", user_routes)
        .nest("/demands", demand_routes)
        .nest("/commission-tasks", task_routes)
        .nest("/notes", note_routes)
        .route("/demand-logs/{id}", delete(handlers::demands::delete_demand_log))
        .route("/predefined-services", get(handlers::commission::list_predefined_services))
        .route("/home", get(handlers::dashboard::get_home))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected)
        .with_state(app_state)
}
