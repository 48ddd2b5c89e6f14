//src/main.rs

use std::time::Duration;

use axum::{
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::{AppConfig, AppState};
use crate::docs::ApiDoc;
use crate::handlers::booking;

// Intervalo da varredura de sessões abandonadas do funil
const SESSION_SWEEP_EVERY: Duration = Duration::from_secs(60);

/// Monta o router completo. Fica fora do `main` para os testes usarem sem banco.
pub fn app(app_state: AppState) -> Router {
    // Rotas públicas do portal de agendamento (sem login de usuário do painel)
    let public_routes = Router::new()
        .route("/api/public/{slug}", get(booking::get_tenant))
        .route("/api/public/{slug}/services", get(booking::list_services))
        .route("/api/public/{slug}/employees", get(booking::list_employees))
        .route("/api/public/{slug}/slots", get(booking::list_slots))
        .route("/api/public/{slug}/sessions", post(booking::open_session))
        .route("/api/public/{slug}/sessions/{id}", get(booking::get_session))
        .route(
            "/api/public/{slug}/sessions/{id}/service",
            put(booking::select_service),
        )
        .route(
            "/api/public/{slug}/sessions/{id}/employee",
            put(booking::select_employee),
        )
        .route("/api/public/{slug}/sessions/{id}/date", put(booking::select_date))
        .route("/api/public/{slug}/sessions/{id}/time", put(booking::select_time))
        .route(
            "/api/public/{slug}/sessions/{id}/payment-method",
            put(booking::select_payment_method),
        )
        .route(
            "/api/public/{slug}/sessions/{id}/identity/lookup",
            post(booking::lookup_identity),
        )
        .route(
            "/api/public/{slug}/sessions/{id}/identity/login",
            post(booking::login),
        )
        .route(
            "/api/public/{slug}/sessions/{id}/identity/register",
            post(booking::register),
        )
        .route("/api/public/{slug}/sessions/{id}/next", post(booking::next_step))
        .route("/api/public/{slug}/sessions/{id}/back", post(booking::previous_step));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(public_routes)
        // Documentação interativa da API pública
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Inicializa o logger; RUST_LOG sobrescreve o nível padrão
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = AppConfig::from_env()?;
    let db_pool = AppState::connect(&config).await?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!().run(&db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app_state = AppState::from_pool(db_pool, &config);
    app_state.sessions.clone().spawn_sweeper(SESSION_SWEEP_EVERY);

    // Inicia o servidor
    let listener = TcpListener::bind(&config.app_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app(app_state)).await?;

    Ok(())
}
