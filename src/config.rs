// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{
        AppointmentRepository, BookingStore, CatalogRepository, CrmRepository, PgBookingStore,
        TenantRepository,
    },
    services::{identity_service::IdentityService, session_registry::SessionRegistry},
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub app_addr: String,
    pub db_max_connections: u32,
    pub session_ttl: Duration,
    pub bcrypt_cost: u32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let app_addr = env::var("APP_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", 5)?;
        let session_ttl_minutes: u64 = parse_var("BOOKING_SESSION_TTL_MINUTES", 30)?;
        let bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;

        Ok(Self {
            database_url,
            app_addr,
            db_max_connections,
            session_ttl: Duration::from_secs(session_ttl_minutes * 60),
            bcrypt_cost,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} inválida: {raw}")),
        Err(_) => Ok(default),
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
    pub identity_service: IdentityService,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Conecta ao banco usando '?' para propagar erros.
    pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");
        Ok(db_pool)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, config: &AppConfig) -> Self {
        let store = PgBookingStore::new(
            TenantRepository::new(db_pool.clone()),
            CatalogRepository::new(db_pool.clone()),
            AppointmentRepository::new(db_pool.clone()),
            CrmRepository::new(db_pool),
        );
        Self::from_store(Arc::new(store), config.bcrypt_cost, config.session_ttl)
    }

    pub fn from_store(store: Arc<dyn BookingStore>, bcrypt_cost: u32, session_ttl: Duration) -> Self {
        Self {
            identity_service: IdentityService::new(store.clone(), bcrypt_cost),
            store,
            sessions: Arc::new(SessionRegistry::new(session_ttl)),
        }
    }
}
