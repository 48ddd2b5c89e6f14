// src/db/tenancy_repo.rs

use sqlx::PgPool;
use crate::{common::error::AppError, models::tenancy::Tenant};

#[derive(Clone)]
pub struct TenantRepository {
    pool: PgPool,
}

impl TenantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Busca o estabelecimento pelo slug público (ex: "studio-bela").
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Tenant>, AppError> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, slug, name, whatsapp, scheduling_type, utc_offset_minutes,
                   created_at, updated_at
            FROM tenants
            WHERE slug = $1
            "#,
        )
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tenant)
    }
}
