// src/db/catalog_repo.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::catalog::{Service, StaffAvailability, StaffMember},
};

// Leitura do catálogo (serviços, profissionais e horários).
// A escrita fica com as telas administrativas.
#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_active_services(&self, tenant_id: Uuid) -> Result<Vec<Service>, AppError> {
        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, tenant_id, name, description, duration_minutes,
                   price, currency, metadata, is_active
            FROM services
            WHERE tenant_id = $1 AND is_active = TRUE
            ORDER BY name
            "#,
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(services)
    }

    pub async fn list_active_staff(&self, tenant_id: Uuid) -> Result<Vec<StaffMember>, AppError> {
        let staff = sqlx::query_as::<_, StaffMember>(
            r#"
            SELECT id, tenant_id, name, specialties, is_active
            FROM employees
            WHERE tenant_id = $1 AND is_active = TRUE
            ORDER BY name
            "#,
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(staff)
    }

    /// Linhas cruas de disponibilidade. Os horários vêm como texto ("09:00:00")
    /// e são truncados para "HH:MM" na montagem da agenda.
    pub async fn list_availability(
        &self,
        tenant_id: Uuid,
    ) -> Result<Vec<StaffAvailability>, AppError> {
        let rows = sqlx::query_as::<_, StaffAvailability>(
            r#"
            SELECT employee_id, weekday,
                   start_time::text AS start_time,
                   end_time::text AS end_time
            FROM staff_availability
            WHERE tenant_id = $1
            ORDER BY employee_id, weekday, created_at
            "#,
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}
