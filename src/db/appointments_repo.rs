// src/db/appointments_repo.rs

use chrono::{Duration, NaiveDate, NaiveTime};
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    models::{
        appointments::{Appointment, NewAppointment},
        tenancy::{SchedulingType, Tenant},
    },
    services::slots::to_utc,
};

const APPOINTMENT_COLUMNS: &str = "id, tenant_id, service_id, employee_id, customer_id, \
     start_at, end_at, duration_minutes, status, channel, price, currency, metadata, created_at";

#[derive(Clone)]
pub struct AppointmentRepository {
    pool: PgPool,
}

impl AppointmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Foto dos agendamentos de um dia local, com folga de um dia para cada
    /// lado (agendamentos longos que atravessam a meia-noite).
    pub async fn list_around_day(
        &self,
        tenant: &Tenant,
        day: NaiveDate,
    ) -> Result<Vec<Appointment>, AppError> {
        let midnight = day.and_time(NaiveTime::MIN);
        let from = to_utc(tenant, midnight - Duration::days(1));
        let to = to_utc(tenant, midnight + Duration::days(2));

        let query = format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE tenant_id = $1 AND start_at >= $2 AND start_at < $3 \
             ORDER BY start_at"
        );

        let appointments = sqlx::query_as::<_, Appointment>(&query)
            .bind(tenant.id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;

        Ok(appointments)
    }

    /// Gravação definitiva. A checagem do funil roda sobre uma foto e pode
    /// estar velha; aqui a mesma regra de sobreposição é refeita dentro da
    /// transação, serializada por um advisory lock do tenant.
    pub async fn insert_if_free(
        &self,
        new: NewAppointment,
        scheduling_type: SchedulingType,
    ) -> Result<Appointment, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text))")
            .bind(new.tenant_id.to_string())
            .execute(&mut *tx)
            .await?;

        let shared = scheduling_type == SchedulingType::Shared;
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM appointments a
                LEFT JOIN services s ON s.id = a.service_id
                WHERE a.tenant_id = $1
                  AND a.status <> 'cancelled'
                  AND ($2 OR a.employee_id = $3)
                  AND a.start_at < $5
                  AND COALESCE(
                        a.end_at,
                        a.start_at + make_interval(mins => COALESCE(a.duration_minutes, s.duration_minutes, 0))
                      ) > $4
            )
            "#,
        )
            .bind(new.tenant_id)
            .bind(shared)
            .bind(new.employee_id)
            .bind(new.start_at)
            .bind(new.end_at)
            .fetch_one(&mut *tx)
            .await?;

        if taken {
            // O drop do tx faz rollback e solta o lock
            return Err(AppError::SlotUnavailable);
        }

        let query = format!(
            "INSERT INTO appointments (
                tenant_id, service_id, employee_id, customer_id, start_at, end_at,
                duration_minutes, price, currency, status, channel, metadata
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {APPOINTMENT_COLUMNS}"
        );

        let appointment = sqlx::query_as::<_, Appointment>(&query)
            .bind(new.tenant_id)
            .bind(new.service_id)
            .bind(new.employee_id)
            .bind(new.customer_id)
            .bind(new.start_at)
            .bind(new.end_at)
            .bind(new.duration_minutes)
            .bind(new.price)
            .bind(&new.currency)
            .bind(new.status)
            .bind(&new.channel)
            .bind(&new.metadata)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            "📅 Agendamento {} criado (tenant {}, profissional {}, início {})",
            appointment.id,
            appointment.tenant_id,
            appointment.employee_id,
            appointment.start_at
        );

        Ok(appointment)
    }
}
