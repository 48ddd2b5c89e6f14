// src/models/appointments.rs

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

// Mapeia o CREATE TYPE appointment_status do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

pub const CHANNEL_PUBLIC_PORTAL: &str = "public_portal";
pub const BOOKING_SOURCE: &str = "public_booking_page";

// O registro oficial de tempo ocupado.
// Nunca é apagado, só passa para "cancelled".
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub employee_id: Uuid,
    pub customer_id: Option<Uuid>,

    pub start_at: DateTime<Utc>,
    // Quando ausente, o fim sai de start_at + duration_minutes
    pub end_at: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,

    pub status: AppointmentStatus,
    pub channel: String,

    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub metadata: Value,

    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// Fim efetivo do agendamento. `fallback_minutes` é usado quando o
    /// registro não traz nem `end_at` nem `duration_minutes`.
    pub fn effective_end(&self, fallback_minutes: i64) -> DateTime<Utc> {
        if let Some(end) = self.end_at {
            return end;
        }
        let minutes = self
            .duration_minutes
            .map(i64::from)
            .unwrap_or(fallback_minutes);
        // Duração fora do intervalo do chrono: trata como sem fim
        Duration::try_minutes(minutes)
            .and_then(|span| self.start_at.checked_add_signed(span))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

// Payload de inserção vindo do funil público
#[derive(Debug, Clone, Serialize)]
pub struct NewAppointment {
    pub tenant_id: Uuid,
    pub service_id: Uuid,
    pub employee_id: Uuid,
    pub customer_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub price: Decimal,
    pub currency: String,
    pub status: AppointmentStatus,
    pub channel: String,
    pub metadata: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn appointment(end_at: Option<DateTime<Utc>>, duration_minutes: Option<i32>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            service_id: Uuid::new_v4(),
            employee_id: Uuid::new_v4(),
            customer_id: None,
            start_at: Utc::now(),
            end_at,
            duration_minutes,
            status: AppointmentStatus::Scheduled,
            channel: CHANNEL_PUBLIC_PORTAL.into(),
            price: None,
            currency: None,
            metadata: json!({}),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn end_prefers_stored_end_then_duration_then_fallback() {
        let stored_end = Utc::now() + Duration::minutes(90);
        assert_eq!(appointment(Some(stored_end), Some(30)).effective_end(10), stored_end);

        let with_duration = appointment(None, Some(30));
        assert_eq!(with_duration.effective_end(10), with_duration.start_at + Duration::minutes(30));

        let bare = appointment(None, None);
        assert_eq!(bare.effective_end(10), bare.start_at + Duration::minutes(10));
    }

    #[test]
    fn absurd_fallback_is_open_ended() {
        assert_eq!(appointment(None, None).effective_end(i64::MAX), DateTime::<Utc>::MAX_UTC);
    }
}
