// src/models/catalog.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::scheduling::WeeklySchedule;

// --- SERVIÇO (O que o salão vende) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,

    // Tempo do serviço em si, sem os buffers de preparo/limpeza
    pub duration_minutes: i32,

    pub price: Decimal,
    pub currency: String,

    // JSONB livre. Aqui moram o "bufferBefore" e o "bufferAfter".
    #[schema(value_type = Option<Object>)]
    pub metadata: Option<Value>,

    pub is_active: bool,
}

// --- PROFISSIONAL ---

/// Linha da tabela `employees`, sem a agenda.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,

    // IDs ou nomes de serviços que a pessoa atende
    pub specialties: Vec<String>,

    pub is_active: bool,
}

/// Profissional já com a agenda semanal montada.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(flatten)]
    pub profile: StaffMember,
    pub working_hours: WeeklySchedule,
}

impl Employee {
    pub fn id(&self) -> Uuid {
        self.profile.id
    }

    /// Sem especialidades cadastradas, a pessoa atende tudo.
    pub fn can_perform(&self, service: &Service) -> bool {
        let specialties = &self.profile.specialties;
        if specialties.is_empty() {
            return true;
        }

        let service_id = service.id.to_string();
        specialties
            .iter()
            .any(|s| *s == service_id || s.eq_ignore_ascii_case(&service.name))
    }
}

// --- DISPONIBILIDADE (linhas cruas da staff_availability) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StaffAvailability {
    pub employee_id: Uuid,
    // 0 = domingo ... 6 = sábado
    pub weekday: i16,
    pub start_time: String,
    pub end_time: String,
}
