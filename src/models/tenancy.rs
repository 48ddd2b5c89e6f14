// src/models/tenancy.rs

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Mapeia o CREATE TYPE scheduling_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "scheduling_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SchedulingType {
    /// Cada profissional tem a sua própria cadeira: conflitos só entre o mesmo profissional.
    Individual,
    /// Uma única sala para todo o estabelecimento: qualquer agendamento bloqueia o horário.
    Shared,
}

// ---
// Tenant (O "Estabelecimento")
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub whatsapp: Option<String>,
    pub scheduling_type: SchedulingType,

    // Fuso fixo do salão (ex: -180 para Brasília)
    pub utc_offset_minutes: i32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Fuso horário local do estabelecimento. Um offset fora do intervalo
    /// aceito pelo chrono cai para UTC.
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}
