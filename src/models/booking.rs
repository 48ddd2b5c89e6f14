// src/models/booking.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::crm::ClientIdentity;

// --- ETAPAS DO FUNIL ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStep {
    Service,
    Professional,
    Datetime,
    ClientInfo,
    Confirmation,
    Payment,
    Success,
}

impl BookingStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStep::Service => "service",
            BookingStep::Professional => "professional",
            BookingStep::Datetime => "datetime",
            BookingStep::ClientInfo => "client_info",
            BookingStep::Confirmation => "confirmation",
            BookingStep::Payment => "payment",
            BookingStep::Success => "success",
        }
    }

    /// Próxima etapa na ordem linear. `success` é terminal.
    pub fn following(&self) -> Option<BookingStep> {
        match self {
            BookingStep::Service => Some(BookingStep::Professional),
            BookingStep::Professional => Some(BookingStep::Datetime),
            BookingStep::Datetime => Some(BookingStep::ClientInfo),
            BookingStep::ClientInfo => Some(BookingStep::Confirmation),
            BookingStep::Confirmation => Some(BookingStep::Payment),
            BookingStep::Payment => Some(BookingStep::Success),
            BookingStep::Success => None,
        }
    }

    /// Etapa anterior. Não existe volta a partir de `service` nem de `success`.
    pub fn preceding(&self) -> Option<BookingStep> {
        match self {
            BookingStep::Service | BookingStep::Success => None,
            BookingStep::Professional => Some(BookingStep::Service),
            BookingStep::Datetime => Some(BookingStep::Professional),
            BookingStep::ClientInfo => Some(BookingStep::Datetime),
            BookingStep::Confirmation => Some(BookingStep::ClientInfo),
            BookingStep::Payment => Some(BookingStep::Confirmation),
        }
    }
}

// Mapeia os meios de pagamento aceitos no portal (só registro, sem cobrança)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Pix,
    CreditCard,
    DebitCard,
    OnSite,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Pix => "pix",
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::OnSite => "on_site",
        }
    }
}

// ---
// BookingSession: tudo o que o cliente escolheu até agora.
// Vive só enquanto o funil estiver aberto.
// ---
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingSession {
    pub service_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    // "HH:MM"
    #[schema(example = "09:30")]
    pub time: Option<String>,
    pub client: Option<ClientIdentity>,
    pub payment_method: Option<PaymentMethod>,
    // Preenchido quando o agendamento é gravado
    pub appointment_id: Option<Uuid>,
}

/// Quais guardas de avanço estão satisfeitas, para habilitar o botão "próximo".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuardStatus {
    pub has_service: bool,
    pub has_employee: bool,
    pub has_datetime: bool,
    pub has_identity: bool,
    pub has_payment_method: bool,
    pub can_advance: bool,
    pub can_go_back: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunnelSnapshot {
    pub session_id: Uuid,
    pub step: BookingStep,
    pub guards: GuardStatus,
    pub selection: BookingSession,
    pub available_slots: Vec<String>,
}
