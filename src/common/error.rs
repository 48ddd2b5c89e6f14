use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Nosso tipo de erro de domínio, com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("CPF inválido")]
    InvalidDocument,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Cliente já cadastrado")]
    CustomerAlreadyExists,

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Estabelecimento não encontrado: {0}")]
    TenantNotFound(String),

    #[error("Serviço não encontrado")]
    ServiceNotFound,

    #[error("Profissional não encontrado")]
    EmployeeNotFound,

    #[error("Profissional não atende este serviço")]
    EmployeeNotEligible,

    #[error("Horário indisponível")]
    SlotUnavailable,

    #[error("Sessão de agendamento não encontrada")]
    SessionNotFound,

    #[error("Data ou horário inválido")]
    InvalidDateTime,

    #[error("Ação indisponível na etapa atual do agendamento")]
    StepNotAllowed,

    #[error("Cliente ainda não identificado")]
    ClientNotIdentified,

    #[error("Forma de pagamento não escolhida")]
    PaymentMethodMissing,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),
}

// O erro já traduzido, pronto para virar resposta HTTP
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl AppError {
    /// Código estável usado pelo frontend e pelos testes.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation",
            AppError::InvalidDocument => "invalid_document",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::CustomerAlreadyExists => "customer_already_exists",
            AppError::EmailAlreadyExists => "email_already_exists",
            AppError::TenantNotFound(_) => "tenant_not_found",
            AppError::ServiceNotFound => "service_not_found",
            AppError::EmployeeNotFound => "employee_not_found",
            AppError::EmployeeNotEligible => "employee_not_eligible",
            AppError::SlotUnavailable => "slot_unavailable",
            AppError::SessionNotFound => "session_not_found",
            AppError::InvalidDateTime => "invalid_datetime",
            AppError::StepNotAllowed => "step_not_allowed",
            AppError::ClientNotIdentified => "client_not_identified",
            AppError::PaymentMethodMissing => "payment_method_missing",
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::InvalidDocument
            | AppError::InvalidDateTime
            | AppError::EmployeeNotEligible
            | AppError::ClientNotIdentified
            | AppError::PaymentMethodMissing => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::CustomerAlreadyExists
            | AppError::EmailAlreadyExists
            | AppError::SlotUnavailable
            | AppError::StepNotAllowed => StatusCode::CONFLICT,
            AppError::TenantNotFound(_)
            | AppError::ServiceNotFound
            | AppError::EmployeeNotFound
            | AppError::SessionNotFound => StatusCode::NOT_FOUND,
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self, lang: &str) -> &'static str {
        let english = lang == "en";
        match (self, english) {
            (AppError::ValidationError(_), false) => "Um ou mais campos são inválidos.",
            (AppError::ValidationError(_), true) => "One or more fields are invalid.",
            (AppError::InvalidDocument, false) => "Informe um CPF com 11 dígitos.",
            (AppError::InvalidDocument, true) => "Please provide an 11-digit CPF.",
            (AppError::InvalidCredentials, false) => "CPF ou senha inválidos.",
            (AppError::InvalidCredentials, true) => "Invalid CPF or password.",
            (AppError::CustomerAlreadyExists, false) => "Já existe um cadastro para este CPF.",
            (AppError::CustomerAlreadyExists, true) => "This CPF is already registered.",
            (AppError::EmailAlreadyExists, false) => "Este e-mail já está em uso.",
            (AppError::EmailAlreadyExists, true) => "This e-mail is already in use.",
            (AppError::TenantNotFound(_), false) => "Estabelecimento não encontrado.",
            (AppError::TenantNotFound(_), true) => "Business not found.",
            (AppError::ServiceNotFound, false) => "Serviço não encontrado.",
            (AppError::ServiceNotFound, true) => "Service not found.",
            (AppError::EmployeeNotFound, false) => "Profissional não encontrado.",
            (AppError::EmployeeNotFound, true) => "Professional not found.",
            (AppError::EmployeeNotEligible, false) => "Este profissional não realiza o serviço escolhido.",
            (AppError::EmployeeNotEligible, true) => "This professional does not perform the selected service.",
            (AppError::SlotUnavailable, false) => "Este horário acabou de ser reservado. Escolha outro.",
            (AppError::SlotUnavailable, true) => "This time was just booked. Please pick another one.",
            (AppError::SessionNotFound, false) => "Sessão de agendamento expirada ou inexistente.",
            (AppError::SessionNotFound, true) => "Booking session expired or not found.",
            (AppError::InvalidDateTime, false) => "Data ou horário inválido.",
            (AppError::InvalidDateTime, true) => "Invalid date or time.",
            (AppError::StepNotAllowed, false) => "Esta ação não está disponível nesta etapa do agendamento.",
            (AppError::StepNotAllowed, true) => "This action is not available at the current booking step.",
            (AppError::ClientNotIdentified, false) => "Identifique-se antes de concluir o agendamento.",
            (AppError::ClientNotIdentified, true) => "Please identify yourself before completing the booking.",
            (AppError::PaymentMethodMissing, false) => "Escolha uma forma de pagamento.",
            (AppError::PaymentMethodMissing, true) => "Please choose a payment method.",
            (_, false) => "Ocorreu um erro inesperado. Tente novamente.",
            (_, true) => "An unexpected error occurred. Please try again.",
        }
    }

    /// Traduz o erro para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                Some(Value::Object(details))
            }
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_) => {
                // O `tracing` loga a mensagem detalhada; o cliente só vê a genérica.
                tracing::error!("Erro Interno do Servidor: {:?}", self);
                None
            }
            _ => None,
        };

        ApiError {
            status: self.status(),
            error: self.message(&locale.0).to_string(),
            details,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}
