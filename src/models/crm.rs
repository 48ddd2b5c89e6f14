// src/models/crm.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- ENUMS ---

// Mapeia o CREATE TYPE identity_type do banco
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "identity_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum IdentityType {
    Cpf,
    Email,
}

// --- CLIENTE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub tenant_id: Uuid,

    pub full_name: String,
    // CPF só com dígitos
    pub document_number: Option<String>,

    pub email: Option<String>,
    pub phone: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- CREDENCIAL (senha do portal público) ---

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCredential {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    pub identity_type: IdentityType,
    pub identifier: String,

    #[serde(skip_serializing)] // IMPORTANTE para segurança
    pub password_hash: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub tenant_id: Uuid,
    pub full_name: String,
    pub document_number: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCredential {
    pub identity_type: IdentityType,
    pub identifier: String,
    pub password_hash: String,
}

// --- PAYLOADS DO FLUXO DE IDENTIFICAÇÃO ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityLookupPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "529.982.247-25")]
    pub document_number: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerLoginPayload {
    #[validate(length(min = 1, message = "required"))]
    pub document_number: String,
    #[validate(length(min = 1, message = "required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerPayload {
    #[validate(length(min = 1, message = "required"))]
    pub document_number: String,

    #[validate(length(min = 2, message = "O nome deve ter no mínimo 2 caracteres."))]
    pub full_name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "cliente@email.com")]
    pub email: String,

    #[validate(length(min = 8, message = "O telefone fornecido é inválido."))]
    pub phone: String,

    #[validate(length(min = 6, message = "A senha deve ter no mínimo 6 caracteres."))]
    pub password: String,

    #[validate(must_match(other = "password", message = "As senhas não conferem."))]
    pub password_confirmation: String,
}

/// Identidade validada que fica presa na sessão do funil.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdentity {
    pub customer_id: Uuid,
    pub full_name: String,
    pub document_number: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<&Customer> for ClientIdentity {
    fn from(customer: &Customer) -> Self {
        Self {
            customer_id: customer.id,
            full_name: customer.full_name.clone(),
            document_number: customer.document_number.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
        }
    }
}
