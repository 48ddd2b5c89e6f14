// src/services/identity_service.rs

use std::sync::Arc;

use bcrypt::{hash, verify};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::BookingStore,
    models::crm::{ClientIdentity, IdentityType, NewCredential, NewCustomer, RegisterCustomerPayload},
};

pub const CPF_LENGTH: usize = 11;

/// Qual caminho o cliente segue depois de digitar o CPF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum IdentityBranch {
    Login,
    Registration,
}

/// Deixa só os dígitos e exige exatamente 11.
pub fn normalize_document(raw: &str) -> Result<String, AppError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != CPF_LENGTH {
        return Err(AppError::InvalidDocument);
    }
    Ok(digits)
}

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn BookingStore>,
    bcrypt_cost: u32,
}

impl IdentityService {
    pub fn new(store: Arc<dyn BookingStore>, bcrypt_cost: u32) -> Self {
        Self { store, bcrypt_cost }
    }

    pub async fn lookup(&self, tenant_id: Uuid, raw_document: &str) -> Result<IdentityBranch, AppError> {
        let document = normalize_document(raw_document)?;
        let existing = self
            .store
            .find_customer_by_document(tenant_id, &document)
            .await?;

        Ok(match existing {
            Some(_) => IdentityBranch::Login,
            None => IdentityBranch::Registration,
        })
    }

    /// Login por CPF + senha. Cliente inexistente, sem credencial ou senha
    /// errada dão todos o mesmo erro.
    pub async fn login(
        &self,
        tenant_id: Uuid,
        raw_document: &str,
        password: &str,
    ) -> Result<ClientIdentity, AppError> {
        let document = normalize_document(raw_document)?;

        let customer = self
            .store
            .find_customer_by_document(tenant_id, &document)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let credential = self
            .store
            .find_credential(tenant_id, customer.id, IdentityType::Cpf)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let password_clone = password.to_owned();
        let password_hash_clone = credential.password_hash.clone();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || {
            verify(&password_clone, &password_hash_clone)
        })
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        ?;

        if !is_password_valid {
            return Err(AppError::InvalidCredentials);
        }

        tracing::info!("🔑 Cliente {} identificado no portal", customer.id);
        Ok(ClientIdentity::from(&customer))
    }

    /// Cadastro pelo portal: cria o cliente e as credenciais (CPF e e-mail).
    pub async fn register(
        &self,
        tenant_id: Uuid,
        payload: &RegisterCustomerPayload,
    ) -> Result<ClientIdentity, AppError> {
        let document = normalize_document(&payload.document_number)?;
        payload.validate()?;

        if self
            .store
            .find_customer_by_document(tenant_id, &document)
            .await?
            .is_some()
        {
            return Err(AppError::CustomerAlreadyExists);
        }

        let email = payload.email.trim().to_lowercase();
        if !email.is_empty()
            && self
                .store
                .find_customer_by_email(tenant_id, &email)
                .await?
                .is_some()
        {
            return Err(AppError::EmailAlreadyExists);
        }

        let password_clone = payload.password.clone();
        let cost = self.bcrypt_cost;
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password_clone, cost))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))?
            ?;

        let mut credentials = vec![NewCredential {
            identity_type: IdentityType::Cpf,
            identifier: document.clone(),
            password_hash: hashed_password.clone(),
        }];
        if !email.is_empty() {
            credentials.push(NewCredential {
                identity_type: IdentityType::Email,
                identifier: email.clone(),
                password_hash: hashed_password,
            });
        }

        let customer = self
            .store
            .create_customer_with_credentials(
                NewCustomer {
                    tenant_id,
                    full_name: payload.full_name.trim().to_string(),
                    document_number: document,
                    email: (!email.is_empty()).then_some(email),
                    phone: Some(payload.phone.trim().to_string()),
                },
                credentials,
            )
            .await?;

        Ok(ClientIdentity::from(&customer))
    }
}
