// src/db/crm_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::crm::{Customer, CustomerCredential, IdentityType, NewCredential, NewCustomer},
};

const CUSTOMER_COLUMNS: &str =
    "id, tenant_id, full_name, document_number, email, phone, created_at, updated_at";

#[derive(Clone)]
pub struct CrmRepository {
    pool: PgPool,
}

impl CrmRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  CLIENTES
    // =========================================================================

    pub async fn find_customer_by_document(
        &self,
        tenant_id: Uuid,
        document_number: &str,
    ) -> Result<Option<Customer>, AppError> {
        let query = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1 AND document_number = $2"
        );
        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(tenant_id)
            .bind(document_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    pub async fn find_customer_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<Customer>, AppError> {
        let query = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE tenant_id = $1 AND lower(email) = lower($2)"
        );
        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(tenant_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(customer)
    }

    /// Cria o cliente e as credenciais na mesma transação.
    /// Se qualquer credencial falhar, o cliente criado é desfeito.
    pub async fn create_customer_with_credentials(
        &self,
        new: NewCustomer,
        credentials: Vec<NewCredential>,
    ) -> Result<Customer, AppError> {
        let mut tx = self.pool.begin().await?;

        let query = format!(
            "INSERT INTO customers (tenant_id, full_name, document_number, email, phone)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let customer = sqlx::query_as::<_, Customer>(&query)
            .bind(new.tenant_id)
            .bind(&new.full_name)
            .bind(&new.document_number)
            .bind(&new.email)
            .bind(&new.phone)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, AppError::CustomerAlreadyExists))?;

        for credential in &credentials {
            self.insert_credential(&mut *tx, new.tenant_id, customer.id, credential)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(
            "👤 Cliente {} cadastrado pelo portal com {} credencial(is)",
            customer.id,
            credentials.len()
        );

        Ok(customer)
    }

    // =========================================================================
    //  CREDENCIAIS
    // =========================================================================

    pub async fn find_credential(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        identity_type: IdentityType,
    ) -> Result<Option<CustomerCredential>, AppError> {
        let credential = sqlx::query_as::<_, CustomerCredential>(
            r#"
            SELECT id, tenant_id, customer_id, identity_type, identifier, password_hash, created_at
            FROM customer_credentials
            WHERE tenant_id = $1 AND customer_id = $2 AND identity_type = $3
            "#,
        )
            .bind(tenant_id)
            .bind(customer_id)
            .bind(identity_type)
            .fetch_optional(&self.pool)
            .await?;

        Ok(credential)
    }

    async fn insert_credential<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        credential: &NewCredential,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO customer_credentials (tenant_id, customer_id, identity_type, identifier, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
            .bind(tenant_id)
            .bind(customer_id)
            .bind(credential.identity_type)
            .bind(&credential.identifier)
            .bind(&credential.password_hash)
            .execute(executor)
            .await
            .map_err(|e| {
                let duplicate = match credential.identity_type {
                    IdentityType::Email => AppError::EmailAlreadyExists,
                    IdentityType::Cpf => AppError::CustomerAlreadyExists,
                };
                map_unique_violation(e, duplicate)
            })?;

        Ok(())
    }
}

// Converte erro de violação de chave única em um erro mais amigável
fn map_unique_violation(e: sqlx::Error, duplicate: AppError) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return duplicate;
        }
    }
    e.into()
}
