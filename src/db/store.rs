// src/db/store.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AppointmentRepository, CatalogRepository, CrmRepository, TenantRepository},
    models::{
        appointments::{Appointment, NewAppointment},
        catalog::{Service, StaffAvailability, StaffMember},
        crm::{Customer, CustomerCredential, IdentityType, NewCredential, NewCustomer},
        tenancy::{SchedulingType, Tenant},
    },
};

/// Tudo o que o funil público precisa ler e gravar.
/// O Postgres implementa via repositórios; os testes usam a versão em memória.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn find_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, AppError>;

    async fn list_services(&self, tenant_id: Uuid) -> Result<Vec<Service>, AppError>;
    async fn list_staff(&self, tenant_id: Uuid) -> Result<Vec<StaffMember>, AppError>;
    async fn list_availability(&self, tenant_id: Uuid) -> Result<Vec<StaffAvailability>, AppError>;

    /// Agendamentos que começam no dia local informado (com um dia de folga
    /// para cada lado, o filtro fino fica com o detector de conflitos).
    async fn list_appointments_around(
        &self,
        tenant: &Tenant,
        day: NaiveDate,
    ) -> Result<Vec<Appointment>, AppError>;

    async fn find_customer_by_document(
        &self,
        tenant_id: Uuid,
        document_number: &str,
    ) -> Result<Option<Customer>, AppError>;

    async fn find_customer_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<Customer>, AppError>;

    async fn find_credential(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        identity_type: IdentityType,
    ) -> Result<Option<CustomerCredential>, AppError>;

    /// Cria o cliente e as credenciais de forma atômica.
    async fn create_customer_with_credentials(
        &self,
        customer: NewCustomer,
        credentials: Vec<NewCredential>,
    ) -> Result<Customer, AppError>;

    /// Grava o agendamento somente se o horário continuar livre na hora da escrita.
    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
        scheduling_type: SchedulingType,
    ) -> Result<Appointment, AppError>;
}

// O store de produção: só monta os repositórios e delega.
#[derive(Clone)]
pub struct PgBookingStore {
    tenant_repo: TenantRepository,
    catalog_repo: CatalogRepository,
    appointment_repo: AppointmentRepository,
    crm_repo: CrmRepository,
}

impl PgBookingStore {
    pub fn new(
        tenant_repo: TenantRepository,
        catalog_repo: CatalogRepository,
        appointment_repo: AppointmentRepository,
        crm_repo: CrmRepository,
    ) -> Self {
        Self {
            tenant_repo,
            catalog_repo,
            appointment_repo,
            crm_repo,
        }
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn find_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, AppError> {
        self.tenant_repo.find_by_slug(slug).await
    }

    async fn list_services(&self, tenant_id: Uuid) -> Result<Vec<Service>, AppError> {
        self.catalog_repo.list_active_services(tenant_id).await
    }

    async fn list_staff(&self, tenant_id: Uuid) -> Result<Vec<StaffMember>, AppError> {
        self.catalog_repo.list_active_staff(tenant_id).await
    }

    async fn list_availability(&self, tenant_id: Uuid) -> Result<Vec<StaffAvailability>, AppError> {
        self.catalog_repo.list_availability(tenant_id).await
    }

    async fn list_appointments_around(
        &self,
        tenant: &Tenant,
        day: NaiveDate,
    ) -> Result<Vec<Appointment>, AppError> {
        self.appointment_repo.list_around_day(tenant, day).await
    }

    async fn find_customer_by_document(
        &self,
        tenant_id: Uuid,
        document_number: &str,
    ) -> Result<Option<Customer>, AppError> {
        self.crm_repo
            .find_customer_by_document(tenant_id, document_number)
            .await
    }

    async fn find_customer_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<Customer>, AppError> {
        self.crm_repo.find_customer_by_email(tenant_id, email).await
    }

    async fn find_credential(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        identity_type: IdentityType,
    ) -> Result<Option<CustomerCredential>, AppError> {
        self.crm_repo
            .find_credential(tenant_id, customer_id, identity_type)
            .await
    }

    async fn create_customer_with_credentials(
        &self,
        customer: NewCustomer,
        credentials: Vec<NewCredential>,
    ) -> Result<Customer, AppError> {
        self.crm_repo
            .create_customer_with_credentials(customer, credentials)
            .await
    }

    async fn insert_appointment(
        &self,
        appointment: NewAppointment,
        scheduling_type: SchedulingType,
    ) -> Result<Appointment, AppError> {
        self.appointment_repo
            .insert_if_free(appointment, scheduling_type)
            .await
    }
}
