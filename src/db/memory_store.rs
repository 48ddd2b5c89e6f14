// src/db/memory_store.rs
// BookingStore em memória para os testes do funil e das rotas.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::BookingStore,
    models::{
        appointments::{Appointment, AppointmentStatus, NewAppointment},
        catalog::{Service, StaffAvailability, StaffMember},
        crm::{Customer, CustomerCredential, IdentityType, NewCredential, NewCustomer},
        tenancy::{SchedulingType, Tenant},
    },
};

#[derive(Default)]
struct State {
    tenants: Vec<Tenant>,
    services: Vec<Service>,
    staff: Vec<StaffMember>,
    availability: Vec<StaffAvailability>,
    appointments: Vec<Appointment>,
    customers: Vec<Customer>,
    credentials: Vec<CustomerCredential>,
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
    fail_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tenant(&self, tenant: Tenant) {
        self.state.lock().unwrap().tenants.push(tenant);
    }

    pub fn add_service(&self, service: Service) {
        self.state.lock().unwrap().services.push(service);
    }

    pub fn add_staff(&self, staff: StaffMember) {
        self.state.lock().unwrap().staff.push(staff);
    }

    pub fn add_availability(&self, row: StaffAvailability) {
        self.state.lock().unwrap().availability.push(row);
    }

    pub fn add_appointment(&self, appointment: Appointment) {
        self.state.lock().unwrap().appointments.push(appointment);
    }

    pub fn appointments(&self) -> Vec<Appointment> {
        self.state.lock().unwrap().appointments.clone()
    }

    pub fn customers(&self) -> Vec<Customer> {
        self.state.lock().unwrap().customers.clone()
    }

    pub fn credentials(&self) -> Vec<CustomerCredential> {
        self.state.lock().unwrap().credentials.clone()
    }

    /// Simula queda do banco nas gravações.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "conexão com o banco perdida"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn find_tenant_by_slug(&self, slug: &str) -> Result<Option<Tenant>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.tenants.iter().find(|t| t.slug == slug).cloned())
    }

    async fn list_services(&self, tenant_id: Uuid) -> Result<Vec<Service>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .services
            .iter()
            .filter(|s| s.tenant_id == tenant_id && s.is_active)
            .cloned()
            .collect())
    }

    async fn list_staff(&self, tenant_id: Uuid) -> Result<Vec<StaffMember>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .staff
            .iter()
            .filter(|s| s.tenant_id == tenant_id && s.is_active)
            .cloned()
            .collect())
    }

    async fn list_availability(&self, tenant_id: Uuid) -> Result<Vec<StaffAvailability>, AppError> {
        let state = self.state.lock().unwrap();
        let staff_ids: Vec<Uuid> = state
            .staff
            .iter()
            .filter(|s| s.tenant_id == tenant_id)
            .map(|s| s.id)
            .collect();
        Ok(state
            .availability
            .iter()
            .filter(|row| staff_ids.contains(&row.employee_id))
            .cloned()
            .collect())
    }

    async fn list_appointments_around(
        &self,
        tenant: &Tenant,
        _day: NaiveDate,
    ) -> Result<Vec<Appointment>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .appointments
            .iter()
            .filter(|a| a.tenant_id == tenant.id)
            .cloned()
            .collect())
    }

    async fn find_customer_by_document(
        &self,
        tenant_id: Uuid,
        document_number: &str,
    ) -> Result<Option<Customer>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .customers
            .iter()
            .find(|c| c.tenant_id == tenant_id && c.document_number.as_deref() == Some(document_number))
            .cloned())
    }

    async fn find_customer_by_email(
        &self,
        tenant_id: Uuid,
        email: &str,
    ) -> Result<Option<Customer>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .customers
            .iter()
            .find(|c| {
                c.tenant_id == tenant_id
                    && c.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email))
            })
            .cloned())
    }

    async fn find_credential(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
        identity_type: IdentityType,
    ) -> Result<Option<CustomerCredential>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .credentials
            .iter()
            .find(|c| {
                c.tenant_id == tenant_id
                    && c.customer_id == customer_id
                    && c.identity_type == identity_type
            })
            .cloned())
    }

    async fn create_customer_with_credentials(
        &self,
        new: NewCustomer,
        credentials: Vec<NewCredential>,
    ) -> Result<Customer, AppError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();

        let duplicate = state.customers.iter().any(|c| {
            c.tenant_id == new.tenant_id && c.document_number.as_deref() == Some(&new.document_number)
        });
        if duplicate {
            return Err(AppError::CustomerAlreadyExists);
        }

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            tenant_id: new.tenant_id,
            full_name: new.full_name,
            document_number: Some(new.document_number),
            email: new.email,
            phone: new.phone,
            created_at: now,
            updated_at: now,
        };

        for credential in credentials {
            state.credentials.push(CustomerCredential {
                id: Uuid::new_v4(),
                tenant_id: customer.tenant_id,
                customer_id: customer.id,
                identity_type: credential.identity_type,
                identifier: credential.identifier,
                password_hash: credential.password_hash,
                created_at: now,
            });
        }
        state.customers.push(customer.clone());

        Ok(customer)
    }

    async fn insert_appointment(
        &self,
        new: NewAppointment,
        scheduling_type: SchedulingType,
    ) -> Result<Appointment, AppError> {
        self.check_writable()?;
        let mut state = self.state.lock().unwrap();

        let taken = state.appointments.iter().any(|a| {
            a.tenant_id == new.tenant_id
                && a.status != AppointmentStatus::Cancelled
                && (scheduling_type == SchedulingType::Shared || a.employee_id == new.employee_id)
                && a.start_at < new.end_at
                && a.effective_end(0) > new.start_at
        });
        if taken {
            return Err(AppError::SlotUnavailable);
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            tenant_id: new.tenant_id,
            service_id: new.service_id,
            employee_id: new.employee_id,
            customer_id: Some(new.customer_id),
            start_at: new.start_at,
            end_at: Some(new.end_at),
            duration_minutes: Some(new.duration_minutes),
            status: new.status,
            channel: new.channel,
            price: Some(new.price),
            currency: Some(new.currency),
            metadata: new.metadata,
            created_at: Utc::now(),
        };
        state.appointments.push(appointment.clone());

        Ok(appointment)
    }
}
