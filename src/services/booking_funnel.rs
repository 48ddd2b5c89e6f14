// src/services/booking_funnel.rs
// O funil público: serviço -> profissional -> data/hora -> identificação ->
// confirmação -> pagamento -> sucesso.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::BookingStore,
    models::{
        appointments::{
            Appointment, AppointmentStatus, NewAppointment, BOOKING_SOURCE, CHANNEL_PUBLIC_PORTAL,
        },
        booking::{BookingSession, BookingStep, FunnelSnapshot, GuardStatus, PaymentMethod},
        catalog::{Employee, Service},
        crm::{ClientIdentity, RegisterCustomerPayload},
        tenancy::Tenant,
    },
    services::{
        availability::{assemble_employees, total_duration},
        identity_service::{IdentityBranch, IdentityService},
        slots::{generate_slots, to_utc, SlotQuery},
    },
};

// =========================================================================
//  CONTEXTO (tenant + catálogo carregados uma vez por sessão)
// =========================================================================

#[derive(Debug, Clone)]
pub struct BookingContext {
    pub tenant: Tenant,
    pub services: Vec<Service>,
    pub employees: Vec<Employee>,
}

impl BookingContext {
    /// Carrega tudo o que o funil precisa a partir do slug público.
    /// Slug desconhecido é beco sem saída para a sessão.
    pub async fn load(store: &dyn BookingStore, slug: &str) -> Result<Self, AppError> {
        let tenant = store
            .find_tenant_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::TenantNotFound(slug.to_string()))?;

        let services = store.list_services(tenant.id).await?;
        let staff = store.list_staff(tenant.id).await?;
        let availability = store.list_availability(tenant.id).await?;
        let employees = assemble_employees(staff, &availability);

        Ok(Self {
            tenant,
            services,
            employees,
        })
    }

    pub fn service(&self, id: Uuid) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn employee(&self, id: Uuid) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id() == id)
    }

    pub fn eligible_employees(&self, service: Option<&Service>) -> Vec<&Employee> {
        self.employees
            .iter()
            .filter(|e| service.is_none_or(|s| e.can_perform(s)))
            .collect()
    }

    /// Horários livres sobre uma foto já buscada de agendamentos.
    pub fn slots(
        &self,
        service_id: Option<Uuid>,
        employee_id: Option<Uuid>,
        date: Option<NaiveDate>,
        appointments: &[Appointment],
    ) -> Vec<String> {
        generate_slots(SlotQuery {
            tenant: &self.tenant,
            service: service_id.and_then(|id| self.service(id)),
            employee: employee_id.and_then(|id| self.employee(id)),
            date,
            existing: appointments,
            catalog: &self.services,
        })
    }
}

// =========================================================================
//  MÁQUINA DE ESTADOS
// =========================================================================

pub struct BookingFunnel {
    id: Uuid,
    context: Arc<BookingContext>,
    store: Arc<dyn BookingStore>,
    identity: IdentityService,
    step: BookingStep,
    session: BookingSession,
    // Foto dos agendamentos da data escolhida
    appointments: Vec<Appointment>,
}

impl BookingFunnel {
    pub fn new(
        context: Arc<BookingContext>,
        store: Arc<dyn BookingStore>,
        identity: IdentityService,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            context,
            store,
            identity,
            step: BookingStep::Service,
            session: BookingSession::default(),
            appointments: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn session(&self) -> &BookingSession {
        &self.session
    }

    pub fn tenant(&self) -> &Tenant {
        &self.context.tenant
    }

    pub fn context(&self) -> &BookingContext {
        &self.context
    }

    fn is_finished(&self) -> bool {
        self.step == BookingStep::Success
    }

    fn selected_service(&self) -> Option<&Service> {
        self.session.service_id.and_then(|id| self.context.service(id))
    }

    fn require_step(&self, step: BookingStep) -> Result<(), AppError> {
        if self.step != step {
            return Err(AppError::StepNotAllowed);
        }
        Ok(())
    }

    /// Mudar uma escolha anterior devolve o funil para a etapa dela, para as
    /// guardas seguintes serem reavaliadas.
    fn rewind_to(&mut self, step: BookingStep) {
        if self.step > step {
            tracing::info!(
                "Funil {}: {} -> {} (escolha alterada)",
                self.id,
                self.step.as_str(),
                step.as_str()
            );
            self.step = step;
        }
    }

    // ---
    // Seleções (mudanças em memória, sem efeito colateral)
    // ---

    pub fn select_service(&mut self, service_id: Uuid) -> Result<(), AppError> {
        if self.is_finished() {
            return Ok(());
        }
        let service = self
            .context
            .service(service_id)
            .ok_or(AppError::ServiceNotFound)?;

        // Profissional que não atende o novo serviço é descartado
        let keep_employee = self
            .session
            .employee_id
            .and_then(|id| self.context.employee(id))
            .is_some_and(|e| e.can_perform(service));
        if !keep_employee {
            self.session.employee_id = None;
        }

        self.session.service_id = Some(service_id);
        self.session.time = None;
        self.rewind_to(BookingStep::Service);
        Ok(())
    }

    pub fn select_employee(&mut self, employee_id: Uuid) -> Result<(), AppError> {
        if self.is_finished() {
            return Ok(());
        }
        let employee = self
            .context
            .employee(employee_id)
            .ok_or(AppError::EmployeeNotFound)?;

        if let Some(service) = self.selected_service() {
            if !employee.can_perform(service) {
                return Err(AppError::EmployeeNotEligible);
            }
        }

        self.session.employee_id = Some(employee_id);
        self.session.time = None;
        self.rewind_to(BookingStep::Professional);
        Ok(())
    }

    /// Troca a data e busca uma foto nova dos agendamentos daquele dia.
    /// Se a busca falhar, nada muda.
    pub async fn select_date(&mut self, date: NaiveDate) -> Result<(), AppError> {
        if self.is_finished() {
            return Ok(());
        }
        let appointments = self
            .store
            .list_appointments_around(&self.context.tenant, date)
            .await?;

        self.appointments = appointments;
        self.session.date = Some(date);
        self.session.time = None;
        self.rewind_to(BookingStep::Datetime);
        Ok(())
    }

    pub async fn refresh_appointments(&mut self) -> Result<(), AppError> {
        if let Some(date) = self.session.date {
            self.appointments = self
                .store
                .list_appointments_around(&self.context.tenant, date)
                .await?;
        }
        Ok(())
    }

    pub fn available_slots(&self) -> Vec<String> {
        self.context.slots(
            self.session.service_id,
            self.session.employee_id,
            self.session.date,
            &self.appointments,
        )
    }

    pub fn select_time(&mut self, time: &str) -> Result<(), AppError> {
        if self.is_finished() {
            return Ok(());
        }
        if !self.available_slots().iter().any(|slot| slot == time) {
            return Err(AppError::SlotUnavailable);
        }
        self.session.time = Some(time.to_string());
        self.rewind_to(BookingStep::Datetime);
        Ok(())
    }

    pub fn select_payment_method(&mut self, method: PaymentMethod) {
        if self.is_finished() {
            return;
        }
        self.session.payment_method = Some(method);
    }

    // ---
    // Identificação (só dentro de client_info)
    // ---

    pub async fn lookup_identity(&self, document: &str) -> Result<IdentityBranch, AppError> {
        self.require_step(BookingStep::ClientInfo)?;
        self.identity.lookup(self.context.tenant.id, document).await
    }

    pub async fn login(&mut self, document: &str, password: &str) -> Result<ClientIdentity, AppError> {
        self.require_step(BookingStep::ClientInfo)?;
        let client = self
            .identity
            .login(self.context.tenant.id, document, password)
            .await?;
        self.session.client = Some(client.clone());
        Ok(client)
    }

    pub async fn register(
        &mut self,
        payload: &RegisterCustomerPayload,
    ) -> Result<ClientIdentity, AppError> {
        self.require_step(BookingStep::ClientInfo)?;
        let client = self
            .identity
            .register(self.context.tenant.id, payload)
            .await?;
        self.session.client = Some(client.clone());
        Ok(client)
    }

    // ---
    // Guardas e transições
    // ---

    pub fn guards(&self) -> GuardStatus {
        let has_service = self.session.service_id.is_some();
        let has_employee = self.session.employee_id.is_some();
        let has_datetime = self.session.date.is_some() && !self.available_slots().is_empty();
        let has_identity = self.session.client.is_some();
        let has_payment_method = self.session.payment_method.is_some();

        let can_advance = match self.step {
            BookingStep::Service => has_service,
            BookingStep::Professional => has_employee,
            BookingStep::Datetime => has_datetime,
            BookingStep::ClientInfo => has_identity,
            BookingStep::Confirmation => true,
            BookingStep::Payment => has_payment_method,
            BookingStep::Success => false,
        };

        GuardStatus {
            has_service,
            has_employee,
            has_datetime,
            has_identity,
            has_payment_method,
            can_advance,
            can_go_back: self.step.preceding().is_some(),
        }
    }

    /// Avança uma etapa se a guarda permitir. Guarda não satisfeita é no-op.
    /// Só `payment -> success` grava algo; se a gravação falhar, o funil
    /// continua em `payment` e o erro sobe.
    pub async fn next(&mut self) -> Result<BookingStep, AppError> {
        let guards = self.guards();
        if !guards.can_advance {
            return Ok(self.step);
        }

        match self.step {
            BookingStep::Datetime => {
                let slots = self.available_slots();
                let picked_is_free = self
                    .session
                    .time
                    .as_ref()
                    .is_some_and(|t| slots.contains(t));
                if !picked_is_free {
                    self.session.time = slots.first().cloned();
                }
            }
            BookingStep::Payment => {
                let appointment = self.book().await?;
                self.session.appointment_id = Some(appointment.id);
            }
            _ => {}
        }

        if let Some(following) = self.step.following() {
            tracing::info!(
                "Funil {}: {} -> {}",
                self.id,
                self.step.as_str(),
                following.as_str()
            );
            self.step = following;
        }
        Ok(self.step)
    }

    /// Volta uma etapa, sem condição. No-op em `service` e em `success`.
    pub fn back(&mut self) -> BookingStep {
        if let Some(previous) = self.step.preceding() {
            self.step = previous;
        }
        self.step
    }

    fn build_appointment(&self) -> Result<NewAppointment, AppError> {
        let service = self.selected_service().ok_or(AppError::ServiceNotFound)?;
        let employee_id = self.session.employee_id.ok_or(AppError::EmployeeNotFound)?;
        let client = self
            .session
            .client
            .as_ref()
            .ok_or(AppError::ClientNotIdentified)?;
        let method = self
            .session
            .payment_method
            .ok_or(AppError::PaymentMethodMissing)?;

        let (Some(date), Some(time)) = (self.session.date, self.session.time.as_deref()) else {
            return Err(AppError::InvalidDateTime);
        };
        let time = NaiveTime::parse_from_str(time, "%H:%M").map_err(|_| AppError::InvalidDateTime)?;

        let total = total_duration(service);
        let start_at = to_utc(&self.context.tenant, date.and_time(time));
        let end_at = Duration::try_minutes(total)
            .and_then(|span| start_at.checked_add_signed(span))
            .ok_or(AppError::InvalidDateTime)?;
        let duration_minutes = i32::try_from(total).map_err(|_| AppError::InvalidDateTime)?;

        Ok(NewAppointment {
            tenant_id: self.context.tenant.id,
            service_id: service.id,
            employee_id,
            customer_id: client.customer_id,
            start_at,
            end_at,
            duration_minutes,
            price: service.price,
            currency: service.currency.clone(),
            status: AppointmentStatus::Scheduled,
            channel: CHANNEL_PUBLIC_PORTAL.to_string(),
            metadata: json!({
                "payment_method": method.as_str(),
                "booking_source": BOOKING_SOURCE,
            }),
        })
    }

    async fn book(&mut self) -> Result<Appointment, AppError> {
        let new = self.build_appointment()?;

        match self
            .store
            .insert_appointment(new, self.context.tenant.scheduling_type)
            .await
        {
            Ok(appointment) => Ok(appointment),
            Err(AppError::SlotUnavailable) => {
                // Alguém levou o horário: atualiza a foto para a volta ao passo de data
                if let Err(e) = self.refresh_appointments().await {
                    tracing::warn!("Falha ao atualizar agenda do funil {}: {}", self.id, e);
                }
                Err(AppError::SlotUnavailable)
            }
            Err(e) => Err(e),
        }
    }

    pub fn snapshot(&self) -> FunnelSnapshot {
        FunnelSnapshot {
            session_id: self.id,
            step: self.step,
            guards: self.guards(),
            selection: self.session.clone(),
            available_slots: self.available_slots(),
        }
    }
}
