// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Portal público ---
        handlers::booking::get_tenant,
        handlers::booking::list_services,
        handlers::booking::list_employees,
        handlers::booking::list_slots,

        // --- Funil de agendamento ---
        handlers::booking::open_session,
        handlers::booking::get_session,
        handlers::booking::select_service,
        handlers::booking::select_employee,
        handlers::booking::select_date,
        handlers::booking::select_time,
        handlers::booking::select_payment_method,
        handlers::booking::lookup_identity,
        handlers::booking::login,
        handlers::booking::register,
        handlers::booking::next_step,
        handlers::booking::previous_step,
    ),
    components(
        schemas(
            // --- TENANCY ---
            models::tenancy::SchedulingType,
            handlers::booking::PublicTenant,

            // --- Catálogo ---
            models::catalog::Service,
            models::catalog::StaffMember,
            models::catalog::Employee,
            models::scheduling::ShiftWindow,
            models::scheduling::WeeklySchedule,
            handlers::booking::ServiceView,
            handlers::booking::SlotsResponse,

            // --- Funil ---
            models::booking::BookingStep,
            models::booking::PaymentMethod,
            models::booking::BookingSession,
            models::booking::GuardStatus,
            models::booking::FunnelSnapshot,

            // --- CRM ---
            models::crm::ClientIdentity,
            models::crm::IdentityLookupPayload,
            models::crm::CustomerLoginPayload,
            models::crm::RegisterCustomerPayload,
            crate::services::identity_service::IdentityBranch,
            handlers::booking::LookupResponse,

            // --- Payloads ---
            handlers::booking::SelectServicePayload,
            handlers::booking::SelectEmployeePayload,
            handlers::booking::SelectDatePayload,
            handlers::booking::SelectTimePayload,
            handlers::booking::SelectPaymentPayload,
        )
    ),
    tags(
        (name = "Public Booking", description = "Consultas públicas do estabelecimento (sem sessão)"),
        (name = "Booking Funnel", description = "Sessões do funil: serviço, profissional, horário, identificação e pagamento")
    )
)]
pub struct ApiDoc;
