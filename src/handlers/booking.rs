// src/handlers/booking.rs
// Rotas públicas do portal de agendamento: /api/public/{slug}/...

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::{
        booking::{FunnelSnapshot, PaymentMethod},
        catalog::{Employee, Service},
        crm::{CustomerLoginPayload, IdentityLookupPayload, RegisterCustomerPayload},
        tenancy::SchedulingType,
    },
    services::{
        availability::{get_buffer, total_duration, BufferKind},
        booking_funnel::{BookingContext, BookingFunnel},
        identity_service::IdentityBranch,
    },
};

// =============================================================================
//  RESPOSTAS
// =============================================================================

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicTenant {
    pub slug: String,
    pub name: String,
    pub whatsapp: Option<String>,
    pub scheduling_type: SchedulingType,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServiceView {
    #[serde(flatten)]
    pub service: Service,
    pub buffer_before: i64,
    pub buffer_after: i64,
    pub total_duration_minutes: i64,
}

impl From<&Service> for ServiceView {
    fn from(service: &Service) -> Self {
        Self {
            service: service.clone(),
            buffer_before: get_buffer(Some(service), BufferKind::Before),
            buffer_after: get_buffer(Some(service), BufferKind::After),
            total_duration_minutes: total_duration(service),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotsResponse {
    pub date: NaiveDate,
    #[schema(example = json!(["09:00", "09:15"]))]
    pub slots: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LookupResponse {
    pub branch: IdentityBranch,
}

// =============================================================================
//  CONSULTAS SEM SESSÃO
// =============================================================================

async fn load_context(app_state: &AppState, slug: &str) -> Result<BookingContext, AppError> {
    BookingContext::load(app_state.store.as_ref(), slug).await
}

// GET /api/public/{slug}
#[utoipa::path(
    get,
    path = "/api/public/{slug}",
    tag = "Public Booking",
    responses(
        (status = 200, description = "Perfil público do estabelecimento", body = PublicTenant),
        (status = 404, description = "Estabelecimento não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento")
    )
)]
pub async fn get_tenant(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let tenant = app_state
        .store
        .find_tenant_by_slug(&slug)
        .await
        .and_then(|t| t.ok_or(AppError::TenantNotFound(slug.clone())))
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(Json(PublicTenant {
        slug: tenant.slug,
        name: tenant.name,
        whatsapp: tenant.whatsapp,
        scheduling_type: tenant.scheduling_type,
    }))
}

// GET /api/public/{slug}/services
#[utoipa::path(
    get,
    path = "/api/public/{slug}/services",
    tag = "Public Booking",
    responses(
        (status = 200, description = "Serviços ativos com duração total", body = [ServiceView]),
        (status = 404, description = "Estabelecimento não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento")
    )
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let context = load_context(&app_state, &slug)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    let services: Vec<ServiceView> = context.services.iter().map(ServiceView::from).collect();
    Ok(Json(services))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeesQuery {
    pub service_id: Option<Uuid>,
}

// GET /api/public/{slug}/employees?serviceId=
#[utoipa::path(
    get,
    path = "/api/public/{slug}/employees",
    tag = "Public Booking",
    responses(
        (status = 200, description = "Profissionais aptos com agenda semanal", body = [Employee]),
        (status = 404, description = "Estabelecimento ou serviço não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("serviceId" = Option<Uuid>, Query, description = "Filtra quem realiza o serviço")
    )
)]
pub async fn list_employees(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
    Query(query): Query<EmployeesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let context = load_context(&app_state, &slug)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    let service = match query.service_id {
        Some(id) => Some(
            context
                .service(id)
                .ok_or_else(|| AppError::ServiceNotFound.to_api_error(&locale))?,
        ),
        None => None,
    };

    let employees: Vec<Employee> = context
        .eligible_employees(service)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(employees))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsQuery {
    pub service_id: Uuid,
    pub employee_id: Uuid,
    pub date: NaiveDate,
}

// GET /api/public/{slug}/slots?serviceId=&employeeId=&date=YYYY-MM-DD
#[utoipa::path(
    get,
    path = "/api/public/{slug}/slots",
    tag = "Public Booking",
    responses(
        (status = 200, description = "Horários livres do dia", body = SlotsResponse),
        (status = 404, description = "Estabelecimento, serviço ou profissional não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("serviceId" = Uuid, Query, description = "ID do serviço"),
        ("employeeId" = Uuid, Query, description = "ID do profissional"),
        ("date" = NaiveDate, Query, description = "Dia no formato YYYY-MM-DD")
    )
)]
pub async fn list_slots(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
    Query(query): Query<SlotsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let context = load_context(&app_state, &slug)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    if context.service(query.service_id).is_none() {
        return Err(AppError::ServiceNotFound.to_api_error(&locale));
    }
    if context.employee(query.employee_id).is_none() {
        return Err(AppError::EmployeeNotFound.to_api_error(&locale));
    }

    let appointments = app_state
        .store
        .list_appointments_around(&context.tenant, query.date)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    let slots = context.slots(
        Some(query.service_id),
        Some(query.employee_id),
        Some(query.date),
        &appointments,
    );

    Ok(Json(SlotsResponse {
        date: query.date,
        slots,
    }))
}

// =============================================================================
//  SESSÕES DO FUNIL
// =============================================================================

// POST /api/public/{slug}/sessions
#[utoipa::path(
    post,
    path = "/api/public/{slug}/sessions",
    tag = "Booking Funnel",
    responses(
        (status = 201, description = "Sessão aberta na etapa service", body = FunnelSnapshot),
        (status = 404, description = "Estabelecimento não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento")
    )
)]
pub async fn open_session(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let context = load_context(&app_state, &slug)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    let funnel = BookingFunnel::new(
        Arc::new(context),
        app_state.store.clone(),
        app_state.identity_service.clone(),
    );
    let snapshot = funnel.snapshot();
    app_state.sessions.insert(funnel);

    tracing::info!("🆕 Sessão de agendamento {} aberta em {}", snapshot.session_id, slug);
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// Busca a sessão e confere se ela pertence ao slug da URL.
async fn lock_session(
    app_state: &AppState,
    slug: &str,
    session_id: Uuid,
) -> Result<OwnedMutexGuard<BookingFunnel>, AppError> {
    let shared = app_state
        .sessions
        .get(session_id)
        .ok_or(AppError::SessionNotFound)?;
    let funnel = shared.lock_owned().await;

    if funnel.tenant().slug != slug {
        return Err(AppError::SessionNotFound);
    }
    Ok(funnel)
}

// GET /api/public/{slug}/sessions/{id}
#[utoipa::path(
    get,
    path = "/api/public/{slug}/sessions/{id}",
    tag = "Booking Funnel",
    responses(
        (status = 200, description = "Estado atual do funil", body = FunnelSnapshot),
        (status = 404, description = "Sessão expirada ou inexistente")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn get_session(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(Json(funnel.snapshot()))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectServicePayload {
    pub service_id: Uuid,
}

// PUT /api/public/{slug}/sessions/{id}/service
#[utoipa::path(
    put,
    path = "/api/public/{slug}/sessions/{id}/service",
    tag = "Booking Funnel",
    request_body = SelectServicePayload,
    responses(
        (status = 200, description = "Estado atual do funil", body = FunnelSnapshot),
        (status = 404, description = "Sessão ou serviço não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn select_service(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
    Json(payload): Json<SelectServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    funnel
        .select_service(payload.service_id)
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(Json(funnel.snapshot()))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectEmployeePayload {
    pub employee_id: Uuid,
}

// PUT /api/public/{slug}/sessions/{id}/employee
#[utoipa::path(
    put,
    path = "/api/public/{slug}/sessions/{id}/employee",
    tag = "Booking Funnel",
    request_body = SelectEmployeePayload,
    responses(
        (status = 200, description = "Estado atual do funil", body = FunnelSnapshot),
        (status = 400, description = "Profissional não atende o serviço"),
        (status = 404, description = "Sessão ou profissional não encontrado")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn select_employee(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
    Json(payload): Json<SelectEmployeePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    funnel
        .select_employee(payload.employee_id)
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(Json(funnel.snapshot()))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectDatePayload {
    pub date: NaiveDate,
}

// PUT /api/public/{slug}/sessions/{id}/date
#[utoipa::path(
    put,
    path = "/api/public/{slug}/sessions/{id}/date",
    tag = "Booking Funnel",
    request_body = SelectDatePayload,
    responses(
        (status = 200, description = "Data escolhida e horários recalculados", body = FunnelSnapshot),
        (status = 404, description = "Sessão expirada ou inexistente")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn select_date(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
    Json(payload): Json<SelectDatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    funnel
        .select_date(payload.date)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(Json(funnel.snapshot()))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectTimePayload {
    #[schema(example = "09:30")]
    pub time: String,
}

// PUT /api/public/{slug}/sessions/{id}/time
#[utoipa::path(
    put,
    path = "/api/public/{slug}/sessions/{id}/time",
    tag = "Booking Funnel",
    request_body = SelectTimePayload,
    responses(
        (status = 200, description = "Estado atual do funil", body = FunnelSnapshot),
        (status = 409, description = "Horário indisponível"),
        (status = 404, description = "Sessão expirada ou inexistente")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn select_time(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
    Json(payload): Json<SelectTimePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    funnel
        .select_time(&payload.time)
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(Json(funnel.snapshot()))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SelectPaymentPayload {
    pub payment_method: PaymentMethod,
}

// PUT /api/public/{slug}/sessions/{id}/payment-method
#[utoipa::path(
    put,
    path = "/api/public/{slug}/sessions/{id}/payment-method",
    tag = "Booking Funnel",
    request_body = SelectPaymentPayload,
    responses(
        (status = 200, description = "Estado atual do funil", body = FunnelSnapshot),
        (status = 404, description = "Sessão expirada ou inexistente")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn select_payment_method(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
    Json(payload): Json<SelectPaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    funnel.select_payment_method(payload.payment_method);
    Ok(Json(funnel.snapshot()))
}

// POST /api/public/{slug}/sessions/{id}/identity/lookup
#[utoipa::path(
    post,
    path = "/api/public/{slug}/sessions/{id}/identity/lookup",
    tag = "Booking Funnel",
    request_body = IdentityLookupPayload,
    responses(
        (status = 200, description = "Login ou cadastro", body = LookupResponse),
        (status = 400, description = "CPF inválido"),
        (status = 409, description = "Fora da etapa de identificação"),
        (status = 404, description = "Sessão expirada ou inexistente")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn lookup_identity(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
    Json(payload): Json<IdentityLookupPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    let branch = funnel
        .lookup_identity(&payload.document_number)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(Json(LookupResponse { branch }))
}

// POST /api/public/{slug}/sessions/{id}/identity/login
#[utoipa::path(
    post,
    path = "/api/public/{slug}/sessions/{id}/identity/login",
    tag = "Booking Funnel",
    request_body = CustomerLoginPayload,
    responses(
        (status = 200, description = "Cliente identificado", body = FunnelSnapshot),
        (status = 401, description = "CPF ou senha inválidos"),
        (status = 409, description = "Fora da etapa de identificação"),
        (status = 404, description = "Sessão expirada ou inexistente")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
    Json(payload): Json<CustomerLoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    funnel
        .login(&payload.document_number, &payload.password)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(Json(funnel.snapshot()))
}

// POST /api/public/{slug}/sessions/{id}/identity/register
#[utoipa::path(
    post,
    path = "/api/public/{slug}/sessions/{id}/identity/register",
    tag = "Booking Funnel",
    request_body = RegisterCustomerPayload,
    responses(
        (status = 201, description = "Cliente cadastrado e identificado", body = FunnelSnapshot),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "CPF ou e-mail já cadastrado, ou fora da etapa de identificação"),
        (status = 404, description = "Sessão expirada ou inexistente")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
    Json(payload): Json<RegisterCustomerPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    funnel
        .register(&payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(funnel.snapshot())))
}

// POST /api/public/{slug}/sessions/{id}/next
#[utoipa::path(
    post,
    path = "/api/public/{slug}/sessions/{id}/next",
    tag = "Booking Funnel",
    responses(
        (status = 200, description = "Etapa seguinte (ou a mesma, se a guarda não permitir)", body = FunnelSnapshot),
        (status = 409, description = "O horário foi reservado por outra pessoa"),
        (status = 404, description = "Sessão expirada ou inexistente")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn next_step(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    funnel
        .next()
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    Ok(Json(funnel.snapshot()))
}

// POST /api/public/{slug}/sessions/{id}/back
#[utoipa::path(
    post,
    path = "/api/public/{slug}/sessions/{id}/back",
    tag = "Booking Funnel",
    responses(
        (status = 200, description = "Etapa anterior", body = FunnelSnapshot),
        (status = 404, description = "Sessão expirada ou inexistente")
    ),
    params(
        ("slug" = String, Path, description = "Slug público do estabelecimento"),
        ("id" = Uuid, Path, description = "ID da sessão de agendamento")
    )
)]
pub async fn previous_step(
    State(app_state): State<AppState>,
    locale: Locale,
    Path((slug, session_id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let mut funnel = lock_session(&app_state, &slug, session_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale))?;

    funnel.back();
    Ok(Json(funnel.snapshot()))
}
