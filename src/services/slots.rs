// src/services/slots.rs
// Geração de horários livres e detecção de conflito com a agenda existente.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::{
    common::clock::{format_minutes, parse_minutes, time_from_minutes},
    models::{
        appointments::{Appointment, AppointmentStatus},
        catalog::{Employee, Service},
        tenancy::{SchedulingType, Tenant},
    },
    services::availability::total_duration,
};

/// Granularidade fixa em que os inícios candidatos são testados.
pub const SLOT_STEP_MINUTES: i64 = 15;

// ---
// Conversões de fuso (horário de parede do salão <-> UTC)
// ---

pub fn to_local(tenant: &Tenant, instant: DateTime<Utc>) -> NaiveDateTime {
    instant.with_timezone(&tenant.local_offset()).naive_local()
}

pub fn to_utc(tenant: &Tenant, local: NaiveDateTime) -> DateTime<Utc> {
    let offset = i64::from(tenant.local_offset().local_minus_utc());
    (local - Duration::seconds(offset)).and_utc()
}

// =========================================================================
//  DETECTOR DE CONFLITOS
// =========================================================================

/// Diz se o intervalo `[candidate_start, candidate_start + total_minutes)`
/// (horário local do salão) esbarra em algum agendamento do mesmo dia.
///
/// Em modo `individual` só contam agendamentos do próprio profissional; em
/// `shared` qualquer agendamento do tenant bloqueia. Agendamentos sem fim
/// nem duração usam a duração do serviço deles no `catalog`, e por último
/// `fallback_minutes`.
pub fn has_conflict(
    candidate_start: NaiveDateTime,
    total_minutes: i64,
    employee_id: Uuid,
    tenant: &Tenant,
    existing: &[Appointment],
    catalog: &[Service],
    fallback_minutes: i64,
) -> bool {
    let date = candidate_start.date();
    // Intervalo que nem cabe no calendário não é oferecido
    let Some(candidate_end) = Duration::try_minutes(total_minutes)
        .and_then(|span| candidate_start.checked_add_signed(span))
    else {
        return true;
    };

    existing.iter().any(|appt| {
        if appt.tenant_id != tenant.id || appt.status == AppointmentStatus::Cancelled {
            return false;
        }

        let existing_start = to_local(tenant, appt.start_at);
        if existing_start.date() != date {
            return false;
        }

        let service_minutes = catalog
            .iter()
            .find(|s| s.id == appt.service_id)
            .map(|s| i64::from(s.duration_minutes))
            .unwrap_or(fallback_minutes);
        let existing_end = to_local(tenant, appt.effective_end(service_minutes));

        // Intervalos semiabertos: encostar no fim não é conflito
        let overlaps = candidate_start < existing_end && candidate_end > existing_start;
        if !overlaps {
            return false;
        }

        match tenant.scheduling_type {
            SchedulingType::Individual => appt.employee_id == employee_id,
            SchedulingType::Shared => true,
        }
    })
}

// =========================================================================
//  GERADOR DE HORÁRIOS
// =========================================================================

/// Entradas do gerador. Tudo emprestado: gerar não altera nada.
#[derive(Debug, Clone, Copy)]
pub struct SlotQuery<'a> {
    pub tenant: &'a Tenant,
    pub service: Option<&'a Service>,
    pub employee: Option<&'a Employee>,
    pub date: Option<NaiveDate>,
    pub existing: &'a [Appointment],
    pub catalog: &'a [Service],
}

/// Horários "HH:MM" em que o serviço inteiro (com buffers) cabe no turno e
/// não conflita com a agenda. Turnos são ordenados pelo início antes da
/// varredura, então a saída sai em ordem cronológica.
pub fn generate_slots(query: SlotQuery<'_>) -> Vec<String> {
    let (Some(service), Some(employee), Some(date)) = (query.service, query.employee, query.date)
    else {
        return Vec::new();
    };

    let total = total_duration(service);
    let day_shifts = employee.working_hours.shifts(date.weekday());
    if day_shifts.is_empty() {
        return Vec::new();
    }

    let mut shifts: Vec<(i64, i64)> = day_shifts
        .iter()
        .filter_map(|shift| match (parse_minutes(&shift.start), parse_minutes(&shift.end)) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => {
                tracing::warn!(
                    "Turno inválido ignorado ({} - {}) para o profissional {}",
                    shift.start,
                    shift.end,
                    employee.id()
                );
                None
            }
        })
        .collect();
    shifts.sort_by_key(|(start, _)| *start);

    let mut slots = Vec::new();
    for (shift_start, shift_end) in shifts {
        let mut minute = shift_start;
        while minute < shift_end && minute.checked_add(total).is_some_and(|end| end <= shift_end) {
            if let Some(time) = time_from_minutes(minute) {
                let candidate = date.and_time(time);
                let taken = has_conflict(
                    candidate,
                    total,
                    employee.id(),
                    query.tenant,
                    query.existing,
                    query.catalog,
                    i64::from(service.duration_minutes),
                );
                if !taken {
                    slots.push(format_minutes(minute));
                }
            }
            minute += SLOT_STEP_MINUTES;
        }
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::models::{
        catalog::StaffMember,
        scheduling::{ShiftWindow, WeeklySchedule},
    };

    // 2024-01-01 foi uma segunda-feira
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn tenant(mode: SchedulingType) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            slug: "studio-bela".into(),
            name: "Studio Bela".into(),
            whatsapp: None,
            scheduling_type: mode,
            utc_offset_minutes: -180,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service(tenant: &Tenant, duration: i32, before: i64, after: i64) -> Service {
        Service {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            name: "Escova".into(),
            description: None,
            duration_minutes: duration,
            price: Decimal::new(8000, 2),
            currency: "BRL".into(),
            metadata: Some(json!({ "bufferBefore": before, "bufferAfter": after })),
            is_active: true,
        }
    }

    fn employee(tenant: &Tenant, monday_shifts: Vec<ShiftWindow>) -> Employee {
        Employee {
            profile: StaffMember {
                id: Uuid::new_v4(),
                tenant_id: tenant.id,
                name: "Joana".into(),
                specialties: vec![],
                is_active: true,
            },
            working_hours: WeeklySchedule {
                monday: monday_shifts,
                ..WeeklySchedule::default()
            },
        }
    }

    fn appointment(
        tenant: &Tenant,
        service: &Service,
        employee_id: Uuid,
        local_start: &str,
        minutes: i32,
    ) -> Appointment {
        let start = monday().and_time(chrono::NaiveTime::parse_from_str(local_start, "%H:%M").unwrap());
        Appointment {
            id: Uuid::new_v4(),
            tenant_id: tenant.id,
            service_id: service.id,
            employee_id,
            customer_id: None,
            start_at: to_utc(tenant, start),
            end_at: None,
            duration_minutes: Some(minutes),
            status: AppointmentStatus::Scheduled,
            channel: "public_portal".into(),
            price: None,
            currency: None,
            metadata: json!({}),
            created_at: Utc::now(),
        }
    }

    fn slots_for(
        tenant: &Tenant,
        service: &Service,
        employee: &Employee,
        existing: &[Appointment],
    ) -> Vec<String> {
        let catalog = vec![service.clone()];
        generate_slots(SlotQuery {
            tenant,
            service: Some(service),
            employee: Some(employee),
            date: Some(monday()),
            existing,
            catalog: &catalog,
        })
    }

    #[test]
    fn end_to_end_morning_shift() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 60, 0, 15);
        let employee = employee(&tenant, vec![ShiftWindow::new("09:00", "12:00")]);

        let slots = slots_for(&tenant, &service, &employee, &[]);

        assert_eq!(
            slots,
            vec!["09:00", "09:15", "09:30", "09:45", "10:00", "10:15", "10:30", "10:45"]
        );
    }

    #[test]
    fn extreme_buffers_offer_nothing_without_panicking() {
        let tenant = tenant(SchedulingType::Individual);
        let employee = employee(&tenant, vec![ShiftWindow::new("09:00", "12:00")]);

        let mut huge = service(&tenant, 60, 0, 0);
        huge.metadata = Some(json!({ "bufferAfter": 1e20 }));
        assert!(slots_for(&tenant, &huge, &employee, &[]).is_empty());

        let mut negative = service(&tenant, 60, 0, 0);
        negative.metadata = Some(json!({ "bufferBefore": "-1e12" }));
        assert!(slots_for(&tenant, &negative, &employee, &[]).is_empty());
    }

    #[test]
    fn unrepresentable_interval_counts_as_taken() {
        let tenant = tenant(SchedulingType::Individual);
        let candidate = monday().and_hms_opt(9, 0, 0).unwrap();

        assert!(has_conflict(candidate, i64::MAX, Uuid::new_v4(), &tenant, &[], &[], 60));
        assert!(!has_conflict(candidate, 60, Uuid::new_v4(), &tenant, &[], &[], 60));
    }

    #[test]
    fn slots_sit_on_the_step_grid_and_fit_the_shift() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 50, 5, 0);
        let employee = employee(&tenant, vec![ShiftWindow::new("08:10", "13:00")]);

        let slots = slots_for(&tenant, &service, &employee, &[]);
        assert!(!slots.is_empty());

        for slot in slots {
            let minute = parse_minutes(&slot).unwrap();
            assert_eq!((minute - 490) % SLOT_STEP_MINUTES, 0);
            assert!(minute + 55 <= 780);
        }
    }

    #[test]
    fn missing_inputs_yield_nothing() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 30, 0, 0);
        let employee = employee(&tenant, vec![ShiftWindow::new("09:00", "12:00")]);

        let query = SlotQuery {
            tenant: &tenant,
            service: Some(&service),
            employee: Some(&employee),
            date: None,
            existing: &[],
            catalog: &[],
        };
        assert!(generate_slots(query).is_empty());
        assert!(generate_slots(SlotQuery { service: None, date: Some(monday()), ..query }).is_empty());
        assert!(generate_slots(SlotQuery { employee: None, date: Some(monday()), ..query }).is_empty());
    }

    #[test]
    fn day_without_shifts_is_empty() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 30, 0, 0);
        let employee = employee(&tenant, vec![ShiftWindow::new("09:00", "12:00")]);
        let tuesday = monday().succ_opt().unwrap();

        let slots = generate_slots(SlotQuery {
            tenant: &tenant,
            service: Some(&service),
            employee: Some(&employee),
            date: Some(tuesday),
            existing: &[],
            catalog: &[],
        });
        assert!(slots.is_empty());
    }

    #[test]
    fn individual_mode_ignores_other_employees() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 60, 0, 0);
        let ana = employee(&tenant, vec![ShiftWindow::new("09:00", "12:00")]);
        let bruno = employee(&tenant, vec![ShiftWindow::new("09:00", "12:00")]);
        let booked = vec![appointment(&tenant, &service, ana.id(), "10:00", 60)];

        let for_bruno = slots_for(&tenant, &service, &bruno, &booked);
        assert!(for_bruno.contains(&"10:00".to_string()));

        let for_ana = slots_for(&tenant, &service, &ana, &booked);
        assert!(!for_ana.contains(&"10:00".to_string()));
    }

    #[test]
    fn shared_mode_blocks_everyone() {
        let tenant = tenant(SchedulingType::Shared);
        let service = service(&tenant, 60, 0, 0);
        let ana = employee(&tenant, vec![ShiftWindow::new("09:00", "12:00")]);
        let bruno = employee(&tenant, vec![ShiftWindow::new("09:00", "12:00")]);
        let booked = vec![appointment(&tenant, &service, ana.id(), "10:00", 60)];

        let for_bruno = slots_for(&tenant, &service, &bruno, &booked);
        assert!(!for_bruno.contains(&"10:00".to_string()));
        // 09:00 termina exatamente às 10:00 e continua livre
        assert!(for_bruno.contains(&"09:00".to_string()));
        assert!(for_bruno.contains(&"11:00".to_string()));
    }

    #[test]
    fn buffers_count_towards_conflicts() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 30, 10, 5);
        let employee_id = Uuid::new_v4();
        // reservado às 10:00 com 45 minutos totais: [10:00, 10:45)
        let booked = vec![appointment(&tenant, &service, employee_id, "10:00", 45)];
        let catalog = vec![service.clone()];

        let at = |hh: u32, mm: u32| monday().and_hms_opt(hh, mm, 0).unwrap();

        assert!(has_conflict(at(10, 40), 45, employee_id, &tenant, &booked, &catalog, 30));
        assert!(!has_conflict(at(10, 45), 45, employee_id, &tenant, &booked, &catalog, 30));
        // termina às 10:00 em ponto
        assert!(!has_conflict(at(9, 15), 45, employee_id, &tenant, &booked, &catalog, 30));
    }

    #[test]
    fn missing_duration_falls_back_to_the_service() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 60, 0, 0);
        let employee_id = Uuid::new_v4();
        let mut appt = appointment(&tenant, &service, employee_id, "10:00", 0);
        appt.duration_minutes = None;
        let catalog = vec![service.clone()];
        let at = |hh: u32, mm: u32| monday().and_hms_opt(hh, mm, 0).unwrap();

        assert!(has_conflict(at(10, 30), 15, employee_id, &tenant, &[appt.clone()], &catalog, 5));
        // fora do catálogo usa o fallback de 5 minutos
        assert!(!has_conflict(at(10, 30), 15, employee_id, &tenant, &[appt], &[], 5));
    }

    #[test]
    fn explicit_end_wins_over_duration() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 60, 0, 0);
        let employee_id = Uuid::new_v4();
        let mut appt = appointment(&tenant, &service, employee_id, "10:00", 60);
        appt.end_at = Some(appt.start_at + Duration::minutes(15));
        let at = |hh: u32, mm: u32| monday().and_hms_opt(hh, mm, 0).unwrap();

        assert!(!has_conflict(at(10, 15), 30, employee_id, &tenant, &[appt], &[], 60));
    }

    #[test]
    fn other_days_tenants_and_cancellations_do_not_block() {
        let tenant = tenant(SchedulingType::Shared);
        let service = service(&tenant, 60, 0, 0);
        let employee = employee(&tenant, vec![ShiftWindow::new("09:00", "12:00")]);

        let mut next_day = appointment(&tenant, &service, employee.id(), "10:00", 60);
        next_day.start_at += Duration::days(1);
        let mut other_tenant = appointment(&tenant, &service, employee.id(), "10:00", 60);
        other_tenant.tenant_id = Uuid::new_v4();
        let mut cancelled = appointment(&tenant, &service, employee.id(), "10:00", 60);
        cancelled.status = AppointmentStatus::Cancelled;

        let slots = slots_for(&tenant, &service, &employee, &[next_day, other_tenant, cancelled]);
        assert!(slots.contains(&"10:00".to_string()));
    }

    #[test]
    fn local_calendar_day_is_used() {
        // 23:30 de domingo em Brasília já é segunda em UTC: não pode bloquear segunda.
        let tenant = tenant(SchedulingType::Shared);
        let service = service(&tenant, 30, 0, 0);
        let employee = employee(&tenant, vec![ShiftWindow::new("00:00", "01:00")]);
        let mut late_sunday = appointment(&tenant, &service, employee.id(), "23:30", 90);
        late_sunday.start_at -= Duration::days(1);

        let slots = slots_for(&tenant, &service, &employee, &[late_sunday]);
        assert!(slots.contains(&"00:00".to_string()));
    }

    #[test]
    fn shifts_are_sorted_before_generation() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 60, 0, 0);
        let employee = employee(
            &tenant,
            vec![
                ShiftWindow::new("14:00", "15:00"),
                ShiftWindow::new("08:00", "09:00"),
            ],
        );

        assert_eq!(slots_for(&tenant, &service, &employee, &[]), vec!["08:00", "14:00"]);
    }

    #[test]
    fn generation_is_idempotent() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 45, 5, 10);
        let employee = employee(
            &tenant,
            vec![ShiftWindow::new("09:00", "12:00"), ShiftWindow::new("13:00", "18:00")],
        );
        let booked = vec![appointment(&tenant, &service, employee.id(), "14:00", 60)];

        let first = slots_for(&tenant, &service, &employee, &booked);
        let second = slots_for(&tenant, &service, &employee, &booked);
        assert_eq!(first, second);
    }

    #[test]
    fn service_longer_than_shift_has_no_slots() {
        let tenant = tenant(SchedulingType::Individual);
        let service = service(&tenant, 120, 0, 0);
        let employee = employee(&tenant, vec![ShiftWindow::new("09:00", "10:00")]);

        assert!(slots_for(&tenant, &service, &employee, &[]).is_empty());
    }
}
