// src/services/availability.rs
// Buffers dos serviços e montagem da agenda semanal dos profissionais.

use std::collections::HashMap;

use chrono::Weekday;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    common::clock::truncate_hhmm,
    models::{
        catalog::{Employee, Service, StaffAvailability, StaffMember},
        scheduling::{weekday_from_index, ShiftWindow, WeeklySchedule},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Before,
    After,
}

impl BufferKind {
    pub fn metadata_key(&self) -> &'static str {
        match self {
            BufferKind::Before => "bufferBefore",
            BufferKind::After => "bufferAfter",
        }
    }
}

// =========================================================================
//  BUFFERS
// =========================================================================

/// Minutos de preparo/limpeza guardados no metadata do serviço.
/// Número vale como está (negativos não são validados), string é convertida
/// e qualquer outra coisa vira 0.
pub fn get_buffer(service: Option<&Service>, kind: BufferKind) -> i64 {
    let Some(value) = service
        .and_then(|s| s.metadata.as_ref())
        .and_then(|m| m.get(kind.metadata_key()))
    else {
        return 0;
    };

    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(|f| f as i64)
            .unwrap_or(0),
        _ => 0,
    }
}

/// Tempo total que o serviço ocupa na agenda: preparo + serviço + limpeza.
/// Buffers absurdos saturam em vez de estourar.
pub fn total_duration(service: &Service) -> i64 {
    get_buffer(Some(service), BufferKind::Before)
        .saturating_add(i64::from(service.duration_minutes))
        .saturating_add(get_buffer(Some(service), BufferKind::After))
}

// =========================================================================
//  AGENDA SEMANAL
// =========================================================================

/// Seg a sex, 09:00 às 18:00. Usada para quem ainda não configurou horários.
pub fn fallback_schedule() -> WeeklySchedule {
    let mut schedule = WeeklySchedule::default();
    for day in [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri] {
        schedule
            .shifts_mut(day)
            .push(ShiftWindow::new("09:00", "18:00"));
    }
    schedule
}

/// Agrupa as linhas de disponibilidade de UM profissional por dia da semana.
/// A ordem de entrada é mantida e sobreposições não são checadas.
pub fn build_schedule(rows: &[StaffAvailability]) -> WeeklySchedule {
    let mut schedule = WeeklySchedule::default();

    for row in rows {
        let Some(day) = weekday_from_index(row.weekday) else {
            tracing::warn!(
                "Linha de disponibilidade ignorada: weekday {} fora de 0..=6 (profissional {})",
                row.weekday,
                row.employee_id
            );
            continue;
        };

        schedule.shifts_mut(day).push(ShiftWindow::new(
            truncate_hhmm(&row.start_time),
            truncate_hhmm(&row.end_time),
        ));
    }

    if schedule.is_empty() {
        return fallback_schedule();
    }
    schedule
}

/// Monta os profissionais já com agenda, a partir das linhas de todo o tenant.
pub fn assemble_employees(
    staff: Vec<StaffMember>,
    availability: &[StaffAvailability],
) -> Vec<Employee> {
    let mut rows_by_employee: HashMap<Uuid, Vec<StaffAvailability>> = HashMap::new();
    for row in availability {
        rows_by_employee
            .entry(row.employee_id)
            .or_default()
            .push(row.clone());
    }

    staff
        .into_iter()
        .map(|profile| {
            let rows = rows_by_employee.remove(&profile.id).unwrap_or_default();
            Employee {
                working_hours: build_schedule(&rows),
                profile,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use serde_json::json;

    fn service_with_metadata(metadata: Option<Value>) -> Service {
        Service {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Corte".into(),
            description: None,
            duration_minutes: 30,
            price: Decimal::new(5000, 2),
            currency: "BRL".into(),
            metadata,
            is_active: true,
        }
    }

    fn row(employee_id: Uuid, weekday: i16, start: &str, end: &str) -> StaffAvailability {
        StaffAvailability {
            employee_id,
            weekday,
            start_time: start.into(),
            end_time: end.into(),
        }
    }

    #[test]
    fn string_buffer_is_parsed() {
        let service = service_with_metadata(Some(json!({ "bufferBefore": "15" })));
        assert_eq!(get_buffer(Some(&service), BufferKind::Before), 15);
    }

    #[test]
    fn missing_service_has_no_buffer() {
        assert_eq!(get_buffer(None, BufferKind::After), 0);
    }

    #[test]
    fn garbage_buffer_is_zero() {
        let service = service_with_metadata(Some(json!({ "bufferBefore": "abc" })));
        assert_eq!(get_buffer(Some(&service), BufferKind::Before), 0);

        let service = service_with_metadata(Some(json!({ "bufferAfter": [5] })));
        assert_eq!(get_buffer(Some(&service), BufferKind::After), 0);

        let service = service_with_metadata(None);
        assert_eq!(get_buffer(Some(&service), BufferKind::After), 0);
    }

    #[test]
    fn numeric_buffers_pass_through() {
        let service = service_with_metadata(Some(json!({ "bufferBefore": 0, "bufferAfter": -5 })));
        assert_eq!(get_buffer(Some(&service), BufferKind::Before), 0);
        assert_eq!(get_buffer(Some(&service), BufferKind::After), -5);
    }

    #[test]
    fn huge_buffers_saturate_instead_of_overflowing() {
        let service = service_with_metadata(Some(json!({ "bufferBefore": "1e300", "bufferAfter": 1e20 })));
        assert_eq!(get_buffer(Some(&service), BufferKind::After), i64::MAX);
        assert_eq!(total_duration(&service), i64::MAX);

        let service = service_with_metadata(Some(json!({ "bufferBefore": "-1e300" })));
        assert_eq!(total_duration(&service), i64::MIN + 30);
    }

    #[test]
    fn total_duration_adds_both_buffers() {
        let service =
            service_with_metadata(Some(json!({ "bufferBefore": 10, "bufferAfter": "5" })));
        assert_eq!(total_duration(&service), 45);
    }

    #[test]
    fn no_rows_gives_weekday_fallback() {
        let schedule = build_schedule(&[]);
        let expected = vec![ShiftWindow::new("09:00", "18:00")];

        assert_eq!(schedule.monday, expected);
        assert_eq!(schedule.tuesday, expected);
        assert_eq!(schedule.wednesday, expected);
        assert_eq!(schedule.thursday, expected);
        assert_eq!(schedule.friday, expected);
        assert!(schedule.saturday.is_empty());
        assert!(schedule.sunday.is_empty());
    }

    #[test]
    fn rows_are_grouped_and_truncated() {
        let id = Uuid::new_v4();
        let rows = vec![
            row(id, 1, "13:00:00", "18:00:00"),
            row(id, 1, "08:00:00", "12:00:00"),
            row(id, 6, "09:00", "13:00"),
        ];
        let schedule = build_schedule(&rows);

        // ordem de entrada preservada
        assert_eq!(
            schedule.monday,
            vec![
                ShiftWindow::new("13:00", "18:00"),
                ShiftWindow::new("08:00", "12:00"),
            ]
        );
        assert_eq!(schedule.saturday, vec![ShiftWindow::new("09:00", "13:00")]);
        assert!(schedule.tuesday.is_empty());
    }

    #[test]
    fn invalid_weekday_rows_are_ignored() {
        let id = Uuid::new_v4();
        let schedule = build_schedule(&[row(id, 9, "09:00", "10:00"), row(id, 2, "09:00", "10:00")]);
        assert_eq!(schedule.tuesday.len(), 1);
        assert!(schedule.monday.is_empty());
    }

    #[test]
    fn assemble_gives_fallback_only_to_unconfigured_staff() {
        let tenant_id = Uuid::new_v4();
        let configured = StaffMember {
            id: Uuid::new_v4(),
            tenant_id,
            name: "Bia".into(),
            specialties: vec![],
            is_active: true,
        };
        let legacy = StaffMember {
            id: Uuid::new_v4(),
            name: "Caio".into(),
            ..configured.clone()
        };
        let rows = vec![row(configured.id, 3, "10:00", "14:00")];

        let employees = assemble_employees(vec![configured.clone(), legacy.clone()], &rows);

        assert_eq!(employees[0].working_hours.wednesday.len(), 1);
        assert!(employees[0].working_hours.monday.is_empty());
        assert_eq!(employees[1].working_hours, fallback_schedule());
    }
}
