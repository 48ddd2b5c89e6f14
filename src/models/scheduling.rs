// src/models/scheduling.rs

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Um turno contínuo de trabalho, em "HH:MM".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShiftWindow {
    #[schema(example = "09:00")]
    pub start: String,
    #[schema(example = "18:00")]
    pub end: String,
}

impl ShiftWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

// Agenda semanal: uma lista de turnos por dia.
// Turnos do mesmo dia podem vir fora de ordem (o gerador de horários ordena).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct WeeklySchedule {
    pub sunday: Vec<ShiftWindow>,
    pub monday: Vec<ShiftWindow>,
    pub tuesday: Vec<ShiftWindow>,
    pub wednesday: Vec<ShiftWindow>,
    pub thursday: Vec<ShiftWindow>,
    pub friday: Vec<ShiftWindow>,
    pub saturday: Vec<ShiftWindow>,
}

impl WeeklySchedule {
    pub fn shifts(&self, weekday: Weekday) -> &[ShiftWindow] {
        match weekday {
            Weekday::Sun => &self.sunday,
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
        }
    }

    pub fn shifts_mut(&mut self, weekday: Weekday) -> &mut Vec<ShiftWindow> {
        match weekday {
            Weekday::Sun => &mut self.sunday,
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
        }
    }

    pub fn is_empty(&self) -> bool {
        ALL_WEEKDAYS.iter().all(|d| self.shifts(*d).is_empty())
    }
}

/// Índice 0 = domingo, igual à coluna `weekday` do banco.
pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub fn weekday_from_index(index: i16) -> Option<Weekday> {
    usize::try_from(index)
        .ok()
        .and_then(|i| ALL_WEEKDAYS.get(i).copied())
}
