//! Record types for tracked activities.

use chrono::{NaiveDate, NaiveDateTime};

/// Child's gender, as picked during registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Boy,
    Girl,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Boy => "boy",
            Gender::Girl => "girl",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "girl" => Gender::Girl,
            _ => Gender::Boy,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Boy => "👦 Boy",
            Gender::Girl => "👧 Girl",
        }
    }
}

/// What was in the diaper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiaperKind {
    Wet,
    Stool,
    Both,
}

impl DiaperKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiaperKind::Wet => "wet",
            DiaperKind::Stool => "stool",
            DiaperKind::Both => "both",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "stool" => DiaperKind::Stool,
            "both" => DiaperKind::Both,
            _ => DiaperKind::Wet,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DiaperKind::Wet => "💦 Wet",
            DiaperKind::Stool => "💩 Stool",
            DiaperKind::Both => "💦💩 Both",
        }
    }
}

/// A registered child. One per chat; the chat id is the tenant key.
#[derive(Debug, Clone)]
pub struct Child {
    pub id: i64,
    pub chat_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub gestation_weeks: u8,
    pub gestation_days: u8,
    pub birth_weight_g: f64,
    pub birth_height_cm: i64,
    pub registered_at: NaiveDateTime,
}

impl Child {
    /// "First Last" or just "First".
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// Payload collected by the registration wizard.
#[derive(Debug, Clone)]
pub struct NewChild {
    pub first_name: String,
    pub last_name: Option<String>,
    pub gender: Gender,
    pub birth_date: NaiveDate,
    pub gestation_weeks: u8,
    pub gestation_days: u8,
    pub birth_weight_g: f64,
    pub birth_height_cm: i64,
}

/// A feeding interval. Active while `ended_at` is unset.
#[derive(Debug, Clone)]
pub struct Feeding {
    pub id: i64,
    pub chat_id: i64,
    pub child_id: i64,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
    pub prepared_ml: Option<i64>,
    pub total_eaten_ml: Option<i64>,
}

/// A completed feeding as shown in daily summaries.
#[derive(Debug, Clone)]
pub struct FeedingRecord {
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
    pub total_eaten_ml: i64,
}

/// An open sleep or wake interval.
#[derive(Debug, Clone)]
pub struct OpenInterval {
    pub id: i64,
    pub child_id: i64,
    pub started_at: NaiveDateTime,
}

/// A just-closed interval with its computed duration.
#[derive(Debug, Clone, Copy)]
pub struct ClosedInterval {
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
    pub minutes: i64,
}

/// A growth measurement.
#[derive(Debug, Clone)]
pub struct Measurement {
    pub id: i64,
    pub child_id: i64,
    pub weight_g: f64,
    pub height_cm: i64,
    pub measured_on: NaiveDate,
    pub age_days: i64,
    pub recorded_at: NaiveDateTime,
}

/// A free-text journal note.
#[derive(Debug, Clone)]
pub struct JournalNote {
    pub id: i64,
    pub child_id: i64,
    pub note: String,
    pub category: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A measurement reminder joined with its child, ready for delivery.
#[derive(Debug, Clone)]
pub struct DueReminder {
    pub id: i64,
    pub chat_id: i64,
    pub child_id: i64,
    pub first_name: String,
    pub birth_date: NaiveDate,
}

/// Per-day feeding totals (today or one row of the weekly breakdown).
#[derive(Debug, Clone, Default)]
pub struct FeedingDayStats {
    pub count: i64,
    pub total_ml: i64,
}

/// One day of the weekly feeding history.
#[derive(Debug, Clone)]
pub struct FeedingDayTotal {
    pub date: NaiveDate,
    pub count: i64,
    pub total_ml: i64,
}

/// Count/total/average over completed sleep or wake intervals for one day.
#[derive(Debug, Clone, Default)]
pub struct IntervalDayStats {
    pub count: i64,
    pub total_minutes: i64,
    pub avg_minutes: i64,
}

/// Per-kind diaper counts for one day.
#[derive(Debug, Clone)]
pub struct DiaperDayCount {
    pub kind: DiaperKind,
    pub count: i64,
    /// How many of those fell within the last three hours.
    pub recent: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_round_trip() {
        assert_eq!(Gender::from_str(Gender::Boy.as_str()), Gender::Boy);
        assert_eq!(Gender::from_str(Gender::Girl.as_str()), Gender::Girl);
    }

    #[test]
    fn test_diaper_kind_round_trip() {
        for kind in [DiaperKind::Wet, DiaperKind::Stool, DiaperKind::Both] {
            assert_eq!(DiaperKind::from_str(kind.as_str()), kind);
        }
    }

    #[test]
    fn test_full_name() {
        let mut child = Child {
            id: 1,
            chat_id: 100,
            first_name: "Mia".to_string(),
            last_name: Some("Lee".to_string()),
            gender: Gender::Girl,
            birth_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            gestation_weeks: 39,
            gestation_days: 3,
            birth_weight_g: 3200.0,
            birth_height_cm: 51,
            registered_at: NaiveDate::from_ymd_opt(2025, 5, 2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        };
        assert_eq!(child.full_name(), "Mia Lee");
        child.last_name = None;
        assert_eq!(child.full_name(), "Mia");
    }
}
