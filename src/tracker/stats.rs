//! Derived statistics: age math, duration formatting, and the age-based
//! recommendation lookups used in replies.

use chrono::{Datelike, NaiveDate};

/// Calendar age split into years/months/days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeBreakdown {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl std::fmt::Display for AgeBreakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}y {}m {}d", self.years, self.months, self.days)
    }
}

/// Whole days since birth.
pub fn age_in_days(birth: NaiveDate, today: NaiveDate) -> i64 {
    (today - birth).num_days()
}

/// Calendar breakdown of age, borrowing days from the previous month and
/// months from the previous year the way people count it.
pub fn age_breakdown(birth: NaiveDate, today: NaiveDate) -> AgeBreakdown {
    let mut years = today.year() - birth.year();
    let mut months = today.month() as i32 - birth.month() as i32;
    let mut days = today.day() as i32 - birth.day() as i32;

    if days < 0 {
        months -= 1;
        let (prev_year, prev_month) = if today.month() == 1 {
            (today.year() - 1, 12)
        } else {
            (today.year(), today.month() - 1)
        };
        days += days_in_month(prev_year, prev_month) as i32;
    }
    if months < 0 {
        years -= 1;
        months += 12;
    }

    AgeBreakdown {
        years: years.max(0) as u32,
        months: months.max(0) as u32,
        days: days.max(0) as u32,
    }
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    // First of the following month minus one day; months here are always 1..=12.
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(30)
}

/// "2h 15m" / "45m" style compaction for minutes.
pub fn format_minutes(total_minutes: i64) -> String {
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Same compaction for a seconds count (feeding durations).
pub fn format_seconds(total_seconds: i64) -> String {
    format_minutes(total_seconds / 60)
}

/// Daily formula intake plan derived from weight and age.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulaPlan {
    pub daily_ml: u32,
    pub per_feeding_ml: u32,
    pub feedings_per_day: u32,
}

/// Volume bands: 70 ml/kg/day for the first ten days, 90 up to two months,
/// 110 after. Ten feedings a day for the first month, eight after.
pub fn formula_plan(weight_kg: f64, age_days: i64) -> FormulaPlan {
    let per_kg = if age_days <= 10 {
        70.0
    } else if age_days <= 60 {
        90.0
    } else {
        110.0
    };
    let daily = weight_kg * per_kg;
    let feedings = if age_days > 30 { 8 } else { 10 };

    FormulaPlan {
        daily_ml: daily.round() as u32,
        per_feeding_ml: (daily / feedings as f64).round() as u32,
        feedings_per_day: feedings,
    }
}

/// Recommended total sleep per day for the child's age.
pub fn daily_sleep_recommendation(age_days: i64) -> &'static str {
    if age_days <= 90 {
        "newborns need 14-17 hours of sleep a day"
    } else if age_days <= 180 {
        "infants need 12-16 hours of sleep a day"
    } else {
        "babies this age need 11-14 hours of sleep a day"
    }
}

/// Recommended single wake-window length for the child's age.
pub fn wake_window_recommendation(age_days: i64) -> &'static str {
    if age_days <= 30 {
        "1-2 hours"
    } else if age_days <= 90 {
        "1.5-2.5 hours"
    } else if age_days <= 180 {
        "2-3 hours"
    } else {
        "3-4 hours"
    }
}

/// How often growth should be measured at this age.
pub fn measuring_cadence(age_days: i64) -> &'static str {
    if age_days <= 14 {
        "daily"
    } else if age_days <= 90 {
        "weekly"
    } else {
        "monthly"
    }
}

/// Average wake stretches longer than this suggest an overtired baby.
pub const OVERTIRED_WAKE_MINUTES: i64 = 240;

/// Verdict on the number of diaper changes in a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiaperVerdict {
    Low,
    Normal,
    High,
}

/// Under six changes a day suggests underfeeding, over fifteen is worth a
/// pediatrician call.
pub fn diaper_day_verdict(total: i64) -> DiaperVerdict {
    if total < 6 {
        DiaperVerdict::Low
    } else if total > 15 {
        DiaperVerdict::High
    } else {
        DiaperVerdict::Normal
    }
}
