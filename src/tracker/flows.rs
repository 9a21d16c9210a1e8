//! Multi-step input flows, one finite-state machine per conversation.
//!
//! Each chat has at most one flow in progress. Replies are validated as they
//! arrive; a failed validation returns the re-prompt text and leaves the flow
//! where it was.

use chrono::NaiveDate;

use crate::tracker::model::{Gender, NewChild};

/// Accepted amount range for a single feeding entry, in milliliters.
const AMOUNT_RANGE_ML: std::ops::RangeInclusive<i64> = 1..=500;

/// What a chat is currently being asked for.
pub enum Flow {
    Register(RegisterFlow),
    Params(ParamsFlow),
    /// Waiting for journal note text.
    Note,
    /// Waiting for a typed feeding amount.
    CustomAmount,
}

// ==================== registration ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RegisterStep {
    FirstName,
    LastName,
    Gender,
    BirthDate,
    GestationWeeks,
    GestationDays,
    BirthWeight,
    BirthHeight,
}

/// The registration wizard: collects the child's card step by step.
pub struct RegisterFlow {
    step: RegisterStep,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<Gender>,
    birth_date: Option<NaiveDate>,
    gestation_weeks: Option<u8>,
    gestation_days: Option<u8>,
    birth_weight_g: Option<f64>,
}

#[derive(Debug)]
pub enum RegisterProgress {
    Continue,
    Done(NewChild),
}

impl RegisterFlow {
    pub fn new() -> Self {
        Self {
            step: RegisterStep::FirstName,
            first_name: None,
            last_name: None,
            gender: None,
            birth_date: None,
            gestation_weeks: None,
            gestation_days: None,
            birth_weight_g: None,
        }
    }

    /// The question for the current step.
    pub fn prompt(&self) -> String {
        match self.step {
            RegisterStep::FirstName => "👶 Let's register your child.\n\nWhat is the child's first name?".to_string(),
            RegisterStep::LastName => "What is the child's last name? (send \"-\" to skip)".to_string(),
            RegisterStep::Gender => "Pick the child's gender:".to_string(),
            RegisterStep::BirthDate => {
                "What is the birth date? (YYYY-MM-DD or DD.MM.YYYY)".to_string()
            }
            RegisterStep::GestationWeeks => {
                "How many full weeks of gestation at birth? (20-45)".to_string()
            }
            RegisterStep::GestationDays => "And how many extra days? (0-6)".to_string(),
            RegisterStep::BirthWeight => {
                "What was the birth weight in grams? (for example: 3200)".to_string()
            }
            RegisterStep::BirthHeight => {
                "What was the birth height in centimeters? (for example: 51)".to_string()
            }
        }
    }

    /// Whether the flow is waiting on the gender keyboard.
    pub fn wants_gender(&self) -> bool {
        self.step == RegisterStep::Gender
    }

    /// Feed a text reply into the wizard. `Err` carries the re-prompt text.
    pub fn feed_text(&mut self, text: &str, today: NaiveDate) -> Result<RegisterProgress, String> {
        let text = text.trim();
        match self.step {
            RegisterStep::FirstName => {
                self.first_name = Some(parse_name(text)?);
                self.step = RegisterStep::LastName;
            }
            RegisterStep::LastName => {
                self.last_name = if text == "-" { None } else { Some(parse_name(text)?) };
                self.step = RegisterStep::Gender;
            }
            RegisterStep::Gender => {
                return Err("Please use the buttons to pick the gender.".to_string());
            }
            RegisterStep::BirthDate => {
                self.birth_date = Some(parse_birth_date(text, today)?);
                self.step = RegisterStep::GestationWeeks;
            }
            RegisterStep::GestationWeeks => {
                self.gestation_weeks = Some(parse_gestation_weeks(text)?);
                self.step = RegisterStep::GestationDays;
            }
            RegisterStep::GestationDays => {
                self.gestation_days = Some(parse_gestation_days(text)?);
                self.step = RegisterStep::BirthWeight;
            }
            RegisterStep::BirthWeight => {
                self.birth_weight_g = Some(parse_weight_grams(text, 300.0, 7000.0)?);
                self.step = RegisterStep::BirthHeight;
            }
            RegisterStep::BirthHeight => {
                let height = parse_height_cm(text, 25, 70)?;
                return Ok(RegisterProgress::Done(self.finish(height)));
            }
        }
        Ok(RegisterProgress::Continue)
    }

    /// Feed the gender button press. Ignored outside the gender step.
    pub fn feed_gender(&mut self, gender: Gender) -> bool {
        if self.step != RegisterStep::Gender {
            return false;
        }
        self.gender = Some(gender);
        self.step = RegisterStep::BirthDate;
        true
    }

    fn finish(&mut self, birth_height_cm: i64) -> NewChild {
        // All earlier steps have run by the time the final one validates.
        NewChild {
            first_name: self.first_name.take().expect("registration step order"),
            last_name: self.last_name.take(),
            gender: self.gender.expect("registration step order"),
            birth_date: self.birth_date.expect("registration step order"),
            gestation_weeks: self.gestation_weeks.expect("registration step order"),
            gestation_days: self.gestation_days.expect("registration step order"),
            birth_weight_g: self.birth_weight_g.expect("registration step order"),
            birth_height_cm,
        }
    }
}

impl Default for RegisterFlow {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== measurement entry ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamsStep {
    Weight,
    Height,
}

/// Weight and height values collected by the measurement flow.
#[derive(Debug, Clone, Copy)]
pub struct MeasurementInput {
    pub weight_g: f64,
    pub height_cm: i64,
}

/// Two-step weight/height entry.
pub struct ParamsFlow {
    step: ParamsStep,
    weight_g: Option<f64>,
}

pub enum ParamsProgress {
    Continue,
    Done(MeasurementInput),
}

impl ParamsFlow {
    pub fn new() -> Self {
        Self { step: ParamsStep::Weight, weight_g: None }
    }

    pub fn prompt(&self) -> String {
        match self.step {
            ParamsStep::Weight => {
                "⚖️ Enter the current weight in grams (for example: 4500):".to_string()
            }
            ParamsStep::Height => {
                "📏 Now enter the current height in centimeters (for example: 56):".to_string()
            }
        }
    }

    pub fn feed_text(&mut self, text: &str) -> Result<ParamsProgress, String> {
        let text = text.trim();
        match self.step {
            ParamsStep::Weight => {
                self.weight_g = Some(parse_weight_grams(text, 300.0, 30_000.0)?);
                self.step = ParamsStep::Height;
                Ok(ParamsProgress::Continue)
            }
            ParamsStep::Height => {
                let height_cm = parse_height_cm(text, 25, 130)?;
                let weight_g = self.weight_g.expect("weight collected before height");
                Ok(ParamsProgress::Done(MeasurementInput { weight_g, height_cm }))
            }
        }
    }
}

impl Default for ParamsFlow {
    fn default() -> Self {
        Self::new()
    }
}

// ==================== shared validation ====================

fn parse_name(text: &str) -> Result<String, String> {
    if text.is_empty() {
        return Err("The name cannot be empty. Try again:".to_string());
    }
    if text.chars().count() > 64 {
        return Err("That name is too long (64 characters max). Try again:".to_string());
    }
    Ok(text.to_string())
}

/// Birth date in ISO or dotted European format, not in the future.
pub fn parse_birth_date(text: &str, today: NaiveDate) -> Result<NaiveDate, String> {
    let parsed = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d.%m.%Y"))
        .map_err(|_| "I couldn't read that date. Use YYYY-MM-DD or DD.MM.YYYY:".to_string())?;
    if parsed > today {
        return Err("The birth date cannot be in the future. Try again:".to_string());
    }
    Ok(parsed)
}

fn parse_weight_grams(text: &str, min: f64, max: f64) -> Result<f64, String> {
    let value: f64 = text
        .parse()
        .map_err(|_| "Please enter the weight as a number of grams:".to_string())?;
    if value < min || value > max {
        return Err(format!("Weight must be between {:.0} and {:.0} grams. Try again:", min, max));
    }
    Ok(value)
}

fn parse_height_cm(text: &str, min: i64, max: i64) -> Result<i64, String> {
    let value: i64 = text
        .parse()
        .map_err(|_| "Please enter the height as a whole number of centimeters:".to_string())?;
    if !(min..=max).contains(&value) {
        return Err(format!("Height must be between {} and {} cm. Try again:", min, max));
    }
    Ok(value)
}

fn parse_gestation_weeks(text: &str) -> Result<u8, String> {
    let value: u8 = text
        .parse()
        .map_err(|_| "Please enter a number of weeks:".to_string())?;
    if !(20..=45).contains(&value) {
        return Err("Gestation weeks must be between 20 and 45. Try again:".to_string());
    }
    Ok(value)
}

fn parse_gestation_days(text: &str) -> Result<u8, String> {
    let value: u8 = text
        .parse()
        .map_err(|_| "Please enter a number of days:".to_string())?;
    if value > 6 {
        return Err("Extra gestation days must be between 0 and 6. Try again:".to_string());
    }
    Ok(value)
}

/// A single feeding amount entry, 1-500 ml.
pub fn parse_amount_ml(text: &str) -> Result<i64, String> {
    let value: i64 = text
        .trim()
        .parse()
        .map_err(|_| "Please enter a number of milliliters (for example: 75):".to_string())?;
    if !AMOUNT_RANGE_ML.contains(&value) {
        return Err(format!(
            "The amount must be between {} and {} ml. Try again:",
            AMOUNT_RANGE_ML.start(),
            AMOUNT_RANGE_ML.end()
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, 1).unwrap()
    }

    #[test]
    fn test_registration_happy_path() {
        let mut flow = RegisterFlow::new();

        assert!(matches!(flow.feed_text("Emma", today()), Ok(RegisterProgress::Continue)));
        assert!(matches!(flow.feed_text("Stone", today()), Ok(RegisterProgress::Continue)));
        assert!(flow.wants_gender());
        assert!(flow.feed_gender(Gender::Girl));
        assert!(matches!(flow.feed_text("2025-06-15", today()), Ok(RegisterProgress::Continue)));
        assert!(matches!(flow.feed_text("39", today()), Ok(RegisterProgress::Continue)));
        assert!(matches!(flow.feed_text("2", today()), Ok(RegisterProgress::Continue)));
        assert!(matches!(flow.feed_text("3250", today()), Ok(RegisterProgress::Continue)));

        match flow.feed_text("51", today()) {
            Ok(RegisterProgress::Done(child)) => {
                assert_eq!(child.first_name, "Emma");
                assert_eq!(child.last_name.as_deref(), Some("Stone"));
                assert_eq!(child.gender, Gender::Girl);
                assert_eq!(child.birth_date, NaiveDate::from_ymd_opt(2025, 6, 15).unwrap());
                assert_eq!(child.gestation_weeks, 39);
                assert_eq!(child.gestation_days, 2);
                assert_eq!(child.birth_weight_g, 3250.0);
                assert_eq!(child.birth_height_cm, 51);
            }
            _ => panic!("expected completed registration"),
        }
    }

    #[test]
    fn test_registration_skips_last_name() {
        let mut flow = RegisterFlow::new();
        flow.feed_text("Leo", today()).unwrap();
        flow.feed_text("-", today()).unwrap();
        assert!(flow.wants_gender());
        flow.feed_gender(Gender::Boy);
        flow.feed_text("01.07.2025", today()).unwrap();
        flow.feed_text("40", today()).unwrap();
        flow.feed_text("0", today()).unwrap();
        flow.feed_text("3600", today()).unwrap();

        match flow.feed_text("53", today()) {
            Ok(RegisterProgress::Done(child)) => {
                assert_eq!(child.last_name, None);
                assert_eq!(child.birth_date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
            }
            _ => panic!("expected completed registration"),
        }
    }

    #[test]
    fn test_invalid_input_does_not_advance() {
        let mut flow = RegisterFlow::new();
        flow.feed_text("Leo", today()).unwrap();
        flow.feed_text("-", today()).unwrap();
        flow.feed_gender(Gender::Boy);

        // Bad date, three times; the prompt stays on the date step.
        assert!(flow.feed_text("yesterday", today()).is_err());
        assert!(flow.feed_text("2026-01-01", today()).is_err()); // future
        assert!(flow.feed_text("15/06/2025", today()).is_err());
        assert!(flow.prompt().contains("birth date"));

        assert!(matches!(flow.feed_text("2025-06-15", today()), Ok(RegisterProgress::Continue)));
    }

    #[test]
    fn test_gender_requires_button() {
        let mut flow = RegisterFlow::new();
        flow.feed_text("Leo", today()).unwrap();
        flow.feed_text("-", today()).unwrap();

        let err = flow.feed_text("boy", today()).unwrap_err();
        assert!(err.contains("button"));
        assert!(flow.wants_gender());
    }

    #[test]
    fn test_gender_button_ignored_outside_step() {
        let mut flow = RegisterFlow::new();
        assert!(!flow.feed_gender(Gender::Boy));
    }

    #[test]
    fn test_gestation_ranges() {
        let mut flow = RegisterFlow::new();
        flow.feed_text("Leo", today()).unwrap();
        flow.feed_text("-", today()).unwrap();
        flow.feed_gender(Gender::Boy);
        flow.feed_text("2025-06-15", today()).unwrap();

        assert!(flow.feed_text("19", today()).is_err());
        assert!(flow.feed_text("46", today()).is_err());
        flow.feed_text("38", today()).unwrap();

        assert!(flow.feed_text("7", today()).is_err());
        assert!(matches!(flow.feed_text("6", today()), Ok(RegisterProgress::Continue)));
    }

    #[test]
    fn test_birth_weight_range() {
        let mut flow = RegisterFlow::new();
        flow.feed_text("Leo", today()).unwrap();
        flow.feed_text("-", today()).unwrap();
        flow.feed_gender(Gender::Boy);
        flow.feed_text("2025-06-15", today()).unwrap();
        flow.feed_text("40", today()).unwrap();
        flow.feed_text("0", today()).unwrap();

        assert!(flow.feed_text("100", today()).is_err());
        assert!(flow.feed_text("9000", today()).is_err());
        assert!(flow.feed_text("oops", today()).is_err());
        assert!(matches!(flow.feed_text("3400", today()), Ok(RegisterProgress::Continue)));
    }

    #[test]
    fn test_params_flow() {
        let mut flow = ParamsFlow::new();
        assert!(flow.prompt().contains("weight"));

        assert!(flow.feed_text("50").is_err()); // below the plausible range
        assert!(matches!(flow.feed_text("4800"), Ok(ParamsProgress::Continue)));
        assert!(flow.prompt().contains("height"));

        assert!(flow.feed_text("300").is_err());
        match flow.feed_text("58") {
            Ok(ParamsProgress::Done(input)) => {
                assert_eq!(input.weight_g, 4800.0);
                assert_eq!(input.height_cm, 58);
            }
            _ => panic!("expected completed measurement input"),
        }
    }

    #[test]
    fn test_parse_amount_ml() {
        assert_eq!(parse_amount_ml("75").unwrap(), 75);
        assert_eq!(parse_amount_ml(" 500 ").unwrap(), 500);
        assert!(parse_amount_ml("0").is_err());
        assert!(parse_amount_ml("501").is_err());
        assert!(parse_amount_ml("-5").is_err());
        assert!(parse_amount_ml("lots").is_err());
    }
}
