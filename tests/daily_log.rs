//! Integration test: a full day of tracking against the storage layer.

use chrono::{NaiveDate, NaiveDateTime};

use lullabot::tracker::database::Database;
use lullabot::tracker::model::{DiaperKind, Gender, NewChild};
use lullabot::tracker::sessions::{self, EndOutcome, FeedingStart, StartOutcome};
use lullabot::tracker::stats;

const CHAT_ID: i64 = 424242;

fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn register(db: &Database) -> i64 {
    let child = NewChild {
        first_name: "Nora".to_string(),
        last_name: Some("Berg".to_string()),
        gender: Gender::Girl,
        birth_date: day("2025-05-20"),
        gestation_weeks: 39,
        gestation_days: 1,
        birth_weight_g: 3300.0,
        birth_height_cm: 51,
    };
    db.register_child(CHAT_ID, &child, ts("2025-05-21 10:00:00"))
        .unwrap()
}

#[test]
fn full_day_of_tracking() {
    let db = Database::in_memory().unwrap();
    let child_id = register(&db);
    let today = day("2025-06-05");

    // Morning: the child wakes up.
    let woke = sessions::start_wake(&db, child_id, ts("2025-06-05 07:00:00")).unwrap();
    assert!(matches!(woke, StartOutcome::Started { interrupted: None }));

    // First feeding, two amounts added as it goes.
    let started = sessions::start_feeding(&db, CHAT_ID, child_id, ts("2025-06-05 08:00:00")).unwrap();
    let feeding_id = match started {
        FeedingStart::Started { id } => id,
        FeedingStart::AlreadyActive => panic!("no feeding should be active yet"),
    };
    db.add_eaten_ml(feeding_id, 40).unwrap();
    db.add_eaten_ml(feeding_id, 40).unwrap();
    db.finish_feeding(feeding_id, ts("2025-06-05 08:25:00")).unwrap();

    // Morning nap interrupts the wake stretch.
    let nap = sessions::start_sleep(&db, child_id, ts("2025-06-05 09:30:00")).unwrap();
    match nap {
        StartOutcome::Started { interrupted: Some(wake) } => assert_eq!(wake.minutes, 150),
        other => panic!("expected the wake stretch to close, got {:?}", other),
    }
    match sessions::end_sleep(&db, child_id, ts("2025-06-05 11:00:00")).unwrap() {
        EndOutcome::Ended(closed) => assert_eq!(closed.minutes, 90),
        EndOutcome::NotActive => panic!("nap should have been active"),
    }

    // Two diaper changes after the nap.
    db.add_diaper(child_id, DiaperKind::Wet, ts("2025-06-05 11:05:00")).unwrap();
    db.add_diaper(child_id, DiaperKind::Stool, ts("2025-06-05 11:10:00")).unwrap();

    // Noon measurement.
    let m = db
        .add_measurement(child_id, 4100.0, 54, ts("2025-06-05 12:00:00"))
        .unwrap();
    assert_eq!(m.age_days, 16);

    // Second feeding.
    let second = sessions::start_feeding(&db, CHAT_ID, child_id, ts("2025-06-05 12:10:00")).unwrap();
    let second_id = match second {
        FeedingStart::Started { id } => id,
        FeedingStart::AlreadyActive => panic!("first feeding was finished"),
    };
    db.add_eaten_ml(second_id, 90).unwrap();
    db.finish_feeding(second_id, ts("2025-06-05 12:40:00")).unwrap();

    // A journal note for the pediatrician.
    db.add_note(child_id, "slept through the morning nap", None, ts("2025-06-05 13:00:00"))
        .unwrap();

    // Daily totals line up.
    let feedings = db.feeding_day_stats(child_id, today).unwrap();
    assert_eq!(feedings.count, 2);
    assert_eq!(feedings.total_ml, 170);

    let completed = db.feedings_on(child_id, today).unwrap();
    assert_eq!(completed.len(), 2);
    assert_eq!(completed[0].total_eaten_ml, 80);
    assert_eq!(completed[1].total_eaten_ml, 90);

    let sleep = db.sleep_day_stats(child_id, today).unwrap();
    assert_eq!(sleep.count, 1);
    assert_eq!(sleep.total_minutes, 90);

    let wake = db.wake_day_stats(child_id, today).unwrap();
    assert_eq!(wake.count, 1);
    assert_eq!(wake.total_minutes, 150);

    let diapers = db
        .diaper_day_stats(child_id, today, ts("2025-06-05 13:00:00"))
        .unwrap();
    let total: i64 = diapers.iter().map(|c| c.count).sum();
    assert_eq!(total, 2);

    let notes = db.recent_notes(child_id, 5).unwrap();
    assert_eq!(notes.len(), 1);

    // Recommendations for a 16-day-old.
    assert_eq!(stats::wake_window_recommendation(m.age_days), "1-2 hours");
    assert_eq!(stats::measuring_cadence(m.age_days), "weekly");
    let plan = stats::formula_plan(m.weight_g / 1000.0, m.age_days);
    assert_eq!(plan.daily_ml, 369);
    assert_eq!(plan.feedings_per_day, 10);
}

#[test]
fn reminders_follow_the_measurement_schedule() {
    let db = Database::in_memory().unwrap();
    let child_id = register(&db);

    // All three reminders are due right after registration.
    assert_eq!(db.due_reminders(day("2025-05-21")).unwrap().len(), 3);

    // Delivery stamps them for the day without advancing the schedule.
    for r in db.due_reminders(day("2025-05-21")).unwrap() {
        db.mark_reminder_sent(r.id, day("2025-05-21")).unwrap();
    }
    assert!(db.due_reminders(day("2025-05-21")).unwrap().is_empty());
    assert_eq!(db.due_reminders(day("2025-05-22")).unwrap().len(), 3);

    // Recording a measurement pushes each reminder out by its frequency.
    db.add_measurement(child_id, 3500.0, 52, ts("2025-05-22 09:00:00"))
        .unwrap();
    assert!(db.due_reminders(day("2025-05-22")).unwrap().is_empty());
    assert_eq!(db.due_reminders(day("2025-05-23")).unwrap().len(), 1);
    assert_eq!(db.due_reminders(day("2025-05-29")).unwrap().len(), 2);
    assert_eq!(db.due_reminders(day("2025-06-21")).unwrap().len(), 3);
}

#[test]
fn stuck_feeding_recovery() {
    let db = Database::in_memory().unwrap();
    let child_id = register(&db);

    sessions::start_feeding(&db, CHAT_ID, child_id, ts("2025-06-05 08:00:00")).unwrap();
    assert!(matches!(
        sessions::start_feeding(&db, CHAT_ID, child_id, ts("2025-06-05 09:00:00")).unwrap(),
        FeedingStart::AlreadyActive
    ));

    // The reset escape hatch clears the stuck interval.
    assert_eq!(db.delete_active_feedings(CHAT_ID).unwrap(), 1);
    assert!(matches!(
        sessions::start_feeding(&db, CHAT_ID, child_id, ts("2025-06-05 09:05:00")).unwrap(),
        FeedingStart::Started { .. }
    ));
}
