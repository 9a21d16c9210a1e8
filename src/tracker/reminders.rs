//! Background delivery of measurement reminders.
//!
//! A fixed-interval poll picks up due reminders and sends one message per
//! child per day; the schedule only advances when a measurement is saved.

use std::sync::Arc;

use teloxide::prelude::*;
use tracing::{info, warn};

use crate::tracker::AppState;
use crate::tracker::stats;

/// Spawn the reminder poll loop.
pub fn spawn_reminder_loop(bot: Bot, state: Arc<AppState>) {
    let poll_secs = state.config.reminder_poll_secs;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(poll_secs));
        loop {
            interval.tick().await;
            if let Err(e) = deliver_due_reminders(&bot, &state).await {
                warn!("Reminder check failed: {e}");
            }
        }
    });
    info!("Reminder loop started (poll every {}s)", poll_secs);
}

/// Send every due reminder, stamping each as sent for today.
async fn deliver_due_reminders(bot: &Bot, state: &AppState) -> Result<usize, String> {
    let today = state.today();
    let due = state
        .db
        .due_reminders(today)
        .map_err(|e| format!("query failed: {e}"))?;

    if due.is_empty() {
        return Ok(0);
    }
    info!("Delivering {} due reminder(s)", due.len());

    let mut sent = 0;
    for reminder in due {
        let age_days = stats::age_in_days(reminder.birth_date, today);
        let text = reminder_text(&reminder.first_name, age_days);

        match bot.send_message(ChatId(reminder.chat_id), text).await {
            Ok(_) => {
                sent += 1;
                if let Err(e) = state.db.mark_reminder_sent(reminder.id, today) {
                    warn!("Failed to mark reminder #{} sent: {e}", reminder.id);
                }
            }
            Err(e) => {
                // Leave the reminder unsent; the next poll retries.
                warn!("Failed to send reminder #{} to chat {}: {e}", reminder.id, reminder.chat_id);
            }
        }
    }

    Ok(sent)
}

/// The reminder message: child, age, and the measuring cadence for that age.
pub fn reminder_text(first_name: &str, age_days: i64) -> String {
    format!(
        "🔔 Reminder for {}\n\n\
         Time to measure weight and height!\n\
         📅 Age: {} days\n\
         📋 Recommended cadence: {}\n\n\
         Use \"📊 Measurements\" in the menu to enter the values.",
        first_name,
        age_days,
        stats::measuring_cadence(age_days),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_text_mentions_cadence() {
        let text = reminder_text("Emma", 10);
        assert!(text.contains("Emma"));
        assert!(text.contains("10 days"));
        assert!(text.contains("daily"));

        assert!(reminder_text("Emma", 60).contains("weekly"));
        assert!(reminder_text("Emma", 200).contains("monthly"));
    }
}
