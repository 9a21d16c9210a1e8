//! Inline keyboards and the typed callback data behind them.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::tracker::model::{DiaperKind, Gender};

/// Everything an inline button can ask for, parsed from callback data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    MainMenu,
    ChildInfo,
    UpdateParams,
    StartFeeding,
    SleepMenu,
    DiaperMenu,
    NoteMenu,
    ShowStats,
    ResetActiveFeeding,
    StartSleep,
    EndSleep,
    SleepStats,
    WakeMenu,
    StartWake,
    EndWake,
    WakeStats,
    Diaper(DiaperKind),
    DiaperStats,
    AddMl(i64),
    AddCustom,
    FinishFeeding,
    CancelFeeding,
    Gender(Gender),
    CancelInput,
}

impl CallbackAction {
    /// The wire string stored as the button's callback data.
    pub fn as_data(self) -> String {
        match self {
            CallbackAction::MainMenu => "main_menu".to_string(),
            CallbackAction::ChildInfo => "child_info".to_string(),
            CallbackAction::UpdateParams => "update_params".to_string(),
            CallbackAction::StartFeeding => "start_feeding".to_string(),
            CallbackAction::SleepMenu => "sleep_menu".to_string(),
            CallbackAction::DiaperMenu => "diaper_menu".to_string(),
            CallbackAction::NoteMenu => "note_menu".to_string(),
            CallbackAction::ShowStats => "show_stats".to_string(),
            CallbackAction::ResetActiveFeeding => "reset_feeding".to_string(),
            CallbackAction::StartSleep => "start_sleep".to_string(),
            CallbackAction::EndSleep => "end_sleep".to_string(),
            CallbackAction::SleepStats => "sleep_stats".to_string(),
            CallbackAction::WakeMenu => "wake_menu".to_string(),
            CallbackAction::StartWake => "start_wake".to_string(),
            CallbackAction::EndWake => "end_wake".to_string(),
            CallbackAction::WakeStats => "wake_stats".to_string(),
            CallbackAction::Diaper(kind) => format!("diaper_{}", kind.as_str()),
            CallbackAction::DiaperStats => "diaper_stats".to_string(),
            CallbackAction::AddMl(ml) => format!("add_{}", ml),
            CallbackAction::AddCustom => "add_custom".to_string(),
            CallbackAction::FinishFeeding => "finish_feeding".to_string(),
            CallbackAction::CancelFeeding => "cancel_feeding".to_string(),
            CallbackAction::Gender(g) => format!("gender_{}", g.as_str()),
            CallbackAction::CancelInput => "cancel_input".to_string(),
        }
    }

    /// Parse callback data back into an action.
    pub fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "main_menu" => CallbackAction::MainMenu,
            "child_info" => CallbackAction::ChildInfo,
            "update_params" => CallbackAction::UpdateParams,
            "start_feeding" => CallbackAction::StartFeeding,
            "sleep_menu" => CallbackAction::SleepMenu,
            "diaper_menu" => CallbackAction::DiaperMenu,
            "note_menu" => CallbackAction::NoteMenu,
            "show_stats" => CallbackAction::ShowStats,
            "reset_feeding" => CallbackAction::ResetActiveFeeding,
            "start_sleep" => CallbackAction::StartSleep,
            "end_sleep" => CallbackAction::EndSleep,
            "sleep_stats" => CallbackAction::SleepStats,
            "wake_menu" => CallbackAction::WakeMenu,
            "start_wake" => CallbackAction::StartWake,
            "end_wake" => CallbackAction::EndWake,
            "wake_stats" => CallbackAction::WakeStats,
            "diaper_wet" => CallbackAction::Diaper(DiaperKind::Wet),
            "diaper_stool" => CallbackAction::Diaper(DiaperKind::Stool),
            "diaper_both" => CallbackAction::Diaper(DiaperKind::Both),
            "diaper_stats" => CallbackAction::DiaperStats,
            "add_custom" => CallbackAction::AddCustom,
            "finish_feeding" => CallbackAction::FinishFeeding,
            "cancel_feeding" => CallbackAction::CancelFeeding,
            "gender_boy" => CallbackAction::Gender(Gender::Boy),
            "gender_girl" => CallbackAction::Gender(Gender::Girl),
            "cancel_input" => CallbackAction::CancelInput,
            other => {
                let ml = other.strip_prefix("add_")?.parse().ok()?;
                CallbackAction::AddMl(ml)
            }
        };
        Some(action)
    }
}

fn button(label: &str, action: CallbackAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, action.as_data())
}

/// The main menu, grouped into care / tracking / stats rows.
pub fn main_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("👶 Child info", CallbackAction::ChildInfo),
            button("📊 Measurements", CallbackAction::UpdateParams),
        ],
        vec![
            button("🍼 Feeding", CallbackAction::StartFeeding),
            button("💤 Sleep", CallbackAction::SleepMenu),
        ],
        vec![
            button("🩲 Diaper", CallbackAction::DiaperMenu),
            button("📝 Note", CallbackAction::NoteMenu),
        ],
        vec![button("📈 Statistics", CallbackAction::ShowStats)],
        vec![button("🔄 Reset active feeding", CallbackAction::ResetActiveFeeding)],
    ])
}

/// Amount buttons plus finish/cancel, shown while a feeding is running.
pub fn feeding_control() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("➕ 5 ml", CallbackAction::AddMl(5)),
            button("➕ 10 ml", CallbackAction::AddMl(10)),
            button("➕ 20 ml", CallbackAction::AddMl(20)),
        ],
        vec![
            button("➕ 30 ml", CallbackAction::AddMl(30)),
            button("➕ 50 ml", CallbackAction::AddMl(50)),
            button("➕ 100 ml", CallbackAction::AddMl(100)),
        ],
        vec![button("📝 Enter another amount", CallbackAction::AddCustom)],
        vec![
            button("✅ Finish", CallbackAction::FinishFeeding),
            button("❌ Cancel", CallbackAction::CancelFeeding),
        ],
        vec![button("🔙 Main menu", CallbackAction::MainMenu)],
    ])
}

pub fn sleep_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("🛏️ Start sleep", CallbackAction::StartSleep),
            button("🌅 End sleep", CallbackAction::EndSleep),
        ],
        vec![
            button("📊 Sleep stats", CallbackAction::SleepStats),
            button("🌞 Wakefulness", CallbackAction::WakeMenu),
        ],
        vec![button("🔙 Main menu", CallbackAction::MainMenu)],
    ])
}

pub fn wake_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("🌞 Start wakefulness", CallbackAction::StartWake),
            button("🌜 End wakefulness", CallbackAction::EndWake),
        ],
        vec![button("📊 Wakefulness stats", CallbackAction::WakeStats)],
        vec![button("🔙 Back to sleep menu", CallbackAction::SleepMenu)],
    ])
}

pub fn diaper_menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            button("💦 Wet", CallbackAction::Diaper(DiaperKind::Wet)),
            button("💩 Stool", CallbackAction::Diaper(DiaperKind::Stool)),
        ],
        vec![
            button("💦💩 Both", CallbackAction::Diaper(DiaperKind::Both)),
            button("📊 Stats", CallbackAction::DiaperStats),
        ],
        vec![button("🔙 Main menu", CallbackAction::MainMenu)],
    ])
}

pub fn gender_picker() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        button(Gender::Boy.label(), CallbackAction::Gender(Gender::Boy)),
        button(Gender::Girl.label(), CallbackAction::Gender(Gender::Girl)),
    ]])
}

pub fn cancel_input() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("❌ Cancel", CallbackAction::CancelInput)]])
}

pub fn back_to_main() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![button("🏠 Main menu", CallbackAction::MainMenu)]])
}
