//! Update handlers: commands, flow replies, and inline-keyboard callbacks.
//!
//! Every handler is a short request/response round trip: look up the chat's
//! child, mutate or query the store, render a text reply.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId};
use teloxide::utils::command::BotCommands;
use tracing::{error, warn};

use crate::tracker::AppState;
use crate::tracker::flows::{
    Flow, MeasurementInput, ParamsFlow, ParamsProgress, RegisterFlow, RegisterProgress,
    parse_amount_ml,
};
use crate::tracker::keyboards::{self, CallbackAction};
use crate::tracker::model::{Child, ClosedInterval, DiaperKind, Feeding, Measurement, NewChild};
use crate::tracker::sessions::{self, EndOutcome, FeedingStart, StartOutcome};
use crate::tracker::stats;

/// Bot commands, mapped 1:1 to record operations.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "greeting and main menu")]
    Start,
    #[command(description = "register your child")]
    Register,
    #[command(description = "show the main menu")]
    Menu,
    #[command(description = "show this help")]
    Help,
    #[command(description = "start a feeding")]
    Feeding,
    #[command(description = "add eaten amount in ml, e.g. /add_eaten 50")]
    AddEaten(String),
    #[command(description = "finish the current feeding")]
    Finish,
    #[command(description = "remove a stuck active feeding")]
    ResetFeeding,
    #[command(description = "enter current weight and height")]
    Params,
    #[command(description = "show statistics")]
    Stats,
    #[command(description = "show the child's card")]
    ChildInfo,
    #[command(description = "cancel the current input")]
    Cancel,
}

const REGISTER_HINT: &str = "👶 No child registered yet. Use /register to set up the child's card.";
const DB_ERROR_REPLY: &str = "⚠️ Something went wrong while accessing the records. Please try again.";
const MENU_PROMPT: &str = "🏠 Main menu\nPick a section:";
const NOTE_PROMPT: &str =
    "📝 Journal\n\nType your note (temperature, mood, behavior, feeding details...):";
const CUSTOM_AMOUNT_PROMPT: &str = "📝 How many milliliters did the child eat?\n\nType a number (for example: 75):";

fn log_db<T>(result: rusqlite::Result<T>) -> Result<T, ()> {
    result.map_err(|e| error!("Database error: {e}"))
}

// ==================== command handler ====================

pub async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: Arc<AppState>,
) -> ResponseResult<()> {
    let chat = msg.chat.id;
    match cmd {
        Command::Start => cmd_start(&bot, chat, &state).await,
        Command::Register => cmd_register(&bot, chat, &state).await,
        Command::Menu => {
            bot.send_message(chat, MENU_PROMPT)
                .reply_markup(keyboards::main_menu())
                .await?;
            Ok(())
        }
        Command::Help => {
            bot.send_message(chat, help_text()).await?;
            Ok(())
        }
        Command::Feeding => cmd_feeding(&bot, chat, &state).await,
        Command::AddEaten(arg) => cmd_add_eaten(&bot, chat, &state, &arg).await,
        Command::Finish => cmd_finish(&bot, chat, &state).await,
        Command::ResetFeeding => cmd_reset_feeding(&bot, chat, &state).await,
        Command::Params => cmd_params(&bot, chat, &state).await,
        Command::Stats => cmd_stats(&bot, chat, &state).await,
        Command::ChildInfo => cmd_child_info(&bot, chat, &state).await,
        Command::Cancel => cmd_cancel(&bot, chat, &state).await,
    }
}

fn help_text() -> String {
    format!(
        "{}\n\nMenu sections:\n\
         🍼 Feeding - interval with a running ml total\n\
         💤 Sleep / 🌞 Wakefulness - exclusive interval trackers\n\
         🩲 Diaper - one-tap change log\n\
         📝 Note - free-text journal\n\
         📈 Statistics - today and the last week at a glance",
        Command::descriptions()
    )
}

async fn cmd_start(bot: &Bot, chat: ChatId, state: &AppState) -> ResponseResult<()> {
    let Ok(child) = log_db(state.db.child_by_chat(chat.0)) else {
        bot.send_message(chat, DB_ERROR_REPLY).await?;
        return Ok(());
    };

    let mut text = String::from("👶 Baby care tracker!\n\n");
    match &child {
        Some(child) => {
            let age = stats::age_breakdown(child.birth_date, state.today());
            text.push_str(&format!(
                "👶 Child: {}\n📅 Born: {}\n🎂 Age: {}\n",
                child.full_name(),
                child.birth_date,
                age
            ));
        }
        None => text.push_str("Register your child to start tracking: /register"),
    }

    bot.send_message(chat, text).await?;
    bot.send_message(chat, MENU_PROMPT)
        .reply_markup(keyboards::main_menu())
        .await?;
    Ok(())
}

async fn cmd_register(bot: &Bot, chat: ChatId, state: &AppState) -> ResponseResult<()> {
    let Ok(child) = log_db(state.db.child_by_chat(chat.0)) else {
        bot.send_message(chat, DB_ERROR_REPLY).await?;
        return Ok(());
    };
    if let Some(child) = child {
        bot.send_message(
            chat,
            format!("👶 {} is already registered in this chat.", child.full_name()),
        )
        .await?;
        return Ok(());
    }

    let flow = RegisterFlow::new();
    let prompt = flow.prompt();
    state.flows.lock().await.insert(chat.0, Flow::Register(flow));

    bot.send_message(chat, prompt)
        .reply_markup(keyboards::cancel_input())
        .await?;
    Ok(())
}

async fn cmd_feeding(bot: &Bot, chat: ChatId, state: &AppState) -> ResponseResult<()> {
    let Some(child) = require_child_msg(bot, chat, state).await? else {
        return Ok(());
    };

    match log_db(sessions::start_feeding(&state.db, chat.0, child.id, state.now())) {
        Ok(FeedingStart::AlreadyActive) => {
            bot.send_message(chat, "🍼 A feeding is already running!").await?;
        }
        Ok(FeedingStart::Started { .. }) => {
            let Ok(day) = log_db(state.db.feeding_day_stats(child.id, state.today())) else {
                bot.send_message(chat, DB_ERROR_REPLY).await?;
                return Ok(());
            };
            bot.send_message(chat, feeding_started_text(&child, state.now(), day.count, day.total_ml))
                .reply_markup(keyboards::feeding_control())
                .await?;
        }
        Err(()) => {
            bot.send_message(chat, DB_ERROR_REPLY).await?;
        }
    }
    Ok(())
}

async fn cmd_add_eaten(bot: &Bot, chat: ChatId, state: &AppState, arg: &str) -> ResponseResult<()> {
    if arg.trim().is_empty() {
        bot.send_message(chat, "Usage: /add_eaten <ml>\nFor example: /add_eaten 50").await?;
        return Ok(());
    }
    let eaten_ml = match parse_amount_ml(arg) {
        Ok(ml) => ml,
        Err(reprompt) => {
            bot.send_message(chat, reprompt).await?;
            return Ok(());
        }
    };

    let Ok(feeding) = log_db(state.db.active_feeding(chat.0)) else {
        bot.send_message(chat, DB_ERROR_REPLY).await?;
        return Ok(());
    };
    let Some(feeding) = feeding else {
        bot.send_message(chat, "🍼 No active feeding!").await?;
        return Ok(());
    };

    match add_and_render_progress(state, chat.0, &feeding, eaten_ml) {
        Ok(text) => {
            bot.send_message(chat, text).await?;
        }
        Err(()) => {
            bot.send_message(chat, DB_ERROR_REPLY).await?;
        }
    }
    Ok(())
}

async fn cmd_finish(bot: &Bot, chat: ChatId, state: &AppState) -> ResponseResult<()> {
    let Ok(feeding) = log_db(state.db.active_feeding(chat.0)) else {
        bot.send_message(chat, DB_ERROR_REPLY).await?;
        return Ok(());
    };
    let Some(feeding) = feeding else {
        bot.send_message(chat, "🍼 No active feeding!").await?;
        return Ok(());
    };

    match finish_and_render(state, chat.0, &feeding) {
        Ok(text) => {
            bot.send_message(chat, text).await?;
            bot.send_message(chat, MENU_PROMPT)
                .reply_markup(keyboards::main_menu())
                .await?;
        }
        Err(()) => {
            bot.send_message(chat, DB_ERROR_REPLY).await?;
        }
    }
    Ok(())
}

async fn cmd_reset_feeding(bot: &Bot, chat: ChatId, state: &AppState) -> ResponseResult<()> {
    match log_db(state.db.delete_active_feedings(chat.0)) {
        Ok(0) => {
            bot.send_message(chat, "⚠️ No active feedings found.").await?;
        }
        Ok(n) => {
            bot.send_message(chat, format!("✅ Removed {} active feeding(s).", n)).await?;
        }
        Err(()) => {
            bot.send_message(chat, DB_ERROR_REPLY).await?;
        }
    }
    Ok(())
}

async fn cmd_params(bot: &Bot, chat: ChatId, state: &AppState) -> ResponseResult<()> {
    let Some(_child) = require_child_msg(bot, chat, state).await? else {
        return Ok(());
    };

    let flow = ParamsFlow::new();
    let prompt = flow.prompt();
    state.flows.lock().await.insert(chat.0, Flow::Params(flow));

    bot.send_message(chat, prompt)
        .reply_markup(keyboards::cancel_input())
        .await?;
    Ok(())
}

async fn cmd_stats(bot: &Bot, chat: ChatId, state: &AppState) -> ResponseResult<()> {
    let Some(child) = require_child_msg(bot, chat, state).await? else {
        return Ok(());
    };
    match render_stats_overview(state, &child) {
        Ok(text) => {
            bot.send_message(chat, text).await?;
            bot.send_message(chat, MENU_PROMPT)
                .reply_markup(keyboards::main_menu())
                .await?;
        }
        Err(()) => {
            bot.send_message(chat, DB_ERROR_REPLY).await?;
        }
    }
    Ok(())
}

async fn cmd_child_info(bot: &Bot, chat: ChatId, state: &AppState) -> ResponseResult<()> {
    let Some(child) = require_child_msg(bot, chat, state).await? else {
        return Ok(());
    };
    let Ok(last) = log_db(state.db.last_measurement(child.id)) else {
        bot.send_message(chat, DB_ERROR_REPLY).await?;
        return Ok(());
    };
    bot.send_message(chat, child_card_text(&child, last.as_ref(), state.today()))
        .reply_markup(keyboards::back_to_main())
        .await?;
    Ok(())
}

async fn cmd_cancel(bot: &Bot, chat: ChatId, state: &AppState) -> ResponseResult<()> {
    let removed = state.flows.lock().await.remove(&chat.0).is_some();
    if removed {
        bot.send_message(chat, "❌ Action cancelled.")
            .reply_markup(keyboards::main_menu())
            .await?;
    } else {
        bot.send_message(chat, "Nothing to cancel.").await?;
    }
    Ok(())
}

/// Fetch the chat's child or reply with the register hint.
async fn require_child_msg(
    bot: &Bot,
    chat: ChatId,
    state: &AppState,
) -> ResponseResult<Option<Child>> {
    match log_db(state.db.child_by_chat(chat.0)) {
        Ok(Some(child)) => Ok(Some(child)),
        Ok(None) => {
            bot.send_message(chat, REGISTER_HINT).await?;
            Ok(None)
        }
        Err(()) => {
            bot.send_message(chat, DB_ERROR_REPLY).await?;
            Ok(None)
        }
    }
}

// ==================== text handler (input flows) ====================

/// What an input-flow reply resolved to.
enum FlowStep {
    /// Stay in the flow and re-prompt.
    Prompt { text: String, keyboard: InlineKeyboardMarkup },
    Register(NewChild),
    Measurement(MeasurementInput),
    Note(String),
    Amount(i64),
}

pub async fn handle_text(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else { return Ok(()) };
    let chat = msg.chat.id;
    let today = state.today();

    // Plain chatter outside a flow is ignored; menus drive everything else.
    let step = {
        let mut flows = state.flows.lock().await;
        let Some(flow) = flows.get_mut(&chat.0) else { return Ok(()) };

        let (step, finished) = match flow {
            Flow::Register(reg) => match reg.feed_text(text, today) {
                Err(reprompt) => (prompt_step(reprompt, reg), false),
                Ok(RegisterProgress::Continue) => (prompt_step(reg.prompt(), reg), false),
                Ok(RegisterProgress::Done(child)) => (FlowStep::Register(child), true),
            },
            Flow::Params(params) => match params.feed_text(text) {
                Err(reprompt) => (
                    FlowStep::Prompt { text: reprompt, keyboard: keyboards::cancel_input() },
                    false,
                ),
                Ok(ParamsProgress::Continue) => (
                    FlowStep::Prompt { text: params.prompt(), keyboard: keyboards::cancel_input() },
                    false,
                ),
                Ok(ParamsProgress::Done(input)) => (FlowStep::Measurement(input), true),
            },
            Flow::Note => (FlowStep::Note(text.to_string()), true),
            Flow::CustomAmount => match parse_amount_ml(text) {
                Err(reprompt) => (
                    FlowStep::Prompt { text: reprompt, keyboard: keyboards::cancel_input() },
                    false,
                ),
                Ok(ml) => (FlowStep::Amount(ml), true),
            },
        };
        if finished {
            flows.remove(&chat.0);
        }
        step
    };

    match step {
        FlowStep::Prompt { text, keyboard } => {
            bot.send_message(chat, text).reply_markup(keyboard).await?;
        }
        FlowStep::Register(new_child) => {
            finish_registration(&bot, chat, &state, new_child).await?;
        }
        FlowStep::Measurement(input) => {
            finish_measurement(&bot, chat, &state, input).await?;
        }
        FlowStep::Note(note) => {
            finish_note(&bot, chat, &state, &note).await?;
        }
        FlowStep::Amount(ml) => {
            finish_custom_amount(&bot, chat, &state, ml).await?;
        }
    }
    Ok(())
}

fn prompt_step(text: String, flow: &RegisterFlow) -> FlowStep {
    let keyboard = if flow.wants_gender() {
        keyboards::gender_picker()
    } else {
        keyboards::cancel_input()
    };
    FlowStep::Prompt { text, keyboard }
}

async fn finish_registration(
    bot: &Bot,
    chat: ChatId,
    state: &AppState,
    new_child: NewChild,
) -> ResponseResult<()> {
    if log_db(state.db.register_child(chat.0, &new_child, state.now())).is_err() {
        bot.send_message(chat, DB_ERROR_REPLY).await?;
        return Ok(());
    }

    let text = format!(
        "✅ {} is registered!\n\n\
         📅 Born: {}\n\
         🤰 Gestation: {} weeks {} days\n\
         ⚖️ Birth weight: {:.0} g\n\
         📏 Birth height: {} cm\n\n\
         I'll remind you to measure weight and height regularly.",
        new_child.first_name,
        new_child.birth_date,
        new_child.gestation_weeks,
        new_child.gestation_days,
        new_child.birth_weight_g,
        new_child.birth_height_cm,
    );
    bot.send_message(chat, text).await?;
    bot.send_message(chat, MENU_PROMPT)
        .reply_markup(keyboards::main_menu())
        .await?;
    Ok(())
}

async fn finish_measurement(
    bot: &Bot,
    chat: ChatId,
    state: &AppState,
    input: MeasurementInput,
) -> ResponseResult<()> {
    let Some(child) = require_child_msg(bot, chat, state).await? else {
        return Ok(());
    };
    let Ok(measurement) =
        log_db(state.db.add_measurement(child.id, input.weight_g, input.height_cm, state.now()))
    else {
        bot.send_message(chat, DB_ERROR_REPLY).await?;
        return Ok(());
    };

    bot.send_message(chat, measurement_saved_text(&measurement)).await?;
    bot.send_message(chat, MENU_PROMPT)
        .reply_markup(keyboards::main_menu())
        .await?;
    Ok(())
}

async fn finish_note(bot: &Bot, chat: ChatId, state: &AppState, note: &str) -> ResponseResult<()> {
    let Some(child) = require_child_msg(bot, chat, state).await? else {
        return Ok(());
    };
    if log_db(state.db.add_note(child.id, note, None, state.now())).is_err() {
        bot.send_message(chat, DB_ERROR_REPLY).await?;
        return Ok(());
    }

    let mut text = format!("✅ Note saved!\n\n📝 {}\n", truncate(note, 100));
    if let Ok(recent) = log_db(state.db.recent_notes(child.id, 3))
        && recent.len() > 1
    {
        text.push_str("\n📋 Recent notes:\n");
        for (i, n) in recent.iter().enumerate() {
            text.push_str(&format!(
                "{}. {}: {}\n",
                i + 1,
                n.created_at.format("%d.%m %H:%M"),
                truncate(&n.note, 50)
            ));
        }
    }

    bot.send_message(chat, text).await?;
    bot.send_message(chat, MENU_PROMPT)
        .reply_markup(keyboards::main_menu())
        .await?;
    Ok(())
}

async fn finish_custom_amount(
    bot: &Bot,
    chat: ChatId,
    state: &AppState,
    eaten_ml: i64,
) -> ResponseResult<()> {
    let Ok(feeding) = log_db(state.db.active_feeding(chat.0)) else {
        bot.send_message(chat, DB_ERROR_REPLY).await?;
        return Ok(());
    };
    let Some(feeding) = feeding else {
        bot.send_message(chat, "🍼 No active feeding!").await?;
        return Ok(());
    };

    match add_and_render_progress(state, chat.0, &feeding, eaten_ml) {
        Ok(text) => {
            bot.send_message(chat, text)
                .reply_markup(keyboards::feeding_control())
                .await?;
        }
        Err(()) => {
            bot.send_message(chat, DB_ERROR_REPLY).await?;
        }
    }
    Ok(())
}

// ==================== callback handler ====================

pub async fn handle_callback(bot: Bot, q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(data) = q.data.as_deref() else {
        return answer(&bot, &q).await;
    };
    let Some(action) = CallbackAction::parse(data) else {
        warn!("Unknown callback data: {data}");
        return answer(&bot, &q).await;
    };
    let Some((chat, msg_id)) = q.regular_message().map(|m| (m.chat.id, m.id)) else {
        return answer(&bot, &q).await;
    };

    match action {
        CallbackAction::MainMenu => {
            let Ok(child) = log_db(state.db.child_by_chat(chat.0)) else {
                return answer_alert(&bot, &q, DB_ERROR_REPLY).await;
            };
            edit_or_send(
                &bot,
                chat,
                msg_id,
                &main_menu_text(child.as_ref(), state.today()),
                keyboards::main_menu(),
            )
            .await?;
            answer(&bot, &q).await
        }

        CallbackAction::CancelInput => {
            state.flows.lock().await.remove(&chat.0);
            edit_or_send(&bot, chat, msg_id, "❌ Input cancelled.", keyboards::main_menu()).await?;
            answer_toast(&bot, &q, "Cancelled").await
        }

        CallbackAction::ChildInfo => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            let Ok(last) = log_db(state.db.last_measurement(child.id)) else {
                return answer_alert(&bot, &q, DB_ERROR_REPLY).await;
            };
            edit_or_send(
                &bot,
                chat,
                msg_id,
                &child_card_text(&child, last.as_ref(), state.today()),
                keyboards::back_to_main(),
            )
            .await?;
            answer(&bot, &q).await
        }

        CallbackAction::UpdateParams => {
            let Some(_child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            let flow = ParamsFlow::new();
            let prompt = flow.prompt();
            state.flows.lock().await.insert(chat.0, Flow::Params(flow));
            edit_or_send(&bot, chat, msg_id, &prompt, keyboards::cancel_input()).await?;
            answer(&bot, &q).await
        }

        CallbackAction::NoteMenu => {
            let Some(_child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            state.flows.lock().await.insert(chat.0, Flow::Note);
            edit_or_send(&bot, chat, msg_id, NOTE_PROMPT, keyboards::cancel_input()).await?;
            answer(&bot, &q).await
        }

        CallbackAction::ShowStats => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            let Ok(text) = render_stats_overview(state.as_ref(), &child) else {
                return answer_alert(&bot, &q, DB_ERROR_REPLY).await;
            };
            edit_or_send(&bot, chat, msg_id, &text, keyboards::back_to_main()).await?;
            answer(&bot, &q).await
        }

        CallbackAction::StartFeeding => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            match log_db(sessions::start_feeding(&state.db, chat.0, child.id, state.now())) {
                Ok(FeedingStart::AlreadyActive) => {
                    answer_alert(&bot, &q, "A feeding is already running!").await
                }
                Ok(FeedingStart::Started { .. }) => {
                    let Ok(day) = log_db(state.db.feeding_day_stats(child.id, state.today())) else {
                        return answer_alert(&bot, &q, DB_ERROR_REPLY).await;
                    };
                    edit_or_send(
                        &bot,
                        chat,
                        msg_id,
                        &feeding_started_text(&child, state.now(), day.count, day.total_ml),
                        keyboards::feeding_control(),
                    )
                    .await?;
                    answer(&bot, &q).await
                }
                Err(()) => answer_alert(&bot, &q, DB_ERROR_REPLY).await,
            }
        }

        CallbackAction::AddMl(eaten_ml) => {
            if !(1..=500).contains(&eaten_ml) {
                return answer_alert(&bot, &q, "Amount must be 1-500 ml.").await;
            }
            let Some(feeding) = require_feeding_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            match add_and_render_progress(state.as_ref(), chat.0, &feeding, eaten_ml) {
                Ok(text) => {
                    edit_or_send(&bot, chat, msg_id, &text, keyboards::feeding_control()).await?;
                    answer_toast(&bot, &q, &format!("+{} ml", eaten_ml)).await
                }
                Err(()) => answer_alert(&bot, &q, DB_ERROR_REPLY).await,
            }
        }

        CallbackAction::AddCustom => {
            let Some(_feeding) = require_feeding_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            state.flows.lock().await.insert(chat.0, Flow::CustomAmount);
            edit_or_send(&bot, chat, msg_id, CUSTOM_AMOUNT_PROMPT, keyboards::cancel_input()).await?;
            answer(&bot, &q).await
        }

        CallbackAction::FinishFeeding => {
            let Some(feeding) = require_feeding_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            match finish_and_render(state.as_ref(), chat.0, &feeding) {
                Ok(text) => {
                    edit_or_send(&bot, chat, msg_id, &text, keyboards::back_to_main()).await?;
                    answer(&bot, &q).await
                }
                Err(()) => answer_alert(&bot, &q, DB_ERROR_REPLY).await,
            }
        }

        CallbackAction::CancelFeeding => {
            let Some(feeding) = require_feeding_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            if log_db(state.db.delete_feeding(feeding.id)).is_err() {
                return answer_alert(&bot, &q, DB_ERROR_REPLY).await;
            }
            edit_or_send(&bot, chat, msg_id, "❌ Feeding cancelled.", keyboards::back_to_main())
                .await?;
            answer(&bot, &q).await
        }

        CallbackAction::ResetActiveFeeding => {
            match log_db(state.db.delete_active_feedings(chat.0)) {
                Ok(0) => answer_alert(&bot, &q, "No active feedings found.").await?,
                Ok(n) => {
                    answer_alert(&bot, &q, &format!("Removed {} active feeding(s).", n)).await?
                }
                Err(()) => return answer_alert(&bot, &q, DB_ERROR_REPLY).await,
            }
            let Ok(child) = log_db(state.db.child_by_chat(chat.0)) else { return Ok(()) };
            edit_or_send(
                &bot,
                chat,
                msg_id,
                &main_menu_text(child.as_ref(), state.today()),
                keyboards::main_menu(),
            )
            .await
        }

        CallbackAction::SleepMenu => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            let text = format!(
                "💤 Sleep and wakefulness tracking\n\n👶 Child: {}\n📅 Date: {}\n\nPick an action:",
                child.first_name,
                state.today()
            );
            edit_or_send(&bot, chat, msg_id, &text, keyboards::sleep_menu()).await?;
            answer(&bot, &q).await
        }

        CallbackAction::StartSleep => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            match log_db(sessions::start_sleep(&state.db, child.id, state.now())) {
                Ok(StartOutcome::AlreadyActive { .. }) => {
                    answer_alert(&bot, &q, "Sleep is already being tracked! End it first.").await
                }
                Ok(StartOutcome::Started { interrupted }) => {
                    let text = sleep_started_text(&child, state.now(), interrupted.as_ref());
                    edit_or_send(&bot, chat, msg_id, &text, keyboards::sleep_menu()).await?;
                    answer(&bot, &q).await
                }
                Err(()) => answer_alert(&bot, &q, DB_ERROR_REPLY).await,
            }
        }

        CallbackAction::EndSleep => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            match log_db(sessions::end_sleep(&state.db, child.id, state.now())) {
                Ok(EndOutcome::NotActive) => {
                    answer_alert(&bot, &q, "No sleep in progress! Start one first.").await
                }
                Ok(EndOutcome::Ended(closed)) => {
                    let text = sleep_ended_text(&child, &closed, state.today());
                    edit_or_send(&bot, chat, msg_id, &text, keyboards::sleep_menu()).await?;
                    answer(&bot, &q).await
                }
                Err(()) => answer_alert(&bot, &q, DB_ERROR_REPLY).await,
            }
        }

        CallbackAction::SleepStats => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            let Ok(day) = log_db(state.db.sleep_day_stats(child.id, state.today())) else {
                return answer_alert(&bot, &q, DB_ERROR_REPLY).await;
            };
            let text = sleep_stats_text(&child, &day, state.today());
            edit_or_send(&bot, chat, msg_id, &text, keyboards::sleep_menu()).await?;
            answer(&bot, &q).await
        }

        CallbackAction::WakeMenu => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            let text = format!(
                "🌞 Wakefulness tracking\n\n👶 Child: {}\n📅 Date: {}\n\nPick an action:",
                child.first_name,
                state.today()
            );
            edit_or_send(&bot, chat, msg_id, &text, keyboards::wake_menu()).await?;
            answer(&bot, &q).await
        }

        CallbackAction::StartWake => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            match log_db(sessions::start_wake(&state.db, child.id, state.now())) {
                Ok(StartOutcome::AlreadyActive { .. }) => {
                    answer_alert(&bot, &q, "Wakefulness is already being tracked! End it first.")
                        .await
                }
                Ok(StartOutcome::Started { interrupted }) => {
                    let text = wake_started_text(&child, state.now(), interrupted.as_ref());
                    edit_or_send(&bot, chat, msg_id, &text, keyboards::wake_menu()).await?;
                    answer(&bot, &q).await
                }
                Err(()) => answer_alert(&bot, &q, DB_ERROR_REPLY).await,
            }
        }

        CallbackAction::EndWake => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            match log_db(sessions::end_wake(&state.db, child.id, state.now())) {
                Ok(EndOutcome::NotActive) => {
                    answer_alert(&bot, &q, "No wakefulness in progress! Start one first.").await
                }
                Ok(EndOutcome::Ended(closed)) => {
                    let text = wake_ended_text(&child, &closed, state.today());
                    edit_or_send(&bot, chat, msg_id, &text, keyboards::wake_menu()).await?;
                    answer(&bot, &q).await
                }
                Err(()) => answer_alert(&bot, &q, DB_ERROR_REPLY).await,
            }
        }

        CallbackAction::WakeStats => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            let Ok(day) = log_db(state.db.wake_day_stats(child.id, state.today())) else {
                return answer_alert(&bot, &q, DB_ERROR_REPLY).await;
            };
            let text = wake_stats_text(&child, &day, state.today());
            edit_or_send(&bot, chat, msg_id, &text, keyboards::wake_menu()).await?;
            answer(&bot, &q).await
        }

        CallbackAction::DiaperMenu => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            let text = format!(
                "🩲 Diaper tracking\n\n👶 Child: {}\n📅 Date: {}\n\nPick a kind:",
                child.first_name,
                state.today()
            );
            edit_or_send(&bot, chat, msg_id, &text, keyboards::diaper_menu()).await?;
            answer(&bot, &q).await
        }

        CallbackAction::Diaper(kind) => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            if log_db(state.db.add_diaper(child.id, kind, state.now())).is_err() {
                return answer_alert(&bot, &q, DB_ERROR_REPLY).await;
            }
            let text = diaper_logged_text(&child, kind, state.now());
            edit_or_send(&bot, chat, msg_id, &text, keyboards::diaper_menu()).await?;
            answer_toast(&bot, &q, "✅ Saved!").await
        }

        CallbackAction::DiaperStats => {
            let Some(child) = require_child_cb(&bot, &q, state.as_ref(), chat).await? else {
                return Ok(());
            };
            let Ok(counts) = log_db(state.db.diaper_day_stats(child.id, state.today(), state.now()))
            else {
                return answer_alert(&bot, &q, DB_ERROR_REPLY).await;
            };
            let text = diaper_stats_text(&child, &counts, state.today());
            edit_or_send(&bot, chat, msg_id, &text, keyboards::diaper_menu()).await?;
            answer(&bot, &q).await
        }

        CallbackAction::Gender(gender) => {
            let next_prompt = {
                let mut flows = state.flows.lock().await;
                match flows.get_mut(&chat.0) {
                    Some(Flow::Register(reg)) if reg.wants_gender() => {
                        reg.feed_gender(gender);
                        Some(reg.prompt())
                    }
                    _ => None,
                }
            };
            match next_prompt {
                Some(prompt) => {
                    edit_or_send(&bot, chat, msg_id, &prompt, keyboards::cancel_input()).await?;
                    answer(&bot, &q).await
                }
                // Stale button outside the registration wizard.
                None => answer(&bot, &q).await,
            }
        }
    }
}

async fn answer(bot: &Bot, q: &CallbackQuery) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).await?;
    Ok(())
}

async fn answer_toast(bot: &Bot, q: &CallbackQuery, text: &str) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone()).text(text).await?;
    Ok(())
}

async fn answer_alert(bot: &Bot, q: &CallbackQuery, text: &str) -> ResponseResult<()> {
    bot.answer_callback_query(q.id.clone())
        .text(text)
        .show_alert(true)
        .await?;
    Ok(())
}

/// Edit the menu message in place, falling back to a fresh message.
async fn edit_or_send(
    bot: &Bot,
    chat: ChatId,
    msg_id: MessageId,
    text: &str,
    keyboard: InlineKeyboardMarkup,
) -> ResponseResult<()> {
    let edited = bot
        .edit_message_text(chat, msg_id, text)
        .reply_markup(keyboard.clone())
        .await;
    if edited.is_err() {
        bot.send_message(chat, text).reply_markup(keyboard).await?;
    }
    Ok(())
}

async fn require_child_cb(
    bot: &Bot,
    q: &CallbackQuery,
    state: &AppState,
    chat: ChatId,
) -> ResponseResult<Option<Child>> {
    match log_db(state.db.child_by_chat(chat.0)) {
        Ok(Some(child)) => Ok(Some(child)),
        Ok(None) => {
            answer_alert(bot, q, REGISTER_HINT).await?;
            Ok(None)
        }
        Err(()) => {
            answer_alert(bot, q, DB_ERROR_REPLY).await?;
            Ok(None)
        }
    }
}

async fn require_feeding_cb(
    bot: &Bot,
    q: &CallbackQuery,
    state: &AppState,
    chat: ChatId,
) -> ResponseResult<Option<Feeding>> {
    match log_db(state.db.active_feeding(chat.0)) {
        Ok(Some(feeding)) => Ok(Some(feeding)),
        Ok(None) => {
            answer_alert(bot, q, "No active feeding!").await?;
            Ok(None)
        }
        Err(()) => {
            answer_alert(bot, q, DB_ERROR_REPLY).await?;
            Ok(None)
        }
    }
}

// ==================== shared feeding steps ====================

/// Record an amount and render the in-progress text.
fn add_and_render_progress(
    state: &AppState,
    chat_id: i64,
    feeding: &Feeding,
    eaten_ml: i64,
) -> Result<String, ()> {
    log_db(state.db.add_eaten_ml(feeding.id, eaten_ml))?;
    let child = log_db(state.db.child_by_chat(chat_id))?.ok_or(())?;
    let day = log_db(state.db.feeding_day_stats(child.id, state.today()))?;
    let total_now = feeding.total_eaten_ml.unwrap_or(0) + eaten_ml;

    Ok(format!(
        "🍼 Feeding in progress\n\n\
         👶 Child: {}\n\
         ⏱️ Start: {}\n\
         🍶 Eaten so far: {} ml\n\
         📊 Today: {} feedings, {} ml total\n\n\
         ✅ Added: {} ml\n\n\
         Keep going or finish the feeding.",
        child.first_name,
        feeding.started_at.format("%H:%M"),
        total_now,
        day.count,
        day.total_ml,
        eaten_ml,
    ))
}

/// Close the feeding and render its summary.
fn finish_and_render(state: &AppState, chat_id: i64, feeding: &Feeding) -> Result<String, ()> {
    let now = state.now();
    log_db(state.db.finish_feeding(feeding.id, now))?;
    let child = log_db(state.db.child_by_chat(chat_id))?.ok_or(())?;
    let day = log_db(state.db.feeding_day_stats(child.id, state.today()))?;
    let today_feedings = log_db(state.db.feedings_on(child.id, state.today()))?;

    let duration_secs = (now - feeding.started_at).num_seconds();
    let mut text = format!(
        "✅ Feeding finished!\n\n\
         👶 Child: {}\n\
         ⏱️ Start: {}\n\
         ⏱️ End: {}\n\
         ⏳ Duration: {}\n\
         🍶 Eaten: {} ml\n\
         📊 Today: {} feedings, {} ml total",
        child.first_name,
        feeding.started_at.format("%H:%M"),
        now.format("%H:%M"),
        stats::format_seconds(duration_secs),
        feeding.total_eaten_ml.unwrap_or(0),
        day.count,
        day.total_ml,
    );

    if !today_feedings.is_empty() {
        text.push_str("\n\n📋 Today's feedings:\n");
        for f in &today_feedings {
            text.push_str(&format!(
                "  {} - {}: {} ml\n",
                f.started_at.format("%H:%M"),
                f.ended_at.format("%H:%M"),
                f.total_eaten_ml
            ));
        }
    }
    if let Some(prepared) = feeding.prepared_ml {
        text.push_str(&format!("\n🍶 Prepared: {} ml", prepared));
    }

    Ok(text)
}

// ==================== reply rendering ====================

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    }
}

fn main_menu_text(child: Option<&Child>, today: NaiveDate) -> String {
    let mut text = String::from("🏠 Main menu\n\n");
    if let Some(child) = child {
        text.push_str(&format!(
            "👶 Child: {}\n📅 Age: {}\n\n",
            child.full_name(),
            stats::age_breakdown(child.birth_date, today)
        ));
    }
    text.push_str("Pick a section:");
    text
}

fn feeding_started_text(child: &Child, now: NaiveDateTime, day_count: i64, day_total: i64) -> String {
    format!(
        "🍼 Feeding started!\n\n\
         👶 Child: {}\n\
         ⏱️ Start: {}\n\
         🍶 Eaten so far: 0 ml\n\
         📊 Today: {} feedings, {} ml total\n\n\
         Add amounts as the feeding goes:",
        child.first_name,
        now.format("%H:%M"),
        day_count,
        day_total,
    )
}

fn child_card_text(child: &Child, last: Option<&Measurement>, today: NaiveDate) -> String {
    let age = stats::age_breakdown(child.birth_date, today);
    let mut text = format!(
        "👶 Child info\n\n\
         👶 Name: {}\n\
         🚻 Gender: {}\n\
         📅 Born: {}\n\
         🎂 Age: {}\n\
         🤰 Gestation: {} weeks {} days\n\
         ⚖️ Birth weight: {:.0} g\n\
         📏 Birth height: {} cm\n",
        child.full_name(),
        child.gender.as_str(),
        child.birth_date,
        age,
        child.gestation_weeks,
        child.gestation_days,
        child.birth_weight_g,
        child.birth_height_cm,
    );

    if let Some(m) = last {
        text.push_str(&format!(
            "\n📊 Latest measurement:\n\
             ⚖️ Weight: {:.0} g ({:+.0} g)\n\
             📏 Height: {} cm ({:+} cm)\n\
             📅 Date: {} (at {} days old)",
            m.weight_g,
            m.weight_g - child.birth_weight_g,
            m.height_cm,
            m.height_cm - child.birth_height_cm,
            m.measured_on,
            m.age_days,
        ));
    }
    text
}

fn measurement_saved_text(m: &Measurement) -> String {
    let plan = stats::formula_plan(m.weight_g / 1000.0, m.age_days);
    format!(
        "✅ Measurement saved!\n\n\
         ⚖️ Weight: {:.0} g\n\
         📏 Height: {} cm\n\
         🎂 Age: {} days\n\n\
         🍼 Suggested formula intake: ~{} ml/day across {} feedings (~{} ml each)",
        m.weight_g, m.height_cm, m.age_days, plan.daily_ml, plan.feedings_per_day, plan.per_feeding_ml,
    )
}

fn sleep_started_text(child: &Child, now: NaiveDateTime, interrupted: Option<&ClosedInterval>) -> String {
    let mut text = format!(
        "🛏️ Sleep started at {}\n👶 For: {}\n",
        now.format("%H:%M"),
        child.first_name
    );
    if let Some(closed) = interrupted {
        text.push_str(&format!(
            "🌞 Wakefulness ended: {}\n",
            stats::format_minutes(closed.minutes)
        ));
    }
    text.push_str("\nTap \"🌅 End sleep\" when the child wakes up.");
    text
}

fn sleep_ended_text(child: &Child, closed: &ClosedInterval, today: NaiveDate) -> String {
    let age_days = stats::age_in_days(child.birth_date, today);
    format!(
        "🌅 Sleep finished!\n\
         👶 For: {}\n\
         🛏️ Start: {}\n\
         🌅 End: {}\n\
         ⏱️ Duration: {}\n\n\
         💡 Tip: {}.",
        child.first_name,
        closed.started_at.format("%H:%M"),
        closed.ended_at.format("%H:%M"),
        stats::format_minutes(closed.minutes),
        stats::daily_sleep_recommendation(age_days),
    )
}

fn sleep_stats_text(child: &Child, day: &crate::tracker::model::IntervalDayStats, today: NaiveDate) -> String {
    if day.count == 0 {
        return "📊 Sleep today:\n\n😴 No sleep recorded today yet.\nStart with \"🛏️ Start sleep\".".to_string();
    }
    let age_days = stats::age_in_days(child.birth_date, today);
    format!(
        "📊 Sleep today:\n\n\
         👶 Child: {}\n\
         📅 Date: {}\n\
         🛏️ Sleeps: {}\n\
         ⏱️ Total: {}\n\
         📈 Average: {}\n\n\
         💡 Tip: {}.",
        child.first_name,
        today,
        day.count,
        stats::format_minutes(day.total_minutes),
        stats::format_minutes(day.avg_minutes),
        stats::daily_sleep_recommendation(age_days),
    )
}

fn wake_started_text(child: &Child, now: NaiveDateTime, interrupted: Option<&ClosedInterval>) -> String {
    let mut text = format!(
        "🌞 Wakefulness started at {}\n👶 For: {}\n",
        now.format("%H:%M"),
        child.first_name
    );
    if let Some(closed) = interrupted {
        text.push_str(&format!("🛏️ Sleep ended: {}\n", stats::format_minutes(closed.minutes)));
    }
    text.push_str("\nTap \"🌜 End wakefulness\" when the child starts falling asleep.");
    text
}

fn wake_ended_text(child: &Child, closed: &ClosedInterval, today: NaiveDate) -> String {
    let age_days = stats::age_in_days(child.birth_date, today);
    format!(
        "🌜 Wakefulness finished!\n\
         👶 For: {}\n\
         🌞 Start: {}\n\
         🌜 End: {}\n\
         ⏱️ Duration: {}\n\n\
         💡 At {} days the optimal wake window is {}.",
        child.first_name,
        closed.started_at.format("%H:%M"),
        closed.ended_at.format("%H:%M"),
        stats::format_minutes(closed.minutes),
        age_days,
        stats::wake_window_recommendation(age_days),
    )
}

fn wake_stats_text(child: &Child, day: &crate::tracker::model::IntervalDayStats, today: NaiveDate) -> String {
    if day.count == 0 {
        return "📊 Wakefulness today:\n\n🌞 No wakefulness recorded today yet.\nStart with \"🌞 Start wakefulness\".".to_string();
    }
    let age_days = stats::age_in_days(child.birth_date, today);
    let mut text = format!(
        "📊 Wakefulness today:\n\n\
         👶 Child: {}\n\
         📅 Date: {}\n\
         🌞 Stretches: {}\n\
         ⏱️ Total: {}\n\
         📈 Average: {}\n\n\
         💡 At {} days:\n\
         • wake window: {} at a time\n\
         • total sleep: {}\n",
        child.first_name,
        today,
        day.count,
        stats::format_minutes(day.total_minutes),
        stats::format_minutes(day.avg_minutes),
        age_days,
        stats::wake_window_recommendation(age_days),
        stats::daily_sleep_recommendation(age_days),
    );
    if day.avg_minutes > stats::OVERTIRED_WAKE_MINUTES {
        text.push_str("\n⚠️ Long wake stretches can leave the baby overtired!");
    }
    text
}

fn diaper_logged_text(child: &Child, kind: DiaperKind, now: NaiveDateTime) -> String {
    let tip = match kind {
        DiaperKind::Stool => "A breastfed baby's stool is normally yellow and soft.",
        DiaperKind::Wet => "8-12 wet diapers a day is a sign the baby is eating enough.",
        DiaperKind::Both => "Use barrier cream at changes to prevent diaper rash.",
    };
    format!(
        "✅ Diaper change saved!\n\n\
         👶 Child: {}\n\
         ⏰ Time: {}\n\
         🩲 Kind: {}\n\n\
         💡 {}",
        child.first_name,
        now.format("%H:%M"),
        kind.label(),
        tip,
    )
}

fn diaper_stats_text(
    child: &Child,
    counts: &[crate::tracker::model::DiaperDayCount],
    today: NaiveDate,
) -> String {
    let mut text = format!(
        "📊 Diapers today:\n\n👶 Child: {}\n📅 Date: {}\n\n",
        child.first_name, today
    );

    if counts.is_empty() {
        text.push_str("🩲 Nothing logged today yet.\nUse the buttons above to start.");
        return text;
    }

    for c in counts {
        text.push_str(&format!("{}: {} time(s)\n", c.kind.label(), c.count));
        if c.recent > 0 {
            text.push_str(&format!("   ({} in the last 3 hours)\n", c.recent));
        }
    }

    let total: i64 = counts.iter().map(|c| c.count).sum();
    text.push('\n');
    text.push_str(match stats::diaper_day_verdict(total) {
        stats::DiaperVerdict::Low => {
            "⚠️ Few changes today. Check that the child is eating enough.\n"
        }
        stats::DiaperVerdict::High => {
            "⚠️ Very frequent changes today. Consider asking your pediatrician.\n"
        }
        stats::DiaperVerdict::Normal => "✅ The number of changes is within the normal range.\n",
    });
    text.push_str(
        "\n💡 Reference for infants:\n• 8-12 wet diapers a day\n• 1-7 stools a day (depends on feeding type)",
    );
    text
}

/// The /stats overview: feedings, measurements, sleep, wake, diapers.
fn render_stats_overview(state: &AppState, child: &Child) -> Result<String, ()> {
    let today = state.today();
    let now = state.now();

    let today_feedings = log_db(state.db.feedings_on(child.id, today))?;
    let day = log_db(state.db.feeding_day_stats(child.id, today))?;
    let week = log_db(state.db.feeding_week(child.id, today))?;
    let measurements = log_db(state.db.recent_measurements(child.id, 5))?;
    let sleep = log_db(state.db.sleep_day_stats(child.id, today))?;
    let wake = log_db(state.db.wake_day_stats(child.id, today))?;
    let diapers = log_db(state.db.diaper_day_stats(child.id, today, now))?;

    let mut text = format!("📊 Statistics for {}\n\n", child.first_name);

    if today_feedings.is_empty() {
        text.push_str("🍼 No feedings today yet.\n\n");
    } else {
        text.push_str("🍼 Feedings today:\n");
        for f in &today_feedings {
            text.push_str(&format!(
                "  {} - {}: {} ml\n",
                f.started_at.format("%H:%M"),
                f.ended_at.format("%H:%M"),
                f.total_eaten_ml
            ));
        }
        text.push_str(&format!(
            "  Total today: {} ml ({} feedings)\n\n",
            day.total_ml, day.count
        ));
    }

    if !week.is_empty() {
        text.push_str("🍼 Last 7 days:\n");
        for d in &week {
            text.push_str(&format!(
                "  📅 {}: {} feedings, {} ml\n",
                d.date, d.count, d.total_ml
            ));
        }
        text.push('\n');
    }

    if measurements.is_empty() {
        text.push_str("📏 No measurements recorded.\n");
    } else {
        text.push_str("📈 Measurement history:\n");
        for (i, m) in measurements.iter().enumerate() {
            let marker = if i == 0 { " (latest)" } else { "" };
            text.push_str(&format!(
                "  📅 {} ({}): {:.0} g, {} cm{}\n",
                m.measured_on,
                m.recorded_at.format("%H:%M"),
                m.weight_g,
                m.height_cm,
                marker
            ));
        }
    }

    if sleep.count > 0 {
        text.push_str(&format!(
            "\n💤 Sleep today: {} time(s), {}",
            sleep.count,
            stats::format_minutes(sleep.total_minutes)
        ));
    }
    if wake.count > 0 {
        text.push_str(&format!(
            "\n🌞 Wakefulness today: {} time(s), {}",
            wake.count,
            stats::format_minutes(wake.total_minutes)
        ));
    }
    if !diapers.is_empty() {
        text.push_str("\n🩲 Diapers today: ");
        for c in &diapers {
            let emoji = match c.kind {
                DiaperKind::Wet => "💦",
                DiaperKind::Stool => "💩",
                DiaperKind::Both => "💦💩",
            };
            text.push_str(&format!("{}{} ", emoji, c.count));
        }
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::model::{Gender, IntervalDayStats};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn sample_child() -> Child {
        Child {
            id: 1,
            chat_id: 100,
            first_name: "Emma".to_string(),
            last_name: None,
            gender: Gender::Girl,
            birth_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            gestation_weeks: 38,
            gestation_days: 4,
            birth_weight_g: 3100.0,
            birth_height_cm: 50,
            registered_at: ts("2025-06-02 09:00:00"),
        }
    }

    #[test]
    fn test_main_menu_text_with_and_without_child() {
        let child = sample_child();
        let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();

        let text = main_menu_text(Some(&child), today);
        assert!(text.contains("Emma"));
        assert!(text.contains("0y 2m 0d"));

        let text = main_menu_text(None, today);
        assert!(!text.contains("Child:"));
        assert!(text.contains("Pick a section"));
    }

    #[test]
    fn test_child_card_shows_measurement_deltas() {
        let child = sample_child();
        let m = Measurement {
            id: 1,
            child_id: 1,
            weight_g: 4200.0,
            height_cm: 55,
            measured_on: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            age_days: 44,
            recorded_at: ts("2025-07-15 10:00:00"),
        };

        let text = child_card_text(&child, Some(&m), NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        assert!(text.contains("4200 g (+1100 g)"));
        assert!(text.contains("55 cm (+5 cm)"));
        assert!(text.contains("at 44 days old"));
    }

    #[test]
    fn test_child_card_without_measurements() {
        let child = sample_child();
        let text = child_card_text(&child, None, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        assert!(text.contains("38 weeks 4 days"));
        assert!(!text.contains("Latest measurement"));
    }

    #[test]
    fn test_measurement_saved_includes_formula_plan() {
        let m = Measurement {
            id: 1,
            child_id: 1,
            weight_g: 4000.0,
            height_cm: 55,
            measured_on: NaiveDate::from_ymd_opt(2025, 7, 15).unwrap(),
            age_days: 44,
            recorded_at: ts("2025-07-15 10:00:00"),
        };
        let text = measurement_saved_text(&m);
        // 4 kg * 90 ml/kg = 360 ml over 8 feedings.
        assert!(text.contains("~360 ml/day"));
        assert!(text.contains("8 feedings"));
        assert!(text.contains("~45 ml each"));
    }

    #[test]
    fn test_sleep_started_mentions_interrupted_wake() {
        let child = sample_child();
        let closed = ClosedInterval {
            started_at: ts("2025-08-01 10:00:00"),
            ended_at: ts("2025-08-01 12:30:00"),
            minutes: 150,
        };
        let text = sleep_started_text(&child, ts("2025-08-01 12:30:00"), Some(&closed));
        assert!(text.contains("Wakefulness ended: 2h 30m"));

        let text = sleep_started_text(&child, ts("2025-08-01 12:30:00"), None);
        assert!(!text.contains("Wakefulness ended"));
    }

    #[test]
    fn test_wake_stats_overtired_warning() {
        let child = sample_child();
        let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();

        let calm = IntervalDayStats { count: 3, total_minutes: 360, avg_minutes: 120 };
        assert!(!wake_stats_text(&child, &calm, today).contains("overtired"));

        let tired = IntervalDayStats { count: 2, total_minutes: 520, avg_minutes: 260 };
        assert!(wake_stats_text(&child, &tired, today).contains("overtired"));
    }

    #[test]
    fn test_sleep_stats_empty_day() {
        let child = sample_child();
        let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();
        let empty = IntervalDayStats::default();
        let text = sleep_stats_text(&child, &empty, today);
        assert!(text.contains("No sleep recorded today"));
    }

    #[test]
    fn test_diaper_stats_verdicts() {
        let child = sample_child();
        let today = NaiveDate::from_ymd_opt(2025, 8, 1).unwrap();

        let few = vec![crate::tracker::model::DiaperDayCount {
            kind: DiaperKind::Wet,
            count: 3,
            recent: 1,
        }];
        assert!(diaper_stats_text(&child, &few, today).contains("Few changes"));

        let normal = vec![
            crate::tracker::model::DiaperDayCount { kind: DiaperKind::Wet, count: 7, recent: 0 },
            crate::tracker::model::DiaperDayCount { kind: DiaperKind::Stool, count: 2, recent: 0 },
        ];
        assert!(diaper_stats_text(&child, &normal, today).contains("within the normal range"));

        let empty: Vec<crate::tracker::model::DiaperDayCount> = vec![];
        assert!(diaper_stats_text(&child, &empty, today).contains("Nothing logged today"));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long note indeed", 10), "a very lon...");
        // Multibyte input must not panic.
        let cyrillic = "температура 36.8 вечером";
        let cut = truncate(cyrillic, 11);
        assert!(cut.starts_with("температура"));
    }

    #[test]
    fn test_help_text_lists_commands() {
        let text = help_text();
        assert!(text.contains("/add_eaten"));
        assert!(text.contains("/register"));
        assert!(text.contains("Menu sections"));
    }
}
