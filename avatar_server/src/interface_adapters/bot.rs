// Messaging-platform entry point: hands users a button that opens the mini-app.

use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, WebAppInfo};
use url::Url;

pub const WELCOME_TEXT: &str = "🤖 Welcome to the avatar bot!\n\n\
    Tap the button below to start a video call with the interactive avatar. \
    You can talk by voice or by text!";
pub const LAUNCH_BUTTON_TEXT: &str = "📹 Open avatar video call";
pub const INSTRUCTION_TEXT: &str =
    "To talk with the avatar, send /start and open the web app!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotReply {
    // Welcome message with the web-app button.
    Launch,
    // Static hint pointing to /start.
    Instruction,
    Ignore,
}

// Chooses the reply for an incoming message. No per-chat state is kept.
pub fn reply_for(text: Option<&str>) -> BotReply {
    let Some(text) = text.map(str::trim).filter(|text| !text.is_empty()) else {
        return BotReply::Ignore;
    };

    if is_start_command(text) {
        BotReply::Launch
    } else if text.starts_with('/') {
        BotReply::Ignore
    } else {
        BotReply::Instruction
    }
}

fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    // Group chats address commands as /start@BotName.
    command == "/start" || command.starts_with("/start@")
}

pub fn launch_keyboard(webapp_url: &Url) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([[InlineKeyboardButton::web_app(
        LAUNCH_BUTTON_TEXT,
        WebAppInfo {
            url: webapp_url.clone(),
        },
    )]])
}

// Long-polls the messaging platform until the process exits.
pub async fn run(bot_token: String, webapp_url: Url) {
    tracing::info!(%webapp_url, "telegram bot starting");
    let bot = Bot::new(bot_token);
    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![Arc::new(webapp_url)])
        .build()
        .dispatch()
        .await;

    tracing::info!("telegram bot stopped");
}

async fn handle_message(bot: Bot, msg: Message, webapp_url: Arc<Url>) -> ResponseResult<()> {
    match reply_for(msg.text()) {
        BotReply::Launch => {
            bot.send_message(msg.chat.id, WELCOME_TEXT)
                .reply_markup(launch_keyboard(&webapp_url))
                .await?;
        }
        BotReply::Instruction => {
            bot.send_message(msg.chat.id, INSTRUCTION_TEXT).await?;
        }
        BotReply::Ignore => {}
    }
    Ok(())
}
