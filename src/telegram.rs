//! # Telegram Transport
//!
//! teloxide dispatchers for the assistant and reminders bots, plus the
//! [`Notifier`] the reminder loops send through. Everything above this
//! layer works with [`Reply`] values and plain chat ids.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info, warn};
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MaybeInaccessibleMessage, Message, ParseMode};

use crate::commands::{assistant_registry, reminders_registry, CommandRegistry};
use crate::core::chunk_for_message;
use crate::features::assistant::{AssistantService, VOICE_DISABLED};
use crate::features::auth::{Authorizer, UNAUTHORIZED_MESSAGE};
use crate::features::reminders::{Notifier, ReminderService};
use crate::message_components::{inline_keyboard, Reply};

const REMINDERS_HINT: &str =
    "I send reminders automatically. Use /start to subscribe, /refresh to re-check now or /stop to unsubscribe.";

/// Send one chunk, falling back to plain text if Telegram rejects the Markdown
#[allow(deprecated)]
async fn send_chunk(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    markdown: bool,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<(), teloxide::RequestError> {
    let mut request = bot.send_message(chat_id, text);
    if markdown {
        request = request.parse_mode(ParseMode::Markdown);
    }
    if let Some(keyboard) = keyboard.clone() {
        request = request.reply_markup(keyboard);
    }

    match request.await {
        Ok(_) => Ok(()),
        Err(e) if markdown => {
            warn!("Markdown send failed, falling back to plain text: {e}");
            let mut plain = bot.send_message(chat_id, text);
            if let Some(keyboard) = keyboard {
                plain = plain.reply_markup(keyboard);
            }
            plain.await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Send a reply, split to the message limit; buttons go on the last part
pub async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Reply) -> Result<()> {
    let chunks = chunk_for_message(&reply.text);
    let last = chunks.len().saturating_sub(1);
    for (idx, chunk) in chunks.iter().enumerate() {
        let keyboard = if idx == last {
            inline_keyboard(&reply.buttons)
        } else {
            None
        };
        send_chunk(bot, chat_id, chunk, reply.markdown, keyboard).await?;
    }
    Ok(())
}

fn sender_handle(msg: &Message) -> Option<String> {
    msg.from.as_ref().and_then(|user| user.username.clone())
}

/// Reminder delivery through a bot
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        TelegramNotifier { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: i64, text: &str, markdown: bool) -> Result<()> {
        let reply = Reply {
            text: text.to_string(),
            markdown,
            buttons: Vec::new(),
        };
        send_reply(&self.bot, ChatId(chat_id), &reply).await
    }
}

pub struct AssistantBot {
    bot: Bot,
    token: String,
    service: Arc<AssistantService>,
    authorizer: Authorizer,
    commands: CommandRegistry<AssistantService>,
}

impl AssistantBot {
    pub fn new(token: &str, service: AssistantService, authorizer: Authorizer) -> Self {
        AssistantBot {
            bot: Bot::new(token),
            token: token.to_string(),
            service: Arc::new(service),
            authorizer,
            commands: assistant_registry(),
        }
    }

    pub async fn start(self: Arc<Self>) {
        info!("🤖 Assistant bot is polling");

        let handler = dptree::entry()
            .branch(Update::filter_message().endpoint({
                let assistant = Arc::clone(&self);
                move |msg: Message, bot: Bot| {
                    let assistant = Arc::clone(&assistant);
                    async move {
                        assistant.handle_message(msg, bot).await;
                        respond(())
                    }
                }
            }))
            .branch(Update::filter_callback_query().endpoint({
                let assistant = Arc::clone(&self);
                move |q: CallbackQuery, bot: Bot| {
                    let assistant = Arc::clone(&assistant);
                    async move {
                        assistant.handle_callback(q, bot).await;
                        respond(())
                    }
                }
            }));

        Dispatcher::builder(self.bot.clone(), handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_message(&self, msg: Message, bot: Bot) {
        let handle = sender_handle(&msg);
        let chat_id = msg.chat.id;

        let reply = if let Some(text) = msg.text() {
            match self
                .commands
                .dispatch(
                    Arc::clone(&self.service),
                    &self.authorizer,
                    handle.as_deref(),
                    chat_id.0,
                    text,
                )
                .await
            {
                Some(reply) => reply,
                None => match self.authorizer.authorize(handle.as_deref()).await {
                    Some(_) => self.service.answer(text).await,
                    None => Reply::plain(UNAUTHORIZED_MESSAGE),
                },
            }
        } else if msg.voice().is_some() {
            match self.authorizer.authorize(handle.as_deref()).await {
                Some(user) => {
                    info!("🎙️ Voice note from {}", user.name);
                    self.handle_voice(&msg, &bot).await
                }
                None => Reply::plain(UNAUTHORIZED_MESSAGE),
            }
        } else {
            return;
        };

        if let Err(e) = send_reply(&bot, chat_id, &reply).await {
            error!("Failed to reply in chat {chat_id}: {e}");
        }
    }

    async fn handle_voice(&self, msg: &Message, bot: &Bot) -> Reply {
        let Some(voice) = msg.voice() else {
            return Reply::plain(VOICE_DISABLED);
        };
        if !self.service.voice_enabled() {
            return Reply::plain(VOICE_DISABLED);
        }

        let file = match bot.get_file(voice.file.id.clone()).await {
            Ok(file) => file,
            Err(e) => {
                error!("Failed to look up voice file: {e}");
                return Reply::plain(crate::features::responses::templates::ERROR);
            }
        };
        let url = format!("https://api.telegram.org/file/bot{}/{}", self.token, file.path);
        let filename = file
            .path
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .unwrap_or("voice.oga")
            .to_string();

        self.service
            .voice_note(&url, &filename, voice.duration.seconds())
            .await
    }

    async fn handle_callback(&self, q: CallbackQuery, bot: Bot) {
        if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
            warn!("Failed to answer callback query {}: {e}", q.id);
        }

        let Some(MaybeInaccessibleMessage::Regular(message)) = q.message.as_ref() else {
            warn!("Callback without an accessible message");
            return;
        };
        let chat_id = message.chat.id;
        let Some(data) = q.data.as_deref() else {
            return;
        };

        let reply = match self.authorizer.authorize(q.from.username.as_deref()).await {
            Some(user) => {
                info!("Callback {data} from {}", user.name);
                self.service.callback(data).await
            }
            None => Reply::plain(UNAUTHORIZED_MESSAGE),
        };
        if let Err(e) = send_reply(&bot, chat_id, &reply).await {
            error!("Failed to answer callback in chat {chat_id}: {e}");
        }
    }
}

pub struct RemindersBot {
    bot: Bot,
    service: Arc<ReminderService>,
    authorizer: Authorizer,
    commands: CommandRegistry<ReminderService>,
}

impl RemindersBot {
    pub fn new(bot: Bot, service: Arc<ReminderService>, authorizer: Authorizer) -> Self {
        RemindersBot {
            bot,
            service,
            authorizer,
            commands: reminders_registry(),
        }
    }

    pub async fn start(self: Arc<Self>) {
        info!("🔔 Reminders bot is polling");

        let handler = Update::filter_message().endpoint({
            let reminders = Arc::clone(&self);
            move |msg: Message, bot: Bot| {
                let reminders = Arc::clone(&reminders);
                async move {
                    reminders.handle_message(msg, bot).await;
                    respond(())
                }
            }
        });

        Dispatcher::builder(self.bot.clone(), handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    async fn handle_message(&self, msg: Message, bot: Bot) {
        let Some(text) = msg.text() else {
            return;
        };
        let handle = sender_handle(&msg);
        let chat_id = msg.chat.id;

        let reply = match self
            .commands
            .dispatch(
                Arc::clone(&self.service),
                &self.authorizer,
                handle.as_deref(),
                chat_id.0,
                text,
            )
            .await
        {
            Some(reply) => reply,
            None => Reply::plain(REMINDERS_HINT),
        };

        if let Err(e) = send_reply(&bot, chat_id, &reply).await {
            error!("Failed to reply in chat {chat_id}: {e}");
        }
    }
}
