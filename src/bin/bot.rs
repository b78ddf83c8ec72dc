use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;
use teloxide::Bot;

use carebot::core::Config;
use carebot::database::Database;
use carebot::features::assistant::AssistantService;
use carebot::features::audio::{AudioTranscriber, NoteSummarizer};
use carebot::features::auth::Authorizer;
use carebot::features::reminders::{ReminderSchedule, ReminderService};
use carebot::platform::HttpPlatform;
use carebot::telegram::{AssistantBot, RemindersBot, TelegramNotifier};

fn load_schedule(path: &str) -> Result<ReminderSchedule> {
    if std::path::Path::new(path).exists() {
        let schedule = ReminderSchedule::load(path)?;
        info!("📄 Loaded reminder schedule from {path}");
        Ok(schedule)
    } else {
        info!("📄 No reminder schedule at {path} - using defaults");
        Ok(ReminderSchedule::default())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    // The openai crate reads its key from the environment
    if let Some(key) = &config.openai_api_key {
        std::env::set_var("OPENAI_API_KEY", key);
        std::env::set_var("OPENAI_KEY", key);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting care facility bots...");

    let offset = config.facility_offset()?;
    let database = Database::new(&config.database_path).await?;
    let authorizer = Authorizer::new(database.clone());

    let mut tasks = Vec::new();
    let mut loops = Vec::new();

    if let Some(token) = &config.assistant_bot_token {
        let mut service = AssistantService::new(database.clone(), offset)?;
        match &config.openai_api_key {
            Some(key) => {
                service = service.with_voice(
                    AudioTranscriber::new(key.clone()),
                    NoteSummarizer::new(config.openai_model.clone()),
                );
                info!("🎙️ Voice notes enabled ({})", config.openai_model);
            }
            None => warn!("OPENAI_API_KEY not set - voice notes disabled"),
        }

        let bot = Arc::new(AssistantBot::new(token, service, authorizer.clone()));
        tasks.push(tokio::spawn(bot.start()));
    } else {
        info!("ASSISTANT_BOT_TOKEN not set - assistant bot disabled");
    }

    if let Some(token) = &config.reminders_bot_token {
        let schedule = load_schedule(&config.reminder_schedule_path)?;
        let platform = Arc::new(HttpPlatform::new(&config.api_base_url)?);
        let bot = Bot::new(token);
        let notifier = Arc::new(TelegramNotifier::new(bot.clone()));

        let service = Arc::new(ReminderService::new(platform, notifier, schedule, offset));
        loops = service.spawn_loops();
        info!("🔔 Reminder loops started against {}", config.api_base_url);

        let reminders = Arc::new(RemindersBot::new(bot, service, authorizer.clone()));
        tasks.push(tokio::spawn(reminders.start()));
    } else {
        info!("REMINDERS_BOT_TOKEN not set - reminders bot disabled");
    }

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
    info!("🛑 Shutting down");

    for handle in &loops {
        handle.abort();
    }
    // Dispatchers stop on the same Ctrl-C
    for task in tasks {
        if let Err(e) = task.await {
            error!("Bot task ended abnormally: {e}");
        }
    }

    info!("Goodbye");
    Ok(())
}
