//! Transport-neutral replies and inline buttons
//!
//! Handlers build [`Reply`] values; the Telegram layer renders them.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Callback data for the "Show Today's Tasks" button
pub const TODAY_TASKS: &str = "today_tasks";
/// Callback data for the "Show All Residents" button
pub const LIST_RESIDENTS: &str = "list_residents";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback_data: String,
}

impl Button {
    pub fn new(label: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Button {
            label: label.into(),
            callback_data: callback_data.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Send with legacy Markdown parse mode
    pub markdown: bool,
    /// Rendered as a single keyboard row
    pub buttons: Vec<Button>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            markdown: false,
            buttons: Vec::new(),
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Reply {
            text: text.into(),
            markdown: true,
            buttons: Vec::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }
}

/// Follow-up actions offered under a resident profile
pub fn resident_followup_buttons() -> Vec<Button> {
    vec![
        Button::new("Show Today's Tasks", TODAY_TASKS),
        Button::new("Show All Residents", LIST_RESIDENTS),
    ]
}

pub fn inline_keyboard(buttons: &[Button]) -> Option<InlineKeyboardMarkup> {
    if buttons.is_empty() {
        return None;
    }
    let row = buttons
        .iter()
        .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.callback_data.clone()))
        .collect::<Vec<_>>();
    Some(InlineKeyboardMarkup::new(vec![row]))
}
