//! In-memory map of staff users to the chat that receives their reminders

use dashmap::DashMap;
use log::info;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredChat {
    pub chat_id: i64,
    pub name: String,
}

/// Cheap to clone; clones share the same map
#[derive(Clone, Default)]
pub struct ChatRegistry {
    chats: Arc<DashMap<String, RegisteredChat>>,
}

impl ChatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or move) a staff user's chat
    pub fn register(&self, staff_id: &str, chat_id: i64, name: &str) {
        self.chats.insert(
            staff_id.to_string(),
            RegisteredChat {
                chat_id,
                name: name.to_string(),
            },
        );
        info!("📝 Registered chat {chat_id} for {name} ({staff_id})");
    }

    pub fn unregister(&self, staff_id: &str) -> Option<RegisteredChat> {
        let removed = self.chats.remove(staff_id).map(|(_, chat)| chat);
        if let Some(chat) = &removed {
            info!("Unregistered chat {} for {staff_id}", chat.chat_id);
        }
        removed
    }

    pub fn get(&self, staff_id: &str) -> Option<RegisteredChat> {
        self.chats.get(staff_id).map(|entry| entry.value().clone())
    }

    /// Copy of all registrations, so callers never hold a map guard across an await
    pub fn snapshot(&self) -> Vec<(String, RegisteredChat)> {
        self.chats
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    pub fn chat_ids(&self) -> Vec<i64> {
        self.chats.iter().map(|entry| entry.value().chat_id).collect()
    }

    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }
}
