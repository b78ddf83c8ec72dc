//! # Auth Feature
//!
//! Staff-only access: a chat user may use the bots only when their handle
//! is registered in the staff directory.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

use log::{error, info, warn};

use crate::database::{Database, StaffUser};

pub const UNAUTHORIZED_MESSAGE: &str = "Sorry, you are not authorized to use this bot. \
     Please make sure your Telegram username is registered in the system.";

#[derive(Clone)]
pub struct Authorizer {
    database: Database,
}

impl Authorizer {
    pub fn new(database: Database) -> Self {
        Authorizer { database }
    }

    /// Resolve a chat handle to a staff user. Lookup failures count as unauthorized.
    pub async fn authorize(&self, handle: Option<&str>) -> Option<StaffUser> {
        let Some(handle) = handle.filter(|h| !h.trim().is_empty()) else {
            warn!("Rejected a user without a chat handle");
            return None;
        };

        match self.database.find_user_by_handle(handle).await {
            Ok(Some(user)) => {
                info!("🔐 Authorized {} ({})", user.name, user.role);
                Some(user)
            }
            Ok(None) => {
                warn!("Rejected unregistered handle: {handle}");
                None
            }
            Err(e) => {
                error!("Error verifying user {handle}: {e}");
                None
            }
        }
    }
}
