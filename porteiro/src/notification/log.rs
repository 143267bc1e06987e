use async_trait::async_trait;
use tracing::info;

use porteiro_core::notification_types::{Message, NotificationImpl};

/// Delivers user-facing banners to the process log.
pub struct NotifyLog;

impl Default for NotifyLog {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyLog {
    pub fn new() -> Self {
        NotifyLog {}
    }
}

#[async_trait]
impl NotificationImpl for NotifyLog {
    async fn notify(&self, msg: &Message) -> anyhow::Result<()> {
        info!("Notification: {}", msg.message);
        Ok(())
    }
}
