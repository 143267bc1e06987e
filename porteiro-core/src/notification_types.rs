use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where user-facing notifications are delivered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationReceiver {
    Log,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MessageType {
    LoginSucceeded,
    LoginFailed,
    LoggedOut,
    SessionRestored,
    PermissionsSaved { count: usize },
    Custom(String),
}

impl MessageType {
    fn get_message(&self, subject: &str) -> String {
        match self {
            MessageType::LoginSucceeded => format!("Welcome, {subject}!"),
            // Same banner for every auth failure; the sub-reason stays internal.
            MessageType::LoginFailed => "Invalid email or password.".to_string(),
            MessageType::LoggedOut => format!("{subject} signed out."),
            MessageType::SessionRestored => format!("Session restored for {subject}."),
            MessageType::PermissionsSaved { count } => {
                format!("{count} permission(s) updated for {subject}.")
            }
            MessageType::Custom(msg) => msg.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_type: MessageType,
    pub subject: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(message_type: MessageType, subject: &str) -> Message {
        Message {
            message: message_type.get_message(subject),
            message_type,
            subject: subject.to_string(),
            timestamp: Utc::now(),
        }
    }
}

#[async_trait]
pub trait NotificationImpl: Send {
    async fn notify(&self, msg: &Message) -> anyhow::Result<()>;
}
