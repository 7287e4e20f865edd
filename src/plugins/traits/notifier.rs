use async_trait::async_trait;

use crate::utils::error::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Trait for implementing report delivery channels.
///
/// One call is one delivery attempt. Implementations do not retry.
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    /// `Err` for transport failures, `Ok` with `success == false` when the
    /// endpoint answered but did not accept the message.
    async fn notify(&self, text: &str) -> Result<NotificationResult>;
}
