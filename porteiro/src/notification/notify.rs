use tracing::error;

use porteiro_core::notification_types::{Message, NotificationImpl, NotificationReceiver};

use super::log::NotifyLog;

fn get_notification_receiver_impl(to: &NotificationReceiver) -> Box<dyn NotificationImpl> {
    match to {
        NotificationReceiver::Log => Box::new(NotifyLog::new()),
    }
}

/// Deliver a message to every configured receiver. Delivery failures are
/// logged, never propagated; notifications are a collaborator concern and
/// must not fail the operation that triggered them.
pub async fn notify<'a, I>(receivers: I, msg: &Message)
where
    I: IntoIterator<Item = &'a NotificationReceiver>,
{
    let results: Vec<anyhow::Result<()>> = futures_util::future::join_all(
        receivers
            .into_iter()
            .map(|to| async { get_notification_receiver_impl(to).notify(msg).await }),
    )
    .await;

    for result in results {
        if let Err(err) = result {
            error!("Error notifying: {:?}", err);
        }
    }
}
