use lettre::message::Mailbox;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::email::{EmailMessage, EmailSender};

#[derive(Clone, Debug)]
pub struct OutboundEmail {
    pub destination: String,
    pub subject: String,
    pub body_html: String,
    pub body_text: String,
}

/// Fire-and-forget notification queue. Handlers enqueue without awaiting the
/// SMTP round trip; a single worker task drains the queue and logs failures.
/// When the queue is full the notification is dropped rather than blocking
/// the request.
#[derive(Clone)]
pub struct EmailDispatcher {
    queue: mpsc::Sender<OutboundEmail>,
}

impl EmailDispatcher {
    pub fn start(
        sender: Arc<EmailSender>,
        from: Mailbox,
        reply_to: Mailbox,
        queue_depth: usize,
    ) -> Self {
        let (queue, mut receiver) = mpsc::channel::<OutboundEmail>(queue_depth);

        tokio::spawn(async move {
            while let Some(email) = receiver.recv().await {
                let OutboundEmail {
                    destination,
                    subject,
                    body_html,
                    body_text,
                } = email;

                let message = EmailMessage {
                    body_html,
                    body_text,
                    subject: &subject,
                    from: from.clone(),
                    reply_to: reply_to.clone(),
                    destination: &destination,
                };

                if let Err(e) = sender.send(message).await {
                    log::error!("Failed to send email to {destination}: {e}");
                }
            }
        });

        Self { queue }
    }

    pub fn enqueue(&self, email: OutboundEmail) {
        if self.queue.try_send(email).is_err() {
            log::warn!("Email queue is full; dropping a notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

    use crate::email::{EmailError, SendEmail};

    struct RecordingSender {
        record: UnboundedSender<(String, String)>,
    }

    #[async_trait]
    impl SendEmail for RecordingSender {
        async fn send<'a>(&self, message: EmailMessage<'a>) -> Result<(), EmailError> {
            self.record
                .send((
                    String::from(message.destination),
                    String::from(message.subject),
                ))
                .expect("Test channel closed");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_enqueued_email_reaches_sender() {
        let (record, mut recorded) = unbounded_channel();
        let sender: EmailSender = Box::new(RecordingSender { record });

        let from: Mailbox = "Support <support@example.com>".parse().unwrap();
        let reply_to: Mailbox = "No Reply <no-reply@example.com>".parse().unwrap();

        let dispatcher = EmailDispatcher::start(Arc::new(sender), from, reply_to, 8);

        dispatcher.enqueue(OutboundEmail {
            destination: String::from("customer@example.com"),
            subject: String::from("Your ticket has been received"),
            body_html: String::from("<p>received</p>"),
            body_text: String::from("received"),
        });

        let (destination, subject) =
            tokio::time::timeout(Duration::from_secs(5), recorded.recv())
                .await
                .expect("Timed out waiting for dispatcher")
                .expect("Dispatcher dropped the email");

        assert_eq!(destination, "customer@example.com");
        assert_eq!(subject, "Your ticket has been received");
    }
}
