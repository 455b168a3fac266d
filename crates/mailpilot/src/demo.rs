//! In-memory backend used by the headless front end.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{Duration as Age, Utc};
use tracing::info;

use mailpilot_core::model::{Attachment, Category, Label, Priority, ReadStatus, ThreadId};
use mailpilot_core::{
    Address, AiSuggestionService, Folder, Message, MessageId, MutationGateway, OutgoingMessage,
    SentMessage, ServiceError, Tone,
};

/// Gateway that accepts everything after a short delay.
///
/// Sends to an address under the reserved `.invalid` domain are rejected,
/// so failure handling can be exercised by hand.
#[derive(Debug)]
pub struct DemoGateway {
    latency: Duration,
    next_id: AtomicU64,
}

impl DemoGateway {
    /// Creates a gateway answering after `latency`.
    pub const fn new(latency: Duration) -> Self {
        Self {
            latency,
            next_id: AtomicU64::new(1),
        }
    }
}

impl MutationGateway for DemoGateway {
    async fn send_message(&self, payload: OutgoingMessage) -> Result<SentMessage, ServiceError> {
        tokio::time::sleep(self.latency).await;
        if let Some(bad) = payload
            .to
            .iter()
            .chain(&payload.cc)
            .chain(&payload.bcc)
            .find(|a| a.email.to_lowercase().ends_with(".invalid"))
        {
            return Err(ServiceError::rejected(format!(
                "Recipient {} does not exist",
                bad.email
            )));
        }
        let n = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!(subject = %payload.subject, "demo send");
        Ok(SentMessage {
            id: MessageId::new(format!("sent-{n}")),
            thread_id: payload
                .reply_to_thread_id
                .unwrap_or_else(|| ThreadId(format!("thread-sent-{n}"))),
        })
    }

    async fn archive_messages(&self, ids: Vec<MessageId>) -> Result<(), ServiceError> {
        tokio::time::sleep(self.latency).await;
        info!(count = ids.len(), "demo archive");
        Ok(())
    }

    async fn delete_messages(&self, ids: Vec<MessageId>) -> Result<(), ServiceError> {
        tokio::time::sleep(self.latency).await;
        info!(count = ids.len(), "demo delete");
        Ok(())
    }

    async fn star_messages(&self, ids: Vec<MessageId>, value: bool) -> Result<(), ServiceError> {
        tokio::time::sleep(self.latency).await;
        info!(count = ids.len(), value, "demo star");
        Ok(())
    }

    async fn mark_read(&self, ids: Vec<MessageId>, read: bool) -> Result<(), ServiceError> {
        tokio::time::sleep(self.latency).await;
        info!(count = ids.len(), read, "demo mark read");
        Ok(())
    }

    async fn sync(&self) -> Result<(), ServiceError> {
        tokio::time::sleep(self.latency * 3).await;
        Ok(())
    }
}

/// AI service returning canned replies.
#[derive(Debug)]
pub struct DemoAi {
    latency: Duration,
}

impl DemoAi {
    /// Creates a service answering after `latency`.
    pub const fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl AiSuggestionService for DemoAi {
    async fn suggest(&self, message_id: MessageId, tone: Tone) -> Result<String, ServiceError> {
        tokio::time::sleep(self.latency).await;
        let text = match tone {
            Tone::Professional => "Thank you for your message. I will review it and follow up shortly.",
            Tone::Casual => "Thanks! I'll take a look and get back to you soon.",
            Tone::Formal => "Dear colleague, I acknowledge receipt of your message and will respond in due course.",
            Tone::Friendly => "Great to hear from you! Let me check and I'll get back to you today.",
        };
        info!(%message_id, tone = tone.as_str(), "demo suggestion");
        Ok(text.to_string())
    }
}

fn label(id: &str, name: &str, color: &str) -> Label {
    Label {
        label_id: id.into(),
        label_name: name.into(),
        label_color: color.into(),
    }
}

#[allow(clippy::too_many_arguments)]
fn demo_message(
    id: &str,
    from: (&str, &str),
    subject: &str,
    snippet: &str,
    hours_ago: i64,
    priority: Priority,
    category: Category,
    labels: Vec<Label>,
) -> Message {
    Message {
        id: MessageId::new(id),
        thread_id: ThreadId(format!("thread-{id}")),
        folder: Folder::Inbox,
        status: ReadStatus::Unread,
        is_starred: false,
        priority,
        category,
        labels,
        attachments: Vec::new(),
        from: vec![Address::named(from.1, from.0)],
        to: vec![Address::named("me@mailpilot.dev", "Me")],
        cc: Vec::new(),
        bcc: Vec::new(),
        subject: subject.into(),
        snippet: snippet.into(),
        summary: None,
        received_at: Utc::now() - Age::hours(hours_ago),
    }
}

/// Sample mailbox for the demo.
pub fn mock_messages() -> Vec<Message> {
    let urgent = label("urgent", "Urgent", "#ef4444");
    let needs_reply = label("needs-reply", "Needs reply", "#f59e0b");

    let mut invoice = demo_message(
        "msg-3",
        ("Bob Wilson", "bob@example.com"),
        "Invoice #1234",
        "Please find attached the invoice for last month's services...",
        30,
        Priority::High,
        Category::Fyi,
        Vec::new(),
    );
    invoice.status = ReadStatus::Read;
    invoice.is_starred = true;
    invoice.attachments.push(Attachment {
        filename: "invoice-1234.pdf".into(),
        mime_type: "application/pdf".into(),
        size: 48_213,
    });

    let mut newsletter = demo_message(
        "msg-4",
        ("Rust Weekly", "newsletter@rustweekly.dev"),
        "This Week in Rust",
        "Hello and welcome to another issue of This Week in Rust...",
        50,
        Priority::Low,
        Category::Newsletter,
        Vec::new(),
    );
    newsletter.status = ReadStatus::Read;

    let mut sent = demo_message(
        "msg-6",
        ("Me", "me@mailpilot.dev"),
        "Re: Offsite venue",
        "Sounds good, let's book the second option.",
        72,
        Priority::Normal,
        Category::Other("personal".into()),
        Vec::new(),
    );
    sent.folder = Folder::Sent;
    sent.status = ReadStatus::Read;
    sent.to = vec![Address::named("alice@example.com", "Alice Chen")];

    vec![
        demo_message(
            "msg-1",
            ("John Doe", "john@example.com"),
            "Meeting Tomorrow",
            "Hey, just wanted to confirm our meeting tomorrow at 3pm...",
            1,
            Priority::Urgent,
            Category::NeedsReply,
            vec![urgent, needs_reply.clone()],
        ),
        demo_message(
            "msg-2",
            ("Jane Smith", "jane@example.com"),
            "Project Update",
            "The project is going well. Here's a quick summary of what we've accomplished...",
            5,
            Priority::Normal,
            Category::NeedsReply,
            vec![needs_reply],
        ),
        invoice,
        newsletter,
        demo_message(
            "msg-5",
            ("Shop Deals", "deals@shop.example"),
            "48 hours only: 30% off",
            "Our biggest sale of the season starts now...",
            60,
            Priority::Low,
            Category::Promotional,
            Vec::new(),
        ),
        sent,
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_ids_are_unique() {
        let messages = mock_messages();
        let mut ids: Vec<_> = messages.iter().map(|m| m.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), messages.len());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_to_invalid_domain_is_rejected() {
        let gateway = DemoGateway::new(Duration::from_millis(100));
        let payload = OutgoingMessage {
            connection_id: None,
            to: vec![Address::new("ghost@nowhere.invalid")],
            cc: Vec::new(),
            bcc: Vec::new(),
            subject: "Hi".into(),
            body: String::new(),
            body_html: None,
            reply_to_message_id: None,
            reply_to_thread_id: None,
        };

        let err = gateway.send_message(payload).await.unwrap_err();

        assert!(err.user_message().contains("ghost@nowhere.invalid"));
    }
}
