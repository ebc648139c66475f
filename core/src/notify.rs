//! Player notification seam. The core reports; the host renders.

use crate::event::{CampaignEvent, MessageCategory};

pub trait MessageSink: Send {
    fn post_message(&mut self, title: &str, body: &str, category: MessageCategory);
}

/// Writes every message to the log. Used when the host supplies no sink.
#[derive(Debug, Default)]
pub struct LogSink;

impl MessageSink for LogSink {
    fn post_message(&mut self, title: &str, body: &str, category: MessageCategory) {
        log::info!("[{category:?}] {title}: {body}");
    }
}

/// Forward every `MessagePosted` event in `events` to `sink`, in order.
pub fn deliver(sink: &mut dyn MessageSink, events: &[CampaignEvent]) -> usize {
    let mut delivered = 0;
    for event in events {
        if let CampaignEvent::MessagePosted { title, body, category, .. } = event {
            sink.post_message(title, body, *category);
            delivered += 1;
        }
    }
    delivered
}
