//! Event collection helpers

use effect_gen::{Event, ProgressLabel};
use tokio::sync::broadcast;

/// Drain every event already queued on `rx`
pub fn drain_events(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Progress labels in the order they were published
pub fn labels(events: &[Event]) -> Vec<ProgressLabel> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Status { label } => Some(*label),
            _ => None,
        })
        .collect()
}

/// Error messages in the order they were published
pub fn error_messages(events: &[Event]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Error { message } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

/// Whether the last busy event turned the indicator off
pub fn ended_idle(events: &[Event]) -> bool {
    events
        .iter()
        .rev()
        .find_map(|event| match event {
            Event::Busy { active } => Some(!active),
            _ => None,
        })
        .unwrap_or(true)
}
