use std::time::{Duration, Instant};

/// The single user-visible error message.
///
/// A new message replaces the previous one; there is no queue.
#[derive(Debug, Clone, Default)]
pub struct ErrorSlot {
    current: Option<(String, Instant)>,
    dismiss_after: Option<Duration>,
}

impl ErrorSlot {
    /// Slot whose messages expire after `dismiss_after`.
    pub fn with_dismiss_after(dismiss_after: Duration) -> Self {
        Self {
            current: None,
            dismiss_after: Some(dismiss_after).filter(|d| !d.is_zero()),
        }
    }

    pub fn set(&mut self, message: impl Into<String>) {
        self.current = Some((message.into(), Instant::now()));
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|(message, _)| message.as_str())
    }

    /// Drop the message if it has been shown longer than the dismiss
    /// delay. Returns true if a message was dismissed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let Some(limit) = self.dismiss_after else {
            return false;
        };
        match &self.current {
            Some((_, set_at)) if now.saturating_duration_since(*set_at) >= limit => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}
