use std::sync::{Arc, Mutex};

use crate::api::Notifier;

/// Prints alerts to stderr and keeps a copy of each one.
#[derive(Clone, Debug, Default)]
pub struct ConsoleNotifier {
    messages: Arc<Mutex<Vec<String>>>,
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records alerts without printing them.
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }
}

impl Notifier for ConsoleNotifier {
    fn alert(&self, message: &str) {
        tracing::warn!("alert: {}", message);

        if !self.quiet {
            eprintln!("!! {}", message);
        }

        if let Ok(mut messages) = self.messages.lock() {
            messages.push(message.into());
        }
    }
}
