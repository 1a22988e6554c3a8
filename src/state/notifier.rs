use std::sync::Arc;

use tracing::warn;

use crate::{state::ids::SurfaceId, transport::UiTransport};

/// Transient notice surface: at most one notice is visible at a time.
pub struct Notifier {
    ui: Arc<dyn UiTransport>,
    last: Option<SurfaceId>,
}

impl Notifier {
    /// Create a notifier with nothing shown yet.
    pub fn new(ui: Arc<dyn UiTransport>) -> Self {
        Self { ui, last: None }
    }

    /// Replace the visible notice with `text`, quoted line by line.
    pub async fn send(&mut self, text: &str) {
        self.clear().await;
        match self.ui.send_surface(quote(text), Vec::new()).await {
            Ok(surface) => self.last = Some(surface),
            Err(err) => warn!(error = %err, "failed to send notification"),
        }
    }

    /// Delete the visible notice, if any.
    pub async fn clear(&mut self) {
        let Some(surface) = self.last.take() else {
            return;
        };
        if let Err(err) = self.ui.delete_surface(surface).await {
            warn!(error = %err, %surface, "failed to delete notification");
        }
    }
}

fn quote(text: &str) -> String {
    text.lines().map(|line| format!("> {line}\n")).collect()
}
