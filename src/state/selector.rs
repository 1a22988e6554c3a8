//! Paged option list rendered as a single surface with numbered reactions.

use std::sync::Arc;

use tracing::warn;

use crate::{
    state::ids::SurfaceId,
    transport::{TransportResult, UiTransport},
};

/// Options shown per page.
pub const ITEMS_PER_PAGE: usize = 10;

/// Reactions selecting the n-th option of the current page.
pub const NUMBER_EMOJIS: [&str; ITEMS_PER_PAGE] = [
    "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟",
];

/// Reaction turning to the previous page.
pub const PREVIOUS_PAGE: &str = "⬅️";
/// Reaction turning to the next page.
pub const NEXT_PAGE: &str = "➡️";

/// Result of interpreting a reaction on a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// A page reaction; the surface was re-rendered.
    Paged,
    /// Unknown reaction, or a number past the last option.
    Invalid,
    /// Absolute index of the chosen option.
    Selected(usize),
}

/// Position of a number emoji on a page.
pub fn emoji_index(emoji: &str) -> Option<usize> {
    NUMBER_EMOJIS.iter().position(|candidate| *candidate == emoji)
}

/// A selectable, paged list of options.
///
/// The surface is created on the first render and edited afterwards.
pub struct Selector {
    ui: Arc<dyn UiTransport>,
    surface: Option<SurfaceId>,
    options: Vec<String>,
    page: usize,
    header: String,
    default_message: String,
    reactions: Vec<String>,
}

impl Selector {
    /// A selector whose options are replaced over time (numbers plus paging).
    pub fn open(ui: Arc<dyn UiTransport>, default_message: impl Into<String>) -> Self {
        let reactions = NUMBER_EMOJIS
            .iter()
            .chain([PREVIOUS_PAGE, NEXT_PAGE].iter())
            .map(|emoji| emoji.to_string())
            .collect();
        Self::with_reactions(ui, Vec::new(), default_message.into(), reactions)
    }

    /// A selector with a fixed option list, carrying only the reactions it needs.
    pub fn fixed(ui: Arc<dyn UiTransport>, options: Vec<String>) -> Self {
        let reactions = NUMBER_EMOJIS
            .iter()
            .take(options.len())
            .map(|emoji| emoji.to_string())
            .collect();
        Self::with_reactions(ui, options, String::new(), reactions)
    }

    fn with_reactions(
        ui: Arc<dyn UiTransport>,
        options: Vec<String>,
        default_message: String,
        reactions: Vec<String>,
    ) -> Self {
        Self {
            ui,
            surface: None,
            options,
            page: 0,
            header: String::new(),
            default_message,
            reactions,
        }
    }

    /// Replace the options and go back to the first page.
    pub fn set_options(&mut self, options: Vec<String>) {
        self.options = options;
        self.page = 0;
    }

    /// Current options.
    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Option at an absolute index.
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    /// Zero-based page being shown.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Surface rendered so far, if any.
    pub fn surface(&self) -> Option<SurfaceId> {
        self.surface
    }

    /// Whether the given surface is this selector's.
    pub fn belongs_to(&self, surface: SurfaceId) -> bool {
        self.surface == Some(surface)
    }

    /// Render the current page under `header`.
    pub async fn render(&mut self, header: &str) -> TransportResult<()> {
        self.header = header.to_string();
        let content = self.content();
        match self.surface {
            Some(surface) => self.ui.edit_surface(surface, content).await,
            None => {
                let surface = self
                    .ui
                    .send_surface(content, self.reactions.clone())
                    .await?;
                self.surface = Some(surface);
                Ok(())
            }
        }
    }

    /// Interpret a reaction. Paging re-renders with the current header.
    pub async fn resolve(&mut self, emoji: &str) -> SelectionOutcome {
        if !self.reactions.iter().any(|reaction| reaction == emoji) {
            return SelectionOutcome::Invalid;
        }

        if emoji == PREVIOUS_PAGE || emoji == NEXT_PAGE {
            if emoji == PREVIOUS_PAGE {
                self.page = self.page.saturating_sub(1);
            } else if (self.page + 1) * ITEMS_PER_PAGE < self.options.len() {
                self.page += 1;
            }
            let header = self.header.clone();
            if let Err(err) = self.render(&header).await {
                warn!(error = %err, "failed to re-render selector page");
            }
            return SelectionOutcome::Paged;
        }

        match emoji_index(emoji) {
            Some(position) => {
                let index = self.page * ITEMS_PER_PAGE + position;
                if index < self.options.len() {
                    SelectionOutcome::Selected(index)
                } else {
                    SelectionOutcome::Invalid
                }
            }
            None => SelectionOutcome::Invalid,
        }
    }

    fn content(&self) -> String {
        let start = self.page * ITEMS_PER_PAGE;
        let body = if self.options.is_empty() {
            self.default_message.clone()
        } else {
            self.options
                .iter()
                .skip(start)
                .take(ITEMS_PER_PAGE)
                .zip(NUMBER_EMOJIS)
                .map(|(option, emoji)| format!("{emoji} - {option}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        if self.header.is_empty() {
            body
        } else {
            format!("{}\n{body}", self.header)
        }
    }
}
