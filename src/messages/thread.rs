use std::collections::HashMap;

use serde::Serialize;
use time::{macros::format_description, OffsetDateTime};
use uuid::Uuid;

use crate::upload::ObjectRef;

pub const ME: &str = "Me";
const PEERS: [&str; 4] = ["Sonia", "Bob", "Alice", "Mahima"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub from: String,
    pub text: String,
    pub file: Option<String>,
    pub time: String,
    pub read: bool,
}

impl Message {
    fn from_me(text: String, file: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            from: ME.to_string(),
            text,
            file,
            time: clock_time(OffsetDateTime::now_utc()),
            read: false,
        }
    }
}

fn clock_time(now: OffsetDateTime) -> String {
    now.format(format_description!("[hour]:[minute]")).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// Everything the messaging panel shows besides the messages themselves.
#[derive(Debug, Clone, Serialize)]
pub struct PanelState {
    pub active: String,
    pub draft: String,
    pub typing: bool,
    pub emoji_picker: bool,
    pub theme: Theme,
}

pub struct Inbox {
    peers: Vec<String>,
    threads: HashMap<String, Vec<Message>>,
    panel: PanelState,
}

impl Default for Inbox {
    fn default() -> Self {
        Self::with_peers(PEERS)
    }
}

impl Inbox {
    /// The first peer starts out selected.
    pub fn with_peers<I, S>(peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let peers: Vec<String> = peers.into_iter().map(Into::into).collect();
        Self {
            panel: PanelState {
                active: peers.first().cloned().unwrap_or_default(),
                draft: String::new(),
                typing: false,
                emoji_picker: false,
                theme: Theme::default(),
            },
            threads: peers.iter().map(|peer| (peer.clone(), Vec::new())).collect(),
            peers,
        }
    }

    pub fn peers(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();

        self.peers
            .iter()
            .filter(|peer| peer.to_lowercase().contains(&query))
            .map(String::as_str)
            .collect()
    }

    pub fn panel(&self) -> &PanelState {
        &self.panel
    }

    pub fn active(&self) -> &str {
        &self.panel.active
    }

    pub fn thread(&self, peer: &str) -> Option<&[Message]> {
        self.threads.get(peer).map(Vec::as_slice)
    }

    pub fn active_thread(&self) -> &[Message] {
        self.thread(&self.panel.active).unwrap_or_default()
    }

    /// Switching to another peer marks that peer's whole thread read.
    /// Returns false for a peer we have no conversation with.
    pub fn select_peer(&mut self, peer: &str) -> bool {
        let Some(thread) = self.threads.get_mut(peer) else {
            return false;
        };
        if self.panel.active == peer {
            return true;
        }

        for message in thread.iter_mut() {
            message.read = true;
        }
        tracing::debug!(peer, "switched conversation");

        self.panel.active = peer.to_owned();
        true
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.panel.draft = text.into();
        self.panel.typing = true;
    }

    pub fn insert_emoji(&mut self, emoji: &str) {
        self.panel.draft.push_str(emoji);
    }

    pub fn toggle_emoji_picker(&mut self) -> bool {
        self.panel.emoji_picker = !self.panel.emoji_picker;
        self.panel.emoji_picker
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.panel.theme = self.panel.theme.toggled();
        self.panel.theme
    }

    pub fn send_text(&mut self, text: &str) -> Option<&Message> {
        if text.trim().is_empty() {
            return None;
        }

        self.panel.draft.clear();
        self.panel.typing = false;
        self.push(Message::from_me(text.to_owned(), None))
    }

    pub fn send_draft(&mut self) -> Option<&Message> {
        let draft = self.panel.draft.clone();
        self.send_text(&draft)
    }

    pub fn attach_file(&mut self, file: &ObjectRef) -> Option<&Message> {
        self.push(Message::from_me(file.name.clone(), Some(file.url.clone())))
    }

    fn push(&mut self, message: Message) -> Option<&Message> {
        let thread = self.threads.get_mut(&self.panel.active)?;
        tracing::debug!(peer = %self.panel.active, id = %message.id, "appended message");

        thread.push(message);
        thread.last()
    }
}
