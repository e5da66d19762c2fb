use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

pub type SessionId = u32;

pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub title: String,
    pub speaker: String,
    pub date: String,
    pub time: String,
    pub image: String,
    pub description: String,
}

/// The "Create New Session" form. Every field but the image is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionForm {
    pub title: String,
    pub speaker: String,
    pub date: String,
    pub time: String,
    pub image: String,
    pub description: String,
}

impl SessionForm {
    fn is_complete(&self) -> bool {
        [&self.title, &self.speaker, &self.date, &self.time, &self.description]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

pub struct Schedule {
    sessions: Vec<Session>,
    joined: BTreeSet<SessionId>,
    draft: SessionForm,
    modal_open: bool,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            sessions: vec![
                Session {
                    id: 1,
                    title: "Frontend Development with React".to_string(),
                    speaker: "Alice Johnson".to_string(),
                    date: "2025-07-10".to_string(),
                    time: "3:00 PM".to_string(),
                    image: PLACEHOLDER_IMAGE.to_string(),
                    description: "Learn modern frontend development using React and TypeScript.".to_string(),
                },
                Session {
                    id: 2,
                    title: "Cracking Tech Interviews".to_string(),
                    speaker: "Bob Smith".to_string(),
                    date: "2025-07-12".to_string(),
                    time: "5:00 PM".to_string(),
                    image: PLACEHOLDER_IMAGE.to_string(),
                    description: "Get insider tips from Bob to land your next big tech job.".to_string(),
                },
            ],
            joined: BTreeSet::new(),
            draft: SessionForm::default(),
            modal_open: false,
        }
    }
}

impl Schedule {
    pub fn empty() -> Self {
        Self {
            sessions: Vec::new(),
            ..Default::default()
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn joined(&self) -> &BTreeSet<SessionId> {
        &self.joined
    }

    pub fn is_joined(&self, id: SessionId) -> bool {
        self.joined.contains(&id)
    }

    pub fn draft(&self) -> &SessionForm {
        &self.draft
    }

    pub fn edit_draft(&mut self, form: SessionForm) {
        self.draft = form;
    }

    pub fn modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn toggle_modal(&mut self) -> bool {
        self.modal_open = !self.modal_open;
        self.modal_open
    }

    /// Prepends a session built from the draft. An incomplete draft is kept as is.
    pub fn create(&mut self) -> Option<&Session> {
        if !self.draft.is_complete() {
            tracing::debug!("session draft is missing required fields");
            return None;
        }

        let SessionForm { title, speaker, date, time, image, description } = std::mem::take(&mut self.draft);
        let session = Session {
            id: self.sessions.len() as SessionId + 1,
            title,
            speaker,
            date,
            time,
            image: if image.trim().is_empty() { PLACEHOLDER_IMAGE.to_string() } else { image },
            description,
        };
        tracing::debug!(id = session.id, title = %session.title, "created session");

        self.modal_open = false;
        self.sessions.insert(0, session);
        self.sessions.first()
    }

    pub fn create_with(&mut self, form: SessionForm) -> Option<&Session> {
        self.edit_draft(form);
        self.create()
    }

    /// `Some(true)` on first join, `Some(false)` if already joined, `None` for an unknown session.
    pub fn join(&mut self, id: SessionId) -> Option<bool> {
        if !self.sessions.iter().any(|session| session.id == id) {
            return None;
        }

        Some(self.joined.insert(id))
    }

    pub fn search(&self, query: &str) -> Vec<&Session> {
        let query = query.to_lowercase();

        self.sessions
            .iter()
            .filter(|session| {
                session.title.to_lowercase().contains(&query)
                    || session.speaker.to_lowercase().contains(&query)
            })
            .collect()
    }
}
