use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{upload::{DecodeTask, Upload}, Shared};

pub type ProfileId = u32;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    pub branch: String,
    pub year: String,
    pub skills: String,
    pub about: String,
    pub picture: Option<String>,
}

impl Profile {
    fn sample(id: ProfileId, name: &str, branch: &str, year: &str, skills: &str, about: &str) -> Self {
        Self {
            id,
            name: name.to_owned(),
            branch: branch.to_owned(),
            year: year.to_owned(),
            skills: skills.to_owned(),
            about: about.to_owned(),
            picture: None,
        }
    }

    fn matches(&self, query: &str) -> bool {
        [&self.name, &self.branch, &self.skills]
            .iter()
            .any(|field| field.to_lowercase().contains(query))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileField {
    Name,
    Branch,
    Year,
    Skills,
    About,
}

/// One editing session of "my profile". Every reset gets a fresh instance id.
#[derive(Debug, Clone, Serialize)]
pub struct Draft {
    pub instance: Uuid,
    #[serde(flatten)]
    pub profile: Profile,
}

impl Draft {
    fn new(id: ProfileId) -> Self {
        Self {
            instance: Uuid::now_v7(),
            profile: Profile { id, ..Default::default() },
        }
    }
}

pub struct ProfileStore {
    draft: Draft,
    directory: Vec<Profile>,
    pending_picture: Option<DecodeTask>,
}

const MY_PROFILE_ID: ProfileId = 1;

impl Default for ProfileStore {
    fn default() -> Self {
        Self {
            draft: Draft::new(MY_PROFILE_ID),
            directory: vec![
                Profile::sample(2, "Sonia", "IT", "3rd", "Python, Java", "ML enthusiast"),
                Profile::sample(3, "Bob", "CSE", "2nd", "React, Node.js", "Full-stack developer"),
                Profile::sample(4, "Alice", "ECE", "4th", "VLSI, C++", "Loves hardware!"),
            ],
            pending_picture: None,
        }
    }
}

impl ProfileStore {
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn directory(&self) -> &[Profile] {
        &self.directory
    }

    pub fn update_field(&mut self, field: ProfileField, value: impl Into<String>) {
        let profile = &mut self.draft.profile;
        let slot = match field {
            ProfileField::Name => &mut profile.name,
            ProfileField::Branch => &mut profile.branch,
            ProfileField::Year => &mut profile.year,
            ProfileField::Skills => &mut profile.skills,
            ProfileField::About => &mut profile.about,
        };
        *slot = value.into();
    }

    /// Replaces any directory entry sharing the draft's id. Nameless drafts are not saved.
    pub fn save(&mut self) -> Option<&Profile> {
        if self.draft.profile.name.trim().is_empty() {
            tracing::debug!("not saving a profile without a name");
            return None;
        }

        let id = self.draft.profile.id;
        self.directory.retain(|profile| profile.id != id);
        self.directory.push(self.draft.profile.clone());
        tracing::debug!(id, "saved profile");

        self.directory.last()
    }

    /// Starts over with an empty draft; a picture still decoding for the old one is dropped.
    pub fn discard_draft(&mut self) -> Uuid {
        if let Some(task) = self.pending_picture.take() {
            task.cancel();
        }

        self.draft = Draft::new(self.draft.profile.id);
        self.draft.instance
    }

    pub fn search(&self, query: &str) -> Vec<&Profile> {
        let query = query.to_lowercase();
        self.directory.iter().filter(|profile| profile.matches(&query)).collect()
    }

    /// Only lands on the draft instance the decode was started for,
    /// and only touches the picture so edits made meanwhile survive.
    pub fn apply_picture(&mut self, instance: Uuid, picture: String) -> bool {
        if self.draft.instance != instance {
            tracing::warn!(%instance, current = %self.draft.instance, "dropping picture for a stale draft");
            return false;
        }

        self.draft.profile.picture = Some(picture);
        true
    }

    pub fn picture_pending(&self) -> bool {
        self.pending_picture.as_ref().is_some_and(|task| !task.is_finished())
    }
}

/// Decodes the picture on a background task bound to the current draft instance.
/// A newer upload replaces (and cancels) an older one still in flight.
pub async fn upload_picture(profiles: &Shared<ProfileStore>, upload: Upload) -> Uuid {
    let mut store = profiles.lock().await;
    let instance = store.draft.instance;
    tracing::debug!(%instance, name = %upload.name, size = upload.size(), "decoding profile picture");

    let target = profiles.clone();
    let handle = tokio::spawn(async move {
        match upload.decode_data_url().await {
            Ok(picture) => {
                target.lock().await.apply_picture(instance, picture);
            }
            Err(err) => tracing::warn!("couldn't decode profile picture: {err:#}"),
        }
    });

    if let Some(previous) = store.pending_picture.replace(DecodeTask::new(instance, handle)) {
        previous.cancel();
    }

    instance
}
