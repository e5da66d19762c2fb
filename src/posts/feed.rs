use std::collections::HashMap;

use serde::Serialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

pub type PostId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub id: PostId,
    pub author: String,
    pub title: Option<String>,
    pub content: String,
    pub image: Option<String>,
    pub created_at: String,
    pub likes: u32,
    pub liked: bool,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub author: String,
    pub title: Option<String>,
    pub content: String,
    pub image: Option<String>,
}

/// Answer to the "really delete this post?" prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(confirmed: bool) -> Self {
        if confirmed { Confirmation::Confirmed } else { Confirmation::Declined }
    }
}

#[derive(Default)]
pub struct PostFeed {
    posts: Vec<Post>,
    comment_drafts: HashMap<PostId, String>,
    last_id: PostId,
}

impl PostFeed {
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn get(&self, id: PostId) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == id)
    }

    pub fn create(&mut self, new: NewPost) -> Option<&Post> {
        self.create_at(new, OffsetDateTime::now_utc())
    }

    fn create_at(&mut self, NewPost { author, title, content, image }: NewPost, now: OffsetDateTime) -> Option<&Post> {
        if content.trim().is_empty() {
            tracing::debug!("ignoring empty post");
            return None;
        }

        // millisecond clock ids, bumped past the last one so two posts in the same ms stay distinct
        let now_ms = (now.unix_timestamp_nanos() / 1_000_000) as PostId;
        let id = now_ms.max(self.last_id + 1);
        self.last_id = id;

        let post = Post {
            id,
            author,
            title: title.filter(|title| !title.trim().is_empty()),
            content,
            image,
            created_at: now.format(&Rfc3339).unwrap_or_default(),
            likes: 0,
            liked: false,
            comments: Vec::new(),
        };
        tracing::debug!(id, author = %post.author, "created post");

        self.posts.insert(0, post);
        self.posts.first()
    }

    pub fn toggle_like(&mut self, id: PostId) -> Option<&Post> {
        let post = self.posts.iter_mut().find(|post| post.id == id)?;

        post.liked = !post.liked;
        post.likes = if post.liked {
            post.likes + 1
        } else {
            post.likes.saturating_sub(1)
        };

        Some(&*post)
    }

    /// Returns false when there is no such post to hold a draft for.
    pub fn set_comment_draft(&mut self, id: PostId, text: impl Into<String>) -> bool {
        if self.get(id).is_none() {
            return false;
        }

        self.comment_drafts.insert(id, text.into());
        true
    }

    pub fn comment_draft(&self, id: PostId) -> &str {
        self.comment_drafts.get(&id).map(String::as_str).unwrap_or("")
    }

    /// Blank comments leave both the post and its input buffer alone.
    pub fn add_comment(&mut self, id: PostId, text: &str) -> Option<&Post> {
        let post = self.posts.iter_mut().find(|post| post.id == id)?;

        if !text.trim().is_empty() {
            post.comments.push(text.to_owned());
            self.comment_drafts.remove(&id);
        }

        Some(&*post)
    }

    pub fn submit_comment_draft(&mut self, id: PostId) -> Option<&Post> {
        let draft = self.comment_draft(id).to_owned();
        self.add_comment(id, &draft)
    }

    pub fn delete(&mut self, id: PostId, confirmation: Confirmation) -> Option<Post> {
        if confirmation == Confirmation::Declined {
            tracing::debug!(id, "post deletion declined");
            return None;
        }

        let index = self.posts.iter().position(|post| post.id == id)?;
        self.comment_drafts.remove(&id);
        tracing::debug!(id, "deleted post");

        Some(self.posts.remove(index))
    }

    pub fn search(&self, query: &str) -> Vec<&Post> {
        let query = query.to_lowercase();

        self.posts
            .iter()
            .filter(|post| {
                post.content.to_lowercase().contains(&query)
                    || post.author.to_lowercase().contains(&query)
                    || post.title.as_deref().is_some_and(|title| title.to_lowercase().contains(&query))
            })
            .collect()
    }
}
