//! Who may see which posts, and who may change what.
//!
//! Everything here is a pure function of the viewer, the resource and the
//! current time. Repositories evaluate [`PostFilter`] either in SQL or by
//! calling [`PostFilter::matches`] directly.

use super::category::Category;
use super::comment::{Comment, CommentView};
use super::post::{Post, PostView};
use super::viewer::Viewer;
use chrono::{DateTime, Utc};

/// Resources with an author that alone may mutate them.
pub trait Owned {
    fn author_id(&self) -> i64;
}

impl Owned for Post {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

impl Owned for PostView {
    fn author_id(&self) -> i64 {
        self.post.author_id
    }
}

impl Owned for Comment {
    fn author_id(&self) -> i64 {
        self.author_id
    }
}

impl Owned for CommentView {
    fn author_id(&self) -> i64 {
        self.comment.author_id
    }
}

/// Published, already due, and filed under a published category.
pub fn is_public(post: &Post, category: &Category, now: DateTime<Utc>) -> bool {
    post.is_published && post.pub_date <= now && category.is_published
}

/// The visibility rule a listing is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Only public posts.
    Public,
    /// Public posts plus every post authored by this user.
    Viewer(i64),
}

impl Audience {
    pub fn of(viewer: &Viewer) -> Self {
        match viewer.user_id() {
            Some(id) => Self::Viewer(id),
            None => Self::Public,
        }
    }

    pub fn viewer_id(&self) -> Option<i64> {
        match self {
            Self::Public => None,
            Self::Viewer(id) => Some(*id),
        }
    }

    pub fn admits(&self, post: &PostView, now: DateTime<Utc>) -> bool {
        let own = self.viewer_id() == Some(post.post.author_id);
        own || is_public(&post.post, &post.category, now)
    }
}

/// `visible_posts(candidates, viewer)`: keeps the posts the viewer may see,
/// preserving the candidates' order.
pub fn visible_posts(
    candidates: impl IntoIterator<Item = PostView>,
    viewer: &Viewer,
    now: DateTime<Utc>,
) -> Vec<PostView> {
    let audience = Audience::of(viewer);
    candidates
        .into_iter()
        .filter(|post| audience.admits(post, now))
        .collect()
}

/// The detail page is open when the post is published or the viewer wrote it.
/// Publication date and category are deliberately not consulted here.
pub fn can_view_detail(post: &Post, viewer: &Viewer) -> bool {
    post.is_published || viewer.is(post.author_id)
}

pub fn can_mutate(resource: &impl Owned, viewer: &Viewer) -> bool {
    viewer.is(resource.author_id())
}

/// A listing query: an audience plus per-route narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostFilter {
    pub audience: Audience,
    pub category_id: Option<i64>,
    pub author_id: Option<i64>,
}

impl PostFilter {
    /// The home feed is public-only, even for authors.
    pub fn home() -> Self {
        Self {
            audience: Audience::Public,
            category_id: None,
            author_id: None,
        }
    }

    /// Category pages are public-only too.
    pub fn category(category_id: i64) -> Self {
        Self {
            category_id: Some(category_id),
            ..Self::home()
        }
    }

    /// One author's posts as seen by `viewer`: the author sees their drafts,
    /// everyone else only the public ones.
    pub fn author(author_id: i64, viewer: &Viewer) -> Self {
        Self {
            audience: Audience::of(viewer),
            category_id: None,
            author_id: Some(author_id),
        }
    }

    pub fn matches(&self, post: &PostView, now: DateTime<Utc>) -> bool {
        self.audience.admits(post, now)
            && self.category_id.map_or(true, |id| post.post.category_id == id)
            && self.author_id.map_or(true, |id| post.post.author_id == id)
    }
}
