use crate::domain::comment::CommentForm;
use crate::domain::pagination::Pagination;
use crate::domain::post::PostForm;
use crate::domain::user::ProfileForm;
use crate::domain::{Category, Comment, CommentView, PostView, User};
use serde::Serialize;

/// What a route handler decided to do with the request.
#[derive(Debug, Clone)]
pub enum Outcome {
    Render(Page),
    Redirect(Redirect),
}

impl Outcome {
    pub fn login() -> Self {
        Self::Redirect(Redirect::Login)
    }

    pub fn page(&self) -> Option<&Page> {
        match self {
            Self::Render(page) => Some(page),
            Self::Redirect(_) => None,
        }
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Render(_) => None,
            Self::Redirect(redirect) => Some(redirect),
        }
    }
}

impl From<Page> for Outcome {
    fn from(page: Page) -> Self {
        Self::Render(page)
    }
}

impl From<Redirect> for Outcome {
    fn from(redirect: Redirect) -> Self {
        Self::Redirect(redirect)
    }
}

/// A rendered page context, tagged with the page name.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum Page {
    Index {
        posts: Vec<PostView>,
        pagination: Pagination,
    },
    Category {
        category: Category,
        posts: Vec<PostView>,
        pagination: Pagination,
    },
    Profile {
        profile: User,
        posts: Vec<PostView>,
        pagination: Pagination,
    },
    PostDetail {
        post: PostView,
        comments: Vec<CommentView>,
        form: CommentForm,
    },
    PostForm {
        post_id: Option<i64>,
        form: PostForm,
    },
    PostDelete {
        post: PostView,
    },
    CommentForm {
        comment: Comment,
        form: CommentForm,
    },
    CommentDelete {
        comment: Comment,
    },
    ProfileForm {
        form: ProfileForm,
    },
}

impl Page {
    /// Posts shown by a listing page, empty for every other page.
    pub fn posts(&self) -> &[PostView] {
        match self {
            Self::Index { posts, .. }
            | Self::Category { posts, .. }
            | Self::Profile { posts, .. } => posts,
            _ => &[],
        }
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        match self {
            Self::Index { pagination, .. }
            | Self::Category { pagination, .. }
            | Self::Profile { pagination, .. } => Some(pagination),
            _ => None,
        }
    }
}

/// Where to send the viewer next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirect {
    /// The login entry point; the requested path is appended as `next`.
    Login,
    Index,
    Profile { username: String },
    PostDetail { post_id: i64 },
}

impl Redirect {
    pub fn location(&self, login_url: &str, requested_path: &str) -> String {
        match self {
            Self::Login => format!(
                "{}?next={}",
                login_url,
                urlencoding::encode(requested_path)
            ),
            Self::Index => "/".to_string(),
            Self::Profile { username } => {
                format!("/profile/{}/", urlencoding::encode(username))
            }
            Self::PostDetail { post_id } => format!("/posts/{}/", post_id),
        }
    }
}
