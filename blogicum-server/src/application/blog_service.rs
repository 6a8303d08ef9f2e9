use super::outcome::{Outcome, Page, Redirect};
use crate::data::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use crate::data::user_repository::USERNAME_TAKEN;
use crate::domain::comment::CommentForm;
use crate::domain::pagination::{PageRequest, Pagination};
use crate::domain::policy::{can_mutate, can_view_detail, PostFilter};
use crate::domain::post::{PostDraft, PostForm};
use crate::domain::user::ProfileForm;
use crate::domain::{Comment, DomainError, FieldErrors, Post, PostView, Viewer};
use chrono::Utc;
use std::sync::Arc;

const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Edit,
    Delete,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

/// Result of resolving a resource for mutation: either the resource, or the
/// response the viewer gets instead.
enum Access<T> {
    Granted(T),
    Denied(Outcome),
}

/// One method per route. Each takes the viewer, the route identifiers and
/// the submitted payload, and returns a page to render or a redirect.
pub struct BlogService {
    posts: Arc<dyn PostRepository + Send + Sync>,
    comments: Arc<dyn CommentRepository + Send + Sync>,
    categories: Arc<dyn CategoryRepository + Send + Sync>,
    locations: Arc<dyn LocationRepository + Send + Sync>,
    users: Arc<dyn UserRepository + Send + Sync>,
}

impl BlogService {
    pub fn new(
        posts: Arc<dyn PostRepository + Send + Sync>,
        comments: Arc<dyn CommentRepository + Send + Sync>,
        categories: Arc<dyn CategoryRepository + Send + Sync>,
        locations: Arc<dyn LocationRepository + Send + Sync>,
        users: Arc<dyn UserRepository + Send + Sync>,
    ) -> Self {
        Self {
            posts,
            comments,
            categories,
            locations,
            users,
        }
    }

    /// Builds the service over a single store implementing every repository.
    pub fn with_store<S>(store: Arc<S>) -> Self
    where
        S: PostRepository
            + CommentRepository
            + CategoryRepository
            + LocationRepository
            + UserRepository
            + 'static,
    {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
        )
    }

    /// Maps an authenticated user id to a viewer. An id whose account is gone
    /// is treated as anonymous.
    pub async fn resolve_viewer(&self, user_id: i64) -> Result<Viewer, DomainError> {
        match self.users.find_by_id(user_id).await {
            Ok(user) => Ok(Viewer::Authenticated(user)),
            Err(DomainError::UserNotFound) => {
                tracing::debug!("Token for unknown user {}, treating as anonymous", user_id);
                Ok(Viewer::Anonymous)
            }
            Err(e) => Err(e),
        }
    }

    // ============== Listings ==============

    pub async fn index(&self, page: PageRequest) -> Result<Outcome, DomainError> {
        let (posts, pagination) = self.page_of_posts(PostFilter::home(), page).await?;
        Ok(Page::Index { posts, pagination }.into())
    }

    pub async fn category_posts(
        &self,
        slug: &str,
        page: PageRequest,
    ) -> Result<Outcome, DomainError> {
        let category = self.categories.find_published_by_slug(slug).await?;
        let (posts, pagination) = self
            .page_of_posts(PostFilter::category(category.id), page)
            .await?;

        Ok(Page::Category {
            category,
            posts,
            pagination,
        }
        .into())
    }

    pub async fn profile(
        &self,
        viewer: &Viewer,
        username: &str,
        page: PageRequest,
    ) -> Result<Outcome, DomainError> {
        let profile = self.users.find_by_username(username).await?;
        let (posts, pagination) = self
            .page_of_posts(PostFilter::author(profile.id, viewer), page)
            .await?;

        Ok(Page::Profile {
            profile,
            posts,
            pagination,
        }
        .into())
    }

    async fn page_of_posts(
        &self,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<(Vec<PostView>, Pagination), DomainError> {
        let now = Utc::now();
        let total = self.posts.count(&filter, now).await?;
        let pagination = page.resolve(total)?;
        let posts = self
            .posts
            .list(&filter, now, pagination.limit(), pagination.offset())
            .await?;

        Ok((posts, pagination))
    }

    // ============== Posts ==============

    pub async fn post_detail(&self, viewer: &Viewer, post_id: i64) -> Result<Outcome, DomainError> {
        let post = self.posts.find_view(post_id).await?;

        if !can_view_detail(&post.post, viewer) {
            // hidden posts look exactly like missing ones
            tracing::debug!("Post {} hidden from viewer {:?}", post_id, viewer.user_id());
            return Err(DomainError::PostNotFound);
        }

        let comments = self.comments.list_for_post(post_id).await?;

        Ok(Page::PostDetail {
            post,
            comments,
            form: CommentForm::default(),
        }
        .into())
    }

    pub fn new_post_form(&self, viewer: &Viewer) -> Outcome {
        if !viewer.is_authenticated() {
            return Outcome::login();
        }
        Page::PostForm {
            post_id: None,
            form: PostForm::default(),
        }
        .into()
    }

    pub async fn create_post(&self, viewer: &Viewer, form: PostForm) -> Result<Outcome, DomainError> {
        let Some(user) = viewer.user() else {
            return Ok(Outcome::login());
        };

        let draft = self.clean_post(form).await?;
        let post = self.posts.create(user.id, &draft).await?;

        tracing::info!("Post created: id={}, author_id={}", post.id, user.id);

        Ok(Redirect::Profile {
            username: user.username.clone(),
        }
        .into())
    }

    pub async fn edit_post_form(&self, viewer: &Viewer, post_id: i64) -> Result<Outcome, DomainError> {
        let post = match self.post_for_mutation(viewer, post_id, Action::Edit).await? {
            Access::Granted(post) => post,
            Access::Denied(outcome) => return Ok(outcome),
        };

        Ok(Page::PostForm {
            post_id: Some(post.id),
            form: PostForm::from(&post),
        }
        .into())
    }

    pub async fn update_post(
        &self,
        viewer: &Viewer,
        post_id: i64,
        form: PostForm,
    ) -> Result<Outcome, DomainError> {
        let post = match self.post_for_mutation(viewer, post_id, Action::Edit).await? {
            Access::Granted(post) => post,
            Access::Denied(outcome) => return Ok(outcome),
        };

        let draft = self.clean_post(form).await?;
        let updated = self.posts.update(post.id, &draft).await?;

        tracing::info!("Post updated: id={}, author_id={}", updated.id, updated.author_id);

        Ok(Redirect::PostDetail {
            post_id: updated.id,
        }
        .into())
    }

    pub async fn delete_post_confirm(
        &self,
        viewer: &Viewer,
        post_id: i64,
    ) -> Result<Outcome, DomainError> {
        if let Access::Denied(outcome) = self.post_for_mutation(viewer, post_id, Action::Delete).await? {
            return Ok(outcome);
        }

        let post = self.posts.find_view(post_id).await?;
        Ok(Page::PostDelete { post }.into())
    }

    pub async fn delete_post(&self, viewer: &Viewer, post_id: i64) -> Result<Outcome, DomainError> {
        let post = match self.post_for_mutation(viewer, post_id, Action::Delete).await? {
            Access::Granted(post) => post,
            Access::Denied(outcome) => return Ok(outcome),
        };

        self.posts.delete(post.id).await?;

        tracing::info!("Post deleted: id={}, author_id={}", post.id, post.author_id);

        Ok(Redirect::Index.into())
    }

    /// Login, existence, then ownership. A refused edit goes back to the
    /// post, a refused delete to the index.
    async fn post_for_mutation(
        &self,
        viewer: &Viewer,
        post_id: i64,
        action: Action,
    ) -> Result<Access<Post>, DomainError> {
        let Some(user) = viewer.user() else {
            return Ok(Access::Denied(Outcome::login()));
        };

        let post = self.posts.find_by_id(post_id).await?;

        if !can_mutate(&post, viewer) {
            tracing::warn!(
                "User {} attempted to {} post {} owned by {}",
                user.id,
                action.as_str(),
                post.id,
                post.author_id
            );
            let fallback = match action {
                Action::Edit => Redirect::PostDetail { post_id: post.id },
                Action::Delete => Redirect::Index,
            };
            return Ok(Access::Denied(fallback.into()));
        }

        Ok(Access::Granted(post))
    }

    /// Field checks first, then that the referenced category and location
    /// exist.
    async fn clean_post(&self, form: PostForm) -> Result<PostDraft, DomainError> {
        let draft = form.clean(Utc::now()).map_err(DomainError::Validation)?;
        let mut errors = FieldErrors::new();

        match self.categories.find_by_id(draft.category_id).await {
            Ok(_) => {}
            Err(DomainError::CategoryNotFound) => errors.add("category", INVALID_CHOICE),
            Err(e) => return Err(e),
        }

        if let Some(location_id) = draft.location_id {
            match self.locations.find_by_id(location_id).await {
                Ok(_) => {}
                Err(DomainError::LocationNotFound) => errors.add("location", INVALID_CHOICE),
                Err(e) => return Err(e),
            }
        }

        errors.into_result()?;
        Ok(draft)
    }

    // ============== Comments ==============

    pub async fn add_comment(
        &self,
        viewer: &Viewer,
        post_id: i64,
        form: CommentForm,
    ) -> Result<Outcome, DomainError> {
        let Some(user) = viewer.user() else {
            return Ok(Outcome::login());
        };

        let post = self.posts.find_by_id(post_id).await?;
        let form = form.clean().map_err(DomainError::Validation)?;
        let comment = self.comments.create(post.id, user.id, &form).await?;

        tracing::info!(
            "Comment created: id={}, post_id={}, author_id={}",
            comment.id,
            post.id,
            user.id
        );

        Ok(Redirect::PostDetail { post_id: post.id }.into())
    }

    pub async fn edit_comment_form(
        &self,
        viewer: &Viewer,
        comment_id: i64,
    ) -> Result<Outcome, DomainError> {
        let comment = match self.comment_for_mutation(viewer, comment_id, Action::Edit).await? {
            Access::Granted(comment) => comment,
            Access::Denied(outcome) => return Ok(outcome),
        };

        let form = CommentForm {
            text: comment.text.clone(),
        };
        Ok(Page::CommentForm { comment, form }.into())
    }

    pub async fn update_comment(
        &self,
        viewer: &Viewer,
        comment_id: i64,
        form: CommentForm,
    ) -> Result<Outcome, DomainError> {
        let comment = match self.comment_for_mutation(viewer, comment_id, Action::Edit).await? {
            Access::Granted(comment) => comment,
            Access::Denied(outcome) => return Ok(outcome),
        };

        let form = form.clean().map_err(DomainError::Validation)?;
        let updated = self.comments.update(comment.id, &form).await?;

        tracing::info!(
            "Comment updated: id={}, post_id={}",
            updated.id,
            updated.post_id
        );

        Ok(Redirect::PostDetail {
            post_id: updated.post_id,
        }
        .into())
    }

    pub async fn delete_comment_confirm(
        &self,
        viewer: &Viewer,
        comment_id: i64,
    ) -> Result<Outcome, DomainError> {
        match self.comment_for_mutation(viewer, comment_id, Action::Delete).await? {
            Access::Granted(comment) => Ok(Page::CommentDelete { comment }.into()),
            Access::Denied(outcome) => Ok(outcome),
        }
    }

    pub async fn delete_comment(
        &self,
        viewer: &Viewer,
        comment_id: i64,
    ) -> Result<Outcome, DomainError> {
        let comment = match self.comment_for_mutation(viewer, comment_id, Action::Delete).await? {
            Access::Granted(comment) => comment,
            Access::Denied(outcome) => return Ok(outcome),
        };

        self.comments.delete(comment.id).await?;

        tracing::info!(
            "Comment deleted: id={}, post_id={}",
            comment.id,
            comment.post_id
        );

        Ok(Redirect::PostDetail {
            post_id: comment.post_id,
        }
        .into())
    }

    /// Refusals always go back to the comment's post.
    async fn comment_for_mutation(
        &self,
        viewer: &Viewer,
        comment_id: i64,
        action: Action,
    ) -> Result<Access<Comment>, DomainError> {
        let Some(user) = viewer.user() else {
            return Ok(Access::Denied(Outcome::login()));
        };

        let comment = self.comments.find_by_id(comment_id).await?;

        if !can_mutate(&comment, viewer) {
            tracing::warn!(
                "User {} attempted to {} comment {} owned by {}",
                user.id,
                action.as_str(),
                comment.id,
                comment.author_id
            );
            return Ok(Access::Denied(
                Redirect::PostDetail {
                    post_id: comment.post_id,
                }
                .into(),
            ));
        }

        Ok(Access::Granted(comment))
    }

    // ============== Profile ==============

    pub fn profile_form(&self, viewer: &Viewer) -> Outcome {
        match viewer.user() {
            Some(user) => Page::ProfileForm {
                form: ProfileForm::from(user),
            }
            .into(),
            None => Outcome::login(),
        }
    }

    /// The edited account is always the viewer's own.
    pub async fn update_profile(
        &self,
        viewer: &Viewer,
        form: ProfileForm,
    ) -> Result<Outcome, DomainError> {
        let Some(user) = viewer.user() else {
            return Ok(Outcome::login());
        };

        let form = form.clean().map_err(DomainError::Validation)?;

        match self.users.find_by_username(&form.username).await {
            Ok(other) if other.id != user.id => {
                return Err(DomainError::invalid("username", USERNAME_TAKEN));
            }
            Ok(_) | Err(DomainError::UserNotFound) => {}
            Err(e) => return Err(e),
        }

        let updated = self.users.update_profile(user.id, &form).await?;

        tracing::info!(
            "Profile updated: id={}, username={}",
            updated.id,
            updated.username
        );

        Ok(Redirect::Profile {
            username: updated.username,
        }
        .into())
    }
}
