//! An in-process store implementing every repository trait.
//!
//! Listings are filtered with the same [`PostFilter::matches`] predicate the
//! SQL `WHERE` clause mirrors, so the dispatcher behaves identically over
//! either backend. Used by the test suites and for local experiments.

use super::category_repository::{CategoryRepository, LocationRepository};
use super::comment_repository::CommentRepository;
use super::post_repository::PostRepository;
use super::user_repository::{UserRepository, USERNAME_TAKEN};
use crate::domain::comment::CommentForm;
use crate::domain::policy::PostFilter;
use crate::domain::post::PostDraft;
use crate::domain::user::ProfileForm;
use crate::domain::{
    Category, Comment, CommentView, DomainError, Location, Post, PostView, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    locations: BTreeMap<i64, Location>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn post_view(&self, post: &Post) -> Result<PostView, DomainError> {
        let author = self
            .users
            .get(&post.author_id)
            .ok_or(DomainError::UserNotFound)?;
        let category = self
            .categories
            .get(&post.category_id)
            .ok_or(DomainError::CategoryNotFound)?;
        let location = post
            .location_id
            .and_then(|id| self.locations.get(&id))
            .cloned();
        let comment_count = self
            .comments
            .values()
            .filter(|comment| comment.post_id == post.id)
            .count() as i64;

        Ok(PostView {
            post: post.clone(),
            author: author.username.clone(),
            category: category.clone(),
            location,
            comment_count,
        })
    }

    fn matching(&self, filter: &PostFilter, now: DateTime<Utc>) -> Result<Vec<PostView>, DomainError> {
        let mut views = Vec::new();
        for post in self.posts.values() {
            let view = self.post_view(post)?;
            if filter.matches(&view, now) {
                views.push(view);
            }
        }
        // posts iterate in id order, and the sort is stable
        views.sort_by(|a, b| b.post.pub_date.cmp(&a.post.pub_date));
        Ok(views)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, DomainError> {
        self.tables
            .read()
            .map_err(|_| DomainError::InternalError("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, DomainError> {
        self.tables
            .write()
            .map_err(|_| DomainError::InternalError("store lock poisoned".to_string()))
    }

    /// Registers an account, as the auth service would.
    pub fn add_user(&self, username: &str) -> Result<User, DomainError> {
        let mut tables = self.write()?;
        if tables.users.values().any(|user| user.username == username) {
            return Err(DomainError::invalid("username", USERNAME_TAKEN));
        }
        let user = User {
            id: tables.next_id(),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            date_joined: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    pub fn add_category(
        &self,
        title: &str,
        slug: &str,
        is_published: bool,
    ) -> Result<Category, DomainError> {
        let mut tables = self.write()?;
        let category = Category {
            id: tables.next_id(),
            title: title.to_string(),
            description: String::new(),
            slug: slug.to_string(),
            is_published,
        };
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    pub fn set_category_published(&self, id: i64, is_published: bool) -> Result<(), DomainError> {
        let mut tables = self.write()?;
        let category = tables
            .categories
            .get_mut(&id)
            .ok_or(DomainError::CategoryNotFound)?;
        category.is_published = is_published;
        Ok(())
    }

    pub fn add_location(&self, name: &str) -> Result<Location, DomainError> {
        let mut tables = self.write()?;
        let location = Location {
            id: tables.next_id(),
            name: name.to_string(),
            is_published: true,
        };
        tables.locations.insert(location.id, location.clone());
        Ok(location)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, author_id: i64, draft: &PostDraft) -> Result<Post, DomainError> {
        let mut tables = self.write()?;
        let post = Post {
            id: tables.next_id(),
            title: draft.title.clone(),
            text: draft.text.clone(),
            author_id,
            category_id: draft.category_id,
            location_id: draft.location_id,
            pub_date: draft.pub_date,
            is_published: draft.is_published,
            created_at: Utc::now(),
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: i64) -> Result<Post, DomainError> {
        self.read()?
            .posts
            .get(&id)
            .cloned()
            .ok_or(DomainError::PostNotFound)
    }

    async fn find_view(&self, id: i64) -> Result<PostView, DomainError> {
        let tables = self.read()?;
        let post = tables.posts.get(&id).ok_or(DomainError::PostNotFound)?;
        tables.post_view(post)
    }

    async fn update(&self, id: i64, draft: &PostDraft) -> Result<Post, DomainError> {
        let mut tables = self.write()?;
        let post = tables.posts.get_mut(&id).ok_or(DomainError::PostNotFound)?;
        post.title = draft.title.clone();
        post.text = draft.text.clone();
        post.category_id = draft.category_id;
        post.location_id = draft.location_id;
        post.pub_date = draft.pub_date;
        post.is_published = draft.is_published;
        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let mut tables = self.write()?;
        tables.posts.remove(&id).ok_or(DomainError::PostNotFound)?;
        tables.comments.retain(|_, comment| comment.post_id != id);
        Ok(())
    }

    async fn count(&self, filter: &PostFilter, now: DateTime<Utc>) -> Result<i64, DomainError> {
        Ok(self.read()?.matching(filter, now)?.len() as i64)
    }

    async fn list(
        &self,
        filter: &PostFilter,
        now: DateTime<Utc>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<PostView>, DomainError> {
        let views = self.read()?.matching(filter, now)?;
        Ok(views
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(
        &self,
        post_id: i64,
        author_id: i64,
        form: &CommentForm,
    ) -> Result<Comment, DomainError> {
        let mut tables = self.write()?;
        if !tables.posts.contains_key(&post_id) {
            return Err(DomainError::PostNotFound);
        }
        let comment = Comment {
            id: tables.next_id(),
            text: form.text.clone(),
            author_id,
            post_id,
            created_at: Utc::now(),
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: i64) -> Result<Comment, DomainError> {
        self.read()?
            .comments
            .get(&id)
            .cloned()
            .ok_or(DomainError::CommentNotFound)
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentView>, DomainError> {
        let tables = self.read()?;
        let mut comments = tables
            .comments
            .values()
            .filter(|comment| comment.post_id == post_id)
            .map(|comment| {
                let author = tables
                    .users
                    .get(&comment.author_id)
                    .ok_or(DomainError::UserNotFound)?;
                Ok(CommentView {
                    comment: comment.clone(),
                    author: author.username.clone(),
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        comments.sort_by_key(|view| (view.comment.created_at, view.comment.id));
        Ok(comments)
    }

    async fn update(&self, id: i64, form: &CommentForm) -> Result<Comment, DomainError> {
        let mut tables = self.write()?;
        let comment = tables
            .comments
            .get_mut(&id)
            .ok_or(DomainError::CommentNotFound)?;
        comment.text = form.text.clone();
        Ok(comment.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        self.write()?
            .comments
            .remove(&id)
            .map(|_| ())
            .ok_or(DomainError::CommentNotFound)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError> {
        self.read()?
            .categories
            .get(&id)
            .cloned()
            .ok_or(DomainError::CategoryNotFound)
    }

    async fn find_published_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        self.read()?
            .categories
            .values()
            .find(|category| category.slug == slug && category.is_published)
            .cloned()
            .ok_or(DomainError::CategoryNotFound)
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Location, DomainError> {
        self.read()?
            .locations
            .get(&id)
            .cloned()
            .ok_or(DomainError::LocationNotFound)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<User, DomainError> {
        self.read()?
            .users
            .get(&id)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        self.read()?
            .users
            .values()
            .find(|user| user.username == username)
            .cloned()
            .ok_or(DomainError::UserNotFound)
    }

    async fn update_profile(&self, id: i64, form: &ProfileForm) -> Result<User, DomainError> {
        let mut tables = self.write()?;
        if tables
            .users
            .values()
            .any(|user| user.id != id && user.username == form.username)
        {
            return Err(DomainError::invalid("username", USERNAME_TAKEN));
        }
        let user = tables.users.get_mut(&id).ok_or(DomainError::UserNotFound)?;
        user.username = form.username.clone();
        user.first_name = form.first_name.clone();
        user.last_name = form.last_name.clone();
        user.email = form.email_or_blank().to_string();
        Ok(user.clone())
    }
}
