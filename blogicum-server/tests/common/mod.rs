#![allow(dead_code)]

use blogicum_server::application::{BlogService, Outcome, Page, Redirect};
use blogicum_server::data::{InMemoryStore, PostRepository};
use blogicum_server::domain::post::PostDraft;
use blogicum_server::domain::{Category, Post, Viewer};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// A blog over the in-memory store with one published category.
pub struct Blog {
    pub store: Arc<InMemoryStore>,
    pub service: Arc<BlogService>,
    pub category: Category,
}

impl Blog {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let category = store
            .add_category("Travel", "travel", true)
            .expect("seed category");
        let service = Arc::new(BlogService::with_store(store.clone()));
        Self {
            store,
            service,
            category,
        }
    }

    pub fn viewer(&self, username: &str) -> Viewer {
        Viewer::from(self.store.add_user(username).expect("seed user"))
    }

    /// Inserts a post directly, bypassing the create route.
    pub async fn seed_post(
        &self,
        author: &Viewer,
        category_id: i64,
        pub_date: DateTime<Utc>,
        is_published: bool,
    ) -> Post {
        let author_id = author.user_id().expect("seeded posts need an author");
        let draft = PostDraft {
            title: "Seeded".to_string(),
            text: "Seeded text".to_string(),
            pub_date,
            category_id,
            location_id: None,
            is_published,
        };
        PostRepository::create(self.store.as_ref(), author_id, &draft)
            .await
            .expect("seed post")
    }

    pub async fn public_post(&self, author: &Viewer) -> Post {
        self.seed_post(author, self.category.id, Utc::now() - Duration::hours(1), true)
            .await
    }
}

pub fn page(outcome: Outcome) -> Page {
    match outcome {
        Outcome::Render(page) => page,
        Outcome::Redirect(redirect) => panic!("expected a page, got redirect {:?}", redirect),
    }
}

pub fn redirect(outcome: Outcome) -> Redirect {
    match outcome {
        Outcome::Redirect(redirect) => redirect,
        Outcome::Render(page) => panic!("expected a redirect, got page {:?}", page),
    }
}

pub fn post_ids(page: &Page) -> Vec<i64> {
    page.posts().iter().map(|view| view.post.id).collect()
}
