use super::category::Category;
use super::error::FieldErrors;
use super::location::Location;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub text: String,
    pub author_id: i64,
    pub category_id: i64,
    pub location_id: Option<i64>,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

/// A post joined with everything a listing or detail page shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: String,
    pub category: Category,
    pub location: Option<Location>,
    pub comment_count: i64,
}

/// Submitted post fields, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(length(max = 256, message = "Ensure this value has at most 256 characters."))]
    pub title: String,
    #[serde(default)]
    pub text: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub category_id: Option<i64>,
    pub location_id: Option<i64>,
    pub is_published: Option<bool>,
}

impl From<&Post> for PostForm {
    fn from(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: Some(post.pub_date),
            category_id: Some(post.category_id),
            location_id: post.location_id,
            is_published: Some(post.is_published),
        }
    }
}

/// Validated post fields, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: i64,
    pub location_id: Option<i64>,
    pub is_published: bool,
}

impl PostForm {
    /// Checks field shapes. A missing `pub_date` defaults to `now` and a
    /// missing `is_published` to `true`. Whether the referenced category and
    /// location exist is left to the caller.
    pub fn clean(mut self, now: DateTime<Utc>) -> Result<PostDraft, FieldErrors> {
        self.title = self.title.trim().to_string();
        self.text = self.text.trim().to_string();

        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(failures) => FieldErrors::from(failures),
        };
        if self.title.is_empty() {
            errors.add("title", "This field is required.");
        }
        if self.text.is_empty() {
            errors.add("text", "This field is required.");
        }
        if self.category_id.is_none() {
            errors.add("category", "This field is required.");
        }

        match self.category_id {
            Some(category_id) if errors.is_empty() => Ok(PostDraft {
                title: self.title,
                text: self.text,
                pub_date: self.pub_date.unwrap_or(now),
                category_id,
                location_id: self.location_id,
                is_published: self.is_published.unwrap_or(true),
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn clean_fills_defaults() {
        let now = Utc::now();
        let draft = PostForm {
            title: " Hello ".to_string(),
            text: "World".to_string(),
            category_id: Some(3),
            ..Default::default()
        }
        .clean(now)
        .unwrap();

        assert_eq!(draft.title, "Hello");
        assert_eq!(draft.pub_date, now);
        assert!(draft.is_published);
        assert_eq!(draft.location_id, None);
    }

    #[test]
    fn clean_keeps_explicit_schedule() {
        let now = Utc::now();
        let later = now + Duration::days(2);
        let draft = PostForm {
            title: "Draft".to_string(),
            text: "Soon".to_string(),
            pub_date: Some(later),
            category_id: Some(1),
            location_id: Some(9),
            is_published: Some(false),
        }
        .clean(now)
        .unwrap();

        assert_eq!(draft.pub_date, later);
        assert!(!draft.is_published);
        assert_eq!(draft.location_id, Some(9));
    }

    #[test]
    fn clean_reports_every_missing_field() {
        let errors = PostForm::default().clean(Utc::now()).unwrap_err();
        assert!(errors.contains("title"));
        assert!(errors.contains("text"));
        assert!(errors.contains("category"));
    }

    #[test]
    fn clean_rejects_overlong_title() {
        let errors = PostForm {
            title: "x".repeat(257),
            text: "body".to_string(),
            category_id: Some(1),
            ..Default::default()
        }
        .clean(Utc::now())
        .unwrap_err();
        assert_eq!(
            errors.get("title"),
            Some(&["Ensure this value has at most 256 characters.".to_string()][..])
        );
        assert!(!errors.contains("text"));

        let padded = PostForm {
            title: format!("  {}  ", "x".repeat(256)),
            text: "body".to_string(),
            category_id: Some(1),
            ..Default::default()
        };
        assert!(padded.clean(Utc::now()).is_ok());
    }
}
