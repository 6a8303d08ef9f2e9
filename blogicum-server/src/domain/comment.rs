use super::error::FieldErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub author_id: i64,
    pub post_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn clean(self) -> Result<Self, FieldErrors> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            let mut errors = FieldErrors::new();
            errors.add("text", "This field is required.");
            return Err(errors);
        }
        Ok(Self { text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comment_is_rejected() {
        let errors = CommentForm {
            text: " \n ".to_string(),
        }
        .clean()
        .unwrap_err();
        assert!(errors.contains("text"));
    }

    #[test]
    fn comment_text_is_trimmed() {
        let form = CommentForm {
            text: " nice post ".to_string(),
        }
        .clean()
        .unwrap();
        assert_eq!(form.text, "nice post");
    }
}
