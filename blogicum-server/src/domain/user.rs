use super::error::FieldErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_joined: DateTime<Utc>,
}

/// Fields a user may change on their own profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileForm {
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    #[validate(custom(
        function = "validate_username",
        message = "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
    ))]
    pub username: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this value has at most 150 characters."))]
    pub last_name: String,

    /// `None` once cleaned means the account has no address.
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
}

impl From<&User> for ProfileForm {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: Some(user.email.clone()).filter(|email| !email.is_empty()),
        }
    }
}

impl ProfileForm {
    /// Trims the fields and checks their shape. A blank email is dropped.
    /// Uniqueness of the username is checked against the store by the caller.
    pub fn clean(mut self) -> Result<Self, FieldErrors> {
        self.username = self.username.trim().to_string();
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self
            .email
            .map(|email| email.trim().to_string())
            .filter(|email| !email.is_empty());

        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(failures) => FieldErrors::from(failures),
        };
        if self.username.is_empty() {
            errors.add("username", "This field is required.");
        }

        if errors.is_empty() {
            Ok(self)
        } else {
            Err(errors)
        }
    }

    /// The address to store; empty when none was given.
    pub fn email_or_blank(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if username.chars().all(allowed) {
        Ok(())
    } else {
        Err(ValidationError::new("username"))
    }
}
