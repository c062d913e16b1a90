//! Conversation turns and registration data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChatRole, Email, EmailError};

/// One message in a conversation. Conversations are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ConversationTurn {
    #[must_use]
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Errors from the registration form.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UserInfoError {
    #[error("name cannot be empty")]
    EmptyName,
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),
    #[error("age must be between 0 and {max}, got {age}")]
    AgeOutOfRange { age: u32, max: u32 },
}

/// Details collected on the registration page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub name: String,
    pub email: Email,
    pub age: u8,
}

impl UserInfo {
    /// Oldest accepted age on the registration form.
    pub const MAX_AGE: u32 = 120;

    /// Validate registration input.
    ///
    /// # Errors
    ///
    /// Returns [`UserInfoError`] for a blank name, a malformed email, or an age
    /// above [`Self::MAX_AGE`].
    pub fn new(name: &str, email: &str, age: u32) -> Result<Self, UserInfoError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(UserInfoError::EmptyName);
        }
        let email = Email::parse(email)?;
        let age = u8::try_from(age)
            .ok()
            .filter(|a| u32::from(*a) <= Self::MAX_AGE)
            .ok_or(UserInfoError::AgeOutOfRange {
                age,
                max: Self::MAX_AGE,
            })?;

        Ok(Self {
            name: name.to_owned(),
            email,
            age,
        })
    }

    /// Greeting shown at the top of the chat page.
    #[must_use]
    pub fn greeting(&self) -> String {
        format!("Welcome {}!", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_info_valid() {
        let user = UserInfo::new(" Ada ", "ada@vendease.com", 36).expect("valid user");
        assert_eq!(user.name, "Ada");
        assert_eq!(user.age, 36);
        assert_eq!(user.greeting(), "Welcome Ada!");
    }

    #[test]
    fn test_user_info_age_bounds() {
        assert!(UserInfo::new("Ada", "ada@vendease.com", 0).is_ok());
        assert!(UserInfo::new("Ada", "ada@vendease.com", 120).is_ok());
        assert_eq!(
            UserInfo::new("Ada", "ada@vendease.com", 121),
            Err(UserInfoError::AgeOutOfRange { age: 121, max: 120 })
        );
        assert!(UserInfo::new("Ada", "ada@vendease.com", 999).is_err());
    }

    #[test]
    fn test_user_info_rejects_blank_name_and_bad_email() {
        assert_eq!(
            UserInfo::new("  ", "ada@vendease.com", 30),
            Err(UserInfoError::EmptyName)
        );
        assert!(matches!(
            UserInfo::new("Ada", "ada", 30),
            Err(UserInfoError::Email(_))
        ));
    }

    #[test]
    fn test_turn_constructors() {
        assert_eq!(ConversationTurn::user("hi").role, ChatRole::User);
        assert_eq!(ConversationTurn::assistant("hello").content, "hello");
    }
}
