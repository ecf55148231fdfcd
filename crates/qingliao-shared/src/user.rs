//! The full user record as the directory stores it.
//!
//! `User` deliberately does not implement `Serialize`: anything sent to a
//! client goes through [`UserCard`](crate::card::UserCard).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
#[repr(u8)]
pub enum Sex {
    #[default]
    Unspecified = 0,
    Male = 1,
    Female = 2,
}

impl From<u8> for Sex {
    fn from(code: u8) -> Self {
        match code {
            1 => Self::Male,
            2 => Self::Female,
            _ => Self::Unspecified,
        }
    }
}

impl From<Sex> for u8 {
    fn from(sex: Sex) -> Self {
        sex as u8
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub phone: String,
    /// Password hash.
    pub password: String,
    /// Avatar URI.
    pub portrait: Option<String>,
    pub description: Option<String>,
    pub sex: Sex,
    /// Session token.
    pub token: Option<String>,
    /// Device id used by the push channel.
    pub push_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_received_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: name.into(),
            phone: phone.into(),
            password: password_hash.into(),
            portrait: None,
            description: None,
            sex: Sex::Unspecified,
            token: None,
            push_id: None,
            created_at: now,
            updated_at: now,
            last_received_at: now,
        }
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("password", &"<redacted>")
            .field("portrait", &self.portrait)
            .field("description", &self.description)
            .field("sex", &self.sex)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("push_id", &self.push_id.as_ref().map(|_| "<redacted>"))
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("last_received_at", &self.last_received_at)
            .finish()
    }
}
