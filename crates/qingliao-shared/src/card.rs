//! Cards are the only shapes of users and messages that leave the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::message::{DeliveryTarget, MessageEnvelope, MessageKind};
use crate::types::{GroupId, MessageId, UserId};
use crate::user::{Sex, User};

// ---------------------------------------------------------------------------
// UserCard
// ---------------------------------------------------------------------------

/// Public view of a user, computed for one viewer.
///
/// `is_follow` says whether the viewer follows this user, so a card built for
/// one viewer must not be handed to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCard {
    pub id: UserId,
    pub name: String,
    pub phone: String,
    pub portrait: Option<String>,
    pub desc: Option<String>,
    pub sex: Sex,
    /// Last time the profile changed.
    pub modify_at: DateTime<Utc>,
    /// How many users this user follows.
    pub follows: u32,
    /// How many users follow this user.
    pub following: u32,
    pub is_follow: bool,
}

impl UserCard {
    /// Copy the public fields of `user`. Follow counts start at zero; see
    /// [`with_follow_counts`](Self::with_follow_counts).
    pub fn build(user: &User, viewer_follows: bool) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            phone: user.phone.clone(),
            portrait: user.portrait.clone(),
            desc: user.description.clone(),
            sex: user.sex,
            modify_at: user.updated_at,
            follows: 0,
            following: 0,
            is_follow: viewer_follows,
        }
    }

    pub fn with_follow_counts(mut self, follows: u32, following: u32) -> Self {
        self.follows = follows;
        self.following = following;
        self
    }
}

impl From<&User> for UserCard {
    fn from(user: &User) -> Self {
        Self::build(user, false)
    }
}

// ---------------------------------------------------------------------------
// MessageCard
// ---------------------------------------------------------------------------

/// Flat view of a message as pushed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCard {
    pub id: MessageId,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub attach: Option<String>,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub sender_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub receiver_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group_id: Option<GroupId>,
    pub create_at: DateTime<Utc>,
}

impl From<&MessageEnvelope> for MessageCard {
    fn from(env: &MessageEnvelope) -> Self {
        let (receiver_id, group_id) = match env.target() {
            DeliveryTarget::Direct(user) => (Some(user), None),
            DeliveryTarget::Group(group) => (None, Some(group)),
        };
        Self {
            id: env.id().clone(),
            content: env.content().to_string(),
            attach: env.attachment().map(str::to_string),
            kind: env.kind(),
            sender_id: env.sender(),
            receiver_id,
            group_id,
            create_at: env.created_at(),
        }
    }
}
