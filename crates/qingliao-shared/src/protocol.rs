use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::message::{MessageDraft, TargetKind};
use crate::types::{GroupId, MessageId, UserId};

/// Message as the client posts it.
///
/// The receiver is a loose `(receiverId, receiverType)` pair on the wire;
/// [`into_parts`](Self::into_parts) turns it into a typed reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageCreateModel {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attach: Option<String>,
    #[serde(rename = "type")]
    pub kind: i32,
    #[serde(default)]
    pub receiver_id: Option<String>,
    #[serde(default = "default_receiver_type")]
    pub receiver_type: i32,
}

fn default_receiver_type() -> i32 {
    TargetKind::Direct.code()
}

/// Receiver named by a create model, not yet checked against the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetRef {
    User(UserId),
    Group(GroupId),
}

impl MessageCreateModel {
    /// Split into a draft and a receiver reference. Content and kind are left
    /// for the envelope constructors to check.
    pub fn into_parts(self) -> Result<(MessageDraft, TargetRef), ValidationError> {
        let kind = TargetKind::from_code(self.receiver_type)
            .ok_or(ValidationError::UnknownReceiverType(self.receiver_type))?;

        let receiver = match self.receiver_id.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => r.to_string(),
            _ => return Err(ValidationError::MissingReceiver),
        };

        let id = MessageId::parse(&self.id)?;

        let target = match kind {
            TargetKind::Direct => UserId::parse(&receiver).map(TargetRef::User),
            TargetKind::Group => GroupId::parse(&receiver).map(TargetRef::Group),
        }
        .map_err(|_| ValidationError::InvalidId {
            field: "receiver",
            value: receiver.clone(),
        })?;

        let draft = MessageDraft {
            id,
            content: self.content,
            attachment: self.attach,
            kind: self.kind,
        };
        Ok((draft, target))
    }
}
