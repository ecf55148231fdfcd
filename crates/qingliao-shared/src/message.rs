//! The message envelope: one message, one sender, exactly one delivery target.
//!
//! Fields that identify the message (`id`, `sender`, `target`, `kind`,
//! `created_at`) are fixed at construction. Only `content` and `attachment`
//! change afterwards, and every change goes through a method that stamps
//! `updated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ImmutableFieldError, ModelError, ValidationError};
use crate::types::{GroupId, MessageId, UserId};

// ---------------------------------------------------------------------------
// Kind
// ---------------------------------------------------------------------------

/// Payload kind. The discriminants are the wire codes clients send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
#[repr(i32)]
pub enum MessageKind {
    Text = 1,
    Picture = 2,
    File = 3,
    Audio = 4,
}

impl MessageKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Text),
            2 => Some(Self::Picture),
            3 => Some(Self::File),
            4 => Some(Self::Audio),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for MessageKind {
    type Error = ValidationError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(ValidationError::UnknownKind(code))
    }
}

impl From<MessageKind> for i32 {
    fn from(kind: MessageKind) -> Self {
        kind.code()
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Where a message is delivered. A message goes to one user or one group,
/// never both and never neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeliveryTarget {
    Direct(UserId),
    Group(GroupId),
}

/// Discriminator of [`DeliveryTarget`]; the codes match the wire `receiverType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(i32)]
pub enum TargetKind {
    Direct = 1,
    Group = 2,
}

impl TargetKind {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Direct),
            2 => Some(Self::Group),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl DeliveryTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            Self::Direct(_) => TargetKind::Direct,
            Self::Group(_) => TargetKind::Group,
        }
    }

    pub fn recipient(&self) -> Option<UserId> {
        match self {
            Self::Direct(user) => Some(*user),
            Self::Group(_) => None,
        }
    }

    pub fn group(&self) -> Option<GroupId> {
        match self {
            Self::Direct(_) => None,
            Self::Group(group) => Some(*group),
        }
    }
}

// ---------------------------------------------------------------------------
// Draft
// ---------------------------------------------------------------------------

/// Unvalidated message as submitted by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDraft {
    pub id: MessageId,
    pub content: String,
    pub attachment: Option<String>,
    /// Raw kind code, checked against [`MessageKind`] at construction.
    pub kind: i32,
}

impl MessageDraft {
    pub fn new(id: MessageId, content: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            id,
            content: content.into(),
            attachment: None,
            kind: kind.code(),
        }
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }
}

fn check_content(content: &str) -> Result<(), ValidationError> {
    if content.is_empty() {
        return Err(ValidationError::EmptyContent);
    }
    Ok(())
}

fn normalize_attachment(attachment: Option<String>) -> Option<String> {
    attachment.filter(|a| !a.is_empty())
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeField {
    Id,
    Sender,
    Target,
    Kind,
    CreatedAt,
}

impl std::fmt::Display for EnvelopeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Id => "id",
            Self::Sender => "sender",
            Self::Target => "target",
            Self::Kind => "kind",
            Self::CreatedAt => "created_at",
        };
        f.write_str(name)
    }
}

/// A validated message. There is no way to obtain one with empty content,
/// an unknown kind or an ambiguous target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "EnvelopeRecord")]
pub struct MessageEnvelope {
    id: MessageId,
    content: String,
    attachment: Option<String>,
    kind: MessageKind,
    sender: UserId,
    target: DeliveryTarget,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MessageEnvelope {
    /// Message to a single user.
    pub fn new_direct(
        sender: UserId,
        recipient: UserId,
        draft: MessageDraft,
    ) -> Result<Self, ValidationError> {
        Self::new_direct_at(sender, recipient, draft, Utc::now())
    }

    pub fn new_direct_at(
        sender: UserId,
        recipient: UserId,
        draft: MessageDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Self::build(sender, DeliveryTarget::Direct(recipient), draft, now)
    }

    /// Message to every member of a group.
    pub fn new_group(
        sender: UserId,
        group: GroupId,
        draft: MessageDraft,
    ) -> Result<Self, ValidationError> {
        Self::new_group_at(sender, group, draft, Utc::now())
    }

    pub fn new_group_at(
        sender: UserId,
        group: GroupId,
        draft: MessageDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Self::build(sender, DeliveryTarget::Group(group), draft, now)
    }

    fn build(
        sender: UserId,
        target: DeliveryTarget,
        draft: MessageDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        draft.id.check()?;
        check_content(&draft.content)?;
        let kind = MessageKind::try_from(draft.kind)?;

        Ok(Self {
            id: draft.id,
            content: draft.content,
            attachment: normalize_attachment(draft.attachment),
            kind,
            sender,
            target,
            created_at: now,
            updated_at: now,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn attachment(&self) -> Option<&str> {
        self.attachment.as_deref()
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn sender(&self) -> UserId {
        self.sender
    }

    pub fn target(&self) -> DeliveryTarget {
        self.target
    }

    pub fn recipient(&self) -> Option<UserId> {
        self.target.recipient()
    }

    pub fn group(&self) -> Option<GroupId> {
        self.target.group()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    pub fn update_content(&mut self, content: impl Into<String>) -> Result<(), ValidationError> {
        self.update_content_at(content, Utc::now())
    }

    pub fn update_content_at(
        &mut self,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        let content = content.into();
        check_content(&content)?;
        self.content = content;
        self.touch(now);
        Ok(())
    }

    /// Replace or clear the attachment. An empty string clears it.
    pub fn update_attachment(&mut self, attachment: Option<String>) {
        self.update_attachment_at(attachment, Utc::now());
    }

    pub fn update_attachment_at(&mut self, attachment: Option<String>, now: DateTime<Utc>) {
        self.attachment = normalize_attachment(attachment);
        self.touch(now);
    }

    pub fn apply(&mut self, patch: EnvelopePatch) -> Result<(), ModelError> {
        self.apply_at(patch, Utc::now())
    }

    /// Apply a patch. Every field is checked before anything is written, so
    /// a rejected patch leaves the envelope as it was.
    pub fn apply_at(&mut self, patch: EnvelopePatch, now: DateTime<Utc>) -> Result<(), ModelError> {
        self.check_fixed(
            EnvelopeField::Id,
            patch.id.as_ref().is_some_and(|v| *v != self.id),
        )?;
        self.check_fixed(
            EnvelopeField::Sender,
            patch.sender.is_some_and(|v| v != self.sender),
        )?;
        self.check_fixed(
            EnvelopeField::Target,
            patch.target.is_some_and(|v| v != self.target),
        )?;
        self.check_fixed(EnvelopeField::Kind, patch.kind.is_some_and(|v| v != self.kind))?;
        self.check_fixed(
            EnvelopeField::CreatedAt,
            patch.created_at.is_some_and(|v| v != self.created_at),
        )?;
        if let Some(content) = &patch.content {
            check_content(content)?;
        }

        let mut changed = false;
        if let Some(content) = patch.content {
            self.content = content;
            changed = true;
        }
        if let Some(attachment) = patch.attachment {
            self.attachment = normalize_attachment(attachment);
            changed = true;
        }
        if changed {
            self.touch(now);
        }
        Ok(())
    }

    fn check_fixed(&self, field: EnvelopeField, differs: bool) -> Result<(), ImmutableFieldError> {
        if differs {
            return Err(ImmutableFieldError { field });
        }
        Ok(())
    }

    // Clock skew must not move updated_at backwards.
    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.updated_at);
    }

    // ------------------------------------------------------------------
    // Persistence hand-off
    // ------------------------------------------------------------------

    /// Serialize to binary (bincode)
    pub fn to_bytes(&self) -> Result<Vec<u8>, ModelError> {
        bincode::serialize(self).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    /// Deserialize from binary. The decoded record is validated like a draft.
    pub fn from_bytes(data: &[u8]) -> Result<Self, ModelError> {
        bincode::deserialize(data).map_err(|e| ModelError::Serialization(e.to_string()))
    }
}

/// Partial update coming from an ingestion or storage layer.
///
/// Immutable fields may be present only if they restate the current value.
/// `attachment: Some(None)` clears the attachment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvelopePatch {
    pub id: Option<MessageId>,
    pub sender: Option<UserId>,
    pub target: Option<DeliveryTarget>,
    pub kind: Option<MessageKind>,
    pub created_at: Option<DateTime<Utc>>,
    pub content: Option<String>,
    pub attachment: Option<Option<String>>,
}

/// Stored shape of an envelope, checked on the way back in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnvelopeRecord {
    id: MessageId,
    content: String,
    attachment: Option<String>,
    kind: i32,
    sender: UserId,
    target: DeliveryTarget,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<EnvelopeRecord> for MessageEnvelope {
    type Error = ValidationError;

    fn try_from(record: EnvelopeRecord) -> Result<Self, Self::Error> {
        record.id.check()?;
        check_content(&record.content)?;
        let kind = MessageKind::try_from(record.kind)?;
        if record.updated_at < record.created_at {
            return Err(ValidationError::TimestampOrder);
        }

        Ok(Self {
            id: record.id,
            content: record.content,
            attachment: normalize_attachment(record.attachment),
            kind,
            sender: record.sender,
            target: record.target,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn text_draft(content: &str) -> MessageDraft {
        MessageDraft::new(MessageId::new(), content, MessageKind::Text)
    }

    #[test]
    fn test_direct_message_targets_recipient() {
        let (u1, u2) = (UserId::new(), UserId::new());
        let draft = text_draft("hi");
        let id = draft.id.clone();

        let env = MessageEnvelope::new_direct(u1, u2, draft).unwrap();

        assert_eq!(env.id(), &id);
        assert_eq!(env.sender(), u1);
        assert_eq!(env.target(), DeliveryTarget::Direct(u2));
        assert_eq!(env.target().kind(), TargetKind::Direct);
        assert_eq!(env.recipient(), Some(u2));
        assert_eq!(env.group(), None);
        assert_eq!(env.created_at(), env.updated_at());
    }

    #[test]
    fn test_literal_client_id_scenario() {
        let (u1, u2) = (UserId::new(), UserId::new());
        let draft = MessageDraft::new(MessageId::from("m1"), "hi", MessageKind::Text);

        let env = MessageEnvelope::new_direct(u1, u2, draft).unwrap();

        assert_eq!(env.id().as_str(), "m1");
        assert_eq!(env.sender(), u1);
        assert_eq!(env.target(), DeliveryTarget::Direct(u2));
        assert_eq!(env.kind(), MessageKind::Text);
        assert_eq!(env.created_at(), env.updated_at());
    }

    #[test]
    fn test_blank_id_rejected() {
        for raw in ["", "   "] {
            let draft = MessageDraft::new(MessageId::from(raw), "hi", MessageKind::Text);
            let err = MessageEnvelope::new_direct(UserId::new(), UserId::new(), draft).unwrap_err();
            assert_eq!(err, ValidationError::EmptyId);
        }
    }

    #[test]
    fn test_group_message_targets_group() {
        let group = GroupId::new();
        let env =
            MessageEnvelope::new_group(UserId::new(), group, text_draft("hello all")).unwrap();

        assert_eq!(env.target().kind(), TargetKind::Group);
        assert_eq!(env.group(), Some(group));
        assert_eq!(env.recipient(), None);
    }

    #[test]
    fn test_empty_content_rejected() {
        let err = MessageEnvelope::new_direct(UserId::new(), UserId::new(), text_draft(""))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyContent);

        let err = MessageEnvelope::new_group(UserId::new(), GroupId::new(), text_draft(""))
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptyContent);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        for code in [0, 5, -1, 99] {
            let mut draft = text_draft("hi");
            draft.kind = code;
            let err = MessageEnvelope::new_direct(UserId::new(), UserId::new(), draft).unwrap_err();
            assert_eq!(err, ValidationError::UnknownKind(code));
        }
    }

    #[test]
    fn test_all_known_kinds_accepted() {
        for kind in [
            MessageKind::Text,
            MessageKind::Picture,
            MessageKind::File,
            MessageKind::Audio,
        ] {
            let draft = MessageDraft::new(MessageId::new(), "x", kind);
            let env = MessageEnvelope::new_group(UserId::new(), GroupId::new(), draft).unwrap();
            assert_eq!(env.kind(), kind);
        }
    }

    #[test]
    fn test_self_message_is_not_a_model_concern() {
        let u = UserId::new();
        assert!(MessageEnvelope::new_direct(u, u, text_draft("note to self")).is_ok());
    }

    #[test]
    fn test_empty_attachment_normalized() {
        let draft = text_draft("pic").with_attachment("");
        let env = MessageEnvelope::new_direct(UserId::new(), UserId::new(), draft).unwrap();
        assert_eq!(env.attachment(), None);
    }

    #[test]
    fn test_update_content_bumps_updated_at_only() {
        let t0 = Utc::now();
        let mut env =
            MessageEnvelope::new_direct_at(UserId::new(), UserId::new(), text_draft("a"), t0)
                .unwrap();
        let id = env.id().clone();

        let t1 = t0 + Duration::milliseconds(5);
        env.update_content_at("b", t1).unwrap();

        assert_eq!(env.content(), "b");
        assert_eq!(env.updated_at(), t1);
        assert_eq!(env.created_at(), t0);
        assert_eq!(env.id(), &id);
    }

    #[test]
    fn test_update_content_rejects_empty_and_keeps_state() {
        let t0 = Utc::now();
        let mut env =
            MessageEnvelope::new_direct_at(UserId::new(), UserId::new(), text_draft("a"), t0)
                .unwrap();
        let before = env.clone();

        let err = env.update_content_at("", t0 + Duration::seconds(1)).unwrap_err();
        assert_eq!(err, ValidationError::EmptyContent);
        assert_eq!(env, before);
    }

    #[test]
    fn test_updated_at_never_goes_backwards() {
        let t0 = Utc::now();
        let mut env =
            MessageEnvelope::new_group_at(UserId::new(), GroupId::new(), text_draft("a"), t0)
                .unwrap();

        env.update_attachment_at(Some("file://x".to_string()), t0 - Duration::seconds(10));
        assert_eq!(env.updated_at(), t0);
        assert_eq!(env.attachment(), Some("file://x"));

        env.update_attachment_at(None, t0 + Duration::seconds(1));
        assert!(env.updated_at() > t0);
        assert_eq!(env.created_at(), t0);
        assert_eq!(env.attachment(), None);
    }

    #[test]
    fn test_patch_immutable_field_fails_without_side_effects() {
        let mut env =
            MessageEnvelope::new_direct(UserId::new(), UserId::new(), text_draft("a")).unwrap();
        let before = env.clone();

        let patch = EnvelopePatch {
            content: Some("changed".to_string()),
            target: Some(DeliveryTarget::Group(GroupId::new())),
            ..Default::default()
        };
        let err = env.apply(patch).unwrap_err();

        assert!(matches!(
            err,
            ModelError::ImmutableField(ImmutableFieldError {
                field: EnvelopeField::Target
            })
        ));
        assert_eq!(env, before);

        let err = env
            .apply(EnvelopePatch {
                id: Some(MessageId::new()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::ImmutableField(ImmutableFieldError {
                field: EnvelopeField::Id
            })
        ));
    }

    #[test]
    fn test_patch_restating_fixed_fields_is_accepted() {
        let t0 = Utc::now();
        let mut env =
            MessageEnvelope::new_direct_at(UserId::new(), UserId::new(), text_draft("a"), t0)
                .unwrap();

        let patch = EnvelopePatch {
            id: Some(env.id().clone()),
            sender: Some(env.sender()),
            target: Some(env.target()),
            kind: Some(env.kind()),
            created_at: Some(env.created_at()),
            content: Some("b".to_string()),
            attachment: Some(Some("uri".to_string())),
        };
        let t1 = t0 + Duration::seconds(2);
        env.apply_at(patch, t1).unwrap();

        assert_eq!(env.content(), "b");
        assert_eq!(env.attachment(), Some("uri"));
        assert_eq!(env.updated_at(), t1);
    }

    #[test]
    fn test_patch_with_empty_content_is_validation_error() {
        let mut env =
            MessageEnvelope::new_direct(UserId::new(), UserId::new(), text_draft("a")).unwrap();
        let err = env
            .apply(EnvelopePatch {
                content: Some(String::new()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ModelError::Validation(ValidationError::EmptyContent)
        ));
    }

    #[test]
    fn test_bytes_roundtrip_preserves_envelope() {
        let draft = text_draft("stored").with_attachment("blob:1");
        let env = MessageEnvelope::new_group(UserId::new(), GroupId::new(), draft).unwrap();

        let bytes = env.to_bytes().unwrap();
        let restored = MessageEnvelope::from_bytes(&bytes).unwrap();
        assert_eq!(restored, env);
    }

    #[test]
    fn test_json_record_is_validated() {
        let env =
            MessageEnvelope::new_direct(UserId::new(), UserId::new(), text_draft("a")).unwrap();
        let mut value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["kind"], 1);
        assert!(value["target"]["direct"].is_string());

        value["content"] = serde_json::Value::String(String::new());
        assert!(serde_json::from_value::<MessageEnvelope>(value.clone()).is_err());

        value["content"] = serde_json::Value::String("ok".to_string());
        value["kind"] = serde_json::json!(7);
        assert!(serde_json::from_value::<MessageEnvelope>(value).is_err());
    }

    #[test]
    fn test_record_with_blank_id_rejected() {
        let draft = MessageDraft::new(MessageId::from("m1"), "a", MessageKind::Text);
        let env = MessageEnvelope::new_direct(UserId::new(), UserId::new(), draft).unwrap();
        let mut value = serde_json::to_value(&env).unwrap();
        assert_eq!(value["id"], "m1");

        value["id"] = serde_json::Value::String(" ".to_string());
        assert!(serde_json::from_value::<MessageEnvelope>(value).is_err());
    }

    #[test]
    fn test_record_with_reversed_timestamps_rejected() {
        let env =
            MessageEnvelope::new_direct(UserId::new(), UserId::new(), text_draft("a")).unwrap();
        let mut value = serde_json::to_value(&env).unwrap();
        value["updatedAt"] =
            serde_json::to_value(env.created_at() - Duration::seconds(1)).unwrap();
        assert!(serde_json::from_value::<MessageEnvelope>(value).is_err());
    }
}
