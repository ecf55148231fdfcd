//! Accepts messages from senders and turns them into envelopes.
//!
//! The envelope model only checks shape. Everything that depends on who the
//! sender is, or on what was already accepted, is decided here.

use std::collections::{HashMap, VecDeque};

use qingliao_shared::{
    MessageCard, MessageCreateModel, MessageEnvelope, MessageId, TargetRef, UserCard, UserId,
};
use tracing::{debug, info, warn};

use crate::config::PushConfig;
use crate::directory::Directory;
use crate::error::{PushError, Result};

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A new envelope was created.
    Accepted(MessageCard),
    /// The id was already accepted from this sender; this is a client retry
    /// and the stored message is returned unchanged.
    Duplicate(MessageCard),
}

impl Submission {
    pub fn card(&self) -> &MessageCard {
        match self {
            Self::Accepted(card) | Self::Duplicate(card) => card,
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }
}

/// Keeps the last `dedup_window` accepted messages; older ones are dropped
/// oldest first and can no longer be looked up, edited or matched as retries.
pub struct MessageDispatcher<D> {
    config: PushConfig,
    directory: D,
    accepted: HashMap<MessageId, MessageEnvelope>,
    // acceptance order, oldest at the front
    order: VecDeque<MessageId>,
}

impl<D: Directory> MessageDispatcher<D> {
    pub fn new(config: PushConfig, directory: D) -> Self {
        Self {
            config,
            directory,
            accepted: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    pub fn directory_mut(&mut self) -> &mut D {
        &mut self.directory
    }

    pub fn envelope(&self, id: &MessageId) -> Option<&MessageEnvelope> {
        self.accepted.get(id)
    }

    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    /// Validate and record a message posted by `sender`.
    pub fn submit(&mut self, sender: UserId, model: MessageCreateModel) -> Result<Submission> {
        let result = self.try_submit(sender, model);
        if let Err(e) = &result {
            warn!(sender = %sender, error = %e, "Rejected message");
        }
        result
    }

    fn try_submit(&mut self, sender: UserId, model: MessageCreateModel) -> Result<Submission> {
        let (draft, target) = model.into_parts()?;

        // Retries are answered from the ledger even if the directory has
        // changed since the first attempt.
        if let Some(existing) = self.accepted.get(&draft.id) {
            if existing.sender() != sender {
                return Err(PushError::IdConflict(draft.id));
            }
            info!(
                message = %draft.id,
                sender = %sender,
                "Duplicate submission, returning stored message"
            );
            return Ok(Submission::Duplicate(MessageCard::from(existing)));
        }

        if self.directory.user(sender).is_none() {
            return Err(PushError::UnknownSender(sender));
        }
        self.check_size(draft.content.len())?;

        match target {
            TargetRef::User(recipient) => {
                if self.directory.user(recipient).is_none() {
                    return Err(PushError::UnknownReceiver(recipient));
                }
                if recipient == sender && !self.config.allow_self_message {
                    return Err(PushError::SelfMessage);
                }
            }
            TargetRef::Group(group) => {
                if !self.directory.group_exists(group) {
                    return Err(PushError::UnknownGroup(group));
                }
                if !self.directory.is_group_member(group, sender) {
                    return Err(PushError::NotGroupMember { user: sender, group });
                }
            }
        }

        let envelope = match target {
            TargetRef::User(recipient) => MessageEnvelope::new_direct(sender, recipient, draft)?,
            TargetRef::Group(group) => MessageEnvelope::new_group(sender, group, draft)?,
        };

        debug!(
            message = %envelope.id(),
            sender = %sender,
            target = ?envelope.target(),
            kind = ?envelope.kind(),
            "Accepted message"
        );

        let card = MessageCard::from(&envelope);
        self.record(envelope);
        Ok(Submission::Accepted(card))
    }

    fn record(&mut self, envelope: MessageEnvelope) {
        let id = envelope.id().clone();
        self.accepted.insert(id.clone(), envelope);
        self.order.push_back(id);

        while self.order.len() > self.config.dedup_window {
            if let Some(oldest) = self.order.pop_front() {
                self.accepted.remove(&oldest);
                debug!(message = %oldest, "Evicted message from retry window");
            }
        }
    }

    /// Replace the content of a stored message. Only its author may edit it.
    pub fn update_content(
        &mut self,
        id: &MessageId,
        editor: UserId,
        content: impl Into<String>,
    ) -> Result<MessageCard> {
        let content = content.into();
        self.check_size(content.len())?;

        let envelope = self
            .accepted
            .get_mut(id)
            .ok_or_else(|| PushError::MessageNotFound(id.clone()))?;
        if envelope.sender() != editor {
            return Err(PushError::NotAuthor {
                message: id.clone(),
                user: editor,
            });
        }

        envelope.update_content(content)?;
        debug!(message = %id, "Updated message content");
        Ok(MessageCard::from(&*envelope))
    }

    /// Card for `user` as seen by `viewer`.
    pub fn user_card(&self, viewer: UserId, user: UserId) -> Result<UserCard> {
        let record = self
            .directory
            .user(user)
            .ok_or(PushError::UnknownUser(user))?;
        let (follows, followers) = self.directory.follow_counts(user);
        let viewer_follows = self.directory.is_following(viewer, user);

        Ok(UserCard::build(&record, viewer_follows).with_follow_counts(follows, followers))
    }

    fn check_size(&self, size: usize) -> Result<()> {
        let max = self.config.max_content_bytes;
        if size > max {
            return Err(PushError::ContentTooLarge { size, max });
        }
        Ok(())
    }
}
