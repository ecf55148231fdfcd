use qingliao_shared::{GroupId, MessageId, ModelError, UserId, ValidationError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PushError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Unknown sender: {0}")]
    UnknownSender(UserId),

    #[error("Unknown receiver: {0}")]
    UnknownReceiver(UserId),

    #[error("Unknown user: {0}")]
    UnknownUser(UserId),

    #[error("Unknown group: {0}")]
    UnknownGroup(GroupId),

    #[error("User {user} is not a member of group {group}")]
    NotGroupMember { user: UserId, group: GroupId },

    #[error("Sending a message to yourself is not allowed")]
    SelfMessage,

    #[error("Message content too large: {size} bytes (max {max})")]
    ContentTooLarge { size: usize, max: usize },

    #[error("Message id {0} is already used by another sender")]
    IdConflict(MessageId),

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("User {user} is not the author of message {message}")]
    NotAuthor { message: MessageId, user: UserId },
}

impl From<ValidationError> for PushError {
    fn from(e: ValidationError) -> Self {
        PushError::Model(ModelError::Validation(e))
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PushError>;
