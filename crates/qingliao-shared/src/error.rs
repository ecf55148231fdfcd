use thiserror::Error;

use crate::message::EnvelopeField;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    ImmutableField(#[from] ImmutableFieldError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Rejected input. The caller has to fix the draft and resubmit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message id must not be empty")]
    EmptyId,

    #[error("Message content must not be empty")]
    EmptyContent,

    #[error("Unknown message kind: {0}")]
    UnknownKind(i32),

    #[error("Unknown receiver type: {0}")]
    UnknownReceiverType(i32),

    #[error("Message has no receiver")]
    MissingReceiver,

    #[error("Invalid {field} id: {value:?}")]
    InvalidId { field: &'static str, value: String },

    #[error("updated_at is earlier than created_at")]
    TimestampOrder,
}

/// Attempt to change a field that is fixed once the envelope exists.
/// This is a bug in the caller, not a user error.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Field `{field}` cannot be changed after the message is created")]
pub struct ImmutableFieldError {
    pub field: EnvelopeField,
}
