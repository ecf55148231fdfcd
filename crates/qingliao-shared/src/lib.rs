//! # qingliao-shared
//!
//! Value types shared by every Qingliao backend service: ids, the message
//! envelope with its delivery target, and the cards sent to clients.
//!
//! Nothing here does I/O or keeps state between calls.

pub mod card;
pub mod error;
pub mod message;
pub mod protocol;
pub mod types;
pub mod user;

pub use card::{MessageCard, UserCard};
pub use error::{ImmutableFieldError, ModelError, ValidationError};
pub use message::{
    DeliveryTarget, EnvelopeField, EnvelopePatch, MessageDraft, MessageEnvelope, MessageKind,
    TargetKind,
};
pub use protocol::{MessageCreateModel, TargetRef};
pub use types::{GroupId, MessageId, UserId};
pub use user::{Sex, User};
