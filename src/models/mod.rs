//! Domain model module declarations.

pub mod channel;
pub mod event;
pub mod resolution;

pub use channel::{Channel, ChannelDetails};
pub use event::{Attachment, InboundEvent};
pub use resolution::{Resolution, ResolutionStrategy};
