//! Routing core: decides whether a message is forwarded and where.
//!
//! Nothing in this module talks to Slack directly. Platform access goes
//! through the [`directory::ChannelDirectory`] and
//! [`forwarder::FileTransfer`] traits.

pub mod dedup;
pub mod directory;
pub mod filter;
pub mod forwarder;
pub mod mention;
pub mod normalize;
pub mod pipeline;
pub mod resolver;

pub use pipeline::{RelayOutcome, RelayPipeline};
