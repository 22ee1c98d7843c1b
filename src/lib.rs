#![forbid(unsafe_code)]

//! Routes captioned images from a Slack logistics channel to the channel
//! named in the caption.

pub mod config;
pub mod errors;
pub mod models;
pub mod routing;
pub mod slack;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
