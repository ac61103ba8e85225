//! Touch-to-keystroke engine for on-screen keyboards.
//!
//! Raw multi-pointer frames go in; key down/up/cancel events, popup and
//! editor actions, and glide strokes come out through the collaborator
//! traits in [`ports`].

pub mod config;
pub mod glide;
pub mod output;
pub mod pipeline;
pub mod ports;
pub mod touch;
pub mod types;

pub use config::{ConfigError, KeyboardConfig, SwipeAction};
pub use ports::TouchContext;
pub use touch::TouchStateMachine;
pub use types::{KeyCode, TouchAction, TouchFrame};
