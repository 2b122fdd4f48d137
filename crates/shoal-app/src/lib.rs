//! Host plumbing for shoal worlds: the run/pause session and live configuration patches.

pub mod control;
pub mod session;

pub use control::{
    ConfigSnapshot, ControlError, KnobUpdate, apply_patch, apply_updates, config_snapshot,
};
pub use session::{Session, StatusReport};
