//! Brand wallet cards: activity read models and the tier unlock engine.

pub mod activity;
pub mod unlocks;

pub use activity::{ActivationRecord, ActivationStatus, ActivitySnapshot, EventRsvp, RsvpStatus};
