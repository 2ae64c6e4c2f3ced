//! Alert data model shared by the store and the provider.
//!
//! An alert is identified by its [`Fingerprint`], a deterministic hash of its
//! identifying label set. Two records with the same fingerprint are the same
//! logical alert observed at different times, never two alerts.

mod alert;
mod error;
mod marker;
mod silence;

pub use alert::{Alert, Fingerprint, LabelSet};
pub use error::AlertError;
pub use marker::{MemMarker, Marker};
pub use silence::{Matcher, Silence, SilenceUpdate};
