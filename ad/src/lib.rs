//! alertd - in-process alert store with live subscription delivery
//!
//! The provider holds the current set of active alerts, deduplicates and
//! merges overlapping occurrences of the same alert, and broadcasts every
//! insertion to any number of concurrent subscribers while also supporting
//! point-in-time snapshot reads.
//!
//! # Modules
//!
//! - [`provider`] - the alert provider, subscriber registry, and iterator
//! - [`client`] - HTTP client for a remote alerting service
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod provider;

// Re-export commonly used types
pub use client::{ApiClient, ClientError, RemoteStatus};
pub use config::{Config, ProviderConfig, ServerConfig};
pub use provider::{AlertIterator, AlertProvider, MemAlerts, Registry};

pub use alerttypes::{Alert, AlertError, Fingerprint, LabelSet, Marker, Matcher, MemMarker, Silence, SilenceUpdate};
