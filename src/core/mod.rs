//! Core module - identity, fingerprinting and context persistence

pub mod config;
pub mod context;
pub mod fingerprint;
pub mod identity;
pub mod version;

pub use config::Config;
pub use context::{ContextError, ContextStore, DesignContext, STORE_FILE};
pub use fingerprint::{DesignCounters, Fingerprint, FingerprintParseError};
pub use identity::{sanitize_file_name, strip_revision_suffix, DesignIdentity};
pub use version::{existing_versions, next_version, versioned_name, VersionLabel};
