//! Host seam - what the toolkit needs from a CAD application
//!
//! The export orchestrator never talks to a concrete CAD product. It
//! talks to [`DesignHost`], which answers identity questions, hands out
//! change counters and performs the actual artifact writes. The
//! built-in [`document::DesignDocument`] host serves local `.dsn.json`
//! design files; a plugin embedding this crate in a live CAD session
//! supplies its own implementation.

pub mod document;
pub mod mesh;
pub mod preview;

pub use document::{DesignDocument, DocumentError};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::core::fingerprint::DesignCounters;
use crate::core::identity::DesignIdentity;

/// Tessellation quality for curved faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshRefinement {
    Low,
    Medium,
    #[default]
    High,
}

impl MeshRefinement {
    /// Segments used for one full revolution of a curved face
    pub fn segments(self) -> u32 {
        match self {
            MeshRefinement::Low => 12,
            MeshRefinement::Medium => 24,
            MeshRefinement::High => 48,
        }
    }
}

impl fmt::Display for MeshRefinement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MeshRefinement::Low => "low",
            MeshRefinement::Medium => "medium",
            MeshRefinement::High => "high",
        };
        write!(f, "{}", s)
    }
}

/// A body eligible for mesh export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyRef {
    /// Component path and body name joined by underscores
    pub qualified_name: String,

    /// Position in the host's flattened body list
    pub index: usize,
}

/// What the export orchestrator needs from the hosting CAD application
pub trait DesignHost {
    /// Document title as shown in the host's window, revision suffix included
    fn title(&self) -> &str;

    /// Host-assigned document id, when there is one
    fn design_id(&self) -> Option<Uuid>;

    /// Change counters for fingerprinting
    fn counters(&self) -> DesignCounters;

    /// Visible bodies in traversal order
    fn visible_bodies(&self) -> Vec<BodyRef>;

    /// Extension of the host's native archive format
    fn archive_extension(&self) -> &'static str;

    /// Extension of the interchange snapshot format
    fn interchange_extension(&self) -> &'static str;

    /// Extension of per-body mesh files
    fn mesh_extension(&self) -> &'static str;

    /// Write the native archive to `dest`
    fn export_archive(&self, dest: &Path) -> Result<(), HostError>;

    /// Write the interchange snapshot to `dest`
    fn export_interchange(&self, dest: &Path) -> Result<(), HostError>;

    /// Write one body's mesh to `dest`
    fn export_body_mesh(&self, body: &BodyRef, dest: &Path) -> Result<(), HostError>;

    /// Render the preview image to `dest`
    fn render_preview(&self, dest: &Path, width: u32, height: u32) -> Result<(), HostError>;
}

/// Resolve the identity of the host's open design
pub fn identify(host: &dyn DesignHost) -> DesignIdentity {
    DesignIdentity::new(host.design_id(), host.title())
}

/// Errors from host export operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("could not write {path:?}: {reason}")]
    WriteError { path: PathBuf, reason: String },

    #[error("could not encode {path:?}: {reason}")]
    EncodeError { path: PathBuf, reason: String },

    #[error("no body at index {0}")]
    UnknownBody(usize),
}
