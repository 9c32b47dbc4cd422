//! Built-in design document host (`.dsn.json` files)
//!
//! A small parametric design format: a component tree with box and
//! cylinder bodies, a feature timeline and user parameters. It exists
//! so the toolkit can be exercised end to end without a CAD seat, and
//! doubles as the archive format the built-in host exports.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::core::fingerprint::DesignCounters;
use crate::host::mesh::{self, BodyMesh};
use crate::host::{preview, BodyRef, DesignHost, HostError, MeshRefinement};

/// Extension of design document files
pub const DOCUMENT_EXTENSION: &str = "dsn.json";

fn default_visible() -> bool {
    true
}

/// A user parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// One feature in the timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub name: String,
    pub operation: String,
}

/// Ordered feature history with an optional rollback marker
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    #[serde(default)]
    pub entries: Vec<TimelineEntry>,

    /// Rollback marker; `None` means the full timeline is computed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
}

impl Timeline {
    /// Effective marker position, clamped to the timeline length
    pub fn marker(&self) -> u32 {
        let len = self.entries.len() as u32;
        self.position.map_or(len, |p| p.min(len))
    }
}

/// Primitive solids the built-in host can tessellate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Shape {
    Box { size: [f32; 3] },
    Cylinder { radius: f32, height: f32 },
}

/// A solid body inside a component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub name: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    pub shape: Shape,
    #[serde(default)]
    pub translation: [f32; 3],
}

/// Placement of a child component inside its parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub translation: [f32; 3],
    pub component: Component,
}

/// A component with its bodies and child occurrences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    #[serde(default)]
    pub bodies: Vec<Body>,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

/// A design document served by the built-in host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignDocument {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_id: Option<Uuid>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub timeline: Timeline,

    pub root: Component,

    /// Tessellation quality, set by the caller rather than the file
    #[serde(skip)]
    refinement: MeshRefinement,
}

impl DesignDocument {
    /// Read a document from disk
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let contents = std::fs::read_to_string(path).map_err(|e| DocumentError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| DocumentError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Write the canonical pretty-printed JSON form to disk
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        let write_err = |reason: String| DocumentError::WriteError {
            path: path.to_path_buf(),
            reason,
        };
        let contents =
            serde_json::to_string_pretty(self).map_err(|e| write_err(e.to_string()))?;
        std::fs::write(path, contents).map_err(|e| write_err(e.to_string()))
    }

    /// Use `refinement` for every mesh this document tessellates
    pub fn with_refinement(mut self, refinement: MeshRefinement) -> Self {
        self.refinement = refinement;
        self
    }

    /// Visible bodies resolved to world-space meshes, in traversal order
    ///
    /// Names carry the component path, underscore-joined, so a body
    /// `Plate` inside `Chassis > Left` resolves as `Chassis_Left_Plate`.
    pub fn resolve_bodies(&self) -> Vec<BodyMesh> {
        let mut out = Vec::new();
        resolve_component(&self.root, "", Vec3::ZERO, self.refinement, &mut out);
        out
    }

    fn visible_body_names(&self) -> Vec<String> {
        let mut out = Vec::new();
        collect_names(&self.root, "", &mut out);
        out
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}_{}", prefix, name)
    }
}

fn resolve_component(
    component: &Component,
    prefix: &str,
    offset: Vec3,
    refinement: MeshRefinement,
    out: &mut Vec<BodyMesh>,
) {
    let path = qualify(prefix, &component.name);
    for body in &component.bodies {
        if !body.visible {
            continue;
        }
        let mesh = mesh::tessellate(&body.shape, refinement)
            .translated(offset + Vec3::from(body.translation));
        out.push(BodyMesh {
            name: qualify(&path, &body.name),
            mesh,
        });
    }
    for occurrence in &component.occurrences {
        if !occurrence.visible {
            continue;
        }
        resolve_component(
            &occurrence.component,
            &path,
            offset + Vec3::from(occurrence.translation),
            refinement,
            out,
        );
    }
}

fn collect_names(component: &Component, prefix: &str, out: &mut Vec<String>) {
    let path = qualify(prefix, &component.name);
    for body in &component.bodies {
        if body.visible {
            out.push(qualify(&path, &body.name));
        }
    }
    for occurrence in &component.occurrences {
        if occurrence.visible {
            collect_names(&occurrence.component, &path, out);
        }
    }
}

/// All bodies in the tree, hidden ones included
fn count_bodies(component: &Component) -> u32 {
    component.bodies.len() as u32
        + component
            .occurrences
            .iter()
            .map(|o| count_bodies(&o.component))
            .sum::<u32>()
}

/// All occurrences in the tree, hidden ones included
fn count_occurrences(component: &Component) -> u32 {
    component.occurrences.len() as u32
        + component
            .occurrences
            .iter()
            .map(|o| count_occurrences(&o.component))
            .sum::<u32>()
}

impl DesignHost for DesignDocument {
    fn title(&self) -> &str {
        &self.title
    }

    fn design_id(&self) -> Option<Uuid> {
        self.design_id
    }

    fn counters(&self) -> DesignCounters {
        DesignCounters {
            timeline_length: self.timeline.entries.len() as u32,
            timeline_position: self.timeline.marker(),
            occurrences: count_occurrences(&self.root),
            parameters: self.parameters.len() as u32,
            bodies: count_bodies(&self.root),
        }
    }

    fn visible_bodies(&self) -> Vec<BodyRef> {
        self.visible_body_names()
            .into_iter()
            .enumerate()
            .map(|(index, qualified_name)| BodyRef {
                qualified_name,
                index,
            })
            .collect()
    }

    fn archive_extension(&self) -> &'static str {
        DOCUMENT_EXTENSION
    }

    fn interchange_extension(&self) -> &'static str {
        "obj"
    }

    fn mesh_extension(&self) -> &'static str {
        "stl"
    }

    fn export_archive(&self, dest: &Path) -> Result<(), HostError> {
        self.save(dest).map_err(|e| HostError::WriteError {
            path: dest.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn export_interchange(&self, dest: &Path) -> Result<(), HostError> {
        mesh::write_obj(&self.resolve_bodies(), dest)
    }

    fn export_body_mesh(&self, body: &BodyRef, dest: &Path) -> Result<(), HostError> {
        let resolved = self.resolve_bodies();
        let target = resolved
            .get(body.index)
            .ok_or(HostError::UnknownBody(body.index))?;
        mesh::write_stl(&target.mesh, dest)
    }

    fn render_preview(&self, dest: &Path, width: u32, height: u32) -> Result<(), HostError> {
        preview::render(&self.resolve_bodies(), dest, width, height)
    }
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("could not read design document {path:?}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("design document {path:?} is not valid JSON: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("could not write design document {path:?}: {reason}")]
    WriteError { path: PathBuf, reason: String },
}
