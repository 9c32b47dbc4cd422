//! Export orchestration - the fixed save-intercept sequence
//!
//! One export pass walks the same stations every time: ensure the
//! folder skeleton, refresh the preview, pick the next version folder,
//! write the archive and interchange snapshots into it, then refresh
//! the per-body mesh files. Individual stations may fail without
//! aborting the pass; the report records what happened at each.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

use crate::core::identity::sanitize_file_name;
use crate::core::version::{next_version, versioned_name, VersionLabel};
use crate::host::{DesignHost, HostError};

/// Subfolder holding the versioned CAD snapshots
pub const CAD_DIR: &str = "CAD";

/// Subfolder holding the always-current mesh files
pub const MODELS_DIR: &str = "Models";

/// Preview image file name, overwritten on every export
pub const PREVIEW_FILE: &str = "_preview.png";

/// Progress sink for the step-by-step export log
pub type Progress<'a> = &'a mut dyn FnMut(&str);

/// The versioned artifacts, in the order they are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Preview,
    Archive,
    Interchange,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Preview => "preview",
            ArtifactKind::Archive => "archive",
            ArtifactKind::Interchange => "interchange",
        }
    }
}

/// Outcome of one artifact write
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactResult {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// What one export pass did
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    /// Version folder this pass wrote into
    pub version: VersionLabel,

    /// Base name of the versioned files, `<project>_v03`
    pub versioned_name: String,

    pub artifacts: Vec<ArtifactResult>,

    /// Mesh files written to `Models/`
    pub meshes_exported: usize,

    /// Bodies whose mesh export failed
    pub meshes_failed: usize,

    /// One message per failed mesh
    pub mesh_errors: Vec<String>,

    pub duration_ms: u64,
}

impl ExportReport {
    fn artifact_ok(&self, kind: ArtifactKind) -> bool {
        self.artifacts
            .iter()
            .any(|a| a.kind == kind && a.success)
    }

    /// True when both versioned snapshots landed
    ///
    /// Only a complete snapshot advances the stored fingerprint, so a
    /// half-written version folder is retried on the next save.
    pub fn snapshot_complete(&self) -> bool {
        self.artifact_ok(ArtifactKind::Archive) && self.artifact_ok(ArtifactKind::Interchange)
    }

    pub fn preview_ok(&self) -> bool {
        self.artifact_ok(ArtifactKind::Preview)
    }

    /// Failed artifacts, for warning summaries
    pub fn failures(&self) -> impl Iterator<Item = &ArtifactResult> {
        self.artifacts.iter().filter(|a| !a.success)
    }
}

/// Knobs the orchestrator takes from configuration
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    /// Preview edge length in pixels
    pub preview_size: u32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            preview_size: crate::host::preview::DEFAULT_PREVIEW_SIZE,
        }
    }
}

/// Errors that abort an export pass outright
///
/// Only scaffolding failures abort; artifact failures are recorded in
/// the report instead.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not create {path:?}: {reason}")]
    CreateDir { path: PathBuf, reason: String },

    #[error("could not scan version folders under {path:?}: {reason}")]
    VersionScan { path: PathBuf, reason: String },
}

/// Run one export pass for `host` into `root`
///
/// `project` is the sanitized project name used for versioned file
/// names. Progress lines go to `progress` as the pass moves along.
pub fn run_export(
    host: &dyn DesignHost,
    root: &Path,
    project: &str,
    options: &ExportOptions,
    progress: Progress,
) -> Result<ExportReport, ExportError> {
    let started = Instant::now();
    let mut artifacts = Vec::new();

    let cad_dir = root.join(CAD_DIR);
    let models_dir = root.join(MODELS_DIR);
    ensure_dir(&cad_dir, progress)?;
    ensure_dir(&models_dir, progress)?;

    // Preview first: it reflects the design as saved, and a failure
    // here must not cost the version snapshot.
    let preview_path = root.join(PREVIEW_FILE);
    match host.render_preview(&preview_path, options.preview_size, options.preview_size) {
        Ok(()) => {
            progress(&format!("Preview saved: {}", PREVIEW_FILE));
            artifacts.push(ArtifactResult {
                kind: ArtifactKind::Preview,
                path: preview_path,
                success: true,
                error: None,
            });
        }
        Err(e) => {
            progress(&format!("Preview failed: {}", e));
            artifacts.push(ArtifactResult {
                kind: ArtifactKind::Preview,
                path: preview_path,
                success: false,
                error: Some(e.to_string()),
            });
        }
    }

    let version = next_version(&cad_dir).map_err(|e: io::Error| ExportError::VersionScan {
        path: cad_dir.clone(),
        reason: e.to_string(),
    })?;
    let versioned = versioned_name(project, version);
    let version_dir = cad_dir.join(version.to_string());
    ensure_dir(&version_dir, progress)?;
    progress(&format!(
        "Version calculated: {} -> {}",
        versioned,
        version_dir.display()
    ));

    let archive_dest = version_dir.join(format!("{}.{}", versioned, host.archive_extension()));
    artifacts.push(write_artifact(
        ArtifactKind::Archive,
        archive_dest,
        |d| host.export_archive(d),
        progress,
    ));

    let interchange_dest =
        version_dir.join(format!("{}.{}", versioned, host.interchange_extension()));
    artifacts.push(write_artifact(
        ArtifactKind::Interchange,
        interchange_dest,
        |d| host.export_interchange(d),
        progress,
    ));

    // Mesh files carry no version; they overwrite so the Models folder
    // always mirrors the latest save.
    let mut meshes_exported = 0;
    let mut mesh_errors = Vec::new();
    let bodies = host.visible_bodies();
    for body in &bodies {
        let file_name = sanitize_file_name(&format!(
            "{}.{}",
            body.qualified_name,
            host.mesh_extension()
        ));
        let dest = models_dir.join(&file_name);
        match host.export_body_mesh(body, &dest) {
            Ok(()) => meshes_exported += 1,
            Err(e) => {
                progress(&format!("Mesh export failed for {}: {}", file_name, e));
                mesh_errors.push(format!("{}: {}", file_name, e));
            }
        }
    }
    progress(&format!(
        "Meshes exported: {} ok, {} failed",
        meshes_exported,
        mesh_errors.len()
    ));

    Ok(ExportReport {
        version,
        versioned_name: versioned,
        artifacts,
        meshes_exported,
        meshes_failed: mesh_errors.len(),
        mesh_errors,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

fn write_artifact(
    kind: ArtifactKind,
    dest: PathBuf,
    op: impl FnOnce(&Path) -> Result<(), HostError>,
    progress: Progress,
) -> ArtifactResult {
    progress(&format!("Exporting {} -> {}", kind.as_str(), dest.display()));
    match op(&dest) {
        Ok(()) => ArtifactResult {
            kind,
            path: dest,
            success: true,
            error: None,
        },
        Err(e) => {
            progress(&format!("{} export failed: {}", kind.as_str(), e));
            ArtifactResult {
                kind,
                path: dest,
                success: false,
                error: Some(e.to_string()),
            }
        }
    }
}

fn ensure_dir(path: &Path, progress: Progress) -> Result<(), ExportError> {
    if path.exists() {
        progress(&format!("Targeting existing directory: {}", path.display()));
    } else {
        progress(&format!("Creating directory: {}", path.display()));
        std::fs::create_dir_all(path).map_err(|e| ExportError::CreateDir {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    }
    Ok(())
}
