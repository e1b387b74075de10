//! Request file loading.
//!
//! A request file is a single JSON document bundling the source skeleton,
//! the deform meshes, and the rig options for one synthesis run.

use anyhow::{Context, Result};
use rigforge_spec::{MeshData, RigOptions, SkeletonPreset, SourceSkeleton};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One synthesis request: the skeleton to rig, the meshes it deforms,
/// and the options controlling the output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigRequest {
    /// The source skeleton to build the control rig over.
    pub skeleton: SourceSkeleton,

    /// Deform meshes used for shape auto-sizing and heel probing.
    #[serde(default)]
    pub meshes: Vec<MeshData>,

    /// Synthesis options. Missing fields take their defaults.
    #[serde(default)]
    pub options: RigOptions,
}

/// Load a request from a JSON file.
pub fn load_request(path: &Path) -> Result<RigRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read request file: {}", path.display()))?;
    let request: RigRequest = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse request file: {}", path.display()))?;
    Ok(request)
}

/// Build a request from a built-in skeleton preset.
///
/// The preset ships with a box shell mesh sized to its proportions so
/// shape auto-sizing has a surface to probe.
pub fn preset_request(name: &str) -> Result<RigRequest> {
    let preset: SkeletonPreset = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    Ok(RigRequest {
        skeleton: preset.source_skeleton(),
        meshes: vec![MeshData::box_shell(
            "body",
            [0.0, 0.0, 0.9],
            [0.4, 0.25, 0.9],
        )],
        options: RigOptions::default(),
    })
}
