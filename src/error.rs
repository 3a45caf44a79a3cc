//! Error types for meshwarp.
//!
//! Every fallible operation in the crate returns [`Result`]. Errors that stem
//! from bad caller input (an unusable mesh or an out-of-range parameter) are
//! raised before any computation starts, so a failed call never produces a
//! partial mesh.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face repeats one of its corners.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A loaded face has fewer than three corners.
    #[error("face {face} has {corners} corners; at least three are required")]
    UnsupportedFace {
        /// The face index.
        face: usize,
        /// Number of corners found.
        corners: usize,
    },

    /// The same directed edge is used by more than one face.
    ///
    /// This happens on non-manifold edges and on neighbouring faces with
    /// inconsistent winding.
    #[error("directed edge ({v0}, {v1}) is used by more than one face")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// Invalid mesh state for the requested operation.
    #[error("invalid mesh state: {0}")]
    InvalidState(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Whether this error was caused by invalid caller input.
    ///
    /// True for malformed meshes and rejected parameters, false for
    /// file-system and format errors.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            MeshError::EmptyMesh
                | MeshError::InvalidVertexIndex { .. }
                | MeshError::DegenerateFace { .. }
                | MeshError::UnsupportedFace { .. }
                | MeshError::NonManifoldEdge { .. }
                | MeshError::InvalidState(_)
                | MeshError::InvalidParameter { .. }
        )
    }
}
