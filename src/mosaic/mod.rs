//! Mosaic assembly
//!
//! This module contains the mosaic-building functionality including:
//! - Grid derivation and row-major tile enumeration
//! - Per-run cache of resized reference images
//! - The staged assembly pipeline

/// Staged pipeline from source photo to finished canvas
pub mod assembler;
/// Tile loaders and the per-run tile image cache
pub mod cache;
/// Grid geometry and tile enumeration
pub mod grid;

pub use assembler::{AssemblyStage, Mosaic, MosaicAssembler};
pub use grid::{MosaicGrid, Tile};
