//! Reference catalog: items, asset resolution and catalog documents

/// Identifier to local image path resolution
pub mod assets;
/// Reference item with memoized dominant color
pub mod item;
/// JSON catalog documents and parallel color enrichment
pub mod source;

pub use assets::{AssetStore, LocalAssetStore};
pub use item::ReferenceItem;
pub use source::{CatalogDocument, compute_colors};
