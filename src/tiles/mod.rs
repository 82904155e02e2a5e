pub mod cache;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use cache::{TileCache, TileKey};
pub use loader::{TileLoader, TilePayload};
pub use source::{Basemap, TileLayer, TileSource, UrlTemplateSource};
