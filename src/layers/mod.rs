pub mod base;
pub mod kind;
pub mod overlay;
pub mod registry;
pub mod style;

pub use base::{LayerProperties, LayerTrait, LayerType};
pub use kind::LayerKind;
pub use overlay::Overlay;
pub use registry::{LayerRegistry, RegistryEntry};
pub use style::{PathStyle, StyleOverride};
