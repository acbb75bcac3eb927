pub mod descriptor;
pub mod local;
pub mod manifest;
pub mod registry;

pub use descriptor::AssetDescriptor;
pub use local::{default_cache_root, AssetState, LocalAsset};
pub use manifest::AssetManifest;
pub use registry::ModelFamily;
