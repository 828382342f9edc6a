//! Import Unreal skeletal meshes (PSK) and animation sets (PSA).
//!
//! Both formats are flat sequences of chunks, each a 32 byte header followed by
//! an array of fixed-size records. This library frames those chunks, decodes the
//! records into an immutable model (mesh, skeleton, weights) and rebuilds the
//! per-frame pose transforms of every animation clip against an already imported
//! skeleton. Scene creation is left to the host, which receives the results
//! through the [`sink::MeshSink`] and [`sink::AnimationSink`] traits.

pub mod animation;
pub mod chunk;
pub mod error;
/// Model loaders for PSK and PSA files
pub mod loader;
pub mod mesh;
pub mod sink;
pub mod skeleton;
pub mod text;
pub mod weight;

pub use error::ImportError;
pub use loader::{ImportParams, TrackLayout};
