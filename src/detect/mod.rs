mod backend;
pub mod backends;
mod filter;
mod registry;
mod result;

pub use backend::DetectorBackend;
pub use backends::{build_registry, NullBackend, ScriptedBackend};
pub use filter::{detect_people, non_max_suppression};
pub use registry::BackendRegistry;
pub use result::{BoundingBox, Detection, ObjectClass};
