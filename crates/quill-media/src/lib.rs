pub mod probe;
pub mod store;

pub use probe::{FfprobeProbe, MediaProbe};
pub use store::{MediaError, MediaStore};
