//! Table operations
//!
//! Each operation consumes the table it works on and returns a new one, so a
//! pipeline threads one owned value through merge → transform → chunk.

mod chunk;
mod merge;
mod transform;

pub use chunk::chunk;
pub use merge::merge;
pub use transform::{transform, TransformError, TransformOptions, NO_SORT};
