//! Domain types for dirload.
//!
//! - [`Resource`] - the tagged value a loader produces for one file
//! - [`Dictionary`] - a shared, mutable string-keyed map of resources
//! - [`Scalar`], [`Callable`], [`Opaque`] - the leaf shapes a resource can take
//!
//! All public types are re-exported at the crate root:
//!
//! ```
//! use dl_core::{Dictionary, Resource};
//! ```

mod dictionary;
mod resource;

pub use dictionary::Dictionary;
pub use resource::{Callable, Opaque, Resource, Scalar};
