//! Data models for reviewacquire.

mod review;

pub use review::{IdentifierTarget, ReviewRecord};
