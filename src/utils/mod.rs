pub mod errors;

pub use errors::{PolicyError, PolicyTableError, ProfileError, StoreError, StoreResult};
