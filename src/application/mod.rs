// Application layer - use cases and orchestration over the store

pub mod advisor;
pub mod error;
pub mod identity;
pub mod reporting;
pub mod service;

pub use advisor::*;
pub use error::*;
pub use identity::*;
pub use reporting::*;
pub use service::*;
