// Import/export of user data

pub mod export;

pub use export::*;
