pub mod cache;
pub mod classifier;
pub mod error;
pub mod fix;
pub mod io;
pub mod paths;
pub mod policy;
pub mod reference;
pub mod types;
pub mod workflow;

pub use error::{Result, WfError};
