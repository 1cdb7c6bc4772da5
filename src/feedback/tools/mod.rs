pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod flatten;
pub mod io;
pub mod model;
pub mod result;
pub mod transport;
pub mod xml;

pub use error::{RemoteError, Result, ToolError};
pub use result::RemoteResult;
