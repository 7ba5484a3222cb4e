pub mod error;
pub mod events;
pub mod types;

pub use error::EventScriptError;
pub use events::*;
pub use types::*;
