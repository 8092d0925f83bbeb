pub mod access_code;
pub mod constants;
pub mod contact;
pub mod error;
pub mod event;
pub mod messages;
pub mod types;
pub mod validity;

pub use access_code::{AccessCode, AccessTags, ValidDays};
pub use contact::{Carrier, Contact};
pub use error::{Error, Result};
pub use event::{AccessVia, GateAccessEvent, WebActor};
pub use messages::DisplayMessages;
pub use types::*;
pub use validity::{AccessWindowEvaluator, TemporalValidity, WindowCheck};

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
