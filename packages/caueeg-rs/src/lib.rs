pub mod bids;
pub mod channels;
pub mod convert;
pub mod edf;
pub mod error;
pub mod events;
pub mod montage;
pub mod participants;
pub mod source;
pub mod types;

#[doc(hidden)]
pub mod fixtures;

pub use convert::{ConvertOptions, Converter};
pub use error::{CaueegError, Result};
pub use types::*;
