//! Error types

mod dispatch;
mod fetch;
mod source;

pub use dispatch::*;
pub use fetch::*;
pub use source::*;
