//! Host data types shared by the Bedrock plugin utilities.
//!
//! These types mirror values handed out by the server host. They carry no
//! persistence logic of their own; the storage engine registers translators
//! for them.

mod ignore_case;
mod location;

pub use ignore_case::IgnoreCase;
pub use location::Location;
