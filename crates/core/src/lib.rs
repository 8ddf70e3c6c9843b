//! Core data types for the MOEX price-alert pipeline.

pub mod alert;
pub mod notification;
pub mod watch;

pub use alert::*;
pub use notification::*;
pub use watch::*;
