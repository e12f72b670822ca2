//! Domain models for the Gold Bar Inventory Platform

mod bar;
mod batch;
mod client;
mod delivery;
mod forward;

pub use bar::*;
pub use batch::*;
pub use client::*;
pub use delivery::*;
pub use forward::*;
