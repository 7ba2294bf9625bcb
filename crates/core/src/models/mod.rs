//! Data models for BaasBeer

mod coins;
mod production;
mod profile;
mod proposal;
mod recipe;
mod share;
mod vote;

pub use coins::*;
pub use production::*;
pub use profile::*;
pub use proposal::*;
pub use recipe::*;
pub use share::*;
pub use vote::*;
