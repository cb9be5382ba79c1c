//! Plain data shared by agents, flocks and their collaborators.

mod body;
mod common;
mod curve;

pub use body::*;
pub use common::*;
pub use curve::*;
