//! Systems - collaborators and scheduling logic the flocks run on

mod integration;
mod sampling;
mod schedule;
mod spatial;

pub use integration::*;
pub use sampling::*;
pub use schedule::*;
pub use spatial::*;
