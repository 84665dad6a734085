pub mod meeting;
pub mod participant;

pub use meeting::*;
pub use participant::*;
