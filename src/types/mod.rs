mod input;
mod models;

pub use input::*;
pub use models::*;
