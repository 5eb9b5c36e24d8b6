pub mod hydroponics;
mod status;

pub use status::*;
