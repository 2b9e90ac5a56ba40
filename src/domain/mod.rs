pub mod announcement;

pub use announcement::*;
