#![forbid(unsafe_code)]

pub mod model;
pub mod progression;
pub mod template;
pub mod time;

pub use time::Clock;
