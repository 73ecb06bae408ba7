#![forbid(unsafe_code)]

pub mod catalog;
pub mod error;
pub mod flow;
pub mod lessons;
pub mod model;
pub mod time;

pub use error::Error;
pub use time::Clock;
