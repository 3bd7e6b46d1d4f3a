#![deny(warnings)]

pub mod analysis;
pub mod config;
pub mod detector;
pub mod emotion;
pub mod session;
pub mod source;
pub mod util;
