#[macro_use]
extern crate quick_error;

#[macro_use]
extern crate derive_builder;

pub mod buffer;
pub mod config;
pub mod data;
pub mod func;
pub mod initializer;
pub mod layer;
pub mod metrics;
pub mod net;
pub mod score;
pub mod state;
pub mod stats;
pub mod train;
mod utils;
