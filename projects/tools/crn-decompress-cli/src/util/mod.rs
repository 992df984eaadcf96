mod core;
mod mmap;
mod throughput;

pub use core::*;
pub use mmap::*;
pub use throughput::*;
