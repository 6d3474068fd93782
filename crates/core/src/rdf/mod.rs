#![forbid(unsafe_code)]

mod dataset;
mod graph;
mod term;

pub use dataset::*;
pub use graph::*;
pub use term::*;

#[cfg(test)]
mod tests;
