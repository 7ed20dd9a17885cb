//! CLI command implementations.

pub mod client;
pub mod info;
pub mod synth;

#[cfg(test)]
pub(crate) mod test_server;
