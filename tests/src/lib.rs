//! Cross-crate tests of the discovery and refresh engines against a simulated fleet.

mod discovery;
mod refresh;
#[cfg(test)]
mod util;
