//! Outbound adapters of the command line front end.

pub mod files;
pub mod lab;
