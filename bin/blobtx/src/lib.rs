//! Command line interface for building, signing and sending blob transactions.

pub mod cli;
