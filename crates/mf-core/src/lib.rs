//! Command-line front end for framing monkey test bundles.
//!
//! The heavy lifting lives in `mf-bundle`; this crate resolves settings,
//! sets up logging, and maps failures to stable exit codes.

pub mod config;
pub mod exit_codes;
pub mod logging;
pub mod output;
