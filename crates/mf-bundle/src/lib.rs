//! Test bundle framing.
//!
//! A test bundle is a ZIP archive whose directories ("groups") each hold a
//! monkey test script and the app package it exercises. This crate rewrites
//! such a bundle so every script becomes a self-contained, runnable test:
//! the app's descriptor is read out of its package and fixed setup/teardown
//! boilerplate is wrapped around the original script body.
//!
//! # Bundle Layout
//!
//! - `<group>/<test>.monkey`: raw test script (the test name is `<test>`)
//! - `<group>/<app>.pbw`: app package, itself a ZIP holding `appinfo.json`
//! - anything else: copied through untouched
//!
//! Scripts are framed; packages and all other entries keep their exact
//! bytes. A script without a package in its group aborts the whole
//! transform.
//!
//! # Example
//!
//! ```no_run
//! use mf_bundle::{transform_file, TransformOptions};
//! use std::path::Path;
//!
//! let report = transform_file(
//!     Path::new("tests.zip"),
//!     Path::new("tests-framed.zip"),
//!     &TransformOptions::default(),
//! )
//! .unwrap();
//! println!("framed {} tests", report.framed.len());
//! ```

pub mod descriptor;
pub mod error;
pub mod frame;
pub mod layout;
pub mod transform;

pub use descriptor::{AppDescriptor, DEFAULT_DESCRIPTOR};
pub use error::{BundleError, Result};
pub use frame::{check_parameters, frame, frame_script};
pub use layout::{split_entry_path, BundleLayout, EntryPath, PackageEntry, ScriptEntry};
pub use transform::{
    normalize_extension, transform, transform_bytes, transform_file, FramedGroup,
    TransformOptions, TransformReport, DEFAULT_PACKAGE_EXTENSION, DEFAULT_SCRIPT_EXTENSION,
};
