//! Bundle layout scan: classifies archive entries by extension and group.
//!
//! A group is the directory part of an entry's path. Each group holds at
//! most one script and at most one package; everything else passes through.

use crate::{BundleError, Result, TransformOptions};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

/// An entry path split into its group key and file name parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPath<'a> {
    /// Directory part (empty for root-level entries).
    pub group: &'a str,
    /// Last path component.
    pub file_name: &'a str,
    /// File name without its extension.
    pub stem: &'a str,
    /// Extension including the leading dot, or empty.
    pub extension: &'a str,
}

/// Split an archive path at its last `/` and its file name at the last `.`.
///
/// Leading dots never start an extension, so `.monkey` has no extension.
pub fn split_entry_path(path: &str) -> EntryPath<'_> {
    let (group, file_name) = match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    };

    let leading_dots = file_name.len() - file_name.trim_start_matches('.').len();
    let (stem, extension) = match file_name.rfind('.') {
        Some(idx) if idx >= leading_dots => (&file_name[..idx], &file_name[idx..]),
        _ => (file_name, ""),
    };

    EntryPath {
        group,
        file_name,
        stem,
        extension,
    }
}

/// A script entry found during the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptEntry {
    /// Test name (the script's file name without extension).
    pub test_name: String,
    /// Full path inside the bundle.
    pub path: String,
    #[serde(skip)]
    pub index: usize,
}

/// A package entry found during the scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageEntry {
    /// Full path inside the bundle.
    pub path: String,
    #[serde(skip)]
    pub index: usize,
}

/// Result of the classification pass over a bundle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BundleLayout {
    /// Script entries by group key.
    pub scripts: BTreeMap<String, ScriptEntry>,
    /// Package entries by group key.
    pub packages: BTreeMap<String, PackageEntry>,
    /// Indices of pass-through entries, in source order.
    #[serde(skip)]
    pub others: Vec<usize>,
}

impl BundleLayout {
    /// Classify every entry of `archive`.
    ///
    /// Only entry metadata is read; no entry is decompressed.
    pub fn scan<R: Read + Seek>(
        archive: &mut ZipArchive<R>,
        options: &TransformOptions,
    ) -> Result<Self> {
        let mut layout = BundleLayout::default();

        for index in 0..archive.len() {
            let name = archive.by_index_raw(index)?.name().to_string();
            let split = split_entry_path(&name);

            if split.extension == options.script_extension {
                let entry = ScriptEntry {
                    test_name: split.stem.to_string(),
                    path: name.clone(),
                    index,
                };
                if let Some(previous) = layout.scripts.insert(split.group.to_string(), entry) {
                    return Err(duplicate(split.group, previous.path, name.clone()));
                }
                debug!(path = %name, group = split.group, "Found script");
            } else if split.extension == options.package_extension {
                let entry = PackageEntry {
                    path: name.clone(),
                    index,
                };
                if let Some(previous) = layout.packages.insert(split.group.to_string(), entry) {
                    return Err(duplicate(split.group, previous.path, name.clone()));
                }
                debug!(path = %name, group = split.group, "Found package");
            } else {
                layout.others.push(index);
            }
        }

        Ok(layout)
    }

    /// Classify every entry of the bundle stored at `path`.
    pub fn scan_file(path: &Path, options: &TransformOptions) -> Result<Self> {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        Self::scan(&mut archive, options)
    }

    /// Number of entries copied through untouched.
    pub fn passthrough_count(&self) -> usize {
        self.others.len()
    }

    /// Packages whose group has no script.
    pub fn orphan_packages(&self) -> Vec<&PackageEntry> {
        self.packages
            .iter()
            .filter(|(group, _)| !self.scripts.contains_key(*group))
            .map(|(_, package)| package)
            .collect()
    }

    /// Scripts whose group has no package.
    pub fn unpaired_scripts(&self) -> Vec<&ScriptEntry> {
        self.scripts
            .iter()
            .filter(|(group, _)| !self.packages.contains_key(*group))
            .map(|(_, script)| script)
            .collect()
    }
}

fn duplicate(group: &str, first: String, second: String) -> BundleError {
    BundleError::DuplicateEntry {
        group: group.to_string(),
        first,
        second,
    }
}
