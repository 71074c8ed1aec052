//! Bundle transformer: copies a test bundle, framing each script on the way.
//!
//! Entries that are neither scripts nor packages are copied first, in source
//! order. Groups are then processed in ascending group-key order: the
//! package is copied and the framed script is written at its original path.
//! Packages without a script in their group are copied last.

use crate::descriptor::{AppDescriptor, DEFAULT_DESCRIPTOR};
use crate::frame::{check_parameters, frame_script};
use crate::layout::BundleLayout;
use crate::{BundleError, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tracing::{debug, info, warn};
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

/// Default extension of test scripts.
pub const DEFAULT_SCRIPT_EXTENSION: &str = ".monkey";

/// Default extension of app packages.
pub const DEFAULT_PACKAGE_EXTENSION: &str = ".pbw";

/// Knobs for a transform pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Extension (with leading dot) marking script entries.
    pub script_extension: String,
    /// Extension (with leading dot) marking package entries.
    pub package_extension: String,
    /// Descriptor member inside each package.
    pub descriptor: String,
    /// Reject names that would break the generated script instead of
    /// substituting them verbatim.
    pub strict_parameters: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            script_extension: DEFAULT_SCRIPT_EXTENSION.to_string(),
            package_extension: DEFAULT_PACKAGE_EXTENSION.to_string(),
            descriptor: DEFAULT_DESCRIPTOR.to_string(),
            strict_parameters: false,
        }
    }
}

impl TransformOptions {
    /// Set the script extension. A missing leading dot is added.
    pub fn with_script_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.script_extension = normalize_extension(extension.as_ref());
        self
    }

    /// Set the package extension. A missing leading dot is added.
    pub fn with_package_extension(mut self, extension: impl AsRef<str>) -> Self {
        self.package_extension = normalize_extension(extension.as_ref());
        self
    }

    /// Set the descriptor member name.
    pub fn with_descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = descriptor.into();
        self
    }

    /// Enable or disable strict parameter checking.
    pub fn with_strict_parameters(mut self, strict: bool) -> Self {
        self.strict_parameters = strict;
        self
    }
}

/// Ensure an extension starts with a single `.`.
pub fn normalize_extension(extension: &str) -> String {
    format!(".{}", extension.trim_start_matches('.'))
}

/// One script/package pair that was framed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FramedGroup {
    pub group: String,
    pub script: String,
    pub package: String,
    pub test_name: String,
    pub app_name: String,
    pub app_id: String,
}

/// Summary of a completed transform.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransformReport {
    /// Framed groups, in processing order.
    pub framed: Vec<FramedGroup>,
    /// Entries copied through untouched (neither script nor package).
    pub passthrough: usize,
    /// Packages copied without a script in their group.
    pub orphan_packages: Vec<String>,
}

impl TransformReport {
    /// Total number of entries written to the destination.
    pub fn entries_written(&self) -> usize {
        self.passthrough + self.framed.len() * 2 + self.orphan_packages.len()
    }
}

/// Transform `source` into `dest`.
///
/// The destination is not finished; the caller owns that step. On error the
/// destination holds whatever was written before the failure and must be
/// discarded.
pub fn transform<R, W>(
    source: &mut ZipArchive<R>,
    dest: &mut ZipWriter<W>,
    options: &TransformOptions,
) -> Result<TransformReport>
where
    R: Read + Seek,
    W: Write + Seek,
{
    let layout = BundleLayout::scan(source, options)?;

    let mut report = TransformReport {
        passthrough: layout.passthrough_count(),
        ..TransformReport::default()
    };

    for &index in &layout.others {
        let entry = source.by_index_raw(index)?;
        debug!(path = %entry.name(), "Copying entry");
        dest.raw_copy_file(entry)?;
    }

    for (group, script) in &layout.scripts {
        let package = layout
            .packages
            .get(group)
            .ok_or_else(|| BundleError::MissingCompanion {
                group: group.clone(),
                script: script.path.clone(),
            })?;

        let package_bytes = read_entry(source, package.index)?;
        let descriptor =
            AppDescriptor::from_package(&package.path, &package_bytes, &options.descriptor)?;

        if options.strict_parameters {
            check_parameters(&script.test_name, &descriptor.short_name, &descriptor.uuid)?;
        }

        dest.raw_copy_file(source.by_index_raw(package.index)?)?;

        let body = String::from_utf8(read_entry(source, script.index)?).map_err(|_| {
            BundleError::InvalidScriptEncoding {
                path: script.path.clone(),
            }
        })?;
        let framed = frame_script(
            &body,
            &script.test_name,
            &descriptor.short_name,
            &descriptor.uuid,
        );

        let (compression, unix_mode) = {
            let entry = source.by_index_raw(script.index)?;
            (entry.compression(), entry.unix_mode())
        };
        let method = match compression {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        let mut file_options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(method);
        if let Some(mode) = unix_mode {
            file_options = file_options.unix_permissions(mode);
        }

        dest.start_file(script.path.as_str(), file_options)?;
        dest.write_all(framed.as_bytes())?;

        info!(
            group = %group,
            test = %script.test_name,
            app = %descriptor.short_name,
            uuid = %descriptor.uuid,
            "Framed test"
        );

        report.framed.push(FramedGroup {
            group: group.clone(),
            script: script.path.clone(),
            package: package.path.clone(),
            test_name: script.test_name.clone(),
            app_name: descriptor.short_name,
            app_id: descriptor.uuid,
        });
    }

    for package in layout.orphan_packages() {
        warn!(path = %package.path, "Package has no test script in its group; copying as-is");
        dest.raw_copy_file(source.by_index_raw(package.index)?)?;
        report.orphan_packages.push(package.path.clone());
    }

    info!(
        framed = report.framed.len(),
        passthrough = report.passthrough,
        orphans = report.orphan_packages.len(),
        "Bundle transformed"
    );

    Ok(report)
}

/// Transform the bundle at `input` into a new bundle at `output`.
///
/// The output file is removed again if the transform fails.
pub fn transform_file(
    input: &Path,
    output: &Path,
    options: &TransformOptions,
) -> Result<TransformReport> {
    if output.exists() && std::fs::canonicalize(input)? == std::fs::canonicalize(output)? {
        return Err(BundleError::SameInputOutput {
            path: output.display().to_string(),
        });
    }

    let mut source = ZipArchive::new(File::open(input)?)?;
    let mut dest = ZipWriter::new(File::create(output)?);

    let report = match transform(&mut source, &mut dest, options) {
        Ok(report) => report,
        Err(e) => {
            drop(dest);
            discard_partial(output);
            return Err(e);
        }
    };

    if let Err(e) = dest.finish() {
        discard_partial(output);
        return Err(e.into());
    }

    info!(
        input = %input.display(),
        output = %output.display(),
        entries = report.entries_written(),
        "Bundle written"
    );

    Ok(report)
}

/// Transform an in-memory bundle, returning the new bundle's bytes.
pub fn transform_bytes(
    input: &[u8],
    options: &TransformOptions,
) -> Result<(Vec<u8>, TransformReport)> {
    let mut source = ZipArchive::new(Cursor::new(input))?;
    let mut dest = ZipWriter::new(Cursor::new(Vec::new()));

    let report = transform(&mut source, &mut dest, options)?;
    let bytes = dest.finish()?.into_inner();

    Ok((bytes, report))
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, index: usize) -> Result<Vec<u8>> {
    let mut file = archive.by_index(index)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

fn discard_partial(output: &Path) {
    if let Err(e) = std::fs::remove_file(output) {
        warn!(path = %output.display(), error = %e, "Could not remove partial bundle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<'_, ()> = FileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn package(appinfo: &str) -> Vec<u8> {
        bundle(&[("appinfo.json", appinfo.as_bytes()), ("pebble-app.bin", b"\x00\x01")])
    }

    fn read_all(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                file.read_to_end(&mut data).unwrap();
                (file.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("monkey"), ".monkey");
        assert_eq!(normalize_extension(".pbw"), ".pbw");
        assert_eq!(normalize_extension("..pbw"), ".pbw");
    }

    #[test]
    fn test_options_builder() {
        let options = TransformOptions::default()
            .with_script_extension("script")
            .with_package_extension(".zip")
            .with_descriptor("package.json")
            .with_strict_parameters(true);

        assert_eq!(options.script_extension, ".script");
        assert_eq!(options.package_extension, ".zip");
        assert_eq!(options.descriptor, "package.json");
        assert!(options.strict_parameters);
    }

    #[test]
    fn test_transform_output_order() {
        let app = package(r#"{"shortName":"B","uuid":"2"}"#);
        let input = bundle(&[
            ("zeta/app.pbw", app.as_slice()),
            ("zeta/run.monkey", b"press UP\n"),
            ("README.md", b"hello"),
            ("alpha/app.pbw", app.as_slice()),
            ("alpha/run.monkey", b"press DOWN\n"),
            ("lonely/app.pbw", app.as_slice()),
        ]);

        let (output, report) = transform_bytes(&input, &TransformOptions::default()).unwrap();
        let names: Vec<_> = read_all(&output).into_iter().map(|(n, _)| n).collect();

        assert_eq!(
            names,
            vec![
                "README.md",
                "alpha/app.pbw",
                "alpha/run.monkey",
                "zeta/app.pbw",
                "zeta/run.monkey",
                "lonely/app.pbw",
            ]
        );
        assert_eq!(report.entries_written(), 6);
        assert_eq!(report.orphan_packages, vec!["lonely/app.pbw"]);
    }

    #[test]
    fn test_transform_missing_companion_writes_nothing_for_group() {
        let input = bundle(&[("other.txt", b"x"), ("solo/test.monkey", b"press UP\n")]);

        let mut source = ZipArchive::new(Cursor::new(input.as_slice())).unwrap();
        let mut dest = ZipWriter::new(Cursor::new(Vec::new()));
        let result = transform(&mut source, &mut dest, &TransformOptions::default());

        match result {
            Err(BundleError::MissingCompanion { group, script }) => {
                assert_eq!(group, "solo");
                assert_eq!(script, "solo/test.monkey");
            }
            other => panic!("expected MissingCompanion, got {other:?}"),
        }

        let written = read_all(&dest.finish().unwrap().into_inner());
        assert!(written.iter().all(|(name, _)| !name.starts_with("solo/")));
    }

    #[test]
    fn test_transform_rejects_non_utf8_script() {
        let app = package(r#"{"shortName":"A","uuid":"1"}"#);
        let input = bundle(&[("t/app.pbw", app.as_slice()), ("t/run.monkey", b"\xff\xfe")]);

        let result = transform_bytes(&input, &TransformOptions::default());
        assert!(matches!(
            result,
            Err(BundleError::InvalidScriptEncoding { ref path }) if path == "t/run.monkey"
        ));
    }

    #[test]
    fn test_transform_strict_parameters() {
        let app = package(r#"{"shortName":"Say \"hi\"","uuid":"1"}"#);
        let input = bundle(&[("t/app.pbw", app.as_slice()), ("t/run.monkey", b"press UP\n")]);

        let lenient = transform_bytes(&input, &TransformOptions::default());
        assert!(lenient.is_ok());

        let strict = transform_bytes(
            &input,
            &TransformOptions::default().with_strict_parameters(true),
        );
        assert!(matches!(
            strict,
            Err(BundleError::UnsafeParameter { parameter: "app name", .. })
        ));
    }

    #[test]
    fn test_transform_not_a_zip() {
        let result = transform_bytes(b"plain text", &TransformOptions::default());
        assert!(matches!(result, Err(BundleError::Zip(_))));
    }
}
