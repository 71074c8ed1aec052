//! App descriptor embedded in a package.
//!
//! A package is itself a ZIP archive; its `appinfo.json` member names the
//! app the test should launch and the UUID it is installed under.

use crate::{BundleError, Result};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Default descriptor member inside a package.
pub const DEFAULT_DESCRIPTOR: &str = "appinfo.json";

/// Identifying fields read from a package descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescriptor {
    /// Display name used to launch the app.
    #[serde(rename = "shortName")]
    pub short_name: String,
    /// Unique identifier used to uninstall a previous copy.
    pub uuid: String,
}

impl AppDescriptor {
    /// Read the descriptor out of a package's raw bytes.
    ///
    /// `package` is the package's path in the bundle and only feeds error
    /// messages.
    pub fn from_package(package: &str, bytes: &[u8], member: &str) -> Result<Self> {
        let malformed = |reason: String| BundleError::MalformedDescriptor {
            package: package.to_string(),
            reason,
        };

        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| malformed(format!("not a readable archive: {e}")))?;

        let mut file = archive
            .by_name(member)
            .map_err(|_| malformed(format!("missing member '{member}'")))?;

        let mut json = String::new();
        file.read_to_string(&mut json)
            .map_err(|e| malformed(format!("cannot read '{member}': {e}")))?;

        Self::from_json(&json).map_err(|e| malformed(format!("invalid '{member}': {e}")))
    }

    /// Parse a descriptor from JSON text.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    fn package_with(member: &str, content: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options: FileOptions<'_, ()> = FileOptions::default();
        zip.start_file(member, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    fn reason_of(result: Result<AppDescriptor>) -> String {
        match result {
            Err(BundleError::MalformedDescriptor { package, reason }) => {
                assert_eq!(package, "t/app.pbw");
                reason
            }
            other => panic!("expected MalformedDescriptor, got {other:?}"),
        }
    }

    #[test]
    fn test_from_package() {
        let bytes = package_with(
            DEFAULT_DESCRIPTOR,
            r#"{"shortName":"MyApp","uuid":"1234","versionLabel":"1.0"}"#,
        );
        let descriptor = AppDescriptor::from_package("t/app.pbw", &bytes, DEFAULT_DESCRIPTOR).unwrap();

        assert_eq!(descriptor.short_name, "MyApp");
        assert_eq!(descriptor.uuid, "1234");
    }

    #[test]
    fn test_not_an_archive() {
        let result = AppDescriptor::from_package("t/app.pbw", b"definitely not zip", DEFAULT_DESCRIPTOR);
        assert!(reason_of(result).contains("not a readable archive"));
    }

    #[test]
    fn test_missing_member() {
        let bytes = package_with("manifest.json", "{}");
        let result = AppDescriptor::from_package("t/app.pbw", &bytes, DEFAULT_DESCRIPTOR);
        assert!(reason_of(result).contains("missing member 'appinfo.json'"));
    }

    #[test]
    fn test_missing_field() {
        let bytes = package_with(DEFAULT_DESCRIPTOR, r#"{"shortName":"MyApp"}"#);
        let result = AppDescriptor::from_package("t/app.pbw", &bytes, DEFAULT_DESCRIPTOR);
        assert!(reason_of(result).contains("uuid"));
    }

    #[test]
    fn test_wrong_field_type() {
        let bytes = package_with(DEFAULT_DESCRIPTOR, r#"{"shortName":7,"uuid":"1234"}"#);
        let result = AppDescriptor::from_package("t/app.pbw", &bytes, DEFAULT_DESCRIPTOR);
        assert!(reason_of(result).starts_with("invalid 'appinfo.json'"));
    }

    #[test]
    fn test_invalid_json() {
        let bytes = package_with(DEFAULT_DESCRIPTOR, "{not json");
        let result = AppDescriptor::from_package("t/app.pbw", &bytes, DEFAULT_DESCRIPTOR);
        assert!(reason_of(result).starts_with("invalid 'appinfo.json'"));
    }

    #[test]
    fn test_from_json() {
        let descriptor = AppDescriptor::from_json(r#"{"uuid":"u","shortName":"n"}"#).unwrap();
        assert_eq!(descriptor.short_name, "n");
    }
}
