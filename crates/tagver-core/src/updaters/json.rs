//! Updater for JSON package files.
//!
//! Reads the top-level `version` field and rewrites it while
//! preserving key order, the file's indentation style, and its line
//! endings. Lockfiles with a `packages[""]` entry (package-lock v2 and
//! later) get that nested version updated too.

use serde::Serialize;
use serde_json::Value;

use super::{UpdaterError, UpdaterResult, VersionUpdater};

/// Updater for `package.json` and friends.
pub struct JsonUpdater;

impl VersionUpdater for JsonUpdater {
    fn read_version(&self, contents: &str) -> UpdaterResult<String> {
        let value = parse(contents)?;
        value
            .get("version")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| UpdaterError::MissingVersion("no \"version\" field".into()))
    }

    fn write_version(&self, contents: &str, version: &str) -> UpdaterResult<String> {
        let newline = detect_newline(contents);
        let mut value = parse(contents)?;

        if let Some(obj) = value.as_object_mut() {
            obj.insert("version".into(), Value::String(version.to_string()));
            // package-lock v2+ mirrors the root version under packages[""].
            if let Some(root_pkg) = obj
                .get_mut("packages")
                .and_then(Value::as_object_mut)
                .and_then(|p| p.get_mut(""))
                .and_then(Value::as_object_mut)
            {
                root_pkg.insert("version".into(), Value::String(version.to_string()));
            }
        }

        let mut buf = Vec::new();
        match detect_indent(contents) {
            Some(indent) => {
                let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
                let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
                value
                    .serialize(&mut ser)
                    .map_err(|e| UpdaterError::Parse(e.to_string()))?;
            }
            // No indented lines, keep the file minified.
            None => {
                let mut ser = serde_json::Serializer::new(&mut buf);
                value
                    .serialize(&mut ser)
                    .map_err(|e| UpdaterError::Parse(e.to_string()))?;
            }
        }
        let mut out = String::from_utf8(buf).map_err(|e| UpdaterError::Parse(e.to_string()))?;
        if contents.ends_with('\n') {
            out.push('\n');
        }
        if newline == "\r\n" {
            out = out.replace('\n', "\r\n");
        }
        Ok(out)
    }

    fn is_private(&self, contents: &str) -> bool {
        parse(contents)
            .ok()
            .and_then(|v| v.get("private").and_then(Value::as_bool))
            .unwrap_or(false)
    }
}

fn parse(contents: &str) -> UpdaterResult<Value> {
    serde_json::from_str(contents).map_err(|e| UpdaterError::Parse(e.to_string()))
}

/// Indentation of the first indented line. `None` means the file has
/// no indented lines, so it is treated as minified.
fn detect_indent(contents: &str) -> Option<String> {
    for line in contents.lines() {
        let ws: String = line
            .chars()
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        if !ws.is_empty() && ws.len() < line.len() {
            return Some(ws);
        }
    }
    None
}

const fn detect_newline(contents: &str) -> &'static str {
    // A single CRLF anywhere means the file uses CRLF throughout.
    let bytes = contents.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'\r' && bytes[i + 1] == b'\n' {
            return "\r\n";
        }
        i += 1;
    }
    "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    const PKG: &str = "{\n  \"name\": \"widget\",\n  \"version\": \"1.2.3\"\n}\n";

    #[test]
    fn reads_version() {
        assert_eq!(JsonUpdater.read_version(PKG).unwrap(), "1.2.3");
    }

    #[test]
    fn missing_version_field() {
        assert!(matches!(
            JsonUpdater.read_version("{\"name\": \"widget\"}"),
            Err(UpdaterError::MissingVersion(_))
        ));
    }

    #[test]
    fn malformed_json() {
        assert!(matches!(
            JsonUpdater.read_version("{not json"),
            Err(UpdaterError::Parse(_))
        ));
    }

    #[test]
    fn writes_version_preserving_key_order() {
        let out = JsonUpdater.write_version(PKG, "2.0.0").unwrap();
        assert_eq!(out, "{\n  \"name\": \"widget\",\n  \"version\": \"2.0.0\"\n}\n");
    }

    #[test]
    fn round_trip_is_identity() {
        let version = JsonUpdater.read_version(PKG).unwrap();
        let out = JsonUpdater.write_version(PKG, &version).unwrap();
        assert_eq!(out, PKG);
    }

    #[test]
    fn minified_file_stays_minified() {
        let pkg = r#"{"name":"widget","version":"1.2.3"}"#;
        let same = JsonUpdater.write_version(pkg, "1.2.3").unwrap();
        assert_eq!(same, pkg);
        let bumped = JsonUpdater.write_version(pkg, "1.2.4").unwrap();
        assert_eq!(bumped, r#"{"name":"widget","version":"1.2.4"}"#);
    }

    #[test]
    fn missing_trailing_newline_is_not_added() {
        let pkg = "{\n  \"version\": \"1.0.0\"\n}";
        let out = JsonUpdater.write_version(pkg, "1.0.1").unwrap();
        assert_eq!(out, "{\n  \"version\": \"1.0.1\"\n}");
    }

    #[test]
    fn preserves_tab_indentation() {
        let pkg = "{\n\t\"version\": \"1.0.0\"\n}\n";
        let out = JsonUpdater.write_version(pkg, "1.0.1").unwrap();
        assert_eq!(out, "{\n\t\"version\": \"1.0.1\"\n}\n");
    }

    #[test]
    fn preserves_crlf() {
        let pkg = "{\r\n  \"version\": \"1.0.0\"\r\n}\r\n";
        let out = JsonUpdater.write_version(pkg, "1.0.1").unwrap();
        assert_eq!(out, "{\r\n  \"version\": \"1.0.1\"\r\n}\r\n");
    }

    #[test]
    fn updates_lockfile_root_package() {
        let lock = concat!(
            "{\n",
            "  \"name\": \"widget\",\n",
            "  \"version\": \"1.2.3\",\n",
            "  \"lockfileVersion\": 2,\n",
            "  \"packages\": {\n",
            "    \"\": {\n",
            "      \"name\": \"widget\",\n",
            "      \"version\": \"1.2.3\"\n",
            "    }\n",
            "  }\n",
            "}\n"
        );
        let out = JsonUpdater.write_version(lock, "1.3.0").unwrap();
        assert_eq!(out.matches("\"1.3.0\"").count(), 2);
        assert!(!out.contains("1.2.3"));
    }

    #[test]
    fn private_flag() {
        assert!(JsonUpdater.is_private("{\"version\": \"1.0.0\", \"private\": true}"));
        assert!(!JsonUpdater.is_private(PKG));
        assert!(!JsonUpdater.is_private("{\"private\": \"true\"}"));
    }
}
