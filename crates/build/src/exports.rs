//! Exported symbol discovery for the manifest.

use crate::classify::{FileEntry, FileRole};
use crate::error::BuildError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

static EXPORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*export\s+(?:(default)\b|(?:async\s+)?(?:const|let|var|function\*?|class)\s+([A-Za-z_$][A-Za-z0-9_$]*))",
    )
    .expect("export regex is valid")
});

/// Lists the symbols a route file exports.
#[cfg_attr(test, mockall::automock)]
pub trait ExportScanner {
    fn exports(&self, root: &Path, entry: &FileEntry) -> Result<Vec<String>, BuildError>;
}

/// Reports no exports for any file.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExports;

impl ExportScanner for NoExports {
    fn exports(&self, _root: &Path, _entry: &FileEntry) -> Result<Vec<String>, BuildError> {
        Ok(vec![])
    }
}

/// Reads source files and collects top-level `export` declarations.
///
/// `export default ...` is reported as `default`. Assets are never read.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceExportScanner;

impl SourceExportScanner {
    pub fn scan_source(source: &str) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for captures in EXPORT_REGEX.captures_iter(source) {
            let Some(name) = captures.get(1).or_else(|| captures.get(2)) else {
                continue;
            };
            if !names.iter().any(|existing| existing == name.as_str()) {
                names.push(name.as_str().to_string());
            }
        }
        names
    }
}

impl ExportScanner for SourceExportScanner {
    fn exports(&self, root: &Path, entry: &FileEntry) -> Result<Vec<String>, BuildError> {
        if entry.role() == FileRole::Asset {
            return Ok(vec![]);
        }
        let path = root.join(entry.relative_path());
        let source = fs::read_to_string(&path).map_err(|e| BuildError::read_file(&path, e))?;
        Ok(Self::scan_source(&source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_source() {
        let source = r#"
import { h } from "preact";

export const config = { skipAppWrapper: true };
export async function handler(ctx) {}
export function* pages() {}
export class Page {}
  export let $count = 0;
export default function render() {}
// export const commented = 1;
const notExported = 2;
export const config = {};
"#;
        assert_eq!(
            SourceExportScanner::scan_source(source),
            vec!["config", "handler", "pages", "Page", "$count", "default"]
        );
    }

    #[test]
    fn test_reads_files_and_skips_assets() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("index.ts"), "export default 1;\n").unwrap();

        let scanner = SourceExportScanner;
        let handler = FileEntry::new("index.ts", FileRole::Handler, "ts");
        assert_eq!(scanner.exports(dir.path(), &handler).unwrap(), vec!["default"]);

        let asset = FileEntry::new("missing.png", FileRole::Asset, "png");
        assert!(scanner.exports(dir.path(), &asset).unwrap().is_empty());

        let missing = FileEntry::new("missing.ts", FileRole::Other, "ts");
        assert!(matches!(scanner.exports(dir.path(), &missing), Err(BuildError::ReadFile { .. })));
    }
}
