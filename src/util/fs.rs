//! Filesystem utilities.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use glob::glob;
use walkdir::WalkDir;

/// Extensions treated as C/C++ headers when walking directories.
pub const HEADER_EXTENSIONS: &[&str] = &["h", "hh", "hpp", "hxx"];

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

pub fn is_header(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| HEADER_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Resolve command-line inputs to header paths.
///
/// Each input is a file, a directory (walked recursively for headers), or a
/// glob pattern, relative to `base`. Results keep input order; directory and
/// glob matches are sorted. Duplicates are dropped.
pub fn discover_headers(base: &Path, inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for input in inputs {
        let path = base.join(input);
        let found = if path.is_file() {
            vec![path]
        } else if path.is_dir() {
            walk_headers(&path)?
        } else if is_glob(input) {
            glob_files(base, std::slice::from_ref(input))?
        } else {
            bail!("no such file or directory: {}", path.display());
        };

        if found.is_empty() {
            tracing::warn!("no headers matched `{}`", input);
        }
        for path in found {
            if seen.insert(path.clone()) {
                results.push(path);
            }
        }
    }

    tracing::debug!("discovered {} headers", results.len());
    Ok(results)
}

fn is_glob(input: &str) -> bool {
    input.contains(['*', '?', '['])
}

fn walk_headers(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut headers = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk directory: {}", dir.display()))?;
        if entry.file_type().is_file() && is_header(entry.path()) {
            headers.push(entry.into_path());
        }
    }
    Ok(headers)
}

/// Find files matching glob patterns relative to a base directory.
pub fn glob_files(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut results = Vec::new();

    for pattern in patterns {
        // Make pattern absolute by joining with base
        let full_pattern = base.join(pattern);
        let pattern_str = full_pattern.to_string_lossy();

        for entry in glob(&pattern_str)
            .with_context(|| format!("invalid glob pattern: {}", pattern))?
        {
            match entry {
                Ok(path) => {
                    if path.is_file() {
                        results.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!("glob error: {}", e);
                }
            }
        }
    }

    results.sort();
    results.dedup();
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::create_header_tree;

    fn names(paths: &[PathBuf], base: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.strip_prefix(base).unwrap().to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_directory_walk_finds_headers_only() {
        let tmp = create_header_tree(&[
            ("include/b.hpp", "int b();"),
            ("include/a.h", "int a();"),
            ("include/nested/c.hh", "int c();"),
            ("include/impl.cpp", "int a() { return 0; }"),
            ("include/README.md", "docs"),
        ]);

        let found = discover_headers(tmp.path(), &["include".to_string()]).unwrap();
        assert_eq!(
            names(&found, tmp.path()),
            ["include/a.h", "include/b.hpp", "include/nested/c.hh"]
        );
    }

    #[test]
    fn test_inputs_keep_order_and_dedup() {
        let tmp = create_header_tree(&[("x.h", ""), ("y.h", "")]);
        let inputs = ["y.h", "x.h", "*.h"].map(String::from);

        let found = discover_headers(tmp.path(), &inputs).unwrap();
        assert_eq!(names(&found, tmp.path()), ["y.h", "x.h"]);
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let tmp = create_header_tree(&[]);
        let err = discover_headers(tmp.path(), &["missing.h".to_string()]).unwrap_err();
        assert!(err.to_string().contains("no such file or directory"));
    }

    #[test]
    fn test_write_string_creates_parents() {
        let tmp = create_header_tree(&[]);
        let path = tmp.path().join("out/nested/mod.pyi");
        write_string(&path, "x: int\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "x: int\n");
    }
}
