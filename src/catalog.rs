//! Payload template discovery.
//!
//! Templates live as plain files anywhere below a payload directory. Each is
//! named by its path relative to that directory, always with `/` separators.

use crate::error::Result;
use crate::types::COMMENT_PREFIX;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One discovered template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEntry {
    pub name: String,
    pub path: PathBuf,
    pub description: Option<String>,
}

/// Templates found below a payload directory
#[derive(Debug, Clone, Default)]
pub struct PayloadCatalog {
    root: PathBuf,
    entries: Vec<PayloadEntry>,
}

impl PayloadCatalog {
    /// Walk `root` recursively and index every file, sorted by name.
    ///
    /// Symlinks are not followed, so a link back into the tree cannot repeat
    /// entries.
    pub fn scan<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        log::debug!("Locating payloads in {:?}", root);

        let mut files = Vec::new();
        collect_files(&root, &mut files)?;

        let mut entries = Vec::with_capacity(files.len());
        for path in files {
            let name = relative_name(&root, &path);
            let description = read_description(&path)?;
            if description.is_none() {
                log::warn!("Unable to read description of {}", name);
            }
            entries.push(PayloadEntry {
                name,
                path,
                description,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        log::debug!("Found {} payload(s)", entries.len());
        Ok(Self { root, entries })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[PayloadEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&PayloadEntry> {
        let name = name.trim_matches('/');
        self.entries.iter().find(|entry| entry.name == name)
    }
}

fn collect_files(root: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(())
}

fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_description(path: &Path) -> Result<Option<String>> {
    let mut first = String::new();
    BufReader::new(fs::File::open(path)?).read_line(&mut first)?;
    Ok(first
        .strip_prefix(COMMENT_PREFIX)
        .map(|text| text.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_nested_payloads() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("windows").join("recon");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("sysinfo.txt"), "REM Collect system info\nGUI r\n").unwrap();
        fs::write(dir.path().join("hello.txt"), "STRING hello\n").unwrap();

        let catalog = PayloadCatalog::scan(dir.path()).unwrap();
        let names: Vec<_> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["hello.txt", "windows/recon/sysinfo.txt"]);

        let entry = catalog.get("windows/recon/sysinfo.txt").unwrap();
        assert_eq!(entry.description.as_deref(), Some("Collect system info"));
        assert_eq!(catalog.get("hello.txt").unwrap().description, None);
        assert!(catalog.get("missing.txt").is_none());
    }

    #[test]
    fn test_scan_ignores_symlink_cycles() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.txt"), "STRING hello\n").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("loop")).unwrap();

        let catalog = PayloadCatalog::scan(dir.path()).unwrap();
        let names: Vec<_> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["hello.txt"]);
    }

    #[test]
    fn test_scan_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PayloadCatalog::scan(dir.path().join("nope")).is_err());
    }
}
