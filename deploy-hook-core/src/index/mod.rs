//! Listing of the documents kept in the site repository.
//!
//! Files are recognized by name (see [`parse_filename`]), dated where the name carries a
//! `DD_MM_YY` token, and rendered into a Markdown table.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

mod date;
mod filename;
mod render;

pub use date::NormalizedDate;
pub use filename::{parse_filename, Extension, ParsedFilename};
pub use render::{render_page, render_table};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("can't read document directory {}", .0.display())]
    RootUnreadable(PathBuf, #[source] std::io::Error),
    #[error("document directory {} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("error walking document directory {}", .0.display())]
    Walk(PathBuf, #[source] walkdir::Error),
}

/// Display label and target of a document link. The path is relative to the scanned directory
/// and always uses `/` as separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    label: String,
    path: String,
}

impl Link {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// One row of the document index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    date: Option<NormalizedDate>,
    title: String,
    extension: Extension,
    link: Link,
}

impl DocumentEntry {
    /// Builds the entry for a file given by its path relative to the scanned directory, or `None`
    /// if the file name isn't one of the recognized document shapes.
    pub fn from_relative_path(relative: &Path) -> Option<DocumentEntry> {
        let filename = relative.file_name()?.to_str()?;
        let parsed = parse_filename(filename)?;
        let path = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?
            .join("/");
        Some(DocumentEntry {
            date: parsed.date_token.as_deref().map(NormalizedDate::normalize),
            title: parsed.name,
            extension: parsed.extension,
            link: Link {
                label: filename.to_owned(),
                path,
            },
        })
    }

    pub fn date(&self) -> Option<&NormalizedDate> {
        self.date.as_ref()
    }

    /// The date column text; empty for undated documents.
    pub fn date_text(&self) -> String {
        self.date
            .as_ref()
            .map(|date| date.to_string())
            .unwrap_or_default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn extension(&self) -> Extension {
        self.extension
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    // Compared in descending order: undated rows come first, then dated rows newest first.
    // Fallback dates compare as their raw text.
    fn sort_key(&self) -> (bool, String) {
        (self.date.is_none(), self.date_text())
    }
}

/// Recursively collects all documents below `root`, sorted for display.
///
/// A missing or unreadable `root` is an error; unreadable subdirectories are skipped with a
/// warning. A directory without any documents yields an empty list.
#[tracing::instrument(level = "debug", skip_all, fields(root = %root.display()))]
pub fn build_index(root: &Path) -> Result<Vec<DocumentEntry>, ScanError> {
    let metadata =
        std::fs::metadata(root).map_err(|e| ScanError::RootUnreadable(root.to_owned(), e))?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory(root.to_owned()));
    }

    let mut entries = Vec::new();
    for dir_entry in WalkDir::new(root).sort_by_file_name() {
        let dir_entry = match dir_entry {
            Ok(dir_entry) => dir_entry,
            Err(e) if e.depth() == 0 => return Err(ScanError::Walk(root.to_owned(), e)),
            Err(e) => {
                tracing::warn!("skipping unreadable part of document directory: {}", e);
                continue;
            }
        };
        let is_file = dir_entry.file_type().is_file()
            || (dir_entry.path_is_symlink() && dir_entry.path().is_file());
        if !is_file {
            continue;
        }
        let relative = match dir_entry.path().strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        match DocumentEntry::from_relative_path(relative) {
            Some(entry) => entries.push(entry),
            None => tracing::debug!(path = %relative.display(), "skipping non-document file"),
        }
    }

    entries.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    tracing::debug!(documents = entries.len(), "scanned document directory");
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, b"").unwrap();
    }

    fn dates(entries: &[DocumentEntry]) -> Vec<String> {
        entries.iter().map(DocumentEntry::date_text).collect()
    }

    #[test]
    fn should_build_entry_from_nested_path() {
        let entry =
            DocumentEntry::from_relative_path(Path::new("2024/board/Minutes_12_03_24.pdf")).unwrap();

        assert_eq!(entry.date_text(), "2024-03-12");
        assert_eq!(entry.title(), "Minutes");
        assert_eq!(entry.extension(), Extension::Pdf);
        assert_eq!(entry.link().label(), "Minutes_12_03_24.pdf");
        assert_eq!(entry.link().path(), "2024/board/Minutes_12_03_24.pdf");
    }

    #[test]
    fn should_order_undated_first_then_newest_first() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "old31_12_23.pdf");
        touch(tmp.path(), "new01_01_24.pdf");
        touch(tmp.path(), "timeless.doc");

        let entries = build_index(tmp.path()).unwrap();

        assert_eq!(dates(&entries), vec!["", "2024-01-01", "2023-12-31"]);
        assert_eq!(entries[0].title(), "timeless");
    }

    #[test]
    fn should_sort_fallback_dates_by_raw_text() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "a01_01_24.pdf");
        touch(tmp.path(), "b31_02_24.pdf");
        touch(tmp.path(), "c.pdf");

        let entries = build_index(tmp.path()).unwrap();

        assert_eq!(dates(&entries), vec!["", "31_02_24", "2024-01-01"]);
    }

    #[test]
    fn should_keep_path_order_for_equal_dates() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "b/second01_01_24.pdf");
        touch(tmp.path(), "a/first01_01_24.pdf");

        let entries = build_index(tmp.path()).unwrap();

        let paths: Vec<_> = entries.iter().map(|e| e.link().path()).collect();
        assert_eq!(paths, vec!["a/first01_01_24.pdf", "b/second01_01_24.pdf"]);
    }

    #[test]
    fn should_exclude_non_documents_at_any_depth() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "keep.pdf");
        touch(tmp.path(), "photo.jpg");
        touch(tmp.path(), "deep/deeper/notes.txt");
        touch(tmp.path(), "deep/deeper/slides12_03_24.pptx");
        touch(tmp.path(), "deep/deeper/report.DOCX");

        let entries = build_index(tmp.path()).unwrap();

        let paths: Vec<_> = entries.iter().map(|e| e.link().path()).collect();
        assert_eq!(paths, vec!["deep/deeper/report.DOCX", "keep.pdf"]);
        assert_eq!(entries[0].extension(), Extension::Docx);
    }

    #[test]
    fn should_return_empty_index_for_empty_directory() {
        let tmp = tempfile::tempdir().unwrap();

        let entries = build_index(tmp.path()).unwrap();

        assert!(entries.is_empty());
    }

    #[test]
    fn should_fail_for_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();

        let result = build_index(&tmp.path().join("missing"));

        assert!(matches!(result, Err(ScanError::RootUnreadable(_, _))));
    }

    #[test]
    fn should_fail_for_file_as_root() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "file.pdf");

        let result = build_index(&tmp.path().join("file.pdf"));

        assert!(matches!(result, Err(ScanError::NotADirectory(_))));
    }

    #[test]
    fn should_not_list_directories_named_like_documents() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("folder.pdf")).unwrap();

        let entries = build_index(tmp.path()).unwrap();

        assert!(entries.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn should_skip_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "Statutes.pdf");
        touch(tmp.path(), "private/Salaries.pdf");
        let private = tmp.path().join("private");
        std::fs::set_permissions(&private, std::fs::Permissions::from_mode(0o000)).unwrap();

        let result = build_index(tmp.path());
        std::fs::set_permissions(&private, std::fs::Permissions::from_mode(0o755)).unwrap();

        let entries = result.unwrap();
        assert!(entries.iter().any(|e| e.title() == "Statutes"));
    }
}
