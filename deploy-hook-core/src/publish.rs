use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to remove {}", .0.display())]
    Remove(PathBuf, #[source] std::io::Error),
    #[error("failed to list {}", .0.display())]
    List(PathBuf, #[source] std::io::Error),
    #[error("failed to copy {} to {}", .0.display(), .1.display())]
    Copy(PathBuf, PathBuf, #[source] std::io::Error),
    #[error("failed to walk {}", .0.display())]
    Walk(PathBuf, #[source] walkdir::Error),
    #[error("build output {} is not a directory", .0.display())]
    MissingSource(PathBuf),
}

/// Removes everything inside `dir`, leaving the directory itself in place.
pub fn clear_dir(dir: &Path) -> Result<(), Error> {
    let entries = fs::read_dir(dir).map_err(|e| Error::List(dir.to_owned(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| Error::List(dir.to_owned(), e))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| Error::List(path.clone(), e))?;
        let result = if file_type.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.map_err(|e| Error::Remove(path, e))?;
    }
    Ok(())
}

/// Copies the contents of `src` into `dest` recursively. Symlinks are followed and their targets
/// copied as regular files.
pub fn copy_tree(src: &Path, dest: &Path) -> Result<usize, Error> {
    if !src.is_dir() {
        return Err(Error::MissingSource(src.to_owned()));
    }
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| Error::Walk(src.to_owned(), e))?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) => relative,
            Err(_) => continue,
        };
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| Error::Copy(entry.path().to_owned(), target.clone(), e))?;
        } else {
            fs::copy(entry.path(), &target)
                .map_err(|e| Error::Copy(entry.path().to_owned(), target.clone(), e))?;
            copied += 1;
        }
    }
    Ok(copied)
}
