//! Collision-free naming.
//!
//! Probing is existence-then-use: callers must be the only writer of the
//! directories involved.

use std::fs;
use std::path::{Path, PathBuf};

const DUPLICATE_MARKER: &str = "-DUPLICATE-";

const FILENAME_UNSAFE_CHARACTERS: [char; 3] = [' ', '*', '$'];
const REPLACEMENT_FILENAME_SAFE_CHARACTER: char = '-';
const FILE_PATH_SEPARATORS: [char; 2] = ['/', '\\'];
const REPLACEMENT_FILE_PATH_SEPARATOR: char = '_';

/// Whether anything (file, directory or dangling link) occupies `path`.
pub fn is_occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// `<stem>-DUPLICATE-<index><.ext>` next to `path`, occupied or not.
pub fn duplicate_filename(path: &Path, index: u64) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (stem, extension) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{ext}")),
        _ => (name, String::new()),
    };
    parent.join(format!("{stem}{DUPLICATE_MARKER}{index}{extension}"))
}

/// Occupied duplicate names of `path` in index order, up to the first gap.
pub fn existing_duplicates(path: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    (0u64..)
        .map(move |index| duplicate_filename(path, index))
        .take_while(|candidate| is_occupied(candidate))
}

/// First free `<stem>-DUPLICATE-<n><.ext>` next to `path`, counting from 0.
pub fn non_duplicate_filename(path: &Path) -> PathBuf {
    let mut index = 0u64;
    loop {
        let candidate = duplicate_filename(path, index);
        if !is_occupied(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

/// First free `<path>-<n>`, counting from 0.
pub fn non_duplicate_directory(path: &Path) -> PathBuf {
    let base = path.as_os_str().to_string_lossy().into_owned();
    let mut index = 0u64;
    loop {
        let candidate = PathBuf::from(format!("{base}-{index}"));
        if !is_occupied(&candidate) {
            return candidate;
        }
        index += 1;
    }
}

/// `path` itself when free, otherwise its first free duplicate name.
pub fn free_filename(path: &Path) -> PathBuf {
    if is_occupied(path) {
        non_duplicate_filename(path)
    } else {
        path.to_path_buf()
    }
}

/// Flatten a relative directory into a single name component.
///
/// A leading separator is dropped, separators become `_` and characters
/// that are awkward in names (space, `*`, `$`) become `-`.
pub fn sanitize_directory(relative: &str) -> String {
    let trimmed = relative
        .strip_prefix(|c: char| FILE_PATH_SEPARATORS.contains(&c))
        .unwrap_or(relative);

    trimmed
        .chars()
        .map(|c| {
            if FILE_PATH_SEPARATORS.contains(&c) {
                REPLACEMENT_FILE_PATH_SEPARATOR
            } else if FILENAME_UNSAFE_CHARACTERS.contains(&c) {
                REPLACEMENT_FILENAME_SAFE_CHARACTER
            } else {
                c
            }
        })
        .collect()
}

/// Name under which an unprocessed file is filed for review.
///
/// The source directory relative to `source_root` is folded into the name so
/// that same-named files from different issues stay apart.
pub fn review_file_name(source_root: &Path, file_path: &Path) -> String {
    let directory = file_path.parent().unwrap_or(Path::new(""));
    let relative = directory.strip_prefix(source_root).unwrap_or(directory);
    let relative = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    let file_name = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    format!("{}_{}", sanitize_directory(&relative), file_name)
}
