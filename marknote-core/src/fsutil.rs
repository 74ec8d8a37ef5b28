//! Filesystem helpers shared by the engine and CLI.

use regex::Regex;
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Flatten slash and dash runs out of a note title so it is a safe
/// filename, and trim dangling dashes.
pub fn sanitize_title(title: &str) -> String {
    static RUNS: once_cell::sync::Lazy<Regex> =
        once_cell::sync::Lazy::new(|| Regex::new(r"[/-]+").expect("valid title regex"));

    RUNS.replace_all(title, "-").trim_matches('-').to_string()
}

/// First non-colliding variant of `file`.
///
/// If `file` itself is free it is returned unchanged; otherwise a numeric
/// suffix is inserted before the extension, continuing from the highest
/// suffix already present in the directory (`foo.md`, `foo-1.md`,
/// `foo-2.md`, ...).
pub fn unique_path(file: &Path) -> io::Result<PathBuf> {
    if !file.exists() {
        return Ok(file.to_path_buf());
    }

    let dir = file.parent().unwrap_or_else(|| Path::new("."));
    let stem = file
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or_default();
    let extension = file.extension().and_then(OsStr::to_str);

    let suffix_pattern = match extension {
        Some(ext) => format!(
            r"^{}-(\d+)\.{}$",
            regex::escape(stem),
            regex::escape(ext)
        ),
        None => format!(r"^{}-(\d+)$", regex::escape(stem)),
    };
    let suffix_re = Regex::new(&suffix_pattern).expect("valid suffix regex");

    let mut max_serial = 0u32;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if let Some(caps) = suffix_re.captures(name) {
                if let Ok(serial) = caps[1].parse::<u32>() {
                    max_serial = max_serial.max(serial);
                }
            }
        }
    }

    let name = match extension {
        Some(ext) => format!("{stem}-{}.{ext}", max_serial + 1),
        None => format!("{stem}-{}", max_serial + 1),
    };
    Ok(dir.join(name))
}

/// Lexically normalize a path: resolve `.` and `..` components without
/// touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(Component::ParentDir);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Relative path from `base` to `path`, producing `..` components when
/// `path` lies outside `base`. Both inputs should be absolute.
pub fn relative_to(base: &Path, path: &Path) -> PathBuf {
    let base = normalize(base);
    let path = normalize(path);

    let base_components: Vec<_> = base.components().collect();
    let path_components: Vec<_> = path.components().collect();

    let common = base_components
        .iter()
        .zip(path_components.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut relative = PathBuf::new();
    for _ in common..base_components.len() {
        relative.push(Component::ParentDir);
    }
    for component in &path_components[common..] {
        relative.push(component);
    }
    relative
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn sanitizes_slashes_and_dashes() {
        assert_eq!(sanitize_title("foo/bar"), "foo-bar");
        assert_eq!(sanitize_title("a//--b"), "a-b");
        assert_eq!(sanitize_title("-draft-"), "draft");
        assert_eq!(sanitize_title("plain title"), "plain title");
    }

    #[test]
    fn unique_path_counts_upward_without_gaps() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("todo.md");

        assert_eq!(unique_path(&base).unwrap(), base);
        fs::write(&base, "x").unwrap();

        let first = unique_path(&base).unwrap();
        assert_eq!(first, dir.path().join("todo-1.md"));
        fs::write(&first, "x").unwrap();

        let second = unique_path(&base).unwrap();
        assert_eq!(second, dir.path().join("todo-2.md"));
    }

    #[test]
    fn unique_path_ignores_unrelated_files() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("todo.md");
        fs::write(&base, "x").unwrap();
        fs::write(dir.path().join("todo-3.txt"), "x").unwrap();
        fs::write(dir.path().join("other-9.md"), "x").unwrap();

        assert_eq!(unique_path(&base).unwrap(), dir.path().join("todo-1.md"));
    }

    #[test]
    fn normalizes_dot_components() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("a/b/../../..")), PathBuf::from(".."));
    }

    #[test]
    fn relative_paths_cross_directories() {
        assert_eq!(
            relative_to(Path::new("/work/space"), Path::new("/work/space/notes/a.md")),
            PathBuf::from("notes/a.md")
        );
        assert_eq!(
            relative_to(Path::new("/work/space"), Path::new("/work/other/b.md")),
            PathBuf::from("../other/b.md")
        );
    }
}
