use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shell_words::quote;
use walkdir::WalkDir;

/// Never shipped to the remote host.
const ALWAYS_SKIP: &[&str] = &[".git"];

/// Files under `root` to archive, as sorted paths relative to `root`.
///
/// An ignore entry with a single component (`__pycache__`) matches that name
/// at any depth; a longer one (`data/raw`) matches from the project root.
pub fn collect_files(root: &Path, ignore: &[String]) -> Result<Vec<PathBuf>> {
    let patterns: Vec<PathBuf> = ignore
        .iter()
        .map(|p| p.trim().trim_end_matches('/'))
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .chain(ALWAYS_SKIP.iter().map(PathBuf::from))
        .collect();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || e.path()
                    .strip_prefix(root)
                    .map(|rel| !is_ignored(rel, &patterns))
                    .unwrap_or(true)
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            files.push(rel.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

fn is_ignored(rel: &Path, patterns: &[PathBuf]) -> bool {
    patterns.iter().any(|pattern| {
        if pattern.components().count() == 1 {
            rel.components().any(|c| c.as_os_str() == pattern.as_os_str())
        } else {
            rel.starts_with(pattern)
        }
    })
}

/// Write one path per line, the input format of `zip -@`.
pub fn write_file_list(files: &[PathBuf], list_path: &Path) -> Result<()> {
    let mut contents = String::new();
    for file in files {
        contents.push_str(&file.to_string_lossy());
        contents.push('\n');
    }
    std::fs::write(list_path, contents)
        .with_context(|| format!("failed to write {}", list_path.display()))
}

/// Shell command that zips the listed files from inside the project root.
pub fn zip_command(project_dir: &Path, archive: &Path, list_path: &Path) -> String {
    format!(
        "cd {} && zip -q {} -@ < {}",
        quote(&project_dir.to_string_lossy()),
        quote(&archive.to_string_lossy()),
        quote(&list_path.to_string_lossy())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for rel in [
            "main.py",
            "pkg/model.py",
            "pkg/__pycache__/model.cpython-312.pyc",
            "data/raw/big.bin",
            "data/small.csv",
            ".git/HEAD",
        ] {
            touch(dir.path(), rel);
        }
        dir
    }

    #[test]
    fn collects_everything_but_git() {
        let dir = tree();
        let files = collect_files(dir.path(), &[]).unwrap();
        assert_eq!(
            files,
            [
                "data/raw/big.bin",
                "data/small.csv",
                "main.py",
                "pkg/__pycache__/model.cpython-312.pyc",
                "pkg/model.py",
            ]
            .map(PathBuf::from)
        );
    }

    #[test]
    fn single_component_pattern_matches_at_any_depth() {
        let dir = tree();
        let files = collect_files(dir.path(), &["__pycache__".into()]).unwrap();
        assert!(files.iter().all(|f| !f.to_string_lossy().contains("__pycache__")));
        assert!(files.contains(&PathBuf::from("pkg/model.py")));
    }

    #[test]
    fn nested_pattern_matches_from_root() {
        let dir = tree();
        let files = collect_files(dir.path(), &["data/raw/".into(), "  ".into()]).unwrap();
        assert!(!files.contains(&PathBuf::from("data/raw/big.bin")));
        assert!(files.contains(&PathBuf::from("data/small.csv")));
    }

    #[test]
    fn file_list_has_one_path_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("files.txt");
        write_file_list(&[PathBuf::from("a.py"), PathBuf::from("b/c.py")], &list).unwrap();
        assert_eq!(fs::read_to_string(list).unwrap(), "a.py\nb/c.py\n");
    }

    #[test]
    fn zip_command_runs_from_project_root() {
        let cmd = zip_command(
            Path::new("/home/alice/proj"),
            Path::new("/tmp/proj_1.zip"),
            Path::new("/tmp/proj_1.files"),
        );
        assert_eq!(
            cmd,
            "cd /home/alice/proj && zip -q /tmp/proj_1.zip -@ < /tmp/proj_1.files"
        );
    }
}
