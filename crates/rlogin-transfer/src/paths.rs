//! Resolves the local destination path for a `get_file` transfer: appends
//! an incrementing `_N` suffix rather than overwriting an existing file
//! unless the caller asked to replace it.

use std::path::{Path, PathBuf};

/// Picks the local path a downloaded remote file should be written to.
///
/// `local_path`, if non-empty, is used verbatim. Otherwise the remote file's
/// base name is placed under `local_folder` (or the current directory).
/// If the resulting path already exists and `replace` is false, an
/// incrementing `_N` suffix is inserted before the extension.
pub fn local_path_for_remote(remote_file: &str, local_path: &str, replace: bool, local_folder: Option<&str>) -> PathBuf {
    let base = if !local_path.is_empty() {
        PathBuf::from(local_path)
    } else {
        let name = Path::new(remote_file)
            .file_name()
            .map(|s| s.to_os_string())
            .unwrap_or_else(|| remote_file.into());
        match local_folder {
            Some(folder) => Path::new(folder).join(name),
            None => PathBuf::from(name),
        }
    };

    if !replace && base.exists() {
        indexed_path(&base)
    } else {
        base
    }
}

fn indexed_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let ext = path.extension().and_then(|s| s.to_str());
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());

    let mut idx = 1u32;
    loop {
        let candidate_name = match ext {
            Some(e) => format!("{stem}_{idx}.{e}"),
            None => format!("{stem}_{idx}"),
        };
        let candidate = match parent {
            Some(p) => p.join(candidate_name),
            None => PathBuf::from(candidate_name),
        };
        if !candidate.exists() {
            return candidate;
        }
        idx += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_remote_basename_under_local_folder() {
        let p = local_path_for_remote("/var/log/app.log", "", true, Some("/tmp/dl"));
        assert_eq!(p, PathBuf::from("/tmp/dl/app.log"));
    }

    #[test]
    fn explicit_local_path_wins() {
        let p = local_path_for_remote("/var/log/app.log", "/tmp/out.log", false, None);
        assert_eq!(p, PathBuf::from("/tmp/out.log"));
    }

    #[test]
    fn indexed_suffix_when_exists_and_not_replacing() {
        let dir = tempdir();
        let existing = dir.join("a.bin");
        std::fs::write(&existing, b"x").unwrap();
        let p = local_path_for_remote("/remote/a.bin", existing.to_str().unwrap(), false, None);
        assert_eq!(p, dir.join("a_1.bin"));
        std::fs::remove_file(&existing).unwrap();
    }

    fn tempdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rlogin-transfer-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
