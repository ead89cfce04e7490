// Finding activity files in a directory.

use std::path::{Path, PathBuf};

use crate::error::Error;

/// A matching entry of the activities directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityFile {
    pub dir: PathBuf,
    pub name: String,
}

impl ActivityFile {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }
}

/// List the files in `dir` whose name ends with `extension` (e.g. `.tcx`).
///
/// Matching is case-sensitive, so `run.TCX` is not picked up for `.tcx`.
/// Sub-directories and names that aren't valid UTF-8 are skipped. The result
/// is sorted by name.
pub fn activity_files(dir: &Path, extension: &str) -> Result<Vec<ActivityFile>, Error> {
    let read_dir_err = |source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in dir.read_dir().map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let Ok(name) = entry.file_name().into_string() else {
            log::debug!("Skipping non UTF-8 entry {:?}", entry.file_name());
            continue;
        };
        if !name.ends_with(extension) {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            log::debug!("Skipping directory {name}");
            continue;
        }
        files.push(ActivityFile {
            dir: dir.to_path_buf(),
            name,
        });
    }
    files.sort_by(|a, b| a.name.cmp(&b.name));
    log::debug!("Found {} {extension} files in {dir:?}", files.len());
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(files: &[ActivityFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn only_exact_extension_is_selected() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["run1.tcx", "notes.txt", "run2.TCX", "ride.tcx.gz", "b.tcx"] {
            fs::write(dir.path().join(f), "x").unwrap();
        }
        fs::create_dir(dir.path().join("old.tcx")).unwrap();

        let files = activity_files(dir.path(), ".tcx").unwrap();
        assert_eq!(names(&files), vec!["b.tcx", "run1.tcx"]);
        assert_eq!(files[1].path(), dir.path().join("run1.tcx"));
    }

    #[test]
    fn gz_extension() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["run1.tcx", "ride.tcx.gz"] {
            fs::write(dir.path().join(f), "x").unwrap();
        }
        let files = activity_files(dir.path(), ".tcx.gz").unwrap();
        assert_eq!(names(&files), vec!["ride.tcx.gz"]);
    }

    #[test]
    fn empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(activity_files(dir.path(), ".tcx").unwrap().is_empty());
    }

    #[test]
    fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        match activity_files(&missing, ".tcx") {
            Err(Error::ReadDir { path, .. }) => assert_eq!(path, missing),
            other => panic!("unexpected {other:?}"),
        }
    }
}
