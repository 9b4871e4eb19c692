//! Executable discovery on the search path
//!
//! Pipeline tools are found by a case-insensitive name fragment rather than an
//! exact file name, because installations commonly carry version or build
//! suffixes (`FastTreeMP-2.1.9-SSE3`, `raxmlHPC-PTHREADS-SSE3`, ...). When the
//! preferred variant is missing a more generic fragment can be tried instead.

use crate::error::{PhyloCfgError, Result};
use nix::sys::stat::{stat, Mode, SFlag};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of a successful executable search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// File name of the matching directory entry (not the symlink target)
    pub name: String,
    /// Directory the entry was found in
    pub dir: PathBuf,
    /// `false` when only the fallback fragment matched
    pub primary_found: bool,
}

/// Searches an ordered list of directories for executables.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    dirs: Vec<PathBuf>,
}

impl Locator {
    /// Creates a locator over an explicit list of directories.
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a locator over the directories listed in `PATH`.
    pub fn from_env() -> Self {
        Self::from_path_var(std::env::var_os("PATH"))
    }

    /// Creates a locator from a raw `PATH`-style value.
    pub fn from_path_var(path: Option<OsString>) -> Self {
        match path {
            Some(path) => Self::new(std::env::split_paths(&path).filter(|d| !d.as_os_str().is_empty())),
            None => Self::default(),
        }
    }

    /// The directories searched, in order.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Finds the first executable whose file name contains `fragment`.
    ///
    /// Directories are searched in order. Within one directory the entries
    /// are visited sorted by file name rather than in `read_dir` order, so
    /// when several entries match, the first by name wins.
    ///
    /// If nothing matches and `fallback` is given, the search is repeated once
    /// with the fallback fragment and the result is flagged with
    /// `primary_found == false`.
    ///
    /// # Errors
    /// Returns [`PhyloCfgError::ExecutableNotFound`] when neither fragment
    /// matches.
    pub fn locate(&self, fragment: &str, fallback: Option<&str>) -> Result<Resolution> {
        if let Some(found) = self.scan(fragment) {
            debug!("Found {fragment:?} as {:?} in {}", found.0, found.1.display());
            return Ok(Resolution {
                name: found.0,
                dir: found.1,
                primary_found: true,
            });
        }

        if let Some(fallback) = fallback {
            if let Some(found) = self.scan(fallback) {
                warn!(
                    "{fragment:?} not found, falling back to {:?} in {}",
                    found.0,
                    found.1.display()
                );
                return Ok(Resolution {
                    name: found.0,
                    dir: found.1,
                    primary_found: false,
                });
            }
        }

        Err(PhyloCfgError::ExecutableNotFound {
            fragment: fragment.to_string(),
            fallback: fallback.map(str::to_string),
        })
    }

    fn scan(&self, fragment: &str) -> Option<(String, PathBuf)> {
        let needle = fragment.to_lowercase();

        for dir in &self.dirs {
            let mut entries: Vec<_> = match fs::read_dir(dir) {
                Ok(entries) => entries.flatten().collect(),
                Err(e) => {
                    debug!("Skipping search directory {}: {e}", dir.display());
                    continue;
                }
            };
            entries.sort_by_key(|entry| entry.file_name());

            for entry in entries {
                let name = entry.file_name().to_string_lossy().into_owned();
                if !name.to_lowercase().contains(&needle) {
                    continue;
                }
                if is_executable_file(&entry.path()) {
                    return Some((name, dir.clone()));
                }
            }
        }

        None
    }
}

/// Resolves symlinks and checks for a non-directory with the owner-execute bit.
pub fn is_executable_file(path: &Path) -> bool {
    let Ok(canonical) = fs::canonicalize(path) else {
        return false;
    };
    let Ok(st) = stat(&canonical) else {
        return false;
    };

    let kind = SFlag::from_bits_truncate(st.st_mode & SFlag::S_IFMT.bits());
    if kind == SFlag::S_IFDIR {
        return false;
    }
    Mode::from_bits_truncate(st.st_mode).contains(Mode::S_IXUSR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::{symlink, PermissionsExt};
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_case_insensitive_substring() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "FastTreeMP-2.1.9-SSE3", 0o755);

        let locator = Locator::new([dir.path()]);
        let found = locator.locate("fasttreemp", None).unwrap();
        assert_eq!(found.name, "FastTreeMP-2.1.9-SSE3");
        assert!(found.primary_found);
    }

    #[test]
    fn test_rejects_non_executable_and_directories() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "muscle", 0o644);
        fs::create_dir(dir.path().join("muscle.d")).unwrap();

        let locator = Locator::new([dir.path()]);
        assert!(matches!(
            locator.locate("muscle", None),
            Err(PhyloCfgError::ExecutableNotFound { .. })
        ));
    }

    #[test]
    fn test_symlink_resolves_to_executable() {
        let dir = tempdir().unwrap();
        let target = touch(dir.path(), "real-trimal", 0o700);
        symlink(&target, dir.path().join("trimal")).unwrap();
        symlink(dir.path().join("missing"), dir.path().join("trimal-broken")).unwrap();

        let locator = Locator::new([dir.path()]);
        let found = locator.locate("trimal", None).unwrap();
        // entries are visited by name; "real-trimal" sorts first
        assert_eq!(found.name, "real-trimal");

        assert!(is_executable_file(&dir.path().join("trimal")));
        assert!(!is_executable_file(&dir.path().join("trimal-broken")));
    }

    #[test]
    fn test_directory_order_wins() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        touch(first.path(), "blastn", 0o755);
        touch(second.path(), "blastn", 0o755);

        let locator = Locator::new([first.path(), second.path()]);
        let found = locator.locate("blastn", None).unwrap();
        assert_eq!(found.dir, first.path());
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "diamond", 0o755);

        let locator = Locator::new([dir.path().join("nope"), dir.path().to_path_buf()]);
        assert_eq!(locator.locate("diamond", None).unwrap().name, "diamond");
    }

    #[test]
    fn test_from_path_var_splits_and_drops_empty() {
        let locator = Locator::from_path_var(Some(OsString::from("/usr/bin::/bin")));
        assert_eq!(
            locator.dirs(),
            &[PathBuf::from("/usr/bin"), PathBuf::from("/bin")]
        );
        assert!(Locator::from_path_var(None).dirs().is_empty());
    }
}
