#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// A throwaway directory of fake executables to search in.
pub struct FakeBin {
    dir: TempDir,
}

impl FakeBin {
    pub fn new() -> Self {
        Self {
            dir: tempdir().unwrap(),
        }
    }

    pub fn with(names: &[&str]) -> Self {
        let bin = Self::new();
        for name in names {
            bin.add(name);
        }
        bin
    }

    /// Adds an executable shell stub.
    pub fn add(&self, name: &str) -> PathBuf {
        self.add_with_mode(name, 0o755)
    }

    pub fn add_with_mode(&self, name: &str, mode: u32) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
