//! Executable search behaviour over fake PATH directories

mod common;

use common::FakeBin;
use phylocfg::{Locator, PhyloCfgError};
use pretty_assertions::assert_eq;
use std::os::unix::fs::symlink;

#[test]
fn test_repeated_lookups_agree() {
    let bin = FakeBin::with(&["raxmlHPC-PTHREADS-SSE3", "raxmlHPC"]);
    let locator = Locator::new([bin.path()]);

    let first = locator.locate("raxmlhpc", None).unwrap();
    let second = locator.locate("raxmlhpc", None).unwrap();
    assert_eq!(first, second);
    // listing is visited in name order
    assert_eq!(first.name, "raxmlHPC");
}

#[test]
fn test_fallback_is_flagged() {
    let bin = FakeBin::with(&["FastTree"]);
    let locator = Locator::new([bin.path()]);

    let found = locator
        .locate("FastTreeMP-2.1.9-SSE3", Some("fasttree"))
        .unwrap();
    assert_eq!(found.name, "FastTree");
    assert!(!found.primary_found);
}

#[test]
fn test_primary_preferred_over_fallback() {
    let generic = FakeBin::with(&["raxml"]);
    let fast = FakeBin::with(&["raxmlHPC-PTHREADS-SSE3"]);
    // the generic build comes first on the path, but the primary still wins
    let locator = Locator::new([generic.path(), fast.path()]);

    let found = locator
        .locate("raxmlHPC-PTHREADS-SSE3", Some("raxml"))
        .unwrap();
    assert_eq!(found.name, "raxmlHPC-PTHREADS-SSE3");
    assert!(found.primary_found);
    assert_eq!(found.dir, fast.path());
}

#[test]
fn test_not_found_names_both_fragments() {
    let bin = FakeBin::with(&["muscle"]);
    let locator = Locator::new([bin.path()]);

    match locator.locate("run-upp.sh", Some("upp")) {
        Err(PhyloCfgError::ExecutableNotFound { fragment, fallback }) => {
            assert_eq!(fragment, "run-upp.sh");
            assert_eq!(fallback.as_deref(), Some("upp"));
        }
        other => panic!("expected ExecutableNotFound, got {other:?}"),
    }
}

#[test]
fn test_group_only_execute_bit_is_not_enough() {
    let bin = FakeBin::new();
    bin.add_with_mode("trimal", 0o650);
    let locator = Locator::new([bin.path()]);

    assert!(locator.locate("trimal", None).is_err());
}

#[test]
fn test_symlink_name_is_reported() {
    let store = FakeBin::new();
    let target = store.add("opal-2.1.3.jar.sh");
    let bin = FakeBin::new();
    symlink(&target, bin.path().join("opal")).unwrap();

    // only the bin directory is searched; the link resolves to an executable
    let locator = Locator::new([bin.path()]);
    let found = locator.locate("OPAL", None).unwrap();
    assert_eq!(found.name, "opal");
}
