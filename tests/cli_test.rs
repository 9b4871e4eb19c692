//! Tests of the phylocfg binary

mod common;

use assert_cmd::Command;
use common::FakeBin;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn phylocfg(bin: &FakeBin) -> Command {
    let mut cmd = Command::cargo_bin("phylocfg").unwrap();
    cmd.env("PATH", bin.path()).env_remove("PHYLOCFG_LOG");
    cmd
}

#[test]
fn test_writes_configuration() {
    let bin = FakeBin::with(&["makeblastdb", "blastn", "muscle", "FastTreeMP-2.1.9-SSE3"]);
    let dir = tempdir().unwrap();
    let out = dir.path().join("phylo.cfg");

    phylocfg(&bin)
        .arg("-o")
        .arg(&out)
        .args(["-d", "n", "--db_dna", "makeblastdb", "--map_dna", "blastn"])
        .args(["--msa", "muscle", "--tree1", "fasttree"])
        .assert()
        .success();

    let text = fs::read_to_string(&out).unwrap();
    let sections: Vec<&str> = text.lines().filter(|l| l.starts_with('[')).collect();
    assert_eq!(sections, vec!["[db_dna]", "[map_dna]", "[msa]", "[tree1]"]);
}

#[test]
fn test_refuses_existing_output() {
    let bin = FakeBin::new();
    let dir = tempdir().unwrap();
    let out = dir.path().join("phylo.cfg");
    fs::write(&out, "untouched").unwrap();

    phylocfg(&bin)
        .arg("-o")
        .arg(&out)
        .args(["-d", "a", "--db_aa", "diamond", "--map_aa", "diamond"])
        .args(["--msa", "mafft", "--tree1", "astral"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&out).unwrap(), "untouched");
}

#[test]
fn test_missing_mapping_tool() {
    let bin = FakeBin::new();
    let dir = tempdir().unwrap();

    phylocfg(&bin)
        .arg("-o")
        .arg(dir.path().join("phylo.cfg"))
        .args(["-d", "n", "--db_dna", "makeblastdb"])
        .args(["--msa", "muscle", "--tree1", "raxml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--map_dna"));
}

#[test]
fn test_missing_executable_fails() {
    let bin = FakeBin::with(&["makeblastdb", "blastn"]);
    let dir = tempdir().unwrap();
    let out = dir.path().join("phylo.cfg");

    phylocfg(&bin)
        .arg("-o")
        .arg(&out)
        .args(["-d", "n", "--db_dna", "makeblastdb", "--map_dna", "blastn"])
        .args(["--msa", "muscle", "--tree1", "fasttree"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("\"muscle\""));

    assert!(!out.exists());
}

#[test]
fn test_bad_arguments_exit_one() {
    let bin = FakeBin::new();

    phylocfg(&bin)
        .args(["-o", "x.cfg", "-d", "n", "--db_dna", "makeblastdb", "--db_aa", "usearch"])
        .args(["--map_dna", "blastn", "--msa", "muscle", "--tree1", "raxml"])
        .assert()
        .code(1);

    phylocfg(&bin).arg("--help").assert().success();
}
