//! Command-line tests for the colorstat binary

mod utils;

use predicates::prelude::*;
use utils::{generic_log, DataTree};

#[test]
fn test_help_lists_subcommands() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("colorstat");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("perf"))
        .stdout(predicate::str::contains("boxplot"))
        .stdout(predicate::str::contains("areas"));
}

#[test]
fn test_perf_text_summary() {
    let tree = DataTree::new().unwrap();
    tree.write_perf("100", 1, 1000, 100, "1.0").unwrap();
    tree.write_perf("100", 2, 1000, 300, "3.0").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("colorstat");
    cmd.arg("--data-root")
        .arg(tree.root())
        .args(["perf", "--first", "1", "--last", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=== Perf run TG/BW/UN/PL/PF/00/100 ==="))
        .stdout(predicate::str::contains("Mean:    20.0000 %"))
        .stdout(predicate::str::contains("(file 2)"));
}

#[test]
fn test_perf_json_over_explicit_files() {
    let tree = DataTree::new().unwrap();
    let log = tree
        .write(&tree.root().join("xeon/log4"), &generic_log(4000, 1000, "2.5"))
        .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("colorstat");
    let output = cmd
        .args(["--format", "json", "perf", "--platform", "XE"])
        .arg(&log)
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["miss_rate"]["mean"], 25.0);
    assert_eq!(value["elapsed"]["min_file_id"], "4");
    assert_eq!(value["records"]["4"]["accesses"], 4000);
}

#[test]
fn test_malformed_file_fails_by_default() {
    let tree = DataTree::new().unwrap();
    tree.write_perf("100", 1, 1000, 100, "1.0").unwrap();
    tree.write(&tree.run_dir("PF", "100").join("2"), "garbage\n")
        .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("colorstat");
    cmd.arg("--data-root")
        .arg(tree.root())
        .args(["perf", "--first", "1", "--last", "2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Malformed record"));
}

#[test]
fn test_skip_malformed_flag() {
    let tree = DataTree::new().unwrap();
    tree.write_perf("100", 1, 1000, 100, "1.0").unwrap();
    tree.write(&tree.run_dir("PF", "100").join("2"), "garbage\n")
        .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("colorstat");
    cmd.arg("--data-root")
        .arg(tree.root())
        .args(["--skip-malformed", "perf", "--first", "1", "--last", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped 1 file(s):"));
}

#[test]
fn test_config_file_is_honored() {
    let tree = DataTree::new().unwrap();
    tree.write_colors("100", 3, &[4, 8, 4, 8]).unwrap();
    let config = tree
        .write(
            &tree.root().join("colorstat.toml"),
            &format!(
                "data_root = {:?}\ncolor_mask = 5\n\n[file_range]\nfirst = 3\nlast = 3\n",
                tree.root().display().to_string()
            ),
        )
        .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("colorstat");
    cmd.arg("--config")
        .arg(&config)
        .arg("colors")
        .assert()
        .success()
        .stdout(predicate::str::contains("(mask 0x5)"))
        .stdout(predicate::str::contains("Pages: 24 total, 8 selected, 16 rest"));
}

#[test]
fn test_missing_config_file() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("colorstat");
    cmd.args(["--config", "/no/such/colorstat.toml", "perf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_boxplot_levels_flag() {
    let tree = DataTree::new().unwrap();
    for utilization in ["12", "25"] {
        tree.write_perf(utilization, 1, 1000, 100, "0.5").unwrap();
    }

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("colorstat");
    cmd.arg("--data-root")
        .arg(tree.root())
        .args([
            "boxplot",
            "--quantity",
            "elapsed-time",
            "--levels",
            "12,25",
            "--first",
            "1",
            "--last",
            "1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("elapsed_time"))
        .stdout(predicate::str::contains("500.0000"));
}

#[test]
fn test_bins_requires_index_or_file() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("colorstat");
    cmd.arg("bins")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--index"));
}

#[test]
fn test_areas_writes_report() {
    let tree = DataTree::new().unwrap();
    let maps = tree
        .write(
            &tree.root().join("maps"),
            "00400000-00402000 r-xp 00000000 08:01 1 /usr/bin/bandwidth\n",
        )
        .unwrap();
    let pages = tree
        .write(&tree.root().join("pages"), "0x00400000 : 2\n0x00401000 : 6\n")
        .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("colorstat");
    cmd.args(["areas", "--map"])
        .arg(&maps)
        .arg("--pages")
        .arg(&pages)
        .assert()
        .success()
        .stdout(predicate::str::contains("pages.ord"));

    let report = std::fs::read_to_string(tree.root().join("pages.ord")).unwrap();
    assert!(report.contains("Area Range : 0x000400000 - 0x000402000"));
    assert!(report.contains("0x00401000 : 6"));
}
