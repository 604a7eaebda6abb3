use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const HEADER: &str = "  Function      Hit    Time            Avg             s^2\n  \
                      --------      ---    ----            ---             ---\n";

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_stat(path: &Path, lines: &[(&str, u64, f64, f64)]) -> std::io::Result<()> {
    let mut s = HEADER.to_string();
    for (name, n, mean, variance) in lines {
        s.push_str(&format!(
            "  {name}  {n}  {}  us  {mean}  us  {variance}  us  \n",
            *n as f64 * mean
        ));
    }
    std::fs::write(path, s)
}

fn simple_setup() -> std::io::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    std::fs::write(dir.path().join("func_names.txt"), "lock\nunlock\nwait\n")?;
    write_stat(
        &dir.path().join("stat1.dat"),
        &[
            ("wait", 100, 12.5, 4.),
            ("lock", 100, 1.25, 0.25),
            ("ignored", 3, 1., 1.),
            ("unlock", 100, 0.75, 0.01),
        ],
    )?;
    write_stat(
        &dir.path().join("stat2.dat"),
        &[
            ("lock", 80, 1.5, 0.36),
            ("unlock", 80, 0.8, 0.04),
            ("wait", 80, 10., 9.),
        ],
    )?;
    Ok(dir)
}

fn histogram(dir: &TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("durations-histogram")?;
    cmd.current_dir(dir.path());
    Ok(cmd)
}

#[test]
fn simple_writes_eps_with_one_group_per_function() -> TestResult {
    let dir = simple_setup()?;
    histogram(&dir)?.assert().success();
    let eps = std::fs::read_to_string(dir.path().join("durations.eps"))?;
    assert!(eps.starts_with("%!PS-Adobe-3.0 EPSF-3.0\n"));
    assert_eq!(eps.matches("% group: ").count(), 3);
    assert!(eps.contains("% group: lock\n"));
    assert!(!eps.contains("ignored"));
    assert!(eps.ends_with("%%EOF\n"));
    Ok(())
}

#[test]
fn simple_with_explicit_paths_and_svg_output() -> TestResult {
    let dir = simple_setup()?;
    std::fs::rename(dir.path().join("stat1.dat"), dir.path().join("a.dat"))?;
    std::fs::rename(dir.path().join("stat2.dat"), dir.path().join("b.dat"))?;
    histogram(&dir)?
        .args(["-a", "a.dat", "-b", "b.dat", "-f", "func_names.txt"])
        .args(["--output", "chart.svg"])
        .assert()
        .success();
    let svg = std::fs::read_to_string(dir.path().join("chart.svg"))?;
    assert!(svg.contains("<svg "));
    assert_eq!(svg.matches("<g class=\"group\"").count(), 3);
    assert!(svg.contains("data-function=\"wait\""));
    assert!(!dir.path().join("durations.eps").exists());
    Ok(())
}

#[test]
fn summary_as_tsv() -> TestResult {
    let dir = simple_setup()?;
    histogram(&dir)?
        .args(["--summary", "--tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no_pi mean"))
        .stdout(predicate::str::contains("lock\t1.250\t0.500\t1.500\t0.600\t1.200"))
        .stdout(predicate::str::contains("ignored").not());
    Ok(())
}

#[test]
fn json_output() -> TestResult {
    let dir = simple_setup()?;
    histogram(&dir)?.args(["--json", "durations.json"]).assert().success();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("durations.json"))?)?;
    let rows = json.as_array().ok_or("expected an array")?;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2]["name"], "wait");
    Ok(())
}

#[test]
fn config_file_in_working_directory_is_used() -> TestResult {
    let dir = simple_setup()?;
    std::fs::write(
        dir.path().join(".pi-durations.yml"),
        "output: from-config.svg\ny_label: time (ns)\n",
    )?;
    histogram(&dir)?.assert().success();
    let svg = std::fs::read_to_string(dir.path().join("from-config.svg"))?;
    assert!(svg.contains("time (ns)"));
    Ok(())
}

#[test]
fn unknown_option_exits_with_usage_error() -> TestResult {
    let dir = simple_setup()?;
    histogram(&dir)?
        .arg("--no-such-option")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
    histogram(&dir)?.args(["--quiet", "--verbose"]).assert().code(2);
    histogram(&dir)?.arg("--tsv").assert().code(2);
    Ok(())
}

#[test]
fn missing_stat_file_fails() -> TestResult {
    let dir = simple_setup()?;
    histogram(&dir)?
        .args(["-b", "nonexistent.dat"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("nonexistent.dat"));
    assert!(!dir.path().join("durations.eps").exists());
    Ok(())
}

#[test]
fn malformed_mean_fails() -> TestResult {
    let dir = simple_setup()?;
    std::fs::write(
        dir.path().join("stat2.dat"),
        format!("{HEADER}  lock  80  120  us  fast  us  0.36  us  \n"),
    )?;
    histogram(&dir)?
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stat2.dat"))
        .stderr(predicate::str::contains("fast"));
    assert!(!dir.path().join("durations.eps").exists());
    Ok(())
}

#[test]
fn unknown_image_format_fails_before_any_output() -> TestResult {
    let dir = simple_setup()?;
    histogram(&dir)?
        .args(["-o", "chart.png", "--json", "out.json", "--summary"])
        .assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("chart.png"));
    assert!(!dir.path().join("out.json").exists());
    assert!(!dir.path().join("chart.png").exists());
    Ok(())
}

#[test]
fn mismatched_series_lengths_fail() -> TestResult {
    let dir = simple_setup()?;
    write_stat(&dir.path().join("stat2.dat"), &[("lock", 80, 1.5, 0.36)])?;
    histogram(&dir)?.assert().code(1);
    assert!(!dir.path().join("durations.eps").exists());
    Ok(())
}

fn pooled_setup(affinity: &str) -> std::io::Result<TempDir> {
    let dir = tempfile::tempdir()?;
    std::fs::create_dir(dir.path().join("stats"))?;
    std::fs::write(dir.path().join("names.txt"), "lock\nwait\n")?;
    for condition in ["no_pi", "pi"] {
        let path = |i| {
            dir.path()
                .join("stats")
                .join(format!("stat_{condition}_2prod_1cons_0annoy_{affinity}_f{i}.dat"))
        };
        write_stat(&path(0), &[("wait", 10, 3., 1.), ("lock", 2, 1., 0.)])?;
        write_stat(&path(1), &[("lock", 2, 3., 0.), ("wait", 10, 7., 1.)])?;
    }
    Ok(dir)
}

fn pooled_cmd(dir: &TempDir) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("durations-pooled")?;
    cmd.current_dir(dir.path());
    cmd.args(["-s", "stats", "-f", "names.txt", "-p", "2", "-P", "2", "-C", "1", "-A", "0"]);
    Ok(cmd)
}

#[test]
fn pooled_summary_shows_pooled_statistics() -> TestResult {
    let dir = pooled_setup("a")?;
    pooled_cmd(&dir)?
        .args(["--affinity", "--summary", "--tsv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lock\t2.000\t1.000\t2.000\t1.000\t1.000"))
        .stdout(predicate::str::contains("wait\t5.000\t2.236\t5.000\t2.236\t1.000"));
    let eps = std::fs::read_to_string(dir.path().join("durations.eps"))?;
    assert_eq!(eps.matches("% group: ").count(), 2);
    Ok(())
}

#[test]
fn pooled_with_letters() -> TestResult {
    let dir = pooled_setup("na")?;
    pooled_cmd(&dir)?
        .args(["--letters", "-o", "pooled.svg"])
        .assert()
        .success();
    let svg = std::fs::read_to_string(dir.path().join("pooled.svg"))?;
    assert!(svg.contains(">a</text>"));
    assert!(svg.contains(">b</text>"));
    assert!(svg.contains("data-function=\"lock\""));
    Ok(())
}

#[test]
fn pooled_without_affinity_files_fails() -> TestResult {
    let dir = pooled_setup("a")?;
    pooled_cmd(&dir)?
        .assert()
        .code(1)
        .stderr(predicate::str::contains("stat_no_pi_2prod_1cons_0annoy_na_f0.dat"));
    Ok(())
}

#[test]
fn pooled_rejects_zero_processors() -> TestResult {
    let dir = pooled_setup("a")?;
    Command::cargo_bin("durations-pooled")?
        .current_dir(dir.path())
        .args(["-p", "0"])
        .assert()
        .code(2);
    Ok(())
}
