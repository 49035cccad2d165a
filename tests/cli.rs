use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn codes2html() -> Command {
    let mut cmd = Command::cargo_bin("codes2html").expect("binary exists");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn reports_every_file_and_total_time() {
    let temp_dir = tempdir().unwrap();
    let src = temp_dir.path().join("src");
    fs::create_dir_all(src.join("vendor")).unwrap();
    fs::write(src.join("main.c"), "int main(void) { return 0; }\n").unwrap();
    fs::write(src.join("vendor").join("lib.c"), "int lib;\n").unwrap();
    fs::write(src.join("data.zzqx"), "???\n").unwrap();

    let ignore_file = temp_dir.path().join("ignore.txt");
    fs::write(&ignore_file, "vendor\n").unwrap();
    let output = temp_dir.path().join("out.html");

    codes2html()
        .arg("-o")
        .arg(&output)
        .arg("-i")
        .arg(&ignore_file)
        .arg(&src)
        .assert()
        .success()
        .stderr(predicate::str::contains("highlighted with C:"))
        .stderr(predicate::str::contains("ignored:").and(predicate::str::contains("vendor")))
        .stderr(predicate::str::contains("not source code:"))
        .stderr(predicate::str::contains("total time:"));

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("</br>"));
    assert!(html.ends_with("</body>\n</html>\n"));
}

#[test]
fn missing_ignore_file_is_only_a_warning() {
    let temp_dir = tempdir().unwrap();
    let src = temp_dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("a.c"), "int a;\n").unwrap();
    let output = temp_dir.path().join("out.html");

    codes2html()
        .arg("-o")
        .arg(&output)
        .arg("-i")
        .arg(temp_dir.path().join("does-not-exist.txt"))
        .arg(&src)
        .assert()
        .success()
        .stderr(predicate::str::contains("No ignore file"));

    assert!(output.exists());
}

#[test]
fn missing_sources_abort_without_output() {
    let temp_dir = tempdir().unwrap();
    let present = temp_dir.path().join("present");
    fs::create_dir_all(&present).unwrap();
    let output = temp_dir.path().join("out.html");

    codes2html()
        .arg("-o")
        .arg(&output)
        .arg(&present)
        .arg(temp_dir.path().join("ghost_one"))
        .arg(temp_dir.path().join("ghost_two"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("source paths do not exist"))
        .stderr(predicate::str::contains("ghost_one"))
        .stderr(predicate::str::contains("ghost_two"))
        .stderr(predicate::str::contains("No ignore file").not());

    assert!(!output.exists());
}

#[test]
fn extension_filter_and_custom_footer() {
    let temp_dir = tempdir().unwrap();
    let src = temp_dir.path().join("src");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("keep.c"), "/* marker_keep */\n").unwrap();
    fs::write(src.join("drop.py"), "# marker_drop\n").unwrap();
    let output = temp_dir.path().join("out.html");

    codes2html()
        .arg("-q")
        .arg("-e")
        .arg("c")
        .arg("-f")
        .arg("<hr class=\"sep\">")
        .arg("-o")
        .arg(&output)
        .arg(&src)
        .assert()
        .success();

    let html = fs::read_to_string(&output).unwrap();
    assert!(html.contains("marker_keep"));
    assert!(!html.contains("marker_drop"));
    assert_eq!(html.matches("<hr class=\"sep\">").count(), 1);
}

#[test]
fn sources_are_required() {
    codes2html().assert().failure();
}

#[test]
fn invalid_arguments_are_rejected() {
    codes2html().arg("--invalid-arg").arg(".").assert().failure();
}
