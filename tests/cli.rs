//! Integration tests for the command-line front end

use std::path::PathBuf;
use std::process::Command;

struct Cleanup(Vec<PathBuf>);
impl Drop for Cleanup {
    fn drop(&mut self) {
        for path in &self.0 {
            let _ = std::fs::remove_file(path);
        }
    }
}

fn temp_path(tag: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "tabula_cli_{}_{}_{}_{:?}.{}",
        tag,
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos(),
        std::thread::current().id(),
        ext,
    ))
}

fn run(args: &[&str]) -> (String, String, i32) {
    // Tests must not depend on a user's ~/.config/tabula/config.toml.
    let config = temp_path("config", "toml");
    std::fs::write(&config, "").unwrap();
    let _cleanup = Cleanup(vec![config.clone()]);

    let output = Command::new(env!("CARGO_BIN_EXE_tabula"))
        .arg("--config")
        .arg(&config)
        .args(args)
        .output()
        .expect("Failed to execute tabula");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}

#[test]
fn test_commands_print_markdown_table() {
    let (stdout, stderr, code) = run(&[
        "-c", "B1 = 1",
        "-c", "B2 = 2",
        "-c", "B3 = 3",
        "-c", "C1 = =SUM(B1..B3)",
    ]);
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.contains("|   | B | C |"), "{stdout}");
    assert!(stdout.contains("| 1 | 1 | 6 |"), "{stdout}");
}

#[test]
fn test_errors_are_listed_with_exit_code() {
    let (stdout, stderr, code) = run(&["-c", "A1 = =A1+1"]);
    assert_eq!(code, 1);
    assert!(stdout.contains("#ERR!"));
    assert!(stderr.contains("A1: Circular reference: A1 refers to itself"), "{stderr}");
}

#[test]
fn test_invalid_command_fails() {
    let (_, stderr, code) = run(&["-c", "frobnicate A1"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Invalid command 'frobnicate A1'"), "{stderr}");
    assert!(stderr.contains("Unknown command: frobnicate"), "{stderr}");
}

#[test]
fn test_save_and_reload_tbl() {
    let sheet = temp_path("sheet", "tbl");
    let _cleanup = Cleanup(vec![sheet.clone()]);
    let sheet_arg = sheet.to_str().unwrap();

    let (_, stderr, code) = run(&[sheet_arg, "--save", "-c", "A1 = 5", "-c", "A2 = =A1*2"]);
    assert_eq!(code, 0, "{stderr}");
    let saved = std::fs::read_to_string(&sheet).unwrap();
    assert!(saved.contains("A1: 5"));
    assert!(saved.contains("A2: =A1*2"));

    let (stdout, stderr, code) = run(&[sheet_arg, "-c", "A1 = 7"]);
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.contains("| 2 | 14 |"), "{stdout}");
}

#[test]
fn test_export_csv() {
    let out = temp_path("export", "csv");
    let _cleanup = Cleanup(vec![out.clone()]);

    let (stdout, stderr, code) = run(&[
        "-c", "A1 = 1",
        "-c", "B1 = =A1+1",
        "-c", "A2 = 'note",
        "-o", out.to_str().unwrap(),
    ]);
    assert_eq!(code, 0, "{stderr}");
    assert!(stdout.starts_with("Exported to"));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "1,=A1+1\n'note,\n");
}

#[test]
fn test_functions_listing() {
    let (stdout, _, code) = run(&["--functions"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("SUM"));
    assert!(stdout.contains("2 parameters or more"));
    assert!(stdout.contains("PI"));
}
