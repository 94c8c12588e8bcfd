use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

fn script(home: &std::path::Path, input: &str) -> assert_cmd::assert::Assert {
    Command::cargo_bin("driver_ledger_cli")
        .unwrap()
        .env("DRIVER_LEDGER_CLI_SCRIPT", "1")
        .env("DRIVER_LEDGER_HOME", home)
        .env_remove("RUST_LOG")
        .write_stdin(input.to_string())
        .assert()
}

#[test]
fn script_mode_records_a_shift() {
    let home = tempdir().unwrap();
    let input = "\
# a rented car paid weekly
vehicle add \"Onix 1.0\" ABC1D23 rented rent=550 cycle=weekly due=1
tx add income uber 320,50
tx add expense fuel 120 fuel=ethanol price=4
dashboard
exit
";
    script(home.path(), input)
        .success()
        .stdout(contains("Vehicle ABC1D23 added"))
        .stdout(contains("Recorded income"))
        .stdout(contains("Real profit"));

    let transactions = std::fs::read_to_string(home.path().join("data").join("transactions.json"))
        .unwrap();
    assert!(transactions.contains("UBER"));
}

#[test]
fn help_lists_commands_and_unknown_input_is_survivable() {
    let home = tempdir().unwrap();
    script(home.path(), "vehicel\nhelp\n")
        .success()
        .stdout(contains("Unknown command `vehicel`"))
        .stdout(contains("Suggestion: `vehicle`?"))
        .stdout(contains("dashboard"));
}

#[test]
fn data_survives_between_runs() {
    let home = tempdir().unwrap();
    script(home.path(), "vehicle add Kwid XYZ9876 owned value=38000\n").success();
    script(home.path(), "vehicle list\n")
        .success()
        .stdout(contains("XYZ9876"))
        .stdout(contains("Kwid"));
}
