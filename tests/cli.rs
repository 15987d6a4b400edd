use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const NORDEA: &str = "Bogført;Tekst;Rentedato;Beløb;Saldo\n01-01-2023;Groceries;01-01-2023;-50,00;100,00\n02-01-2023;Salary;02-01-2023;1.200,00;1300,00\n";

/// A command with HOME pointed at an empty directory so no user config leaks in.
fn csv2ynab(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("csv2ynab").unwrap();
    cmd.env("HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_csv_string_printed() {
    let home = TempDir::new().unwrap();
    csv2ynab(&home)
        .args(["-c", NORDEA, "-n"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Date;Payee;Category;Memo;Outflow;Inflow\n01/01/2023;;;Groceries;50;\n02/01/2023;;;Salary;;1.2",
        ));
}

#[test]
fn test_cutoff_and_date_format() {
    let home = TempDir::new().unwrap();
    csv2ynab(&home)
        .args(["-c", NORDEA, "-n", "-f", "YYYY-MM-DD", "-l", "2023-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2023-01-01;;;Groceries;50;"))
        .stdout(predicate::str::contains("Salary").not());
}

#[test]
fn test_payee_matched_from_memo() {
    let home = TempDir::new().unwrap();
    csv2ynab(&home)
        .args(["-c", NORDEA, "-n", "-p", "grocer,salary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("01/01/2023;grocer;;Groceries;50;"));
}

#[test]
fn test_header_only_fails() {
    let home = TempDir::new().unwrap();
    csv2ynab(&home)
        .args(["-c", "Bogført;Tekst;Rentedato;Beløb;Saldo", "-n"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("CSV file only contains the header row"));
}

#[test]
fn test_unknown_header_lists_sources() {
    let home = TempDir::new().unwrap();
    csv2ynab(&home)
        .args(["-c", "Date;Amount\n2023-01-01;5", "-n"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "No matching source found. List of valid sources: [nordea,be_kbc,be_kbc_creditcard]",
        ));
}

#[test]
fn test_invalid_date_format() {
    let home = TempDir::new().unwrap();
    csv2ynab(&home)
        .args(["-c", NORDEA, "-n", "-f", "YYYY/DD/MM"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Date format YYYY/DD/MM is not valid"));
}

#[test]
fn test_directory_writes_one_file_per_input() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("jan.csv"), NORDEA).unwrap();
    std::fs::write(dir.path().join("feb.csv"), NORDEA).unwrap();

    csv2ynab(&home)
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("written successfully!"));

    let jan = std::fs::read_to_string(dir.path().join("ynab_jan.csv")).unwrap();
    assert!(jan.starts_with("Date;Payee;Category;Memo;Outflow;Inflow\n"));
    assert!(dir.path().join("ynab_feb.csv").exists());
}

#[test]
fn test_empty_directory_fails() {
    let home = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    csv2ynab(&home)
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("No CSV files found"));
}

#[test]
fn test_custom_source_from_home() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("to-ynab-sources.json"),
        r#"{"my_bank": {"headers": ["When", "What", "Amount"],
            "map": {"date": 0, "memo": 1, "outflow": 2, "inflow": 2},
            "dateformat": "YYYY-MM-DD", "delimitor": ","}}"#,
    )
    .unwrap();
    let data = "When,What,Amount\n2023-05-01,Coffee,-3.5";

    csv2ynab(&home)
        .args(["-c", data, "-n", "-s", "my_bank"])
        .assert()
        .success()
        .stdout(predicate::str::contains("01/05/2023;;;Coffee;3.5;"));

    csv2ynab(&home)
        .args(["-c", data, "-n", "-s", "my_bank", "--ignore-custom-sources"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Source my_bank is not valid"));
}

#[test]
fn test_sources_subcommand() {
    let home = TempDir::new().unwrap();
    csv2ynab(&home)
        .arg("sources")
        .assert()
        .success()
        .stdout(predicate::str::contains("be_kbc_creditcard"))
        .stdout(predicate::str::contains("DD-MM-YYYY"));
}
