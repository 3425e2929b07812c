//! CLI integration tests
//!
//! Tests for the sqlreport command-line interface.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const WEBSITE_ID: &str = "35abb2b7-3f97-42ce-931b-cf547d40d967";

const TEMPLATE: &str = "SELECT COUNT(*) FROM umami_views.event \
WHERE website_id = {{website_id}} [[ AND {{url_sti}} ]] [[ AND {{created_at}} ]] LIMIT {{limit}}";

fn sqlreport() -> Command {
    let mut cmd = Command::cargo_bin("sqlreport").unwrap();
    cmd.env_remove("SQLREPORT_PROJECT").env_remove("RUST_LOG");
    cmd
}

fn write_template(temp: &TempDir, contents: &str) -> std::path::PathBuf {
    let path = temp.path().join("report.sql");
    fs::write(&path, contents).unwrap();
    path
}

mod render_command {
    use super::*;

    #[test]
    fn render_with_flags() {
        let temp = TempDir::new().unwrap();
        let file = write_template(&temp, TEMPLATE);

        sqlreport()
            .arg("render")
            .arg(&file)
            .args(["--website-id", WEBSITE_ID])
            .args(["--url-path", "/soknad", "--path-operator", "starts-with"])
            .args(["--from", "2024-01-01", "--to", "2024-01-31"])
            .args(["--var", "limit=10"])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("website_id = '{}'", WEBSITE_ID)))
            .stdout(predicate::str::contains("AND url_path LIKE '/soknad%'"))
            .stdout(predicate::str::contains(
                "AND `umami_views.event`.created_at BETWEEN TIMESTAMP('2024-01-01') AND TIMESTAMP('2024-01-31T23:59:59')",
            ))
            .stdout(predicate::str::ends_with("LIMIT 10"));
    }

    #[test]
    fn render_from_stdin() {
        sqlreport()
            .args(["render", "-", "--var", "limit=ten"])
            .write_stdin("SELECT 1 LIMIT {{limit}}")
            .assert()
            .success()
            .stdout("SELECT 1 LIMIT 'ten'");
    }

    #[test]
    fn project_from_environment() {
        sqlreport()
            .env("SQLREPORT_PROJECT", "team-analytics")
            .args(["render", "-", "--today", "2024-03-15"])
            .write_stdin("[[ AND {{created_at}} ]]")
            .assert()
            .success()
            .stdout(
                "AND `team-analytics.umami_views.event`.created_at BETWEEN TIMESTAMP('2024-02-14') AND TIMESTAMP('2024-03-15T23:59:59')",
            );
    }

    #[test]
    fn explicit_table() {
        sqlreport()
            .args(["render", "-", "--table", "session", "--from", "2024-01-01", "--to", "2024-01-02"])
            .write_stdin("[[ AND {{created_at}} ]]")
            .assert()
            .success()
            .stdout(predicate::str::contains("`umami_views.session`.created_at"));
    }

    #[test]
    fn params_file_with_flag_override() {
        let temp = TempDir::new().unwrap();
        let file = write_template(&temp, "LIMIT {{limit}} OFFSET {{offset}} -- {{website_id}}");
        let params = temp.path().join("params.json");
        fs::write(
            &params,
            format!(
                r#"{{"website_id": "{}", "variables": {{"limit": "10", "offset": "5"}}}}"#,
                WEBSITE_ID
            ),
        )
        .unwrap();

        sqlreport()
            .arg("render")
            .arg(&file)
            .arg("--params")
            .arg(&params)
            .args(["--var", "limit=20"])
            .assert()
            .success()
            .stdout(format!("LIMIT 20 OFFSET 5 -- '{}'", WEBSITE_ID));
    }

    #[test]
    fn unresolved_placeholders_are_reported() {
        sqlreport()
            .args(["render", "-"])
            .write_stdin("WHERE website_id = {{website_id}}")
            .assert()
            .success()
            .stdout("WHERE website_id = {{website_id}}")
            .stderr(predicate::str::contains("unresolved website id {{website_id}}"));
    }

    #[test]
    fn strict_fails_on_unresolved() {
        sqlreport()
            .args(["render", "-", "--strict"])
            .write_stdin("LIMIT {{limit}}")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unresolved custom variable {{limit}}"));
    }

    #[test]
    fn strict_passes_when_complete() {
        sqlreport()
            .args(["render", "-", "--strict", "--var", "limit=1"])
            .write_stdin("LIMIT {{limit}}")
            .assert()
            .success();
    }
}

mod bad_input {
    use super::*;

    #[test]
    fn variable_without_value() {
        sqlreport()
            .args(["render", "-", "--var", "limit"])
            .write_stdin("LIMIT {{limit}}")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid variable 'limit'"));
    }

    #[test]
    fn invalid_date() {
        sqlreport()
            .args(["render", "-", "--from", "01.01.2024"])
            .write_stdin("SELECT 1")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid date '01.01.2024'"));
    }

    #[test]
    fn unknown_path_operator() {
        sqlreport()
            .args(["render", "-", "--path-operator", "contains"])
            .write_stdin("SELECT 1")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Unknown path operator 'contains'"));
    }

    #[test]
    fn missing_file() {
        sqlreport()
            .args(["detect", "/nonexistent/report.sql"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("IO error"));
    }

    #[test]
    fn malformed_params_file() {
        let temp = TempDir::new().unwrap();
        let params = temp.path().join("params.json");
        fs::write(&params, "{ not json").unwrap();

        sqlreport()
            .args(["render", "-", "--params"])
            .arg(&params)
            .write_stdin("SELECT 1")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("JSON error"));
    }
}

mod inspect_commands {
    use super::*;

    #[test]
    fn detect_prints_flags() {
        let temp = TempDir::new().unwrap();
        let file = write_template(&temp, TEMPLATE);

        sqlreport()
            .arg("detect")
            .arg(&file)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"has_date_filter\": true"))
            .stdout(predicate::str::contains("\"has_url_path_filter\": true"))
            .stdout(predicate::str::contains("\"has_site_domain_placeholder\": false"))
            .stdout(predicate::str::contains("\"limit\""));
    }

    #[test]
    fn extract_prints_filters() {
        sqlreport()
            .args(["extract", "-"])
            .write_stdin(format!(
                "SELECT 1 FROM t WHERE website_id = '{}' AND url_path = '/soknad'",
                WEBSITE_ID
            ))
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("\"website_id\": \"{}\"", WEBSITE_ID)))
            .stdout(predicate::str::contains("\"url_path\": \"/soknad\""))
            .stdout(predicate::str::contains("\"date_range\": null"));
    }

    #[test]
    fn verbose_logs_go_to_stderr() {
        sqlreport()
            .args(["--verbose", "render", "-", "--var", "n=1"])
            .write_stdin("SELECT {{n}}")
            .assert()
            .success()
            .stdout("SELECT 1")
            .stderr(predicate::str::contains("applied rewrite pass"));
    }
}

mod link_commands {
    use super::*;

    #[test]
    fn link_with_base() {
        sqlreport()
            .args(["link", "-", "--base", "https://dashboard.example/sql", "--url-path", "/a"])
            .write_stdin("SELECT 1")
            .assert()
            .success()
            .stdout("https://dashboard.example/sql?sql=SELECT+1&urlPath=%2Fa\n");
    }

    #[test]
    fn link_carries_domain_table_and_project() {
        sqlreport()
            .args(["link", "-", "--site-domain", "www.nav.no", "--table", "session"])
            .args(["--project", "team-analytics"])
            .write_stdin("SELECT 1")
            .assert()
            .success()
            .stdout("sql=SELECT+1&siteDomain=www.nav.no&table=session&project=team-analytics\n");
    }

    #[test]
    fn from_help_names_today_as_anchor() {
        sqlreport()
            .args(["render", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("defaults to 30 days before today"));
    }

    #[test]
    fn decode_link() {
        sqlreport()
            .args([
                "decode",
                "https://dashboard.example/sql?sql=SELECT%2520%257B%257Blimit%257D%257D&var_limit=5",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"sql\": \"SELECT {{limit}}\""))
            .stdout(predicate::str::contains("\"limit\": \"5\""));
    }

    #[test]
    fn decode_bare_sql_value() {
        sqlreport()
            .args(["decode", "SELECT%2520*%2520FROM%2520t"])
            .assert()
            .success()
            .stdout("SELECT * FROM t\n");
    }
}
