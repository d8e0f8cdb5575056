use crate::{deploy_hook, site_builder, stdout, updating_git};
use integration_tests::Site;

#[test]
fn should_deploy_without_request_from_command_line() {
    let git = updating_git();
    let build = site_builder();
    let site = Site::new().with_config(&git, &build, "secret = \"s3cret\"");

    let stdout = stdout(deploy_hook(&site).arg("deploy").assert().success());

    assert!(stdout.starts_with("Pulling latest changes...\n"));
    assert!(stdout.ends_with("Deployment successful.\n"));
    assert!(!stdout.contains("Content-Type"));
    build.assert_invocations(&["build"]);
    assert!(site.web_root_files().contains_key("index.html"));
}

#[test]
fn should_exit_with_failure_when_manual_deployment_fails() {
    let git = updating_git();
    let build = site_builder().with_exit_status("build", 1);
    let site = Site::new().with_config(&git, &build, "secret = \"s3cret\"");

    let stdout = stdout(deploy_hook(&site).arg("deploy").assert().failure());

    assert!(stdout.ends_with("Deployment failed: build exited with error status 1\n"));
}

#[test]
fn should_print_index_table_without_config_file() {
    let site = Site::new()
        .with_repository_file("documents/Budget_2023.pdf", "")
        .with_repository_file("documents/Minutes01_02_23.doc", "")
        .with_repository_file("documents/Minutes15_06_23.doc", "");

    deploy_hook(&site)
        .arg("index")
        .arg(site.repository().join("documents"))
        .assert()
        .success()
        .stdout(
            "| Day | What | Format | Link |\n\
             |---|---|---|---|\n\
             |  | Budget 2023 | pdf | [Budget_2023.pdf](Budget_2023.pdf) |\n\
             | 2023-06-15 | Minutes | doc | [Minutes15_06_23.doc](Minutes15_06_23.doc) |\n\
             | 2023-02-01 | Minutes | doc | [Minutes01_02_23.doc](Minutes01_02_23.doc) |\n",
        );
}

#[test]
fn should_print_index_page_with_configured_labels() {
    let git = updating_git();
    let build = site_builder();
    let site = Site::new()
        .with_repository_file("documents/Statutes.pdf", "")
        .with_config(
            &git,
            &build,
            "secret = \"s3cret\"\n\
             [index]\n\
             title = \"Archive\"\n\
             [index.labels]\n\
             date = \"Datum\"\n\
             title = \"Was\"\n\
             format = \"Typ\"\n\
             link = \"Datei\"",
        );

    deploy_hook(&site)
        .arg("index")
        .arg("--page")
        .arg(site.repository().join("documents"))
        .assert()
        .success()
        .stdout(
            "---\n\
             layout: \"page\"\n\
             title: \"Archive\"\n\
             ---\n\
             \n\
             | Datum | Was | Typ | Datei |\n\
             |---|---|---|---|\n\
             |  | Statutes | pdf | [Statutes.pdf](Statutes.pdf) |\n",
        );
}

#[test]
fn should_fail_to_index_missing_directory() {
    let site = Site::new();

    deploy_hook(&site)
        .arg("index")
        .arg(site.repository().join("does-not-exist"))
        .assert()
        .failure();
}
