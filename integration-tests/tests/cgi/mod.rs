use crate::{new_workdir, request, site_builder, stdout, updating_git};
use integration_tests::{Site, Workdir};
use maplit::btreemap;

const SECRET: &str = "secret = \"s3cret\"";

fn deployed_site(git: &Workdir, build: &Workdir, extra: &str) -> Site {
    Site::new()
        .with_repository_file("documents/Statutes.pdf", "%PDF")
        .with_repository_file("documents/minutes/Board_meeting12_03_24.docx", "docx")
        .with_repository_file("documents/notes.txt", "not a document")
        .with_web_root_file("old.html", "<h1>old</h1>")
        .with_web_root_file(".htaccess", "Options -Indexes")
        .with_config(git, build, &format!("{}\n{}", SECRET, extra))
}

#[test]
fn should_reject_request_without_secret() {
    let git = updating_git();
    let build = site_builder();
    let site = deployed_site(&git, &build, "");

    request(&site, "POST", None)
        .assert()
        .failure()
        .stdout(
            "Status: 401 Unauthorized\n\
             Content-Type: text/plain; charset=utf-8\n\
             \n\
             Unauthorized: invalid secret.\n",
        );

    git.assert_invocations(&[]);
    build.assert_invocations(&[]);
    assert!(site.web_root_files().contains_key("old.html"));
}

#[test]
fn should_reject_request_with_wrong_secret() {
    let git = updating_git();
    let build = site_builder();
    let site = deployed_site(&git, &build, "");

    let stdout = stdout(request(&site, "POST", Some("guess")).assert().failure());

    assert!(stdout.starts_with("Status: 401 Unauthorized\n"));

    git.assert_invocations(&[]);
}

#[test]
fn should_reject_get_request_even_with_valid_secret() {
    let git = updating_git();
    let build = site_builder();
    let site = deployed_site(&git, &build, "");

    let stdout = stdout(request(&site, "GET", Some("s3cret")).assert().failure());

    assert!(stdout.starts_with("Status: 405 Method Not Allowed\n"));

    git.assert_invocations(&[]);
}

#[test]
fn should_refuse_requests_when_secret_is_unavailable() {
    let git = updating_git();
    let build = site_builder();
    let site = Site::new().with_config(
        &git,
        &build,
        "[secret]\nenv-var = \"DEPLOY_HOOK_TEST_SECRET_THAT_IS_NOT_SET\"",
    );

    let stdout = stdout(request(&site, "POST", Some("")).assert().failure());

    assert!(stdout.starts_with("Status: 500 Internal Server Error\n"));

    git.assert_invocations(&[]);
}

#[test]
fn should_answer_500_for_missing_config_file() {
    let site = Site::new();

    let stdout = stdout(request(&site, "POST", Some("s3cret")).assert().failure());

    assert_eq!(
        stdout,
        "Status: 500 Internal Server Error\n\
         Content-Type: text/plain; charset=utf-8\n\
         \n\
         Server misconfigured.\n"
    );
}

#[test]
fn should_do_nothing_when_already_up_to_date() {
    let git = new_workdir().with_stdout("pull", "Already up to date.\n");
    let build = site_builder();
    let site = deployed_site(&git, &build, "");

    request(&site, "POST", Some("s3cret"))
        .assert()
        .success()
        .stdout(
            "Content-Type: text/plain; charset=utf-8\n\
             \n\
             Pulling latest changes...\n\
             No changes to deploy.\n",
        );

    git.assert_invocations(&["pull"]);
    build.assert_invocations(&[]);
    assert_eq!(
        site.web_root_files(),
        btreemap! {
            ".htaccess".to_owned() => "Options -Indexes".to_owned(),
            "old.html".to_owned() => "<h1>old</h1>".to_owned(),
        }
    );
}

#[test]
fn should_deploy_site() {
    let git = updating_git();
    let build = site_builder().with_output_file("build", "_site/css/site.css", "body {}");
    let site = deployed_site(&git, &build, "[index]\nlink-prefix = \"documents/\"");

    let stdout = stdout(request(&site, "POST", Some("s3cret")).assert().success());

    assert!(stdout.starts_with(
        "Content-Type: text/plain; charset=utf-8\n\
         \n\
         Pulling latest changes...\n\
         Indexed 2 documents.\n\
         Building site: "
    ));
    assert!(stdout.ends_with(
        "Cleaning web root...\n\
         Copying site...\n\
         Published 2 files.\n\
         Deployment successful.\n"
    ));

    git.assert_invocations(&["pull"]);
    build.assert_invocations(&["build"]);
    assert_eq!(
        site.repository_file("documents.md"),
        "---\n\
         layout: \"page\"\n\
         title: \"Documents\"\n\
         ---\n\
         \n\
         | Day | What | Format | Link |\n\
         |---|---|---|---|\n\
         |  | Statutes | pdf | [Statutes.pdf](documents/Statutes.pdf) |\n\
         | 2024-03-12 | Board meeting | docx | [Board_meeting12_03_24.docx](documents/minutes/Board_meeting12_03_24.docx) |\n"
    );
    assert_eq!(
        site.web_root_files(),
        btreemap! {
            "css/site.css".to_owned() => "body {}".to_owned(),
            "index.html".to_owned() => "<h1>new</h1>".to_owned(),
        }
    );
}

#[test]
fn should_produce_same_web_root_when_deploying_twice() {
    let git = updating_git();
    let build = site_builder();
    let site = deployed_site(&git, &build, "[index]");

    request(&site, "POST", Some("s3cret")).assert().success();
    let first = site.web_root_files();
    let first_index = site.repository_file("documents.md");
    request(&site, "POST", Some("s3cret")).assert().success();

    assert_eq!(site.web_root_files(), first);
    assert_eq!(site.repository_file("documents.md"), first_index);
    git.assert_invocations(&["pull", "pull"]);
}

#[test]
fn should_report_build_failure_and_keep_web_root() {
    let git = updating_git();
    let build = site_builder()
        .with_exit_status("build", 1)
        .with_stderr("build", "Liquid Exception: undefined filter\n");
    let site = deployed_site(&git, &build, "");

    let stdout = stdout(request(&site, "POST", Some("s3cret")).assert().failure());

    assert!(stdout.starts_with("Status: 500 Internal Server Error\n"));
    assert!(stdout.ends_with(
        "Deployment failed: build exited with error status 1\n\
         Liquid Exception: undefined filter\n"
    ));

    assert_eq!(
        site.web_root_files(),
        btreemap! {
            ".htaccess".to_owned() => "Options -Indexes".to_owned(),
            "old.html".to_owned() => "<h1>old</h1>".to_owned(),
        }
    );
}

#[test]
fn should_abort_before_build_when_document_directory_is_missing() {
    let git = updating_git();
    let build = site_builder();
    let site = Site::new()
        .with_web_root_file("old.html", "<h1>old</h1>")
        .with_config(&git, &build, &format!("{}\n[index]", SECRET));

    let stdout = stdout(request(&site, "POST", Some("s3cret")).assert().failure());

    assert!(stdout.starts_with("Status: 500 Internal Server Error\n"));
    assert!(stdout.contains("Deployment failed: index generation failed: can't read document directory "));
    build.assert_invocations(&[]);
    assert_eq!(
        site.web_root_files(),
        btreemap! { "old.html".to_owned() => "<h1>old</h1>".to_owned() }
    );
}

#[test]
fn should_report_pull_failure_without_building() {
    let git = new_workdir()
        .with_exit_status("pull", 128)
        .with_stderr("pull", "fatal: not a git repository\n");
    let build = site_builder();
    let site = deployed_site(&git, &build, "");

    let stdout = stdout(request(&site, "POST", Some("s3cret")).assert().failure());

    assert!(stdout.ends_with(
        "Deployment failed: git pull exited with error status 128\n\
         fatal: not a git repository\n"
    ));

    build.assert_invocations(&[]);
}

#[test]
fn should_notify_commit_author() {
    let git = updating_git();
    let build = site_builder();
    let mail = new_workdir();
    let site = deployed_site(
        &git,
        &build,
        &format!(
            "[notify]\nsender = \"deploy@example.org\"\nsendmail-binary = {:?}",
            mail.test_binary().display().to_string()
        ),
    );

    let stdout = stdout(request(&site, "POST", Some("s3cret")).assert().success());

    assert!(stdout.ends_with("Notified jane@example.org.\nDeployment successful.\n"));

    git.assert_invocations(&["pull", "log -1 --format=%ae%n%s"]);
    mail.assert_invocations(&["-i -f deploy@example.org -- jane@example.org"]);
    let message = mail.stdin();
    assert!(message.contains("To: jane@example.org\n"));
    assert!(message.contains("Subject: Deployed: Add minutes\n"));
}

#[test]
fn should_notify_author_about_failed_deployment() {
    let git = updating_git();
    let build = site_builder().with_exit_status("build", 2);
    let mail = new_workdir();
    let site = deployed_site(
        &git,
        &build,
        &format!(
            "[notify]\nsender = \"deploy@example.org\"\nsendmail-binary = {:?}",
            mail.test_binary().display().to_string()
        ),
    );

    request(&site, "POST", Some("s3cret")).assert().failure();

    assert!(mail
        .stdin()
        .contains("Subject: Deployment failed: Add minutes\n"));
}

#[test]
fn should_deploy_even_if_notification_fails() {
    let git = updating_git();
    let build = site_builder();
    let mail = new_workdir()
        .with_exit_status("-i", 75)
        .with_stderr("-i", "queue unavailable\n");
    let site = deployed_site(
        &git,
        &build,
        &format!(
            "[notify]\nsender = \"deploy@example.org\"\nsendmail-binary = {:?}",
            mail.test_binary().display().to_string()
        ),
    );

    let stdout = stdout(request(&site, "POST", Some("s3cret")).assert().success());

    assert!(stdout.ends_with(
        "Warning: failed to notify author: mail submission exited with error status 75: queue unavailable\n\
         Deployment successful.\n"
    ));

    assert_eq!(
        site.web_root_files(),
        btreemap! { "index.html".to_owned() => "<h1>new</h1>".to_owned() }
    );
}
