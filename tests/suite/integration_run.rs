use std::time::Duration;

use api_smoke::{
    runner::Status,
    suites::integration::{
        AUTHENTICATED_UPLOAD, LISTING, LIVENESS, LOGIN, PROFILE, UNAUTHENTICATED_UPLOAD,
    },
};
use tempfile::tempdir;

use super::support::{
    StubBackend, StubOptions, integration_config, integration_config_with, leftover_files,
    run_suite, unreachable_base_url,
};

const CHECK_ORDER: [&str; 6] = [
    LIVENESS,
    LOGIN,
    AUTHENTICATED_UPLOAD,
    PROFILE,
    LISTING,
    UNAUTHENTICATED_UPLOAD,
];

#[tokio::test]
async fn healthy_backend_passes_every_check() {
    let stub = StubBackend::spawn(StubOptions::default()).await;
    let fixtures = tempdir().expect("fixture dir");
    let config = integration_config(&stub.base_url(), fixtures.path());

    let (summary, report) = run_suite(&config).await;

    let names: Vec<_> = summary.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, CHECK_ORDER);
    assert!(
        summary.results.iter().all(|r| r.passed()),
        "unexpected failures: {:?}",
        summary.failures().collect::<Vec<_>>()
    );
    assert_eq!(summary.exit_code(), 0);

    let details: Vec<_> = summary.results.iter().map(|r| r.details.as_str()).collect();
    assert_eq!(
        details,
        [
            "ok",
            "Token received: true",
            "Resume uploaded successfully",
            "User: testuser",
            "Count: 2",
            "Correctly rejected unauthorized request",
        ]
    );

    assert!(report.starts_with(&format!("{}\nCOMPREHENSIVE INTEGRATION TEST\n", "=".repeat(60))));
    assert!(report.contains("PASS: Backend Server Running\n  Details: ok\n"));
    assert!(report.contains("Passed: 6/6\n"));
    assert!(report.contains("Failed: 0/6\n"));
    assert!(!report.contains("Failed Tests:"));
}

#[tokio::test]
async fn uploads_send_a_pdf_under_the_resume_field() {
    let stub = StubBackend::spawn(StubOptions::default()).await;
    let fixtures = tempdir().expect("fixture dir");
    run_suite(&integration_config(&stub.base_url(), fixtures.path())).await;

    let uploads = stub.uploads();
    assert_eq!(uploads.len(), 2);
    assert!(uploads[0].authorized, "first upload carries the bearer token");
    assert!(!uploads[1].authorized, "second upload is anonymous");
    for upload in &uploads {
        assert_eq!(upload.field, "resume");
        assert_eq!(upload.content_type.as_deref(), Some("application/pdf"));
        assert!(
            upload
                .file_name
                .as_deref()
                .is_some_and(|name| name.ends_with(".pdf"))
        );
        assert!(upload.bytes.starts_with(b"%PDF-1.4"));
    }
}

#[tokio::test]
async fn staged_fixtures_are_removed_after_the_run() {
    let stub = StubBackend::spawn(StubOptions::default()).await;
    let fixtures = tempdir().expect("fixture dir");
    run_suite(&integration_config(&stub.base_url(), fixtures.path())).await;

    assert!(leftover_files(fixtures.path()).expect("list fixtures").is_empty());
}

#[tokio::test]
async fn failed_login_fails_token_dependent_checks() {
    let stub = StubBackend::spawn(StubOptions::default()).await;
    let fixtures = tempdir().expect("fixture dir");
    let config = integration_config_with(
        &stub.base_url(),
        fixtures.path(),
        "wrong-password",
        Duration::from_secs(5),
    );

    let (summary, report) = run_suite(&config).await;

    assert_eq!(summary.total(), 6, "every check leaves a result entry");
    assert_eq!(
        summary.statuses(),
        [
            Status::Pass,
            Status::Fail,
            Status::Fail,
            Status::Fail,
            Status::Pass,
            Status::Pass,
        ]
    );
    assert_eq!(summary.results[1].details, "Token received: false");
    for dependent in &summary.results[2..4] {
        assert!(
            dependent.details.contains("no access token"),
            "{} details: {}",
            dependent.name,
            dependent.details
        );
    }
    assert_eq!(summary.exit_code(), 1);

    // only the anonymous upload reached the backend
    assert_eq!(stub.uploads().len(), 1);
    assert!(report.contains("Failed: 3/6\n"));
    assert!(report.contains(&format!("  - {PROFILE}: ")));
}

#[tokio::test]
async fn accepting_anonymous_uploads_fails_the_security_check() {
    let stub = StubBackend::spawn(StubOptions {
        uploads_require_auth: false,
        ..StubOptions::default()
    })
    .await;
    let fixtures = tempdir().expect("fixture dir");

    let (summary, _) = run_suite(&integration_config(&stub.base_url(), fixtures.path())).await;

    let security = summary.results.last().expect("security check result");
    assert_eq!(security.name, UNAUTHENTICATED_UPLOAD);
    assert_eq!(security.status, Status::Fail);
    assert!(security.details.contains("201"), "details: {}", security.details);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn malformed_health_body_fails_only_liveness() {
    let stub = StubBackend::spawn(StubOptions {
        malformed_health: true,
        ..StubOptions::default()
    })
    .await;
    let fixtures = tempdir().expect("fixture dir");

    let (summary, _) = run_suite(&integration_config(&stub.base_url(), fixtures.path())).await;

    let liveness = &summary.results[0];
    assert_eq!(liveness.status, Status::Fail);
    assert!(liveness.details.contains("malformed JSON"), "details: {}", liveness.details);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.passed, 5);
}

#[tokio::test]
async fn unreachable_backend_fails_every_check_and_still_summarizes() {
    let fixtures = tempdir().expect("fixture dir");
    let config = integration_config(&unreachable_base_url(), fixtures.path());

    let (summary, report) = run_suite(&config).await;

    assert_eq!(summary.total(), 6);
    assert_eq!(summary.failed, 6);
    assert_eq!(summary.exit_code(), 1);

    let liveness = &summary.results[0];
    assert!(liveness.details.contains("/api/hello/"), "details: {}", liveness.details);
    assert!(
        liveness.details.to_lowercase().contains("connect"),
        "details should carry the transport error: {}",
        liveness.details
    );

    assert!(report.contains("Passed: 0/6\n"));
    assert!(report.contains("Failed: 6/6\n"));
    assert!(report.contains("Failed Tests:\n"));
    assert!(leftover_files(fixtures.path()).expect("list fixtures").is_empty());
}

#[tokio::test]
async fn slow_endpoint_times_out_without_aborting_the_run() {
    let stub = StubBackend::spawn(StubOptions {
        listing_delay: Some(Duration::from_secs(3)),
        ..StubOptions::default()
    })
    .await;
    let fixtures = tempdir().expect("fixture dir");
    let config = integration_config_with(
        &stub.base_url(),
        fixtures.path(),
        super::support::PASSWORD,
        Duration::from_millis(500),
    );

    let (summary, _) = run_suite(&config).await;

    let listing = &summary.results[4];
    assert_eq!(listing.name, LISTING);
    assert_eq!(listing.status, Status::Fail);
    assert!(listing.details.contains("timed out"), "details: {}", listing.details);

    let security = &summary.results[5];
    assert_eq!(security.status, Status::Pass, "run continues after a timeout");
}

#[tokio::test]
async fn repeated_runs_produce_the_same_verdicts() {
    let stub = StubBackend::spawn(StubOptions {
        uploads_require_auth: false,
        ..StubOptions::default()
    })
    .await;
    let fixtures = tempdir().expect("fixture dir");
    let config = integration_config(&stub.base_url(), fixtures.path());

    let (first, _) = run_suite(&config).await;
    let (second, _) = run_suite(&config).await;

    assert_eq!(first.statuses(), second.statuses());
}
