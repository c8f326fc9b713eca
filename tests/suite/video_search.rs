use api_smoke::{runner::Status, suites::video_search::check_name};

use super::support::{StubBackend, StubOptions, VIDEO_API_KEY, run_suite, video_config};

#[tokio::test]
async fn known_query_returns_a_video_id() {
    let stub = StubBackend::spawn(StubOptions::default()).await;
    let config = video_config(&stub, VIDEO_API_KEY, "React Tutorial");

    let (summary, report) = run_suite(&config).await;

    assert_eq!(summary.total(), 1);
    let result = &summary.results[0];
    assert_eq!(result.name, check_name("React Tutorial"));
    assert_eq!(result.status, Status::Pass);
    assert_eq!(result.details, "Video ID: abc123");
    assert_eq!(summary.exit_code(), 0);
    assert!(report.contains("VIDEO SEARCH API TEST"));
    assert!(report.contains("PASS: Video Search (React Tutorial)\n"));
}

#[tokio::test]
async fn rejected_key_reports_status_and_body() {
    let stub = StubBackend::spawn(StubOptions::default()).await;
    let config = video_config(&stub, "not-the-key", "React Tutorial");

    let (summary, _) = run_suite(&config).await;

    let result = &summary.results[0];
    assert_eq!(result.status, Status::Fail);
    assert!(result.details.starts_with("HTTP 400"), "details: {}", result.details);
    assert!(result.details.contains("API key not valid"));
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn empty_result_set_fails() {
    let stub = StubBackend::spawn(StubOptions::default()).await;
    let config = video_config(&stub, VIDEO_API_KEY, "nothing matches this");

    let (summary, _) = run_suite(&config).await;

    assert_eq!(summary.results[0].status, Status::Fail);
    assert_eq!(summary.results[0].details, "No items found");
}
