use super::*;

#[test]
fn classify_status_ok() {
    assert_eq!(classify_status(StatusCode::OK), StatusClass::Ok);
}

#[test]
fn classify_status_401_and_403_are_auth_failures() {
    assert_eq!(classify_status(StatusCode::UNAUTHORIZED), StatusClass::Auth);
    assert_eq!(classify_status(StatusCode::FORBIDDEN), StatusClass::Auth);
}

#[test]
fn classify_status_everything_else_is_other() {
    for code in [201_u16, 204, 301, 302, 400, 404, 407, 429, 500, 502, 503] {
        let status = StatusCode::from_u16(code).unwrap();
        assert_eq!(classify_status(status), StatusClass::Other, "status {code}");
    }
}

#[test]
fn fetcher_builds_with_custom_identity() {
    let fetcher = PageFetcher::new(5, "pulse-test/0.1", "pl,en;q=0.7", CountExtractor::default());
    assert!(fetcher.is_ok());
}
