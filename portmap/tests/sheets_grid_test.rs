// Integration tests for `SheetsGrid` using wiremock.

use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use portmap::reconcile::{
    CellGrid, GridRange, ReconcileOptions, ServiceAccount, SheetsGrid, reconcile,
};
use portmap::{Error, Inventory};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup(title: Option<&str>) -> (MockServer, SheetsGrid) {
    let server = MockServer::start().await;
    let grid = SheetsGrid::new(
        reqwest::Client::new(),
        &server.uri(),
        "doc-1",
        title.map(str::to_string),
        SecretString::from("test-token".to_string()),
    )
    .unwrap();
    (server, grid)
}

const SERVICE_KEY: &str = include_str!("fixtures/service_account.pem");

async fn setup_service_account() -> (MockServer, SheetsGrid) {
    let server = MockServer::start().await;
    let account = ServiceAccount::new(
        "bot@project.iam.gserviceaccount.com",
        SecretString::from(SERVICE_KEY.to_string()),
    )
    .with_token_uri(format!("{}/token", server.uri()));
    let grid = SheetsGrid::new(reqwest::Client::new(), &server.uri(), "doc-1", None, account).unwrap();
    (server, grid)
}

fn sheet_body() -> serde_json::Value {
    json!({
        "range": "Sheet1!A1:M500",
        "majorDimension": "ROWS",
        "values": [
            ["Name", "ConnIP", "ConnPort", "PortAlias", "MAC", "TargetIP", "Speed"],
            ["pc-1", "10.0.0.1", "22", "eth-0-5"],
            [],
            ["pc-3", "10.0.0.1", 22, "eth-0-9", "", "", "1G"]
        ]
    })
}

fn range() -> GridRange {
    "A1:M500".parse().unwrap()
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_load_values() {
    let (server, mut grid) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/doc-1/values/A1:M500"))
        .and(query_param("valueRenderOption", "FORMATTED_VALUE"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet_body()))
        .expect(1)
        .mount(&server)
        .await;

    grid.load(range()).await.unwrap();

    assert_eq!(grid.get(0, 1), Some("ConnIP"));
    assert_eq!(grid.get(1, 3), Some("eth-0-5"));
    assert_eq!(grid.get(1, 4), Some(""));
    assert_eq!(grid.get(2, 0), Some(""));
    assert_eq!(grid.get(3, 2), Some("22"));
    assert_eq!(grid.get(500, 0), None);
}

#[tokio::test]
async fn test_load_empty_sheet() {
    let (server, mut grid) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/doc-1/values/A1:M500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "range": "A1:M500" })))
        .mount(&server)
        .await;

    grid.load(range()).await.unwrap();
    assert_eq!(grid.get(0, 0), Some(""));
}

#[tokio::test]
async fn test_batched_save() {
    let (server, mut grid) = setup(Some("Ports")).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/doc-1/values/'Ports'!A1:M500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet_body()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/doc-1/values:batchUpdate"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({
            "valueInputOption": "RAW",
            "data": [
                { "range": "'Ports'!E2", "values": [["aa:bb"]] },
                { "range": "'Ports'!F2", "values": [["10.0.0.9"]] }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "totalUpdatedCells": 2 })))
        .expect(1)
        .mount(&server)
        .await;

    grid.load(range()).await.unwrap();
    assert!(grid.set(1, 4, "aa:bb").unwrap());
    assert!(grid.set(1, 5, "10.0.0.9").unwrap());
    assert!(!grid.set(3, 6, "1G").unwrap());

    assert_eq!(grid.save().await.unwrap(), 2);
    assert_eq!(grid.get(1, 4), Some("aa:bb"));
}

#[tokio::test]
async fn test_save_without_changes_skips_request() {
    let (server, mut grid) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/doc-1/values/A1:M500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet_body()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    grid.load(range()).await.unwrap();
    assert_eq!(grid.save().await.unwrap(), 0);
}

#[tokio::test]
async fn test_error_status_propagates() {
    let (server, mut grid) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/doc-1/values/A1:M500"))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    let err = grid.load(range()).await.unwrap_err();
    match err {
        Error::Grid(portmap::error::GridError::Status { status, body }) => {
            assert_eq!(status, 403);
            assert_eq!(body, "PERMISSION_DENIED");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_reconcile_end_to_end() {
    let (server, mut grid) = setup(None).await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/doc-1/values/A1:M500"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet_body()))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/doc-1/values:batchUpdate"))
        .and(body_json(json!({
            "valueInputOption": "RAW",
            "data": [
                { "range": "E2", "values": [["aa:bb"]] },
                { "range": "F2", "values": [["10.0.0.9"]] },
                { "range": "G2", "values": [["1G"]] }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let inventory = Inventory::from_json(
        r#"{"aa:bb":{"SwitchIP":"10.0.0.1","SwitchPort":"22","LanPort":"eth-0-5","Speed":"1000","IP":"10.0.0.9"}}"#,
    )
    .unwrap();

    let summary = reconcile(&mut grid, range(), &inventory, ReconcileOptions::default())
        .await
        .unwrap();

    assert_eq!(summary.rows_matched(), 1);
    assert_eq!(summary.cells_written, 3);
}

#[tokio::test]
async fn test_service_account_token_exchange() {
    let (server, mut grid) = setup_service_account().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion=ey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "minted-token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/spreadsheets/doc-1/values/A1:M500"))
        .and(header("authorization", "Bearer minted-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet_body()))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/doc-1/values:batchUpdate"))
        .and(header("authorization", "Bearer minted-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    // one minted token serves every request until it nears expiry
    grid.load(range()).await.unwrap();
    grid.load(range()).await.unwrap();
    assert!(grid.set(1, 4, "aa:bb").unwrap());
    assert_eq!(grid.save().await.unwrap(), 1);
}

#[tokio::test]
async fn test_rejected_token_exchange_propagates() {
    let (server, mut grid) = setup_service_account().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sheet_body()))
        .expect(0)
        .mount(&server)
        .await;

    let err = grid.load(range()).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Grid(portmap::error::GridError::Status { status: 400, .. })
    ));
}
