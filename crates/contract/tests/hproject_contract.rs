//! HProject suite against the in-memory stub.
//!
//! The stub answers in the platform's shapes, so every case must pass; the
//! remaining tests check that deviations are caught.

mod common;

use hyperiot_contract::{
    CaseOutcome, ContractError, HttpRequestBuilder, Mismatch, ResponseValidator, hproject,
    properties,
};
use hyperiot_stub::StoreTable;

#[tokio::test]
async fn test_hproject_suite_passes_against_stub() {
    let harness = common::start().await;

    let report = hproject::suite().run(&harness.client, &harness.cleanup).await;

    assert!(report.all_passed(), "{}", report);
    assert_eq!(report.passed_count(), 10);
}

#[tokio::test]
async fn test_every_case_leaves_tables_empty() {
    let harness = common::start().await;

    let report = hproject::suite()
        .filtered("tree_view")
        .run(&harness.client, &harness.cleanup)
        .await;

    assert!(report.all_passed(), "{}", report);
    for table in [
        StoreTable::HProject,
        StoreTable::HDevice,
        StoreTable::HPacket,
        StoreTable::HPacketField,
        StoreTable::Area,
        StoreTable::AreaDevice,
    ] {
        assert_eq!(harness.store().count(table), 0, "{} not truncated", table);
    }
    // the administrator survives truncation
    assert_eq!(harness.store().count(StoreTable::HUser), 1);
}

#[tokio::test]
async fn test_fixture_chain_reaches_owner() {
    let harness = common::start().await;
    let session = harness.client.admin_session().await.unwrap();
    let fixtures = hyperiot_contract::Fixtures::new(&harness.client, &session);

    let project = fixtures.create_project().await.unwrap();
    let device = fixtures.create_device(&project).await.unwrap();
    let packet = fixtures.create_packet(&device).await.unwrap();
    let field = fixtures.create_field(&packet).await.unwrap();
    let area = fixtures.create_area(&project).await.unwrap();
    fixtures.create_area_device(&area, &device).await.unwrap();

    assert!(field.id > 0);
    assert_eq!(harness.store().count(StoreTable::AreaDevice), 1);

    harness.cleanup.run().await.unwrap();
    assert_eq!(harness.store().count(StoreTable::HProject), 0);
}

#[tokio::test]
async fn test_missing_token_is_forbidden() {
    let harness = common::start().await;

    let request = HttpRequestBuilder::get()
        .with_uri("/hprojects/all")
        .build()
        .unwrap();
    let response = harness.client.execute(&request).await.unwrap();

    let report = ResponseValidator::builder()
        .with_status_equal(200)
        .build()
        .validate(&response);
    assert!(!report.passed());
    assert!(matches!(
        report.mismatches(),
        [Mismatch::Status {
            expected: 200,
            actual: 403
        }]
    ));
}

#[tokio::test]
async fn test_bad_token_is_forbidden() {
    let harness = common::start().await;

    let request = HttpRequestBuilder::get()
        .with_uri("/hprojects/all")
        .with_authorization("JWT not-a-token")
        .build()
        .unwrap();
    let response = harness.client.execute(&request).await.unwrap();

    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_extra_property_is_reported() {
    let harness = common::start().await;
    let session = harness.client.admin_session().await.unwrap();
    let project = hyperiot_contract::Fixtures::new(&harness.client, &session)
        .create_project()
        .await
        .unwrap();

    let request = session
        .authorize(HttpRequestBuilder::get().with_uri(format!("/hprojects/{}", project.id)))
        .build()
        .unwrap();
    let response = harness.client.execute(&request).await.unwrap();

    // a view lacking `user` must flag it as unexpected
    let without_user: Vec<&str> = properties::project()
        .into_iter()
        .filter(|p| *p != "user")
        .collect();
    let report = ResponseValidator::builder()
        .with_status_equal(200)
        .contain_exact_properties(without_user)
        .build()
        .validate(&response);

    assert!(!report.passed());
    let mismatch = &report.mismatches()[0];
    assert_eq!(mismatch.unexpected(), vec!["user"]);
    assert!(mismatch.missing().is_empty());

    let err = report.into_result(request.label()).unwrap_err();
    assert!(matches!(err, ContractError::Assertion { .. }));
}

#[tokio::test]
async fn test_wrong_credentials_fail_every_case() {
    let harness = common::start().await;
    let mut config = harness.client.config().clone();
    config.admin_password = "wrong".to_string();
    let client = hyperiot_contract::ContractClient::new(config).unwrap();

    let report = hproject::suite()
        .filtered("test001")
        .run(&client, &harness.cleanup)
        .await;

    assert!(!report.all_passed());
    assert!(matches!(
        report.outcome("test001_save_hproject"),
        Some(CaseOutcome::Failed(ContractError::Authentication(_)))
    ));
}
