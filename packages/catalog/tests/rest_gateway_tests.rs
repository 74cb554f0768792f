// ABOUTME: REST gateway tests against a mock PostgREST server
// ABOUTME: Checks rendered query parameters, auth headers, counts and error surfacing

use pretty_assertions::assert_eq;
use serde_json::json;
use shanyraq_catalog::gateway::{tables, DataGateway, Filter, Query};
use shanyraq_catalog::{
    BeneficiaryQueryService, CatalogError, CatalogFilter, GatewayConfig, RestGateway,
};
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer) -> RestGateway {
    RestGateway::new(&GatewayConfig::with_credentials(server.uri(), "anon-key")).unwrap()
}

#[tokio::test]
async fn test_catalog_query_is_rendered_as_postgrest_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/beneficiaries"))
        .and(query_param("is_active", "eq.true"))
        .and(query_param("category", "eq.urgent"))
        .and(query_param("or", "(city.eq.Алматы,is_nationwide.eq.true)"))
        .and(query_param("order", "created_at.desc"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 12, "title": "Лечение", "category": "urgent", "city": "Алматы", "raised_amount": null}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let service = BeneficiaryQueryService::new(Arc::new(gateway_for(&server)));
    let filter = CatalogFilter::from_selection(Some("urgent"), Some("Алматы")).unwrap();
    let records = service.fetch_beneficiaries(&filter).await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, "12");
    assert_eq!(records[0].raised_amount, None);
}

#[tokio::test]
async fn test_projection_is_sent_as_select() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/partner_funds"))
        .and(query_param("select", "name"))
        .and(query_param("order", "name.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "Аяла"}])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = gateway_for(&server)
        .select(
            &Query::table(tables::PARTNER_FUNDS)
                .select(&["name"])
                .order("name", true),
        )
        .await
        .unwrap();
    assert_eq!(rows, vec![json!({"name": "Аяла"})]);
}

#[tokio::test]
async fn test_gateway_error_message_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/beneficiaries"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "42703",
            "details": null,
            "hint": null,
            "message": "column beneficiaries.helpers does not exist"
        })))
        .mount(&server)
        .await;

    let service = BeneficiaryQueryService::new(Arc::new(gateway_for(&server)));
    let err = service
        .fetch_beneficiaries(&CatalogFilter::default())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::Gateway(_)));
    assert_eq!(err.to_string(), "column beneficiaries.helpers does not exist");
}

#[tokio::test]
async fn test_exact_count_reads_content_range() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/rest/v1/kaspi_payment_requests"))
        .and(query_param("status", "eq.new"))
        .and(header("Prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-range", "0-6/7"))
        .expect(1)
        .mount(&server)
        .await;

    let count = gateway_for(&server)
        .count(&Query::table(tables::PAYMENT_REQUESTS).eq("status", "new"))
        .await
        .unwrap();
    assert_eq!(count, 7);
}

#[tokio::test]
async fn test_insert_asks_for_representation() {
    let server = MockServer::start().await;
    let row = json!({"beneficiary_id": "b-1", "amount": 1000, "status": "new"});
    Mock::given(method("POST"))
        .and(path("/rest/v1/kaspi_payment_requests"))
        .and(header("Prefer", "return=representation"))
        .and(body_json(json!([row.clone()])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            {"id": "p-1", "beneficiary_id": "b-1", "amount": 1000, "status": "new"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let stored = gateway_for(&server)
        .insert(tables::PAYMENT_REQUESTS, vec![row])
        .await
        .unwrap();
    assert_eq!(stored[0]["id"], "p-1");
}

#[tokio::test]
async fn test_update_is_scoped_by_filters() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/kaspi_payment_requests"))
        .and(query_param("id", "eq.p-1"))
        .and(header("Authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "p-1", "status": "paid"}])))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = GatewayConfig::with_credentials(server.uri(), "anon-key");
    config.service_key = Some("service-key".to_string());
    let gateway = RestGateway::new(&config).unwrap();

    let updated = gateway
        .update(
            tables::PAYMENT_REQUESTS,
            &[Filter::eq("id", "p-1")],
            json!({"status": "paid"}),
        )
        .await
        .unwrap();
    assert_eq!(updated[0]["status"], "paid");
}

#[tokio::test]
async fn test_unfiltered_delete_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let err = gateway_for(&server)
        .delete(tables::BENEFICIARIES, &[])
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));
}

#[tokio::test]
async fn test_delete_with_no_content_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/beneficiaries"))
        .and(query_param("id", "eq.b-9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    gateway_for(&server)
        .delete(tables::BENEFICIARIES, &[Filter::eq("id", "b-9")])
        .await
        .unwrap();
}
