mod common;

use common::{api_error_json, card_json, config_for, harness};
use serde_json::json;
use stripe_facade::domain::gateway::CardFields;
use stripe_facade::error::{FacadeError, GatewayFailure};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_create_customer_binds_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/customers"))
        .and(body_string_contains("source=tok_visa"))
        .and(body_string_contains("email=jane%40example.com"))
        .and(body_string_contains("description=Jane+Doe"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_1",
            "object": "customer",
            "email": "jane@example.com",
            "default_source": "card_1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let customer_id = h
        .facade
        .create_customer("tok_visa", "jane@example.com", Some("Jane Doe"))
        .await
        .unwrap();

    assert_eq!(customer_id, "cus_1");
}

#[tokio::test]
async fn test_get_card_from_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tokens/tok_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "tok_1",
            "object": "token",
            "type": "card",
            "used": false,
            "card": card_json("card_1", "fp_abc")
        })))
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let card = h.facade.get_card_from_token("tok_1").await.unwrap();

    assert_eq!(card.id, "card_1");
    assert_eq!(card.fingerprint.as_deref(), Some("fp_abc"));
    assert_eq!(card.last4.as_deref(), Some("4242"));
}

#[tokio::test]
async fn test_get_card_from_unknown_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/tokens/tok_missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(api_error_json(
            "invalid_request_error",
            "No such token: 'tok_missing'",
        )))
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let err = h.facade.get_card_from_token("tok_missing").await.unwrap_err();

    assert!(matches!(
        err,
        FacadeError::Gateway(GatewayFailure::Api { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_add_card_to_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/customers/cus_1/sources"))
        .and(body_string_contains("source=tok_mastercard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(card_json("card_2", "fp_def")))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    h.facade
        .add_card_to_user("cus_1", "tok_mastercard")
        .await
        .unwrap();
}

async fn mount_customer(server: &MockServer, default_source: Option<&str>) {
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_1",
            "object": "customer",
            "default_source": default_source
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fingerprint_match_returns_card_id() {
    let server = MockServer::start().await;
    mount_customer(&server, Some("card_default")).await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1/sources"))
        .and(query_param("object", "card"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [card_json("card_1", "fp_1"), card_json("card_2", "fp_2")],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let card_id = h
        .facade
        .retrieve_customer_card_from_fingerprint("cus_1", "fp_2")
        .await
        .unwrap();

    assert_eq!(card_id.as_deref(), Some("card_2"));
}

#[tokio::test]
async fn test_fingerprint_match_on_second_page() {
    let server = MockServer::start().await;
    mount_customer(&server, Some("card_default")).await;
    // Mounted first so it wins over the unfiltered first-page mock.
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1/sources"))
        .and(query_param("starting_after", "card_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [card_json("card_3", "fp_3")],
            "has_more": false
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1/sources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [card_json("card_1", "fp_1"), card_json("card_2", "fp_2")],
            "has_more": true
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let card_id = h
        .facade
        .retrieve_customer_card_from_fingerprint("cus_1", "fp_3")
        .await
        .unwrap();

    assert_eq!(card_id.as_deref(), Some("card_3"));
}

#[tokio::test]
async fn test_fingerprint_miss_falls_back_to_default_source() {
    let server = MockServer::start().await;
    mount_customer(&server, Some("card_default")).await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1/sources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [card_json("card_1", "fp_1")],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let card_id = h
        .facade
        .retrieve_customer_card_from_fingerprint("cus_1", "fp_unknown")
        .await
        .unwrap();

    assert_eq!(card_id.as_deref(), Some("card_default"));
}

#[tokio::test]
async fn test_fingerprint_miss_without_default_source() {
    let server = MockServer::start().await;
    mount_customer(&server, None).await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1/sources"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [],
            "has_more": false
        })))
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let card_id = h
        .facade
        .retrieve_customer_card_from_fingerprint("cus_1", "fp_unknown")
        .await
        .unwrap();

    assert!(card_id.is_none());
}

#[tokio::test]
async fn test_get_token_from_card() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tokens"))
        .and(body_string_contains("card%5Bnumber%5D=4242424242424242"))
        .and(body_string_contains("card%5Bexp_month%5D=12"))
        .and(body_string_contains("card%5Bexp_year%5D=2030"))
        .and(body_string_contains("card%5Bcvc%5D=123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "tok_new",
            "object": "token",
            "card": card_json("card_9", "fp_9"),
            "used": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let token = h
        .facade
        .get_token_from_card(&CardFields {
            number: "4242424242424242".to_string(),
            exp_month: 12,
            exp_year: 2030,
            cvc: "123".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(token.id, "tok_new");
    assert_eq!(token.card.map(|c| c.id).as_deref(), Some("card_9"));
}

#[tokio::test]
async fn test_customer_id_cannot_escape_its_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_victim"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cus_victim",
            "default_source": "card_v"
        })))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_other%2F..%2Fcus_victim%23frag"))
        .respond_with(ResponseTemplate::new(404).set_body_json(api_error_json(
            "invalid_request_error",
            "No such customer",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(config_for(&server));
    let err = h
        .facade
        .retrieve_customer_card_from_fingerprint("cus_other/../cus_victim#frag", "fp_v")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        FacadeError::Gateway(GatewayFailure::Api { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_dot_segment_token_is_rejected_locally() {
    let server = MockServer::start().await;
    let h = harness(config_for(&server));

    let err = h.facade.get_card_from_token("..").await.unwrap_err();

    assert!(matches!(err, FacadeError::Gateway(GatewayFailure::InvalidId(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}
