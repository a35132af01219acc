use payments_gateway::{GatewayConfig, PaystackGateway};
use payments_types::{
    DepositCharge, GatewayError, Identity, NewRecipient, PaymentGateway, Reference,
    TransferInstruction,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn gateway(server: &MockServer) -> PaystackGateway {
    PaystackGateway::new(&GatewayConfig::new("sk_test_secret").with_base_url(server.uri())).unwrap()
}

#[tokio::test]
async fn initialize_sends_kobo_and_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .and(header("authorization", "Bearer sk_test_secret"))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "amount": 50000,
            "reference": "DEP_1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Authorization URL created",
            "data": {
                "authorization_url": "https://checkout.paystack.com/abc",
                "access_code": "abc",
                "reference": "DEP_1"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = gateway(&server)
        .await
        .initialize_deposit(&DepositCharge {
            email: Identity::parse("ada@example.com").unwrap(),
            amount_minor: 50_000,
            reference: Reference::parse("DEP_1").unwrap(),
            callback_url: None,
        })
        .await
        .unwrap();

    assert_eq!(auth.authorization_url, "https://checkout.paystack.com/abc");
    assert_eq!(auth.access_code, "abc");
    assert_eq!(auth.reference, "DEP_1");
}

#[tokio::test]
async fn verify_maps_customer_and_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/verify/DEP_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "success",
                "reference": "DEP_1",
                "amount": 50000,
                "customer": { "email": "ada@example.com" }
            }
        })))
        .mount(&server)
        .await;

    let verified = gateway(&server)
        .await
        .verify_transaction(&Reference::parse("DEP_1").unwrap())
        .await
        .unwrap();

    assert!(verified.success);
    assert_eq!(verified.amount_minor, 50_000);
    assert_eq!(verified.identity.as_deref(), Some("ada@example.com"));
}

#[tokio::test]
async fn verify_abandoned_payment_is_not_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/verify/DEP_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Verification successful",
            "data": { "status": "abandoned", "reference": "DEP_2", "amount": 1000 }
        })))
        .mount(&server)
        .await;

    let verified = gateway(&server)
        .await
        .verify_transaction(&Reference::parse("DEP_2").unwrap())
        .await
        .unwrap();

    assert!(!verified.success);
    assert_eq!(verified.status, "abandoned");
    assert!(verified.identity.is_none());
}

#[tokio::test]
async fn verify_unknown_reference_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transaction/verify/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "status": false,
            "message": "Transaction reference not found"
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .await
        .verify_transaction(&Reference::parse("missing").unwrap())
        .await
        .unwrap_err();

    match err {
        GatewayError::NotFound(msg) => assert_eq!(msg, "Transaction reference not found"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn envelope_status_false_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transfer"))
        .and(body_partial_json(json!({ "source": "balance", "amount": 30000 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": false,
            "message": "Your balance is not enough to fulfil this request"
        })))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .await
        .initiate_transfer(&TransferInstruction {
            amount_minor: 30_000,
            recipient_code: "RCP_1".to_string(),
            reason: "Rent".to_string(),
            reference: Reference::parse("WIT_1").unwrap(),
        })
        .await
        .unwrap_err();

    assert_eq!(
        err.message(),
        "Your balance is not enough to fulfil this request"
    );
}

#[tokio::test]
async fn transfer_receipt_carries_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transfer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Transfer has been queued",
            "data": { "reference": "WIT_1", "transfer_code": "TRF_1", "status": "pending" }
        })))
        .mount(&server)
        .await;

    let receipt = gateway(&server)
        .await
        .initiate_transfer(&TransferInstruction {
            amount_minor: 30_000,
            recipient_code: "RCP_1".to_string(),
            reason: "Rent".to_string(),
            reference: Reference::parse("WIT_1").unwrap(),
        })
        .await
        .unwrap();

    assert!(receipt.success);
    assert_eq!(receipt.transfer_code, "TRF_1");
}

#[tokio::test]
async fn server_error_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bank"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = gateway(&server).await.list_banks().await.unwrap_err();
    assert!(matches!(err, GatewayError::Rejected(_)));
}

#[tokio::test]
async fn recipient_code_is_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transferrecipient"))
        .and(body_partial_json(json!({ "type": "nuban", "currency": "NGN" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "status": true,
            "message": "Transfer recipient created successfully",
            "data": { "recipient_code": "RCP_abc", "name": "Ada" }
        })))
        .mount(&server)
        .await;

    let recipient = gateway(&server)
        .await
        .create_recipient(&NewRecipient {
            recipient_type: "nuban".to_string(),
            name: "Ada".to_string(),
            account_number: "0123456789".to_string(),
            bank_code: "058".to_string(),
            currency: "NGN".to_string(),
            description: None,
        })
        .await
        .unwrap();

    assert_eq!(recipient.recipient_code, "RCP_abc");
    assert_eq!(recipient.details["name"], "Ada");
}

#[tokio::test]
async fn unreachable_gateway_is_transport_error() {
    let config = GatewayConfig::new("sk").with_base_url("http://127.0.0.1:9");
    let err = PaystackGateway::new(&config)
        .unwrap()
        .list_banks()
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}

#[tokio::test]
async fn verify_path_is_built_under_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/transaction/verify/T.1=a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Verification successful",
            "data": { "status": "success", "reference": "T.1=a", "amount": 100 }
        })))
        .mount(&server)
        .await;

    let config =
        GatewayConfig::new("sk_test_secret").with_base_url(format!("{}/v1/", server.uri()));
    let verified = PaystackGateway::new(&config)
        .unwrap()
        .verify_transaction(&Reference::parse("T.1=a").unwrap())
        .await
        .unwrap();

    assert_eq!(verified.reference, "T.1=a");
    assert_eq!(verified.amount_minor, 100);
}

#[test]
fn invalid_base_url_is_rejected() {
    let config = GatewayConfig::new("sk").with_base_url("not a url");
    assert!(matches!(
        PaystackGateway::new(&config),
        Err(GatewayError::Transport(_))
    ));
}
