//! Upstream client tests against wiremock.

use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use selfservice::clients::adminusers::AdminusersClient;
use selfservice::clients::connector::ConnectorClient;
use selfservice::clients::stripe::{
    BankAccount, Person, PersonRelationship, StripeClient, UploadedDocument,
};
use selfservice::models::credential::CredentialState;
use selfservice::models::go_live_stage::GoLiveStage;
use selfservice::models::stripe_setup::StripeSetupStep;

mod connector_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_credential_state_sends_patch_ops() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/api/accounts/10/credentials/200"))
            .and(body_json(json!([
                { "op": "replace", "path": "state", "value": "VERIFIED_WITH_LIVE_PAYMENT" },
                { "op": "replace", "path": "last_updated_by_user_external_id", "value": "user-1" },
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "gateway_account_credential_id": 200,
                "external_id": "cred-200",
                "payment_provider": "worldpay",
                "state": "VERIFIED_WITH_LIVE_PAYMENT",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ConnectorClient::new(&server.uri()).unwrap();
        let updated = client
            .update_credential_state(10, 200, CredentialState::VerifiedWithLivePayment, "user-1")
            .await
            .unwrap();
        assert_eq!(updated.state, CredentialState::VerifiedWithLivePayment);
    }

    #[tokio::test]
    async fn test_error_body_and_identifier_are_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/api/accounts/10/switch-psp"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "message": ["Credential is not in a switchable state"],
                "error_identifier": "GENERIC",
            })))
            .mount(&server)
            .await;

        let client = ConnectorClient::new(&server.uri()).unwrap();
        let err = client.switch_psp(10, "cred-200", "user-1").await.unwrap_err();
        assert_eq!(err.status, Some(409));
        assert_eq!(err.service, "connector");
        assert_eq!(err.message, "Credential is not in a switchable state");
        assert_eq!(err.error_identifier.as_deref(), Some("GENERIC"));
        assert!(!err.is_not_found());
    }

    #[tokio::test]
    async fn test_stripe_setup_flag() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/api/accounts/10/stripe-setup"))
            .and(body_json(json!([{ "op": "replace", "path": "vat_number", "value": true }])))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = ConnectorClient::new(&server.uri()).unwrap();
        client
            .set_stripe_account_setup_flag(10, StripeSetupStep::VatNumber)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_connector_has_no_status() {
        // Nothing listens on the discard port.
        let client = ConnectorClient::new("http://127.0.0.1:9").unwrap();
        let err = client.get_account_by_external_id("acct-1").await.unwrap_err();
        assert_eq!(err.status, None);
    }
}

mod adminusers_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_go_live_stage() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v1/api/services/svc-1"))
            .and(body_json(json!([
                { "op": "replace", "path": "current_go_live_stage", "value": "TERMS_AGREED_EPDQ" },
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "external_id": "svc-1",
                "name": "Licensing",
                "current_go_live_stage": "TERMS_AGREED_EPDQ",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AdminusersClient::new(&server.uri()).unwrap();
        let service = client
            .update_current_go_live_stage("svc-1", GoLiveStage::TermsAgreedEpdq)
            .await
            .unwrap();
        assert_eq!(service.current_go_live_stage, GoLiveStage::TermsAgreedEpdq);
        assert!(service.gateway_account_ids.is_empty());
    }
}

mod stripe_tests {
    use super::*;

    #[tokio::test]
    async fn test_bank_account_is_form_encoded_with_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts/acct_123"))
            .and(header("authorization", "Bearer sk_test_abc"))
            .and(body_string_contains("routing_number%5D=108800"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "acct_123" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = StripeClient::new(&server.uri(), Some("sk_test_abc".into())).unwrap();
        client
            .update_bank_account(
                "acct_123",
                &BankAccount {
                    sort_code: "108800".into(),
                    account_number: "00012345".into(),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_person_returns_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts/acct_123/persons"))
            .and(body_string_contains("relationship%5Bdirector%5D=true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "person_1" })))
            .mount(&server)
            .await;

        let client = StripeClient::new(&server.uri(), Some("sk_test_abc".into())).unwrap();
        let id = client
            .create_person(
                "acct_123",
                &Person {
                    first_name: "Ada".into(),
                    last_name: "Lovelace".into(),
                    dob_day: 10,
                    dob_month: 12,
                    dob_year: 1985,
                    relationship: PersonRelationship::Director,
                },
            )
            .await
            .unwrap();
        assert_eq!(id, "person_1");
    }

    #[tokio::test]
    async fn test_missing_key_is_refused_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = StripeClient::new(&server.uri(), None).unwrap();
        let err = client.update_vat_number("acct_123", "GB123456789").await.unwrap_err();
        assert_eq!(err.service, "stripe");
        assert_eq!(err.status, None);
    }

    #[tokio::test]
    async fn test_stripe_error_message_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts/acct_123"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid VAT id", "type": "invalid_request_error" }
            })))
            .mount(&server)
            .await;

        let client = StripeClient::new(&server.uri(), Some("sk".into())).unwrap();
        let err = client.update_vat_number("acct_123", "GB1").await.unwrap_err();
        assert_eq!(err.status, Some(400));
        assert_eq!(err.message, "Invalid VAT id");
    }

    #[tokio::test]
    async fn test_document_goes_to_files_host_then_account() {
        let api = MockServer::start().await;
        let files = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/files"))
            .and(header("authorization", "Bearer sk_test_abc"))
            .and(body_string_contains("account_requirement"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "file_9" })))
            .expect(1)
            .mount(&files)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/accounts/acct_123"))
            .and(body_string_contains("%5Bfront%5D=file_9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "acct_123" })))
            .expect(1)
            .mount(&api)
            .await;

        let client = StripeClient::new(&api.uri(), Some("sk_test_abc".into()))
            .unwrap()
            .with_files_url(&files.uri())
            .unwrap();
        let id = client
            .upload_government_entity_document(
                "acct_123",
                UploadedDocument {
                    file_name: "entity.pdf".into(),
                    content_type: "application/pdf".into(),
                    data: b"%PDF-1.4".to_vec(),
                },
            )
            .await
            .unwrap();
        assert_eq!(id, "file_9");
    }
}
