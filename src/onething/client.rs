//! OneThing API client implementation.
//!
//! This module provides one method per remote operation. Each converts its
//! typed request into wire form, sends it through a [`Transport`] and
//! decodes the envelope data into the typed response.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use validator::Validate;

use crate::error::{PilotError, Result, TransportError};

use super::operation::Operation;
use super::requests::{
    ensure_app_id, ensure_valid, InstanceConfig, QueryBill, QueryInstances, QueryPrivateImage,
    QueryPublishImage, QueryResources,
};
use super::responses::{
    InstanceCreateResponse, InstanceList, OrderList, PrivateImageList, PublishImageList,
    ResourceList, WalletDetail,
};
use super::transport::{CallOptions, HttpTransport, Transport, TransportSettings};
use super::types::Envelope;
use super::wire::FromWire;

/// OneThing API client.
///
/// Cloning is cheap; clones share the transport.
#[derive(Debug)]
pub struct OneThingClient<T = HttpTransport> {
    /// Transport shared between clones.
    transport: Arc<T>,
    /// Overrides applied to every call made through this handle.
    options: CallOptions,
}

impl<T> Clone for OneThingClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            options: self.options,
        }
    }
}

impl OneThingClient<HttpTransport> {
    /// Creates a client with the default base URL and retry policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_settings(TransportSettings::new(api_key))
    }

    /// Creates a client from explicit transport settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_settings(settings: TransportSettings) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(settings)?))
    }
}

impl<T: Transport> OneThingClient<T> {
    /// Creates a client over any transport.
    #[must_use]
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            options: CallOptions::default(),
        }
    }

    /// Returns a handle whose calls use `options` instead of the transport
    /// defaults.
    #[must_use]
    pub fn with_call_options(&self, options: CallOptions) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            options,
        }
    }

    /// Lists the caller's private images.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response is malformed.
    pub async fn list_private_images(&self, query: &QueryPrivateImage) -> Result<PrivateImageList> {
        let operation = Operation::ListPrivateImages;
        let list: PrivateImageList = self.call(operation, Some(encode(operation, query)?)).await?;
        debug!("Fetched {} private images", list.private_image_list.len());
        Ok(list)
    }

    /// Lists published images.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response is malformed.
    pub async fn list_published_images(
        &self,
        query: &QueryPublishImage,
    ) -> Result<PublishImageList> {
        let operation = Operation::ListPublishedImages;
        let list: PublishImageList = self.call(operation, Some(encode(operation, query)?)).await?;
        debug!("Fetched {} published images", list.publish_image_list.len());
        Ok(list)
    }

    /// Lists GPU resources available to an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response is malformed.
    pub async fn list_resources(&self, query: &QueryResources) -> Result<ResourceList> {
        let operation = Operation::ListResources;
        self.call(operation, Some(encode(operation, query)?)).await
    }

    /// Lists one page of instances.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is invalid, the API call fails or the
    /// response is malformed.
    pub async fn list_instances(&self, query: &QueryInstances) -> Result<InstanceList> {
        let operation = Operation::ListInstances;
        let list: InstanceList = self.call(operation, Some(encode(operation, query)?)).await?;
        debug!(
            "Fetched {} instances (total {})",
            list.app_list.len(),
            list.pagination.total
        );
        Ok(list)
    }

    /// Creates an instance.
    ///
    /// The API takes no idempotency key: if a retry follows a request that
    /// succeeded server-side, a second instance may be created.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the instance
    /// cannot be created.
    pub async fn create_instance(&self, config: &InstanceConfig) -> Result<InstanceCreateResponse> {
        info!(
            "Creating instance: {}x {} from image {}",
            config.gpu_num, config.gpu_type, config.app_image_id
        );

        let operation = Operation::CreateInstance;
        let created: InstanceCreateResponse =
            self.call(operation, Some(encode(operation, config)?)).await?;

        info!("Created instance {} (group {})", created.app_id, created.group_id);
        Ok(created)
    }

    /// Shuts an instance down.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance cannot be stopped.
    pub async fn stop_instance(&self, app_id: &str) -> Result<()> {
        self.lifecycle(Operation::StopInstance, app_id).await
    }

    /// Boots a stopped instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance cannot be started.
    pub async fn start_instance(&self, app_id: &str) -> Result<()> {
        self.lifecycle(Operation::StartInstance, app_id).await
    }

    /// Releases an instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance cannot be deleted.
    pub async fn delete_instance(&self, app_id: &str) -> Result<()> {
        self.lifecycle(Operation::DeleteInstance, app_id).await
    }

    /// Fetches the wallet summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response is malformed.
    pub async fn wallet_detail(&self) -> Result<WalletDetail> {
        self.call(Operation::WalletDetail, None).await
    }

    /// Fetches one page of consumption records.
    ///
    /// # Errors
    ///
    /// Returns an error if the query is invalid, the API call fails or the
    /// response is malformed.
    pub async fn consumption_records(&self, query: &QueryBill) -> Result<OrderList> {
        let operation = Operation::ConsumptionRecords;
        self.call(operation, Some(encode(operation, query)?)).await
    }

    /// Runs a stop/start/delete operation.
    async fn lifecycle(&self, operation: Operation, app_id: &str) -> Result<()> {
        ensure_app_id(app_id)?;
        info!("{operation}: {app_id}");
        self.send(operation, Some(app_id), None).await?;
        Ok(())
    }

    /// Sends an encoded request and decodes the envelope data.
    async fn call<R: FromWire>(&self, operation: Operation, body: Option<Value>) -> Result<R> {
        let envelope = self.send(operation, None, body).await?;
        decode(operation, envelope.data)
    }

    /// Sends an encoded request and checks the envelope code.
    async fn send(
        &self,
        operation: Operation,
        app_id: Option<&str>,
        body: Option<Value>,
    ) -> Result<Envelope> {
        let endpoint = operation.endpoint(app_id);

        let envelope = self
            .transport
            .execute(operation.method(), &endpoint, body, self.options)
            .await
            .map_err(|e| PilotError::from_transport(operation.name(), e))?;

        if !envelope.is_success() {
            return Err(PilotError::Api {
                operation: operation.name(),
                code: envelope.code,
                message: envelope.msg,
            });
        }

        Ok(envelope)
    }
}

/// Validates a request and converts it to its wire form.
fn encode<Q: Serialize + Validate>(operation: Operation, request: &Q) -> Result<Value> {
    ensure_valid(request)?;
    serde_json::to_value(request).map_err(|e| {
        PilotError::from_transport(operation.name(), TransportError::request(e.to_string()))
    })
}

/// Decodes envelope data into the operation's typed response.
fn decode<R: FromWire>(operation: Operation, data: Option<Value>) -> Result<R> {
    let data = data.ok_or_else(|| PilotError::decode(operation.name(), "response has no data"))?;
    let wire: R::Wire =
        serde_json::from_value(data).map_err(|e| PilotError::decode(operation.name(), e.to_string()))?;
    Ok(R::from_wire(wire)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::onething::requests::CustomPort;
    use crate::onething::transport::MockTransport;
    use crate::onething::types::InstanceStatus;
    use reqwest::Method;
    use serde_json::json;
    use std::time::Duration;

    fn envelope(data: Value) -> Envelope {
        Envelope {
            code: 0,
            msg: String::from("success"),
            data: Some(data),
        }
    }

    fn instance(app_id: &str, status: i64) -> Value {
        json!({
            "appId": app_id,
            "appImageId": "img-1",
            "appImageName": "pytorch",
            "appImageAuthor": "onething",
            "appImageVersion": "2.1",
            "billType": 3,
            "createdAt": 1_700_000_000,
            "errCode": 0,
            "expiredAt": 0,
            "gpuType": "RTX 4090",
            "groupId": "grp-1",
            "prePrice": 0.0,
            "price": 1.99,
            "regionId": 7,
            "runtime": 0.0,
            "startedAt": 0,
            "status": status,
            "stoppedAt": 0,
            "systemDiskSize": 50,
            "systemDiskSizeUsed": 0.0,
            "webUIAddress": ""
        })
    }

    fn client_returning(
        expected_method: Method,
        expected_endpoint: &'static str,
        response: Envelope,
    ) -> OneThingClient<MockTransport> {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(move |method, endpoint, _, _| {
                *method == expected_method && endpoint == expected_endpoint
            })
            .times(1)
            .returning(move |_, _, _, _| Ok(response.clone()));
        OneThingClient::with_transport(transport)
    }

    #[tokio::test]
    async fn test_list_instances_with_pagination() {
        let data = json!({
            "appList": [instance("app-1", 300), instance("app-2", 800)],
            "pagination": { "page": 1, "pageSize": 10, "total": 2 }
        });
        let client = client_returning(Method::GET, "api/v2/app", envelope(data));

        let query = QueryInstances::new(1, 10).unwrap();
        let list = client.list_instances(&query).await.unwrap();

        assert_eq!(list.app_list.len(), 2);
        assert_eq!(list.pagination.total, 2);
        assert_eq!(list.app_list[0].status, InstanceStatus::Running);
        assert_eq!(list.find("app-2").map(|i| i.status), Some(InstanceStatus::Stopped));
    }

    #[tokio::test]
    async fn test_nonzero_code_is_api_error() {
        let response = Envelope {
            code: 1,
            msg: String::from("insufficient balance"),
            data: None,
        };
        let client = client_returning(Method::GET, "api/v1/account/wallet/detail", response);

        let err = client.wallet_detail().await.unwrap_err();
        match err {
            PilotError::Api {
                operation,
                code,
                message,
            } => {
                assert_eq!(operation, "get wallet detail");
                assert_eq!(code, 1);
                assert_eq!(message, "insufficient balance");
            }
            other => panic!("expected API error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shape_mismatch_is_decode_error() {
        let client = client_returning(
            Method::GET,
            "api/v2/resources",
            envelope(json!({ "resourceList": "not a list" })),
        );

        let query = QueryResources::new("img-1").unwrap();
        let err = client.list_resources(&query).await.unwrap_err();
        assert!(matches!(err, PilotError::Decode { operation: "list available resources", .. }));
    }

    #[tokio::test]
    async fn test_missing_data_is_decode_error() {
        let response = Envelope {
            code: 0,
            msg: String::from("success"),
            data: None,
        };
        let client = client_returning(Method::GET, "api/v2/app/publish/image/list", response);

        let err = client
            .list_published_images(&QueryPublishImage::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_unknown_status_is_validation_error() {
        let data = json!({
            "appList": [instance("app-1", 42)],
            "pagination": { "page": 1, "pageSize": 10, "total": 1 }
        });
        let client = client_returning(Method::GET, "api/v2/app", envelope(data));

        let err = client
            .list_instances(&QueryInstances::new(1, 10).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PilotError::Validation(ValidationError::UnknownCode { kind: "instance status", value: 42 })
        ));
    }

    #[tokio::test]
    async fn test_invalid_query_never_sent() {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let client = OneThingClient::with_transport(transport);

        let mut query = QueryBill::new(1, 10).unwrap();
        query.page_size = 250;

        let err = client.consumption_records(&query).await.unwrap_err();
        assert!(matches!(err, PilotError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_instance_sends_camel_case_body() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|method, endpoint, body, _| {
                *method == Method::POST
                    && endpoint == "api/v2/app"
                    && body.as_ref().is_some_and(|b| {
                        b["appImageId"] == json!("img-1") && b["customPort"][0]["localPort"] == json!(22)
                    })
            })
            .times(1)
            .returning(|_, _, _, _| Ok(envelope(json!({ "appId": "x", "groupId": "g" }))));
        let client = OneThingClient::with_transport(transport);

        let config = InstanceConfig::new("img-1", "RTX 4090", 1, 7)
            .unwrap()
            .with_port(CustomPort::tcp(22));
        let created = client.create_instance(&config).await.unwrap();

        assert_eq!(created.app_id, "x");
        assert_eq!(created.group_id, "g");
    }

    #[tokio::test]
    async fn test_lifecycle_endpoints() {
        let client = client_returning(
            Method::PUT,
            "api/v1/app/operate/shutdown/app-1",
            envelope(Value::Null),
        );
        assert!(client.stop_instance("app-1").await.is_ok());

        let client = client_returning(
            Method::PUT,
            "api/v1/app/operate/boot/app-1",
            envelope(Value::Null),
        );
        assert!(client.start_instance("app-1").await.is_ok());

        let client = client_returning(Method::DELETE, "api/v1/app/app-1", envelope(Value::Null));
        assert!(client.delete_instance("app-1").await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_app_id_rejected() {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let client = OneThingClient::with_transport(transport);

        assert!(matches!(
            client.delete_instance("").await,
            Err(PilotError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_path_altering_app_ids_never_sent() {
        let mut transport = MockTransport::new();
        transport.expect_execute().never();
        let client = OneThingClient::with_transport(transport);

        for app_id in ["..", "abc?force=1"] {
            assert!(matches!(
                client.delete_instance(app_id).await,
                Err(PilotError::Validation(_))
            ));
        }
        assert!(matches!(
            client.stop_instance("a#b").await,
            Err(PilotError::Validation(_))
        ));
        assert!(matches!(
            client.start_instance(".").await,
            Err(PilotError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_call_options_forwarded() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|_, _, _, options| {
                options.max_retries == Some(1) && options.timeout == Some(Duration::from_secs(30))
            })
            .times(1)
            .returning(|_, _, _, _| {
                Ok(envelope(json!({
                    "availableBalance": 10.0,
                    "availableVoucherCash": 0.0,
                    "consumeCashTotal": 5.5
                })))
            });
        let client = OneThingClient::with_transport(transport);

        let wallet = client
            .with_call_options(
                CallOptions::default()
                    .with_max_retries(1)
                    .with_timeout(Duration::from_secs(30)),
            )
            .wallet_detail()
            .await
            .unwrap();

        assert!((wallet.consume_cash_total - 5.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_transport_failure_carries_operation() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_, _, _, _| Err(TransportError::Timeout { attempts: 3 }));
        let client = OneThingClient::with_transport(transport);

        let err = client.wallet_detail().await.unwrap_err();
        assert_eq!(err.attempts(), Some(3));
        assert!(err.to_string().starts_with("get wallet detail failed"));
    }

    mod http {
        use super::*;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn client(server: &MockServer) -> OneThingClient {
            let settings = TransportSettings::new("test-key")
                .with_base_url(&server.uri())
                .with_retry_delay(Duration::from_millis(1));
            OneThingClient::with_settings(settings).unwrap()
        }

        #[tokio::test]
        async fn test_consumption_records_over_http() {
            let server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/api/v2/account/wallet/consume/query"))
                .and(query_param("page", "1"))
                .and(query_param("pageSize", "20"))
                .and(query_param("businessType", "1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "code": 0,
                    "msg": "success",
                    "data": {
                        "orderList": [{
                            "actualPayCash": 2.5,
                            "appId": "app-1",
                            "billType": 3,
                            "businessType": 1,
                            "consumeCash": 2.5,
                            "createdAt": 1_700_000_000,
                            "event": "usage",
                            "orderId": "ord-1",
                            "runtime": 3600,
                            "totalDiscountPrice": 0.0,
                            "voucherDeductCash": 0.0
                        }],
                        "pagination": { "page": 1, "pageSize": 20, "total": 1 }
                    }
                })))
                .expect(1)
                .mount(&server)
                .await;

            let query = QueryBill::new(1, 20)
                .unwrap()
                .with_business_type(crate::onething::types::BusinessType::InstanceUsage);
            let orders = client(&server).consumption_records(&query).await.unwrap();

            assert_eq!(orders.order_list.len(), 1);
            assert_eq!(orders.order_list[0].order_id, "ord-1");
            assert!((orders.total_paid() - 2.5).abs() < f64::EPSILON);
        }

        #[tokio::test]
        async fn test_not_found_is_client_error_after_one_attempt() {
            let server = MockServer::start().await;

            Mock::given(method("DELETE"))
                .respond_with(ResponseTemplate::new(404))
                .expect(1)
                .mount(&server)
                .await;

            let err = client(&server).delete_instance("gone").await.unwrap_err();
            assert!(matches!(err, PilotError::Client { status: 404, .. }));
            assert_eq!(err.attempts(), Some(1));
        }
    }
}
