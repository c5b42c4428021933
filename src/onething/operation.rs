//! The fixed set of remote operations and their endpoints.

use reqwest::Method;

/// A remote operation of the OneThing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// List private images.
    ListPrivateImages,
    /// List published images.
    ListPublishedImages,
    /// List available GPU resources.
    ListResources,
    /// List instances.
    ListInstances,
    /// Create an instance.
    CreateInstance,
    /// Shut an instance down.
    StopInstance,
    /// Boot a stopped instance.
    StartInstance,
    /// Release an instance.
    DeleteInstance,
    /// Fetch the wallet summary.
    WalletDetail,
    /// Query consumption records.
    ConsumptionRecords,
}

impl Operation {
    /// Human-readable name used in errors and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ListPrivateImages => "list private images",
            Self::ListPublishedImages => "list published images",
            Self::ListResources => "list available resources",
            Self::ListInstances => "list instances",
            Self::CreateInstance => "create instance",
            Self::StopInstance => "stop instance",
            Self::StartInstance => "start instance",
            Self::DeleteInstance => "delete instance",
            Self::WalletDetail => "get wallet detail",
            Self::ConsumptionRecords => "get consumption records",
        }
    }

    /// HTTP method of the operation.
    #[must_use]
    pub fn method(self) -> Method {
        match self {
            Self::CreateInstance => Method::POST,
            Self::StopInstance | Self::StartInstance => Method::PUT,
            Self::DeleteInstance => Method::DELETE,
            _ => Method::GET,
        }
    }

    /// API version segment the endpoint lives under.
    const fn version(self) -> &'static str {
        match self {
            Self::StopInstance | Self::StartInstance | Self::DeleteInstance | Self::WalletDetail => {
                "api/v1"
            }
            _ => "api/v2",
        }
    }

    /// Endpoint path relative to the base URL.
    ///
    /// `app_id` fills the `{id}` segment of the lifecycle operations and is
    /// ignored by the others.
    #[must_use]
    pub fn endpoint(self, app_id: Option<&str>) -> String {
        let id = app_id.unwrap_or_default();
        let path = match self {
            Self::ListPrivateImages => String::from("app/private/image/list"),
            Self::ListPublishedImages => String::from("app/publish/image/list"),
            Self::ListResources => String::from("resources"),
            Self::ListInstances | Self::CreateInstance => String::from("app"),
            Self::StopInstance => format!("app/operate/shutdown/{id}"),
            Self::StartInstance => format!("app/operate/boot/{id}"),
            Self::DeleteInstance => format!("app/{id}"),
            Self::WalletDetail => String::from("account/wallet/detail"),
            Self::ConsumptionRecords => String::from("account/wallet/consume/query"),
        };
        format!("{}/{path}", self.version())
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
