//! Request objects sent to the OneThing API.
//!
//! Field names are snake_case in Rust and camelCase on the wire; the mapping
//! is done by serde per struct. Optional fields left as `None` are omitted.

use serde::Serialize;
use validator::Validate;

use crate::error::ValidationError;

use super::types::{BillType, BusinessType, PortProtocol};

/// Largest page size the API accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Runs the `validator` checks of a request and converts the report.
///
/// # Errors
///
/// Returns the first failing field.
pub fn ensure_valid<T: Validate>(request: &T) -> Result<(), ValidationError> {
    request
        .validate()
        .map_err(|errors| ValidationError::from_report(&errors))
}

/// Filter for the private image listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryPrivateImage {
    /// Region to list images from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<u32>,
    /// Image name filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_image_name: Option<String>,
}

impl QueryPrivateImage {
    /// Creates an unfiltered query.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            region_id: None,
            app_image_name: None,
        }
    }

    /// Restricts the listing to one region.
    #[must_use]
    pub const fn with_region_id(mut self, region_id: u32) -> Self {
        self.region_id = Some(region_id);
        self
    }

    /// Filters by image name.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.app_image_name = Some(name.to_string());
        self
    }
}

/// Filter for the published image listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryPublishImage {
    /// Image name filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_image_name: Option<String>,
    /// Image author filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_image_author: Option<String>,
}

impl QueryPublishImage {
    /// Creates an unfiltered query.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            app_image_name: None,
            app_image_author: None,
        }
    }

    /// Filters by image name.
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.app_image_name = Some(name.to_string());
        self
    }

    /// Filters by image author.
    #[must_use]
    pub fn with_author(mut self, author: &str) -> Self {
        self.app_image_author = Some(author.to_string());
        self
    }
}

/// Query for GPU resources available to an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryResources {
    /// Image the resources must support.
    #[validate(length(min = 1, message = "app_image_id must not be empty"))]
    pub app_image_id: String,
    /// GPU type filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_type: Option<String>,
    /// Region filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_id: Option<u32>,
}

impl QueryResources {
    /// Creates a resource query for an image.
    ///
    /// # Errors
    ///
    /// Returns an error if the image id is empty.
    pub fn new(app_image_id: &str) -> Result<Self, ValidationError> {
        let query = Self {
            app_image_id: app_image_id.to_string(),
            gpu_type: None,
            region_id: None,
        };
        ensure_valid(&query)?;
        Ok(query)
    }

    /// Filters by GPU type.
    #[must_use]
    pub fn with_gpu_type(mut self, gpu_type: &str) -> Self {
        self.gpu_type = Some(gpu_type.to_string());
        self
    }

    /// Filters by region.
    #[must_use]
    pub const fn with_region_id(mut self, region_id: u32) -> Self {
        self.region_id = Some(region_id);
        self
    }
}

/// A port to expose on a new instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomPort {
    /// Port inside the instance.
    #[validate(range(min = 1, message = "local_port must be between 1 and 65535"))]
    pub local_port: u16,
    /// Exposure protocol.
    #[serde(rename = "type")]
    pub port_type: PortProtocol,
}

impl CustomPort {
    /// Creates an HTTP port mapping.
    #[must_use]
    pub const fn http(local_port: u16) -> Self {
        Self {
            local_port,
            port_type: PortProtocol::Http,
        }
    }

    /// Creates a TCP port mapping.
    #[must_use]
    pub const fn tcp(local_port: u16) -> Self {
        Self {
            local_port,
            port_type: PortProtocol::Tcp,
        }
    }

    /// Parses a port specification like `8000/http` or `22/tcp`.
    ///
    /// A bare port number defaults to HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the port or protocol is invalid.
    pub fn parse(entry: &str) -> Result<Self, ValidationError> {
        let (port, protocol) = entry.split_once('/').unwrap_or((entry, "http"));

        let local_port: u16 = port
            .trim()
            .parse()
            .map_err(|_| ValidationError::field("custom_port", format!("invalid port: {entry}")))?;

        let port_type = match protocol.trim().to_ascii_lowercase().as_str() {
            "http" => PortProtocol::Http,
            "tcp" => PortProtocol::Tcp,
            other => {
                return Err(ValidationError::field(
                    "custom_port",
                    format!("unknown protocol '{other}', expected http or tcp"),
                ));
            }
        };

        let port = Self {
            local_port,
            port_type,
        };
        ensure_valid(&port)?;
        Ok(port)
    }
}

/// Configuration of an instance to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InstanceConfig {
    /// Image to boot.
    #[validate(length(min = 1, message = "app_image_id must not be empty"))]
    pub app_image_id: String,
    /// Billing mode.
    pub bill_type: BillType,
    /// Number of GPUs.
    #[validate(range(min = 1, message = "gpu_num must be at least 1"))]
    pub gpu_num: u32,
    /// Region to deploy into.
    pub region_id: u32,
    /// GPU type.
    #[validate(length(min = 1, message = "gpu_type must not be empty"))]
    pub gpu_type: String,
    /// Subscription length, for subscription bill types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// Group to place the instance in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Ports to expose.
    #[validate(nested)]
    pub custom_port: Vec<CustomPort>,
}

impl InstanceConfig {
    /// Creates a pay-as-you-go instance configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is empty or `gpu_num` is zero.
    pub fn new(
        app_image_id: &str,
        gpu_type: &str,
        gpu_num: u32,
        region_id: u32,
    ) -> Result<Self, ValidationError> {
        let config = Self {
            app_image_id: app_image_id.to_string(),
            bill_type: BillType::default(),
            gpu_num,
            region_id,
            gpu_type: gpu_type.to_string(),
            duration: None,
            group_id: None,
            custom_port: Vec::new(),
        };
        ensure_valid(&config)?;
        Ok(config)
    }

    /// Sets the billing mode.
    #[must_use]
    pub const fn with_bill_type(mut self, bill_type: BillType) -> Self {
        self.bill_type = bill_type;
        self
    }

    /// Sets the subscription duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: u32) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Sets the instance group.
    #[must_use]
    pub fn with_group_id(mut self, group_id: &str) -> Self {
        self.group_id = Some(group_id.to_string());
        self
    }

    /// Adds a port to expose.
    #[must_use]
    pub fn with_port(mut self, port: CustomPort) -> Self {
        self.custom_port.push(port);
        self
    }
}

/// Paged instance listing query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryInstances {
    /// Page number (1-based).
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,
    /// Items per page.
    #[validate(range(min = 1, max = 100, message = "page_size must be between 1 and 100"))]
    pub page_size: u32,
    /// Restrict to one instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Restrict to one group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl QueryInstances {
    /// Creates a query for one page of instances.
    ///
    /// # Errors
    ///
    /// Returns an error if `page` is zero or `page_size` is outside `[1, 100]`.
    pub fn new(page: u32, page_size: u32) -> Result<Self, ValidationError> {
        let query = Self {
            page,
            page_size,
            app_id: None,
            group_id: None,
        };
        ensure_valid(&query)?;
        Ok(query)
    }

    /// Restricts the listing to one instance.
    #[must_use]
    pub fn with_app_id(mut self, app_id: &str) -> Self {
        self.app_id = Some(app_id.to_string());
        self
    }

    /// Restricts the listing to one group.
    #[must_use]
    pub fn with_group_id(mut self, group_id: &str) -> Self {
        self.group_id = Some(group_id.to_string());
        self
    }
}

/// Paged consumption record query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QueryBill {
    /// Page number (1-based).
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u32,
    /// Items per page.
    #[validate(range(min = 1, max = 100, message = "page_size must be between 1 and 100"))]
    pub page_size: u32,
    /// Restrict to one instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
    /// Restrict to one transaction category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_type: Option<BusinessType>,
}

impl QueryBill {
    /// Creates a query for one page of consumption records.
    ///
    /// # Errors
    ///
    /// Returns an error if `page` is zero or `page_size` is outside `[1, 100]`.
    pub fn new(page: u32, page_size: u32) -> Result<Self, ValidationError> {
        let query = Self {
            page,
            page_size,
            app_id: None,
            business_type: None,
        };
        ensure_valid(&query)?;
        Ok(query)
    }

    /// Restricts records to one instance.
    #[must_use]
    pub fn with_app_id(mut self, app_id: &str) -> Self {
        self.app_id = Some(app_id.to_string());
        self
    }

    /// Restricts records to one business type.
    #[must_use]
    pub const fn with_business_type(mut self, business_type: BusinessType) -> Self {
        self.business_type = Some(business_type);
        self
    }
}

/// Checks an instance id before it is placed in a request path.
///
/// The id must be a single plain path segment: ASCII letters, digits, `-`,
/// `_` and `.`, and not `.` or `..`.
///
/// # Errors
///
/// Returns an error if the id is empty or not a plain path segment.
pub fn ensure_app_id(app_id: &str) -> Result<(), ValidationError> {
    if app_id.is_empty() {
        return Err(ValidationError::field("app_id", "app_id must not be empty"));
    }
    let plain = app_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !plain || app_id == "." || app_id == ".." {
        return Err(ValidationError::field(
            "app_id",
            format!("app_id '{app_id}' is not a plain path segment"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_bill_page_size_bounds() {
        assert!(QueryBill::new(1, 1).is_ok());
        assert!(QueryBill::new(1, MAX_PAGE_SIZE).is_ok());

        for page_size in [0, 101, 500, u32::MAX] {
            let err = QueryBill::new(1, page_size).unwrap_err();
            assert_eq!(
                err,
                ValidationError::field("page_size", "page_size must be between 1 and 100")
            );
        }
    }

    #[test]
    fn test_query_bill_page_must_be_positive() {
        let err = QueryBill::new(0, 10).unwrap_err();
        assert!(matches!(err, ValidationError::Field { ref field, .. } if field == "page"));
    }

    #[test]
    fn test_query_instances_page_size_bounds() {
        assert!(QueryInstances::new(1, 10).is_ok());
        assert!(QueryInstances::new(1, 0).is_err());
        assert!(QueryInstances::new(1, 101).is_err());
    }

    #[test]
    fn test_instance_config_wire_names() {
        let config = InstanceConfig::new("img-1", "RTX 4090", 1, 7)
            .unwrap()
            .with_group_id("grp-1")
            .with_port(CustomPort::http(8000));

        let wire = serde_json::to_value(&config).unwrap();
        assert_eq!(wire["appImageId"], json!("img-1"));
        assert_eq!(wire["billType"], json!(3));
        assert_eq!(wire["gpuNum"], json!(1));
        assert_eq!(wire["regionId"], json!(7));
        assert_eq!(wire["gpuType"], json!("RTX 4090"));
        assert_eq!(wire["groupId"], json!("grp-1"));
        assert_eq!(wire["customPort"], json!([{ "localPort": 8000, "type": "http" }]));
        assert!(wire.get("duration").is_none());
        assert!(wire.get("app_image_id").is_none());
    }

    #[test]
    fn test_instance_config_rejects_zero_gpus() {
        let err = InstanceConfig::new("img-1", "RTX 4090", 0, 1).unwrap_err();
        assert!(matches!(err, ValidationError::Field { ref field, .. } if field == "gpu_num"));
    }

    #[test]
    fn test_query_omits_unset_filters() {
        let query = QueryBill::new(2, 20)
            .unwrap()
            .with_business_type(BusinessType::ImageStorage);
        let wire = serde_json::to_value(&query).unwrap();
        assert_eq!(wire, json!({ "page": 2, "pageSize": 20, "businessType": 2 }));
    }

    #[test]
    fn test_custom_port_parse() {
        assert_eq!(CustomPort::parse("8000/http").unwrap(), CustomPort::http(8000));
        assert_eq!(CustomPort::parse("22/tcp").unwrap(), CustomPort::tcp(22));
        assert_eq!(CustomPort::parse("7860").unwrap(), CustomPort::http(7860));
        assert!(CustomPort::parse("0/tcp").is_err());
        assert!(CustomPort::parse("22/udp").is_err());
        assert!(CustomPort::parse("invalid").is_err());
    }

    #[test]
    fn test_app_id_checks() {
        assert!(ensure_app_id("app-123").is_ok());
        assert!(ensure_app_id("").is_err());
        assert!(ensure_app_id("a/b").is_err());
        assert!(ensure_app_id("app.v2_1").is_ok());

        for id in [".", "..", "abc?force=1", "abc#frag", "a%2Fb", "a b", " ", "a\\b", "镜像"] {
            assert!(ensure_app_id(id).is_err(), "{id:?} should be rejected");
        }
    }
}
