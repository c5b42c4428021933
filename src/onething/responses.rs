//! Response objects returned by the OneThing API.
//!
//! These mirror the wire schema. Records carrying enumerated codes are
//! declared through `coded_record!`, which pairs them with a raw wire struct
//! so that unknown codes fail as validation errors during decoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use super::types::{
    epoch_to_utc, BillType, BusinessType, InstanceStatus, Pagination, PrivateImageStatus,
};
use super::wire::{coded_record, from_wire_all, plain_wire, FromWire};

coded_record! {
    /// A private (user-saved) image.
    pub struct PrivateImageItem via PrivateImageItemWire {
        fields {
            /// Image identifier.
            app_image_id: String,
            /// Image name.
            app_image_name: String,
            /// Image description.
            #[serde(default)]
            app_image_description: String,
            /// Total image size.
            app_image_total_size: f64,
            /// Region the image lives in.
            region_id: u32,
            /// Last update (epoch seconds).
            updated_at: i64,
            /// Creation time (epoch seconds).
            created_at: i64,
        }
        codes {
            /// Save state.
            app_image_status: PrivateImageStatus,
        }
        non_negative []
    }
}

/// Private image listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateImageList {
    /// Images.
    pub private_image_list: Vec<PrivateImageItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PrivateImageListWire {
    private_image_list: Vec<PrivateImageItemWire>,
}

impl FromWire for PrivateImageList {
    type Wire = PrivateImageListWire;

    fn from_wire(wire: Self::Wire) -> Result<Self, ValidationError> {
        Ok(Self {
            private_image_list: from_wire_all(wire.private_image_list)?,
        })
    }
}

/// A published (public) image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishImageItem {
    /// Image identifier.
    pub app_image_id: String,
    /// Image name.
    pub app_image_name: String,
    /// Image description.
    pub app_image_description: String,
    /// Publisher.
    pub app_image_author: String,
    /// Image version.
    pub app_image_version: String,
    /// Creation time (epoch seconds).
    pub created_at: i64,
    /// Last update (epoch seconds).
    pub updated_at: i64,
}

/// Published image listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishImageList {
    /// Images.
    pub publish_image_list: Vec<PublishImageItem>,
}

/// GPU capacity available in a region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceItem {
    /// GPU type.
    pub gpu_type: String,
    /// Region.
    pub region_id: u32,
    /// Largest GPU count one instance can get.
    pub max_gpu_num: u32,
}

/// Available resource listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceList {
    /// Resources.
    pub resource_list: Vec<ResourceItem>,
}

/// Identifiers assigned to a newly created instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceCreateResponse {
    /// Instance identifier.
    pub app_id: String,
    /// Group identifier.
    pub group_id: String,
}

/// An exposed port of a running instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomPortWithSubDomain {
    /// Port inside the instance.
    pub local_port: u16,
    /// Exposure protocol as reported by the server, e.g. `http` or `tcp`.
    #[serde(rename = "type")]
    pub port_type: String,
    /// Public sub-domain routed to the port.
    pub sub_domain: String,
}

coded_record! {
    /// A provisioned instance.
    pub struct InstanceItem via InstanceItemWire {
        fields {
            /// Instance identifier.
            app_id: String,
            /// Image identifier.
            app_image_id: String,
            /// Image name.
            app_image_name: String,
            /// Image author.
            app_image_author: String,
            /// Image version.
            app_image_version: String,
            /// Creation time (epoch seconds).
            created_at: i64,
            /// User-given name.
            #[serde(default)]
            custom_name: String,
            /// Exposed ports.
            #[serde(default)]
            custom_port: Vec<CustomPortWithSubDomain>,
            /// Last error code reported by the platform.
            err_code: i64,
            /// Subscription expiry (epoch seconds).
            expired_at: i64,
            /// GPU type.
            gpu_type: String,
            /// Group identifier.
            group_id: String,
            /// Prepaid price.
            pre_price: f64,
            /// Current price.
            price: f64,
            /// Region.
            region_id: u32,
            /// Accumulated runtime.
            runtime: f64,
            /// Last boot (epoch seconds).
            started_at: i64,
            /// Last shutdown (epoch seconds).
            stopped_at: i64,
            /// System disk size.
            system_disk_size: u64,
            /// Used system disk.
            system_disk_size_used: f64,
            /// Web UI address.
            #[serde(rename = "webUIAddress")]
            web_ui_address: String,
        }
        codes {
            /// Billing mode.
            bill_type: BillType,
            /// Lifecycle state.
            status: InstanceStatus,
        }
        non_negative [pre_price, price]
    }
}

impl InstanceItem {
    /// Checks if the instance is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Creation time as a UTC timestamp.
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.created_at)
    }

    /// Last boot as a UTC timestamp.
    #[must_use]
    pub fn started_at_utc(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.started_at)
    }

    /// Returns the public sub-domain for an internal port, if exposed.
    #[must_use]
    pub fn sub_domain_for(&self, local_port: u16) -> Option<&str> {
        self.custom_port
            .iter()
            .find(|p| p.local_port == local_port)
            .map(|p| p.sub_domain.as_str())
    }
}

/// Instance listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceList {
    /// Instances.
    pub app_list: Vec<InstanceItem>,
    /// Pagination block.
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InstanceListWire {
    app_list: Vec<InstanceItemWire>,
    pagination: Pagination,
}

impl FromWire for InstanceList {
    type Wire = InstanceListWire;

    fn from_wire(wire: Self::Wire) -> Result<Self, ValidationError> {
        Ok(Self {
            app_list: from_wire_all(wire.app_list)?,
            pagination: wire.pagination,
        })
    }
}

impl InstanceList {
    /// Finds an instance by id.
    ///
    /// Used to reconcile after a create whose response was lost.
    #[must_use]
    pub fn find(&self, app_id: &str) -> Option<&InstanceItem> {
        self.app_list.iter().find(|i| i.app_id == app_id)
    }
}

coded_record! {
    /// Account balance summary.
    pub struct WalletDetail via WalletDetailWire {
        fields {
            /// Balance after instance reservations.
            available_balance: f64,
            /// Voucher amount after instance reservations.
            available_voucher_cash: f64,
            /// Total amount consumed.
            consume_cash_total: f64,
        }
        codes {}
        non_negative [available_balance, available_voucher_cash, consume_cash_total]
    }
}

coded_record! {
    /// A single consumption record.
    pub struct OrderItem via OrderItemWire {
        fields {
            /// Amount actually paid.
            actual_pay_cash: f64,
            /// Instance the record belongs to.
            #[serde(default)]
            app_id: String,
            /// Amount consumed.
            consume_cash: f64,
            /// Creation time (epoch seconds).
            created_at: i64,
            /// Event description.
            #[serde(default)]
            event: String,
            /// Order identifier.
            order_id: String,
            /// Billed runtime.
            runtime: i64,
            /// Total discount.
            total_discount_price: f64,
            /// Amount covered by vouchers.
            voucher_deduct_cash: f64,
        }
        codes {
            /// Billing mode.
            bill_type: BillType,
            /// Line item category.
            business_type: BusinessType,
        }
        non_negative [actual_pay_cash, consume_cash, total_discount_price, voucher_deduct_cash]
    }
}

impl OrderItem {
    /// Creation time as a UTC timestamp.
    #[must_use]
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        epoch_to_utc(self.created_at)
    }
}

/// Consumption record listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderList {
    /// Records.
    pub order_list: Vec<OrderItem>,
    /// Pagination block.
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct OrderListWire {
    order_list: Vec<OrderItemWire>,
    pagination: Pagination,
}

impl FromWire for OrderList {
    type Wire = OrderListWire;

    fn from_wire(wire: Self::Wire) -> Result<Self, ValidationError> {
        Ok(Self {
            order_list: from_wire_all(wire.order_list)?,
            pagination: wire.pagination,
        })
    }
}

impl OrderList {
    /// Sum of `actual_pay_cash` over the records of this page.
    #[must_use]
    pub fn total_paid(&self) -> f64 {
        self.order_list.iter().map(|o| o.actual_pay_cash).sum()
    }
}

plain_wire!(PublishImageList, ResourceList, InstanceCreateResponse);
