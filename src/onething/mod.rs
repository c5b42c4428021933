//! OneThing API integration module.
//!
//! This module provides the request transport, the typed request and
//! response model, and the resource client for the OneThing GPU instance
//! API.

mod client;
mod operation;
mod requests;
mod responses;
mod transport;
mod types;
mod wire;

pub use client::OneThingClient;
pub use operation::Operation;
pub use requests::{
    ensure_app_id, ensure_valid, CustomPort, InstanceConfig, QueryBill, QueryInstances,
    QueryPrivateImage, QueryPublishImage, QueryResources, MAX_PAGE_SIZE,
};
pub use responses::{
    CustomPortWithSubDomain, InstanceCreateResponse, InstanceItem, InstanceList, OrderItem,
    OrderList, PrivateImageItem, PrivateImageList, PublishImageItem, PublishImageList,
    ResourceItem, ResourceList, WalletDetail,
};
pub use transport::{
    CallOptions, HttpTransport, Transport, TransportSettings, DEFAULT_BASE_URL,
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT,
};
pub use types::{
    epoch_to_utc, BillType, BusinessType, Envelope, InstanceStatus, Pagination, PortProtocol,
    PrivateImageStatus,
};
