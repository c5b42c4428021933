//! Shared OneThing API types: wire enumerations, the response envelope and
//! pagination.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Declares a closed enumeration exchanged on the wire as an integer code.
///
/// The generated type serializes as its code and converts back only through
/// `TryFrom<i64>`, which rejects unknown codes.
macro_rules! wire_code {
    (
        $(#[$meta:meta])*
        pub enum $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        #[serde(into = "i64")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Returns the raw wire code.
            #[must_use]
            pub const fn code(self) -> i64 {
                match self {
                    $( Self::$variant => $code, )+
                }
            }

            /// Returns a human-readable label.
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $( Self::$variant => $label, )+
                }
            }
        }

        impl TryFrom<i64> for $name {
            type Error = ValidationError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $( $code => Ok(Self::$variant), )+
                    _ => Err(ValidationError::UnknownCode { kind: $kind, value }),
                }
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.code()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

wire_code! {
    /// Lifecycle state of an instance.
    pub enum InstanceStatus as "instance status" {
        /// Instance is being deployed.
        Deploying = 100 => "deploying",
        /// Instance is booting.
        Starting = 200 => "starting",
        /// Instance is running.
        Running = 300 => "running",
        /// Instance is shutting down.
        Stopping = 400 => "stopping",
        /// Instance is being reset.
        Resetting = 500 => "resetting",
        /// Instance image is being replaced.
        ChangingImage = 600 => "changing-image",
        /// Instance is being released.
        Releasing = 700 => "releasing",
        /// Instance is stopped.
        Stopped = 800 => "stopped",
    }
}

wire_code! {
    /// Billing mode of an instance or order.
    #[derive(Default)]
    pub enum BillType as "bill type" {
        /// Monthly subscription.
        MonthlySubscription = 1 => "monthly",
        /// Daily subscription.
        DailySubscription = 2 => "daily",
        /// Pay as you go.
        #[default]
        PayAsYouGo = 3 => "pay-as-you-go",
    }
}

wire_code! {
    /// Category of a billing line item.
    pub enum BusinessType as "business type" {
        /// Instance usage.
        InstanceUsage = 1 => "instance-usage",
        /// Image storage.
        ImageStorage = 2 => "image-storage",
        /// File storage.
        FileStorage = 3 => "file-storage",
        /// Instance expansion.
        InstanceExpansion = 4 => "instance-expansion",
    }
}

wire_code! {
    /// Save state of a private image.
    pub enum PrivateImageStatus as "private image status" {
        /// Image is being saved.
        Saving = 1 => "saving",
        /// Image was saved.
        Success = 4 => "success",
        /// Image save failed.
        Failed = 5 => "failed",
    }
}

impl InstanceStatus {
    /// Checks if the instance is up and serving.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Checks if the instance is in a transitional state.
    #[must_use]
    pub const fn is_transitioning(self) -> bool {
        !matches!(self, Self::Running | Self::Stopped)
    }
}

/// Protocol of an exposed instance port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortProtocol {
    /// HTTP, exposed through a sub-domain.
    #[default]
    Http,
    /// Raw TCP.
    Tcp,
}

impl std::fmt::Display for PortProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Tcp => f.write_str("tcp"),
        }
    }
}

/// The `{code, msg, data}` wrapper every API response uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// `0` on success, anything else is a logical failure.
    #[serde(default)]
    pub code: i64,
    /// Human-readable reason.
    #[serde(default = "default_msg")]
    pub msg: String,
    /// Operation payload.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

fn default_msg() -> String {
    String::from("success")
}

impl Envelope {
    /// Checks if the envelope reports success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Current page (1-based).
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
    /// Total number of items.
    pub total: u64,
}

/// Converts epoch seconds from the wire into a UTC timestamp.
///
/// Returns `None` for `0` (the API's "never") and out-of-range values.
#[must_use]
pub fn epoch_to_utc(secs: i64) -> Option<DateTime<Utc>> {
    if secs == 0 {
        return None;
    }
    DateTime::from_timestamp(secs, 0)
}
