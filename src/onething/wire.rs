//! Typed decoding of envelope payloads.
//!
//! Every response type has a wire form that serde reads directly from the
//! envelope `data`. Types carrying enumerated codes or monetary values get a
//! separate raw wire struct, converted with the checks that serde alone
//! cannot express.

use serde::de::DeserializeOwned;

use crate::error::ValidationError;

/// A response type decoded from a raw wire form.
pub(crate) trait FromWire: Sized {
    /// The shape serde deserializes from the envelope data.
    type Wire: DeserializeOwned;

    /// Converts the raw wire value, rejecting unknown codes.
    fn from_wire(wire: Self::Wire) -> Result<Self, ValidationError>;
}

/// Converts a list of raw wire items.
pub(crate) fn from_wire_all<T: FromWire>(items: Vec<T::Wire>) -> Result<Vec<T>, ValidationError> {
    items.into_iter().map(T::from_wire).collect()
}

/// Rejects negative monetary values.
pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value < 0.0 {
        return Err(ValidationError::field(
            field,
            format!("must be non-negative, got {value}"),
        ));
    }
    Ok(())
}

/// Implements [`FromWire`] for types serde can read as-is.
macro_rules! plain_wire {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::onething::wire::FromWire for $ty {
                type Wire = Self;

                fn from_wire(wire: Self) -> Result<Self, $crate::error::ValidationError> {
                    Ok(wire)
                }
            }
        )+
    };
}

/// Declares a response record together with its raw wire struct.
///
/// `fields` are read as-is, `codes` are read as integers and converted with
/// `TryFrom<i64>`, and the `non_negative` fields are range checked.
macro_rules! coded_record {
    (
        $(#[$meta:meta])*
        pub struct $name:ident via $wire:ident {
            fields {
                $( $(#[$fmeta:meta])* $field:ident : $fty:ty, )*
            }
            codes {
                $( $(#[$cmeta:meta])* $code:ident : $cty:ty, )*
            }
            non_negative [ $( $money:ident ),* $(,)? ]
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $fty, )*
            $( $(#[$cmeta])* pub $code: $cty, )*
        }

        #[derive(Debug, ::serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub(crate) struct $wire {
            $( $(#[$fmeta])* $field: $fty, )*
            $( $(#[$cmeta])* $code: i64, )*
        }

        impl $crate::onething::wire::FromWire for $name {
            type Wire = $wire;

            fn from_wire(wire: $wire) -> Result<Self, $crate::error::ValidationError> {
                $( $crate::onething::wire::ensure_non_negative(stringify!($money), wire.$money)?; )*
                Ok(Self {
                    $( $field: wire.$field, )*
                    $( $code: <$cty>::try_from(wire.$code)?, )*
                })
            }
        }
    };
}

pub(crate) use coded_record;
pub(crate) use plain_wire;
