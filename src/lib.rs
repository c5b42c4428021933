// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![deny(unsafe_code)]                 // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![warn(dead_code)]                   // Unused code is reported
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![warn(unused_imports)]              // Unused imports are reported
#![warn(unused_variables)]            // Unused variables are reported
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # OneThing Pilot
//!
//! A typed client SDK and CLI for the OneThingAI GPU-instance API.
//!
//! ## Overview
//!
//! - Authenticated JSON transport with per-attempt timeouts and linear
//!   backoff retries
//! - One method per remote operation, with validated requests and typed
//!   responses
//! - Enumerated wire codes decoded into enums; unknown codes are rejected
//! - A threshold autoscaling policy with per-direction cooldowns
//!
//! ## Modules
//!
//! - [`onething`]: Transport, resource client and wire types
//! - [`scaling`]: Autoscaling policy evaluation
//! - [`config`]: Configuration parsing and validation
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```no_run
//! use onething_pilot::onething::{OneThingClient, QueryInstances};
//!
//! # async fn example() -> onething_pilot::Result<()> {
//! let client = OneThingClient::new("my-api-key")?;
//! let instances = client.list_instances(&QueryInstances::new(1, 20)?).await?;
//! for instance in &instances.app_list {
//!     println!("{} {}", instance.app_id, instance.status);
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod error;
pub mod onething;
pub mod scaling;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, ConfigValidator, PilotConfig};
pub use error::{ConfigError, PilotError, Result, TransportError, ValidationError};
pub use onething::{CallOptions, HttpTransport, OneThingClient, Operation, Transport};
pub use scaling::{AutoscalingEvaluator, AutoscalingPolicy, Metrics};
