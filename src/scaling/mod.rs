//! Threshold-based autoscaling policy.
//!
//! The policy is independent of the API client: it only decides, callers
//! act on the decision.

mod policy;

pub use policy::{
    AutoscalingEvaluator, AutoscalingPolicy, CooldownState, Evaluation, Metrics, ScaleDecision,
    DEFAULT_COOLDOWN, DEFAULT_CPU_THRESHOLD, DEFAULT_MEMORY_THRESHOLD,
};
