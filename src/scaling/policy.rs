//! Autoscaling policy evaluation with per-direction cooldowns.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default CPU usage threshold (percent).
pub const DEFAULT_CPU_THRESHOLD: f64 = 80.0;

/// Default memory usage threshold (percent).
pub const DEFAULT_MEMORY_THRESHOLD: f64 = 80.0;

/// Default cooldown for both directions.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// A metrics snapshot of one monitored instance.
///
/// Missing values default to `0`, which satisfies the scale-down condition.
/// An incomplete snapshot therefore reads as an idle instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Metrics {
    /// CPU usage (percent).
    pub cpu_usage: f64,
    /// Memory usage (percent).
    pub memory_usage: f64,
}

impl Metrics {
    /// Creates a snapshot.
    #[must_use]
    pub const fn new(cpu_usage: f64, memory_usage: f64) -> Self {
        Self {
            cpu_usage,
            memory_usage,
        }
    }

    /// Reads `cpu_usage` and `memory_usage` from an untyped snapshot.
    #[must_use]
    pub fn from_map(values: &HashMap<String, f64>) -> Self {
        Self {
            cpu_usage: values.get("cpu_usage").copied().unwrap_or_default(),
            memory_usage: values.get("memory_usage").copied().unwrap_or_default(),
        }
    }
}

/// Time of the last decision in each direction.
///
/// `None` means the direction has never fired and is ready.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CooldownState {
    /// Last time a scale-up was decided.
    pub last_scale_up_at: Option<Instant>,
    /// Last time a scale-down was decided.
    pub last_scale_down_at: Option<Instant>,
}

/// Outcome of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    /// Whether scaling should happen.
    pub triggered: bool,
    /// State to pass to the next evaluation.
    pub state: CooldownState,
}

/// Combined decision for one polling tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleDecision {
    /// Add capacity.
    Up,
    /// Remove capacity.
    Down,
    /// Do nothing.
    Hold,
}

/// Threshold policy with independent scale-up and scale-down cooldowns.
#[derive(Debug, Clone, PartialEq)]
pub struct AutoscalingPolicy {
    /// CPU usage above which to scale up.
    pub cpu_threshold: f64,
    /// Memory usage above which to scale up.
    pub memory_threshold: f64,
    /// Minimum time between two scale-ups.
    pub scale_up_cooldown: Duration,
    /// Minimum time between two scale-downs.
    pub scale_down_cooldown: Duration,
}

impl Default for AutoscalingPolicy {
    fn default() -> Self {
        Self {
            cpu_threshold: DEFAULT_CPU_THRESHOLD,
            memory_threshold: DEFAULT_MEMORY_THRESHOLD,
            scale_up_cooldown: DEFAULT_COOLDOWN,
            scale_down_cooldown: DEFAULT_COOLDOWN,
        }
    }
}

impl AutoscalingPolicy {
    /// Decides whether to scale up.
    ///
    /// Fires when CPU or memory usage exceeds its threshold and the scale-up
    /// cooldown has elapsed; the returned state then records `now`.
    #[must_use]
    pub fn should_scale_up(
        &self,
        metrics: &Metrics,
        state: CooldownState,
        now: Instant,
    ) -> Evaluation {
        if cooling_down(state.last_scale_up_at, self.scale_up_cooldown, now) {
            return Evaluation {
                triggered: false,
                state,
            };
        }

        let triggered = metrics.cpu_usage > self.cpu_threshold
            || metrics.memory_usage > self.memory_threshold;

        let state = if triggered {
            debug!(
                "Scale up: cpu {:.1} / {:.1}, memory {:.1} / {:.1}",
                metrics.cpu_usage, self.cpu_threshold, metrics.memory_usage, self.memory_threshold
            );
            CooldownState {
                last_scale_up_at: Some(now),
                ..state
            }
        } else {
            state
        };

        Evaluation { triggered, state }
    }

    /// Decides whether to scale down.
    ///
    /// Fires when both CPU and memory usage are below half their thresholds
    /// and the scale-down cooldown has elapsed.
    #[must_use]
    pub fn should_scale_down(
        &self,
        metrics: &Metrics,
        state: CooldownState,
        now: Instant,
    ) -> Evaluation {
        if cooling_down(state.last_scale_down_at, self.scale_down_cooldown, now) {
            return Evaluation {
                triggered: false,
                state,
            };
        }

        let triggered = metrics.cpu_usage < self.cpu_threshold / 2.0
            && metrics.memory_usage < self.memory_threshold / 2.0;

        let state = if triggered {
            debug!(
                "Scale down: cpu {:.1}, memory {:.1}",
                metrics.cpu_usage, metrics.memory_usage
            );
            CooldownState {
                last_scale_down_at: Some(now),
                ..state
            }
        } else {
            state
        };

        Evaluation { triggered, state }
    }
}

fn cooling_down(last: Option<Instant>, cooldown: Duration, now: Instant) -> bool {
    last.is_some_and(|at| now.saturating_duration_since(at) < cooldown)
}

/// A policy bound to the cooldown state of one monitored instance.
///
/// Evaluation takes `&mut self`, so one evaluator cannot be polled from two
/// places at once without external synchronization.
#[derive(Debug, Clone, Default)]
pub struct AutoscalingEvaluator {
    /// The policy.
    policy: AutoscalingPolicy,
    /// Cooldown timers.
    state: CooldownState,
}

impl AutoscalingEvaluator {
    /// Creates an evaluator with both directions ready.
    #[must_use]
    pub fn new(policy: AutoscalingPolicy) -> Self {
        Self {
            policy,
            state: CooldownState::default(),
        }
    }

    /// Returns the policy.
    #[must_use]
    pub const fn policy(&self) -> &AutoscalingPolicy {
        &self.policy
    }

    /// Returns the current cooldown state.
    #[must_use]
    pub const fn state(&self) -> CooldownState {
        self.state
    }

    /// Decides whether to scale up now.
    pub fn should_scale_up(&mut self, metrics: &Metrics) -> bool {
        self.should_scale_up_at(metrics, Instant::now())
    }

    /// Decides whether to scale down now.
    pub fn should_scale_down(&mut self, metrics: &Metrics) -> bool {
        self.should_scale_down_at(metrics, Instant::now())
    }

    /// Decides whether to scale up at `now`.
    pub fn should_scale_up_at(&mut self, metrics: &Metrics, now: Instant) -> bool {
        let evaluation = self.policy.should_scale_up(metrics, self.state, now);
        self.state = evaluation.state;
        evaluation.triggered
    }

    /// Decides whether to scale down at `now`.
    pub fn should_scale_down_at(&mut self, metrics: &Metrics, now: Instant) -> bool {
        let evaluation = self.policy.should_scale_down(metrics, self.state, now);
        self.state = evaluation.state;
        evaluation.triggered
    }

    /// Evaluates scale-up first and scale-down only if no scale-up fired.
    pub fn decide_at(&mut self, metrics: &Metrics, now: Instant) -> ScaleDecision {
        if self.should_scale_up_at(metrics, now) {
            ScaleDecision::Up
        } else if self.should_scale_down_at(metrics, now) {
            ScaleDecision::Down
        } else {
            ScaleDecision::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_up_respects_cooldown() {
        let policy = AutoscalingPolicy::default();
        let metrics = Metrics::new(90.0, 10.0);
        let start = Instant::now();

        let first = policy.should_scale_up(&metrics, CooldownState::default(), start);
        assert!(first.triggered);
        assert_eq!(first.state.last_scale_up_at, Some(start));

        let second = policy.should_scale_up(&metrics, first.state, start);
        assert!(!second.triggered);

        let later = start + policy.scale_up_cooldown;
        let third = policy.should_scale_up(&metrics, second.state, later);
        assert!(third.triggered);
        assert_eq!(third.state.last_scale_up_at, Some(later));
    }

    #[test]
    fn test_scale_up_on_memory_only() {
        let policy = AutoscalingPolicy::default();
        let evaluation = policy.should_scale_up(
            &Metrics::new(10.0, 95.0),
            CooldownState::default(),
            Instant::now(),
        );
        assert!(evaluation.triggered);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let policy = AutoscalingPolicy::default();
        let evaluation =
            policy.should_scale_up(&Metrics::new(80.0, 80.0), CooldownState::default(), Instant::now());
        assert!(!evaluation.triggered);
        assert!(evaluation.state.last_scale_up_at.is_none());
    }

    #[test]
    fn test_scale_down_below_half_thresholds() {
        let policy = AutoscalingPolicy::default();
        let now = Instant::now();

        let evaluation = policy.should_scale_down(&Metrics::new(10.0, 10.0), CooldownState::default(), now);
        assert!(evaluation.triggered);
        assert_eq!(evaluation.state.last_scale_down_at, Some(now));
        assert!(evaluation.state.last_scale_up_at.is_none());

        let busy = policy.should_scale_down(&Metrics::new(10.0, 50.0), CooldownState::default(), now);
        assert!(!busy.triggered);
    }

    #[test]
    fn test_directions_have_independent_cooldowns() {
        let mut evaluator = AutoscalingEvaluator::default();
        let now = Instant::now();

        assert!(evaluator.should_scale_up_at(&Metrics::new(95.0, 0.0), now));
        assert!(evaluator.should_scale_down_at(&Metrics::new(1.0, 1.0), now));
        assert!(!evaluator.should_scale_down_at(&Metrics::new(1.0, 1.0), now));
    }

    #[test]
    fn test_missing_metrics_read_as_idle() {
        let metrics = Metrics::from_map(&HashMap::new());
        assert_eq!(metrics, Metrics::default());

        let mut evaluator = AutoscalingEvaluator::default();
        assert!(evaluator.should_scale_down(&metrics));
    }

    #[test]
    fn test_decide_prefers_scale_up() {
        let policy = AutoscalingPolicy {
            cpu_threshold: 50.0,
            memory_threshold: 50.0,
            scale_up_cooldown: Duration::from_secs(60),
            scale_down_cooldown: Duration::from_secs(60),
        };
        let mut evaluator = AutoscalingEvaluator::new(policy);
        let now = Instant::now();

        assert_eq!(evaluator.decide_at(&Metrics::new(70.0, 10.0), now), ScaleDecision::Up);
        assert_eq!(evaluator.decide_at(&Metrics::new(30.0, 30.0), now), ScaleDecision::Hold);
        assert_eq!(evaluator.decide_at(&Metrics::new(10.0, 10.0), now), ScaleDecision::Down);
    }

    #[test]
    fn test_metrics_deserialize_with_missing_keys() {
        let metrics: Metrics = serde_json::from_str(r#"{ "cpu_usage": 42.0 }"#).unwrap();
        assert_eq!(metrics, Metrics::new(42.0, 0.0));
    }
}
