//! Telemetry metric name constants.
//!
//! Centralised metric names for gleipnir operators. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `gleipnir_`. Counters end in `_total`.
//!
//! # Common labels
//!
//! - `kind`: error classification from [`GleipnirError::kind`](crate::GleipnirError::kind)

/// Total demand forwarded upstream by limit stages (sum of request amounts).
pub const DEMAND_FORWARDED_TOTAL: &str = "gleipnir_demand_forwarded_total";

/// Number of limit stages that self-terminated after delivering their cap.
pub const LIMIT_REACHED_TOTAL: &str = "gleipnir_limit_reached_total";

/// Errors routed to the fallback sink because the consumer was already terminated.
pub const UNDELIVERABLE_ERRORS_TOTAL: &str = "gleipnir_undeliverable_errors_total";

/// Back-pressure protocol violations (zero demand, duplicate subscription, ...).
///
/// Labels: `kind`.
pub const PROTOCOL_VIOLATIONS_TOTAL: &str = "gleipnir_protocol_violations_total";
