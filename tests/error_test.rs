use gleipnir::{GleipnirError, Result};

#[test]
fn test_error_display() {
    let err = GleipnirError::Stream("connection reset".to_string());
    assert!(err.to_string().contains("connection reset"));
}

#[test]
fn test_invalid_demand_display() {
    let err = GleipnirError::InvalidDemand(0);
    assert_eq!(err.to_string(), "demand must be positive, got 0");
}

#[test]
fn test_undeliverable_wraps_cause() {
    let err = GleipnirError::Undeliverable(Box::new(GleipnirError::Stream("boom".into())));
    assert!(err.to_string().contains("undeliverable"));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(GleipnirError::NotSubscribed)
    }
    assert!(returns_error().is_err());
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn protocol_violations() {
    assert!(GleipnirError::InvalidDemand(0).is_protocol_violation());
    assert!(GleipnirError::DuplicateSubscription.is_protocol_violation());
    assert!(GleipnirError::NotSubscribed.is_protocol_violation());
}

#[test]
fn stream_failures_are_not_protocol_violations() {
    assert!(!GleipnirError::Stream("x".into()).is_protocol_violation());
    assert!(
        !GleipnirError::Undeliverable(Box::new(GleipnirError::Stream("x".into())))
            .is_protocol_violation()
    );
    assert!(!GleipnirError::Configuration("x".into()).is_protocol_violation());
}

#[test]
fn kinds_are_stable_labels() {
    assert_eq!(GleipnirError::InvalidDemand(3).kind(), "invalid_demand");
    assert_eq!(GleipnirError::DuplicateSubscription.kind(), "duplicate_subscription");
    assert_eq!(GleipnirError::NotSubscribed.kind(), "not_subscribed");
    assert_eq!(GleipnirError::Stream("x".into()).kind(), "stream");
    assert_eq!(GleipnirError::Configuration("x".into()).kind(), "configuration");
}
