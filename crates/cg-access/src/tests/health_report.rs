use crate::{ComponentCheck, OverallHealth};

fn healthy() -> ComponentCheck {
    ComponentCheck::healthy("ok")
}

fn unhealthy() -> ComponentCheck {
    ComponentCheck::unhealthy("down")
}

fn not_applicable() -> ComponentCheck {
    ComponentCheck::not_applicable("disabled")
}

#[test]
fn given_all_healthy_when_aggregated_then_healthy() {
    let checks = [healthy(), healthy(), healthy(), healthy()];

    assert_eq!(OverallHealth::from_components(&checks), OverallHealth::Healthy);
}

#[test]
fn given_one_of_four_unhealthy_when_aggregated_then_degraded() {
    let checks = [healthy(), unhealthy(), healthy(), healthy()];

    assert_eq!(OverallHealth::from_components(&checks), OverallHealth::Degraded);
}

#[test]
fn given_two_of_four_unhealthy_when_aggregated_then_unhealthy() {
    let checks = [healthy(), unhealthy(), unhealthy(), healthy()];

    assert_eq!(OverallHealth::from_components(&checks), OverallHealth::Unhealthy);
}

#[test]
fn given_not_applicable_components_when_aggregated_then_excluded_from_ratio() {
    let checks = [healthy(), healthy(), not_applicable(), not_applicable()];

    assert_eq!(OverallHealth::from_components(&checks), OverallHealth::Healthy);
}

#[test]
fn given_one_of_two_applicable_unhealthy_when_aggregated_then_unhealthy() {
    let checks = [healthy(), unhealthy(), not_applicable(), not_applicable()];

    assert_eq!(OverallHealth::from_components(&checks), OverallHealth::Unhealthy);
}

#[test]
fn given_nothing_applicable_when_aggregated_then_healthy() {
    let checks = [not_applicable(), not_applicable()];

    assert_eq!(OverallHealth::from_components(&checks), OverallHealth::Healthy);
}

#[test]
fn given_every_probe_failed_when_aggregated_then_error() {
    let checks = [
        ComponentCheck::probe_failed("timed out"),
        ComponentCheck::probe_failed("timed out"),
        not_applicable(),
    ];

    assert_eq!(OverallHealth::from_components(&checks), OverallHealth::Error);
}

#[test]
fn given_degraded_when_is_up_then_true() {
    assert!(OverallHealth::Degraded.is_up());
    assert!(!OverallHealth::Unhealthy.is_up());
    assert!(!OverallHealth::Error.is_up());
}
