use crate::Config;
use crate::tests::{EnvGuard, setup_config_dir, write_config};

use googletest::assert_that;
use googletest::prelude::{anything, err, ok};
use serial_test::serial;

// =========================================================================
// Validation Tests - Process / Retry
// =========================================================================

#[test]
#[serial]
fn given_stop_grace_zero_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _grace = EnvGuard::set("CG_STOP_GRACE_SECS", "0");

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_too_many_restart_attempts_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _attempts = EnvGuard::set("CG_MAX_RESTART_ATTEMPTS", "21");

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_retry_attempts_over_max_when_validate_then_error() {
    // Given
    let (_temp, _guard) = setup_config_dir();
    let _attempts = EnvGuard::set("CG_RETRY_MAX_ATTEMPTS", "11");

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_max_delay_below_base_delay_when_validate_then_error() {
    // Given
    let (temp, _guard) = setup_config_dir();
    write_config(
        &temp,
        r#"
            [retry]
            base_delay_ms = 2000
            max_delay_ms = 1000
        "#,
    );

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_empty_java_path_when_validate_then_error() {
    // Given
    let (temp, _guard) = setup_config_dir();
    write_config(
        &temp,
        r#"
            [game_server]
            java_path = ""
        "#,
    );

    // When
    let result = Config::load().unwrap().validate();

    // Then
    assert_that!(result, err(anything()));
}

#[test]
#[serial]
fn given_empty_stop_command_when_loaded_then_no_stop_command() {
    // Given
    let (temp, _guard) = setup_config_dir();
    write_config(
        &temp,
        r#"
            [game_server]
            stop_command = "  "
        "#,
    );

    // When
    let config = Config::load().unwrap();

    // Then
    assert!(config.game_server.stop_command().is_none());
    assert_that!(config.validate(), ok(anything()));
}
