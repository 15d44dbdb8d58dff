use super::{BASE_DOMAIN, build_platform, test_config};
use crate::{DaemonError, Platform};

use cg_access::{OverallHealth, PublicAccessStatus};
use cg_dns::DnsRecordType;
use cg_process::ProcessStatus;
use googletest::prelude::*;

// =========================================================================
// Construction
// =========================================================================

#[test]
fn given_missing_dns_credentials_when_from_config_then_dns_error() {
    // Given
    let config = test_config();

    // When
    let result = Platform::from_config(&config);

    // Then
    assert!(matches!(result, Err(DaemonError::Dns { .. })));
}

#[tokio::test]
async fn given_dns_credentials_when_from_config_then_everything_idle() {
    // Given
    let mut config = test_config();
    config.dns.api_token = Some(String::from("token"));
    config.dns.zone_id = Some(String::from("zone"));
    config.dns.base_domain = Some(String::from(BASE_DOMAIN));

    // When
    let platform = Platform::from_config(&config).unwrap();

    // Then
    let status = platform.integrated_status();
    assert_that!(status.game_server.status, eq(ProcessStatus::Stopped));
    assert_that!(status.tunnel.status, eq(ProcessStatus::Stopped));
    assert_that!(status.public_access.status, eq(PublicAccessStatus::Disabled));
    assert_that!(status.dns.base_domain, eq(BASE_DOMAIN));
    assert!(status.dns.managed_records.is_empty());
    assert!(!status.health.monitoring);
    assert!(status.health.latest.is_none());
}

// =========================================================================
// Game server
// =========================================================================

#[tokio::test]
async fn given_missing_java_when_start_server_then_failure_with_hint() {
    // Given
    let (platform, _) = build_platform(&test_config());

    // When
    let outcome = platform.start_server().await;

    // Then
    assert!(!outcome.success);
    assert_that!(outcome.message, contains_substring("Check the configured path"));
}

#[tokio::test]
async fn given_stopped_server_when_send_command_then_not_running_reported() {
    // Given
    let (platform, _) = build_platform(&test_config());

    // When
    let outcome = platform.send_command("say hello").await;

    // Then
    assert!(!outcome.success);
    assert_that!(outcome.message, contains_substring("not running"));
}

#[tokio::test]
async fn given_blank_command_when_send_command_then_rejected() {
    // Given
    let (platform, _) = build_platform(&test_config());

    // When
    let outcome = platform.send_command("   ").await;

    // Then
    assert!(!outcome.success);
    assert_that!(outcome.message, eq("Command cannot be empty"));
}

#[tokio::test]
async fn given_stopped_server_when_stop_then_success() {
    // Given
    let (platform, _) = build_platform(&test_config());

    // When
    let outcome = platform.stop_server(false).await;

    // Then
    assert!(outcome.success, "{}", outcome.message);
}

#[cfg(unix)]
#[tokio::test]
async fn given_scripted_server_when_started_then_ready_tracks_players_and_stops_on_command() {
    use std::time::Duration;

    const SCRIPT: &str = r#"
echo '[20:40:13] [Server thread/INFO]: Done (0.2s)! For help, type "help"'
echo '[20:40:14] [Server thread/INFO]: Steve joined the game'
while read line; do
  if [ "$line" = "stop" ]; then
    exit 0
  fi
done
"#;

    // Given
    let directory = tempfile::TempDir::new().unwrap();
    let mut config = test_config();
    config.game_server.java_path = String::from("sh");
    config.game_server.jvm_args = vec![String::from("-c"), String::from(SCRIPT)];
    config.game_server.server_args = Vec::new();
    config.game_server.directory = directory.path().display().to_string();
    let (platform, _) = build_platform(&config);

    // When
    let started = platform.start_server().await;

    // Then
    assert!(started.success, "{}", started.message);
    assert_that!(
        platform.integrated_status().game_server.status,
        eq(ProcessStatus::Running)
    );

    let joined = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let state = platform.integrated_status().server_state;
            if state.online_players.contains("Steve") {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap();
    assert!(joined.is_ready());

    // When
    let sent = platform.send_command("say hello").await;
    let stopped = platform.stop_server(false).await;

    // Then
    assert!(sent.success, "{}", sent.message);
    assert!(stopped.success, "{}", stopped.message);
    let status = platform.integrated_status();
    assert_that!(status.game_server.status, eq(ProcessStatus::Stopped));
    assert_that!(status.game_server.last_exit_code, some(eq(0i32)));
}

// =========================================================================
// Public access
// =========================================================================

#[tokio::test]
async fn given_disabled_when_test_connectivity_then_failure() {
    // Given
    let (platform, _) = build_platform(&test_config());

    // When
    let outcome = platform.test_connectivity().await;

    // Then
    assert!(!outcome.success);
    assert_that!(outcome.message, contains_substring("disabled"));
}

#[tokio::test]
async fn given_disabled_when_disable_public_access_then_success() {
    // Given
    let (platform, _) = build_platform(&test_config());

    // When
    let outcome = platform.disable_public_access().await;

    // Then
    assert!(outcome.success);
    assert_that!(
        platform.public_access_status().status,
        eq(PublicAccessStatus::Disabled)
    );
}

#[tokio::test]
async fn given_missing_tunnel_binary_when_enable_then_failure_and_no_records() {
    // Given
    let (platform, zone) = build_platform(&test_config());

    // When
    let outcome = platform.enable_public_access(Some("play")).await;

    // Then
    assert!(!outcome.success);
    assert_that!(outcome.message, contains_substring("Failed to enable public access"));
    assert!(zone.records().is_empty());
    assert!(platform.public_access_status().last_error.is_some());
}

// =========================================================================
// DNS
// =========================================================================

#[tokio::test]
async fn given_no_target_and_no_tunnel_endpoint_when_update_dns_then_failure() {
    // Given
    let (platform, zone) = build_platform(&test_config());

    // When
    let outcome = platform
        .update_dns_record("play", None, DnsRecordType::Alias)
        .await;

    // Then
    assert!(!outcome.success);
    assert_that!(outcome.message, contains_substring("tunnel has not reported an endpoint"));
    assert!(zone.records().is_empty());
}

#[tokio::test]
async fn given_explicit_target_when_update_dns_twice_then_created_then_updated() {
    // Given
    let (platform, zone) = build_platform(&test_config());

    // When
    let created = platform
        .update_dns_record("mc", Some("host.example"), DnsRecordType::Alias)
        .await;
    let updated = platform
        .update_dns_record("mc", Some("other.example"), DnsRecordType::Alias)
        .await;

    // Then
    assert_that!(created.message, eq("Created ALIAS record mc.example.com -> host.example"));
    assert_that!(updated.message, eq("Updated ALIAS record mc.example.com -> other.example"));

    let records = zone.records();
    assert_eq!(records.len(), 1);
    assert_that!(records[0].content, eq("other.example"));

    let status = platform.dns_status();
    assert_eq!(status.managed_records.len(), 1);
    assert_that!(status.managed_records[0].target, eq("other.example"));
}

#[tokio::test]
async fn given_managed_record_when_removed_twice_then_both_succeed() {
    // Given
    let (platform, zone) = build_platform(&test_config());
    platform
        .update_dns_record("mc", Some("host.example"), DnsRecordType::Alias)
        .await;

    // When
    let removed = platform.remove_dns_record("mc", DnsRecordType::Alias).await;
    let again = platform.remove_dns_record("mc", DnsRecordType::Alias).await;

    // Then
    assert!(removed.success);
    assert_that!(removed.message, eq("Removed ALIAS record mc.example.com"));
    assert!(again.success);
    assert_that!(again.message, contains_substring("nothing to remove"));
    assert!(zone.records().is_empty());
    assert!(platform.dns_status().managed_records.is_empty());
}

// =========================================================================
// Health and shutdown
// =========================================================================

#[tokio::test]
async fn given_idle_platform_when_check_health_then_healthy_and_summarized() {
    // Given
    let (platform, _) = build_platform(&test_config());

    // When
    let report = platform.check_health().await;

    // Then
    assert_that!(report.overall, eq(OverallHealth::Healthy));
    let status = platform.integrated_status();
    assert_eq!(status.health.metrics.total_checks, 1);
    assert_that!(status.health.latest.map(|r| r.overall), some(eq(OverallHealth::Healthy)));

    let json = serde_json::to_value(platform.integrated_status()).unwrap();
    assert!(json.get("public_access").is_some());
    assert!(json["health"].get("metrics").is_some());
}

#[tokio::test]
async fn given_monitoring_when_shutdown_then_monitoring_stopped_and_idle() {
    // Given
    let (platform, _) = build_platform(&test_config());
    platform.start_health_monitoring();
    assert!(platform.integrated_status().health.monitoring);

    // When
    platform.shutdown().await;

    // Then
    let status = platform.integrated_status();
    assert!(!status.health.monitoring);
    assert_that!(status.game_server.status, eq(ProcessStatus::Stopped));
    assert_that!(status.tunnel.status, eq(ProcessStatus::Stopped));
    assert_that!(status.public_access.status, eq(PublicAccessStatus::Disabled));
}
