//! Tests for the payload build service.

#![allow(clippy::expect_used)]

use courier_core::application::services::build_payload;
use courier_core::config::config_under;
use courier_core::domain::{ContractError, EndpointDraft, LogCategory};
use courier_core::infra::MemoryStores;
use uuid::Uuid;

use crate::helpers::installed_package;
use crate::mocks::ScriptedRunner;

fn agent_cfg_json(endpoint_id: Uuid) -> String {
    format!(
        r#"{{
            "agent_config": {{"endpoint_id": "{endpoint_id}", "CALLBACK_INTERVAL": 30}},
            "protocol_config": {{"poll": 10}}
        }}"#
    )
}

#[tokio::test]
async fn build_registers_endpoint_with_build_minted_id() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config_under(tmp.path());
    let stores = MemoryStores::new();
    let package = installed_package(&cfg.package_root, "agentx", "1.0");

    let endpoint_id = Uuid::new_v4();
    let runner = ScriptedRunner::new().on(
        "payload_entry",
        &[
            ("payload-logs.txt", "build ok\n"),
            ("agent_cfg.json", &agent_cfg_json(endpoint_id)),
            ("payload.tar.gz", "artifact-bytes"),
        ],
    );

    let build_args = serde_json::json!({"k": "v"});
    let endpoint = build_payload(
        &cfg,
        &runner,
        &stores.endpoints,
        &stores.logs,
        &package,
        &build_args,
        EndpointDraft {
            name: Some("lab-box".to_string()),
            hostname: None,
            address: Some("10.0.0.9".to_string()),
        },
        None,
        None,
    )
    .await
    .expect("build should succeed");

    // The build, not the server, minted the identifier.
    assert_eq!(endpoint.id, endpoint_id);
    assert!(!endpoint.is_virtual);
    assert!(endpoint.protocol_state.is_none());
    assert_eq!(endpoint.name.as_deref(), Some("lab-box"));

    // Artifact relocated under package identity + endpoint id.
    let expected = cfg
        .payloads_dir()
        .join(format!("agentx-1.0-{endpoint_id}.tar.gz"));
    assert_eq!(endpoint.payload_file.as_deref(), Some(expected.as_path()));
    assert_eq!(
        std::fs::read(&expected).expect("payload stored"),
        b"artifact-bytes"
    );

    // The caller's build args reached the staged directory verbatim.
    let captured = runner
        .captured_input("payload_entry", "build_config.json")
        .expect("build_config.json should have been written before invocation");
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&captured).expect("parse"),
        build_args
    );

    assert_eq!(stores.endpoints.len().expect("len"), 1);
    let logs = stores.logs.all().expect("logs");
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].category, LogCategory::PayloadBuild);
    assert_eq!(logs[0].data, "build ok\n");
}

#[tokio::test]
async fn missing_payload_artifact_fails_with_no_endpoint_but_keeps_the_log() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config_under(tmp.path());
    let stores = MemoryStores::new();
    let package = installed_package(&cfg.package_root, "agentx", "1.0");

    let runner = ScriptedRunner::new().on(
        "payload_entry",
        &[
            ("payload-logs.txt", "build ok\n"),
            ("agent_cfg.json", &agent_cfg_json(Uuid::new_v4())),
        ],
    );

    let err = build_payload(
        &cfg,
        &runner,
        &stores.endpoints,
        &stores.logs,
        &package,
        &serde_json::json!({}),
        EndpointDraft::default(),
        None,
        None,
    )
    .await
    .expect_err("should fail");
    assert!(matches!(
        err.downcast_ref::<ContractError>(),
        Some(ContractError::MissingPayload(_))
    ));

    assert!(stores.endpoints.is_empty().expect("empty"));
    // The log was harvested before the failing step.
    assert_eq!(stores.logs.all().expect("logs").len(), 1);
}

#[tokio::test]
async fn missing_build_log_is_fatal_before_any_other_harvest() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config_under(tmp.path());
    let stores = MemoryStores::new();
    let package = installed_package(&cfg.package_root, "agentx", "1.0");

    let runner = ScriptedRunner::new().on(
        "payload_entry",
        &[
            ("agent_cfg.json", &agent_cfg_json(Uuid::new_v4())),
            ("payload.tar.gz", "artifact-bytes"),
        ],
    );

    let err = build_payload(
        &cfg,
        &runner,
        &stores.endpoints,
        &stores.logs,
        &package,
        &serde_json::json!({}),
        EndpointDraft::default(),
        None,
        None,
    )
    .await
    .expect_err("should fail");
    assert!(matches!(
        err.downcast_ref::<ContractError>(),
        Some(ContractError::MissingLog(_))
    ));
    assert!(stores.endpoints.is_empty().expect("empty"));
    assert!(stores.logs.all().expect("logs").is_empty());
}

#[tokio::test]
async fn missing_final_config_is_fatal_after_the_log_harvest() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config_under(tmp.path());
    let stores = MemoryStores::new();
    let package = installed_package(&cfg.package_root, "agentx", "1.0");

    let runner = ScriptedRunner::new().on(
        "payload_entry",
        &[
            ("payload-logs.txt", "build ok\n"),
            ("payload.tar.gz", "artifact-bytes"),
        ],
    );

    let err = build_payload(
        &cfg,
        &runner,
        &stores.endpoints,
        &stores.logs,
        &package,
        &serde_json::json!({}),
        EndpointDraft::default(),
        None,
        None,
    )
    .await
    .expect_err("should fail");
    assert!(matches!(
        err.downcast_ref::<ContractError>(),
        Some(ContractError::MissingFinalConfig(_))
    ));
    assert!(stores.endpoints.is_empty().expect("empty"));
    assert_eq!(stores.logs.all().expect("logs").len(), 1);
}

#[tokio::test]
async fn staging_a_missing_package_directory_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let cfg = config_under(tmp.path());
    let stores = MemoryStores::new();
    let mut package = installed_package(&cfg.package_root, "agentx", "1.0");
    package.package_dir = cfg.package_root.join("gone");

    let err = build_payload(
        &cfg,
        &ScriptedRunner::new(),
        &stores.endpoints,
        &stores.logs,
        &package,
        &serde_json::json!({}),
        EndpointDraft::default(),
        None,
        None,
    )
    .await
    .expect_err("should fail");
    assert!(
        err.downcast_ref::<courier_core::domain::StagingError>()
            .is_some()
    );
}
