//! Shared fixtures for the unit suite.

#![allow(clippy::expect_used, dead_code)]

use std::path::{Path, PathBuf};

use chrono::Utc;
use flate2::Compression;
use flate2::write::GzEncoder;
use uuid::Uuid;

use courier_core::domain::{
    Endpoint, EndpointConfig, EndpointDraft, Message, Package, PackageIdentity,
};

/// Build an `ExitStatus` from a logical exit code (cross-platform).
#[cfg(unix)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    std::process::ExitStatus::from_raw(code << 8)
}

#[cfg(windows)]
pub fn exit_status(code: i32) -> std::process::ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    #[allow(clippy::cast_sign_loss)]
    std::process::ExitStatus::from_raw(code as u32)
}

/// Write a tar.gz bundle holding the given (path, contents) entries.
pub fn write_bundle(path: &Path, entries: &[(&str, &str)]) {
    let file = std::fs::File::create(path).expect("create bundle");
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, contents) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .expect("append entry");
    }
    builder
        .into_inner()
        .expect("finish tar")
        .finish()
        .expect("finish gzip");
}

/// Descriptor JSON declaring the given identity.
pub fn descriptor_json(name: &str, version: &str) -> String {
    format!(r#"{{"name":"{name}","version":"{version}","description":"test agent"}}"#)
}

/// A Makefile-only bundle; the scripted runner supplies the metadata the
/// install target would generate.
pub fn minimal_bundle(dir: &Path, file_name: &str) -> PathBuf {
    let bundle = dir.join(file_name);
    write_bundle(&bundle, &[("Makefile", "install:\n\ttrue\n")]);
    bundle
}

/// Materialize an installed package on disk (Makefile plus metadata) and
/// return its record, without going through the installer.
pub fn installed_package(root: &Path, name: &str, version: &str) -> Package {
    let identity = PackageIdentity::new(name, version);
    let package_dir = root.join(format!("{identity}"));
    std::fs::create_dir_all(&package_dir).expect("create package dir");
    std::fs::write(package_dir.join("Makefile"), "payload_entry:\n\ttrue\n").expect("write");
    std::fs::write(package_dir.join("agent.json"), descriptor_json(name, version))
        .expect("write");
    std::fs::write(package_dir.join("commands.json"), "[]").expect("write");
    std::fs::write(package_dir.join("protocols.json"), "[]").expect("write");
    Package {
        identity,
        package_dir,
        bundle_file: root.join("unused-bundle.tar.gz"),
        bundle_sha256: "0".repeat(64),
        installed_at: Utc::now(),
    }
}

/// An endpoint built from `package` with a fresh build-minted id.
pub fn endpoint_for(package: &Package) -> Endpoint {
    let endpoint_id = Uuid::new_v4();
    let config: EndpointConfig = serde_json::from_str(&format!(
        r#"{{
            "agent_config": {{"endpoint_id": "{endpoint_id}", "CALLBACK_INTERVAL": 20}},
            "protocol_config": {{"poll": 10}}
        }}"#
    ))
    .expect("config");
    Endpoint::from_build(
        config,
        package.identity.clone(),
        package.package_dir.join("payload.tar.gz"),
        EndpointDraft {
            name: Some("lab-box".to_string()),
            hostname: Some("lab-box.local".to_string()),
            address: Some("10.0.0.9".to_string()),
        },
    )
}

/// A command-request message with the given id.
pub fn message(id: Uuid) -> Message {
    Message {
        message_id: id,
        message_type: "command_request".to_string(),
        request_id: None,
        timestamp: None,
        payload: serde_json::json!({"cmd": "whoami"}),
    }
}

/// A command-response message answering `request`.
pub fn response(id: Uuid, request: Uuid) -> Message {
    Message {
        message_id: id,
        message_type: "command_response".to_string(),
        request_id: Some(request),
        timestamp: None,
        payload: serde_json::json!({"stdout": "ok"}),
    }
}

/// Serialize a batch for a scripted `messages.json`.
pub fn batch_json(messages: &[Message]) -> String {
    serde_json::to_string(messages).expect("serialize batch")
}
