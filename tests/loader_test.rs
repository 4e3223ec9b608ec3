use loadblocks::compiler::core::CompilerConfig;
use loadblocks::compiler::loader;
use loadblocks::dsl::builder::TestBuilder;
use loadblocks::dsl::{Block, Document};
use std::fs;

#[test]
fn test_load_yaml_document() {
    let yaml_content = r#"
version: 0
library:
  swagger: "2.0"
  info:
    title: "Untitled API"
    version: "0.0.0"
  paths: {}
roots:
  - type: "root"
    top: 0
    left: 0
    block:
      id: "s1"
      type: "scenario"
      name: "Smoke"
      executor:
        id: "s1-executor"
        type: "executor"
        executor:
          type: "constant-vus"
          vus: 1
          duration: "30s"
      step:
        id: "r1"
        type: "http-request"
        name: ""
        method: "get"
        url: "https://example.com/{{id}}"
"#;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("smoke.yaml");
    fs::write(&file_path, yaml_content).expect("Failed to write temp file");

    let loaded = loader::load_document(&file_path).expect("Failed to load document from YAML");

    let expected = TestBuilder::new()
        .scenario("s1", "Smoke")
            .constant_vus(1, "30s")
            .steps(vec![Block::http_request("r1", "get", "https://example.com/{{id}}")])
            .build()
        .build();

    assert_eq!(loaded, expected);

    // Cleanup
    temp_dir.close().expect("Failed to close temp dir");
}

#[test]
fn test_load_json_document_round_trip() {
    let test = TestBuilder::new()
        .scenario("s1", "Smoke")
            .constant_vus(1, "30s")
            .steps(vec![Block::sleep("z1", 1.5)])
            .build()
        .root(Block::http_request("loose", "post", "/x").with_header("Accept", "*/*"))
        .build();

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("test.json");
    let json = serde_json::to_string_pretty(&Document::from(test.clone())).expect("serialize failed");
    fs::write(&file_path, json).expect("Failed to write temp file");

    let loaded = loader::load_document(&file_path).expect("Failed to load document from JSON");
    assert_eq!(loaded, test);
}

#[test]
fn test_load_document_wrong_version() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("future.json");
    fs::write(&file_path, r#"{ "version": 3, "library": {}, "roots": [] }"#).expect("Failed to write temp file");

    let err = loader::load_document(&file_path).expect_err("accepted version 3");
    let message = format!("{:#}", err);
    assert!(message.contains("future.json"));
    assert!(message.contains("unsupported document version 3"));
}

#[test]
fn test_load_missing_file() {
    let err = loader::load_document("/definitely/not/here.yaml").expect_err("loaded a missing file");
    assert!(err.to_string().contains("Failed to read file"));
}

#[test]
fn test_load_environment() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("staging.yaml");
    fs::write(
        &file_path,
        "name: staging\ndescription: shared staging cluster\nvariables:\n  host: https://staging.example.com\n",
    )
    .expect("Failed to write temp file");

    let environment = loader::load_environment(&file_path).expect("Failed to load environment");
    assert_eq!(environment.name, "staging");
    assert_eq!(environment.description.as_deref(), Some("shared staging cluster"));
    assert_eq!(environment.substitute("{{host}}/health"), "https://staging.example.com/health");
}

#[test]
fn test_load_config_with_defaults() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let file_path = temp_dir.path().join("config.yaml");
    fs::write(&file_path, "indent_width: 4\n").expect("Failed to write temp file");

    let config = loader::load_config(&file_path).expect("Failed to load config");
    assert_eq!(config, CompilerConfig { indent_width: 4, warn_unresolved: true });
}
