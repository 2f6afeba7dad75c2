// tests/config_loading.rs

use std::io::Write;

use tempfile::NamedTempFile;

use batchdag::config::model::{MarkerConfig, PortsConfig, ResourceConfig};
use batchdag::config::load_and_validate;
use batchdag::errors::BatchdagError;
use batchdag::types::{ParamValue, SchedulePolicy};

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn load_err(contents: &str) -> BatchdagError {
    let file = write_config(contents);
    match load_and_validate(file.path()) {
        Err(e) => e,
        Ok(cfg) => panic!("Expected error, got Ok: {:?}", cfg),
    }
}

#[test]
fn test_full_pipeline_file_parses() {
    let file = write_config(
        r#"
[pipeline]
name = "lots"
root = "data"
namespace = "lot1"
trial = true
schedule_policy = "existence_only"
target = ["stagger"]

[task.reverse]
cmd = "rev < {inputs} > {outputs}"
inputs = { file = "0.txt", independent = true }
outputs = "1.txt"
params = { width = 3, label = "x", strict = false }

[task.stagger]
cmd = "cat {inputs.left} {inputs.right} > {outputs}"
after = ["reverse"]
inputs = { left = "1.txt", right = { file = "0.txt", shared_namespace = true } }
outputs = ["2.txt", { folder = "plots" }]
marker = "marker+outputs"
overwrite = true
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let section = cfg.pipeline();
    assert_eq!(section.name, "lots");
    assert_eq!(section.root, "data");
    assert_eq!(section.naming.namespace, Some(ParamValue::Str("lot1".into())));
    assert_eq!(section.naming.trial, Some(true));
    assert_eq!(section.schedule_policy, SchedulePolicy::ExistenceOnly);
    assert_eq!(section.target.as_deref(), Some(&["stagger".to_string()][..]));

    let reverse = &cfg.tasks()["reverse"];
    match reverse.inputs.as_ref().unwrap() {
        PortsConfig::Single(ResourceConfig::Detailed(spec)) => {
            assert_eq!(spec.file.as_deref(), Some("0.txt"));
            assert!(spec.independent);
        }
        other => panic!("Expected a single detailed input, got {other:?}"),
    }
    assert!(matches!(reverse.outputs, Some(PortsConfig::Single(ResourceConfig::Path(ref p))) if p == "1.txt"));
    assert_eq!(reverse.params.get("width"), Some(&ParamValue::Int(3)));
    assert_eq!(reverse.params.get("strict"), Some(&ParamValue::Bool(false)));

    let stagger = &cfg.tasks()["stagger"];
    match stagger.inputs.as_ref().unwrap() {
        PortsConfig::Named(map) => {
            assert_eq!(map.keys().collect::<Vec<_>>(), vec!["left", "right"]);
        }
        other => panic!("Expected named inputs, got {other:?}"),
    }
    match stagger.outputs.as_ref().unwrap() {
        PortsConfig::Ordered(list) => assert_eq!(list.len(), 2),
        other => panic!("Expected ordered outputs, got {other:?}"),
    }
    assert!(matches!(stagger.marker, Some(MarkerConfig::Mode(ref m)) if m == "marker+outputs"));
    assert_eq!(stagger.naming.overwrite, Some(true));
}

#[test]
fn test_defaults_apply_without_pipeline_section() {
    let file = write_config(
        r#"
[task.only]
cmd = "true"
outputs = []
"#,
    );
    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.pipeline().name, "main");
    assert_eq!(cfg.pipeline().root, ".");
    assert_eq!(cfg.pipeline().marker_dir, ".batchdag/markers");
    assert_eq!(cfg.pipeline().schedule_policy, SchedulePolicy::OwnOverwriteFlag);
    assert!(matches!(cfg.tasks()["only"].outputs, Some(PortsConfig::Ordered(ref v)) if v.is_empty()));
}

#[test]
fn test_dag_cycle_returns_structured_error() {
    let err = load_err(
        r#"
[task.A]
cmd = "echo A"
after = ["B"]

[task.B]
cmd = "echo B"
after = ["A"]
"#,
    );
    match err {
        BatchdagError::DagCycle(path) => assert_eq!(path, "A -> B -> A"),
        other => panic!("Expected DagCycle error, got: {:?}", other),
    }
}

#[test]
fn test_unknown_dependency_returns_missing_dependency() {
    let err = load_err(
        r#"
[task.A]
cmd = "echo A"
after = ["NonExistent"]
"#,
    );
    match err {
        BatchdagError::MissingDependency { dependency, referrer } => {
            assert_eq!(dependency, "NonExistent");
            assert_eq!(referrer, "A");
        }
        other => panic!("Expected MissingDependency error, got: {:?}", other),
    }
}

fn assert_config_error(contents: &str, needle: &str) {
    match load_err(contents) {
        BatchdagError::ConfigError(msg) => {
            assert!(msg.contains(needle), "message {msg:?} does not mention {needle:?}")
        }
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_empty_pipeline_is_rejected() {
    assert_config_error("[pipeline]\nname = \"x\"\n", "at least one");
}

#[test]
fn test_task_needs_exactly_one_of_cmd_or_pipeline() {
    assert_config_error("[task.a]\nafter = []\n", "must set one of");
    assert_config_error(
        "[task.a]\ncmd = \"true\"\npipeline = \"other.toml\"\n",
        "both",
    );
}

#[test]
fn test_nested_pipeline_cannot_declare_ports() {
    assert_config_error(
        "[task.a]\npipeline = \"other.toml\"\noutputs = \"x.txt\"\n",
        "nested pipeline",
    );
}

#[test]
fn test_unknown_placeholder_is_rejected() {
    assert_config_error("[task.a]\ncmd = \"echo {bogus}\"\noutputs = []\n", "bogus");
}

#[test]
fn test_invalid_marker_mode_is_rejected() {
    assert_config_error(
        "[task.a]\ncmd = \"true\"\noutputs = []\nmarker = \"sometimes\"\n",
        "sometimes",
    );
}

#[test]
fn test_resource_must_pick_file_or_folder() {
    assert_config_error(
        "[task.a]\ncmd = \"true\"\noutputs = { file = \"a\", folder = \"b\" }\n",
        "exactly one",
    );
    assert_config_error("[task.a]\ncmd = \"true\"\noutputs = \"dir/\"\n", "dir/");
}

#[test]
fn test_unknown_target_is_rejected() {
    assert_config_error(
        "[pipeline]\ntarget = [\"ghost\"]\n\n[task.a]\ncmd = \"true\"\noutputs = []\n",
        "ghost",
    );
}

#[test]
fn test_toml_syntax_error_is_reported() {
    let err = load_err("[task.a\ncmd = 1\n");
    assert!(matches!(err, BatchdagError::TomlError(_)), "got {err:?}");
}
