// tests/naming_resolution.rs

use batchdag::errors::BatchdagError;
use batchdag::naming::{resolve, AttrLayer, BindContext, Modifiers, NamingExt};
use batchdag::resource::{File, Resource};

fn ctx(namespace: &str, trial: bool) -> BindContext {
    BindContext::top_level(Some(namespace.to_string()), trial, false)
}

fn bound_name(mut file: File, ctx: &BindContext) -> String {
    file.bind(ctx).unwrap();
    file.file_name().unwrap()
}

#[test]
fn test_modifiers_decide_which_segments_apply() {
    let ctx = ctx("N", true);

    assert_eq!(bound_name(File::new("data", "b"), &ctx), "N_trial_b");
    assert_eq!(bound_name(File::new("data", "b").independent(), &ctx), "b");
    assert_eq!(bound_name(File::new("data", "b").shared_namespace(), &ctx), "trial_b");
    assert_eq!(bound_name(File::new("data", "b").namespace_only(), &ctx), "N_b");
}

#[test]
fn test_non_trial_run_has_no_trial_segment() {
    let ctx = ctx("lot7", false);
    assert_eq!(bound_name(File::new("data", "scan.csv"), &ctx), "lot7_scan.csv");
    assert_eq!(bound_name(File::new("data", "scan.csv").shared_namespace(), &ctx), "scan.csv");
}

#[test]
fn test_path_joins_dir_and_decorated_name() {
    let mut file = File::new("data/raw", "b.txt");
    file.bind(&ctx("N", false)).unwrap();
    assert_eq!(file.path().unwrap(), std::path::PathBuf::from("data/raw/N_b.txt"));
}

#[test]
fn test_instance_beats_declared_beats_inherited() {
    let ctx = ctx("inherited", false);
    let declared = AttrLayer {
        namespace: Some("declared".into()),
        ..AttrLayer::default()
    };

    assert_eq!(
        bound_name(File::new("d", "x").with_declared(declared.clone()), &ctx),
        "declared_x"
    );
    assert_eq!(
        bound_name(
            File::new("d", "x").with_declared(declared).with_namespace("instance"),
            &ctx
        ),
        "instance_x"
    );
    assert_eq!(bound_name(File::new("d", "x").with_trial(true), &ctx), "inherited_trial_x");
}

#[test]
fn test_missing_trial_is_unresolved() {
    let mut file = File::new("data", "b");
    let err = file.bind(&BindContext::default()).unwrap_err();

    match err {
        BatchdagError::UnresolvedAttribute { attribute, .. } => assert_eq!(attribute, "trial"),
        other => panic!("Expected UnresolvedAttribute, got: {:?}", other),
    }
}

#[test]
fn test_missing_overwrite_is_unresolved() {
    let ctx = BindContext {
        namespace: Some("N".into()),
        trial: Some(false),
        overwrite: None,
        ..BindContext::default()
    };
    let mut file = File::new("data", "b");
    let err = file.bind(&ctx).unwrap_err();

    match err {
        BatchdagError::UnresolvedAttribute { attribute, owner } => {
            assert_eq!(attribute, "overwrite");
            assert_eq!(owner, "b");
        }
        other => panic!("Expected UnresolvedAttribute, got: {:?}", other),
    }
}

#[test]
fn test_non_string_namespace_is_invalid_type() {
    let mut file = File::new("data", "b").with_namespace(7i64);
    let err = file.bind(&ctx("N", false)).unwrap_err();
    assert!(matches!(err, BatchdagError::InvalidType { .. }), "got {err:?}");
}

#[test]
fn test_ignored_namespace_is_not_type_checked() {
    let file = File::new("data", "b").with_namespace(true).independent();
    assert_eq!(bound_name(file, &ctx("N", true)), "b");
}

#[test]
fn test_resolve_without_namespace_leaves_it_absent() {
    let resolved = resolve(
        "owner",
        &AttrLayer::default(),
        &AttrLayer::default(),
        Modifiers::default(),
        &BindContext::top_level(None, true, true),
    )
    .unwrap();

    assert_eq!(resolved.namespace, None);
    assert!(resolved.trial);
    assert!(resolved.overwrite);
    assert_eq!(resolved.decorate("b"), "trial_b");
}

#[test]
fn test_rebinding_replaces_resolution() {
    let mut file = File::new("data", "b");
    file.bind(&ctx("first", false)).unwrap();
    file.bind(&ctx("second", false)).unwrap();
    assert_eq!(file.file_name().unwrap(), "second_b");
}

#[test]
fn test_unbound_resource_is_not_ready() {
    let file = File::new("data", "b");
    assert!(!file.is_ready());
    assert!(matches!(file.path(), Err(BatchdagError::NotReady(_))));
}
