use recce_state_core::api::{
    Check, ExportOutcome, LoaderOptions, RecceState, Run, RunType, StateErrorKind, StateLoader,
};
use serde_json::json;

#[tokio::test]
async fn exported_state_reloads_with_same_run_and_check() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recce_state.json");

    let run = Run::new(RunType::QueryDiff, json!({"sql": "select 1"}), None);
    let check = Check::from_run(&run, "select one");
    let mut state = RecceState::new();
    state.add_run(run.clone()).unwrap();
    state.add_check(check.clone()).unwrap();

    let mut writer = StateLoader::local(LoaderOptions::local(&path));
    let outcome = writer.export(Some(state)).await;
    assert!(outcome.is_success(), "{outcome}");
    assert_eq!(
        outcome,
        ExportOutcome::Stored(format!("The state file is stored at [{}]", path.display()))
    );

    let mut reader = StateLoader::local(LoaderOptions::local(&path));
    assert!(reader.verify());
    let loaded = reader.load().await.expect("state should load");
    assert_eq!(loaded.runs, vec![run]);
    assert_eq!(loaded.checks, vec![check]);
    assert!(loaded.runs[0].result.is_none());
}

#[tokio::test]
async fn missing_file_yields_empty_loader() {
    let dir = tempfile::tempdir().unwrap();
    let mut loader = StateLoader::local(LoaderOptions::local(dir.path().join("nope.json")));

    assert!(loader.verify());
    assert!(loader.load().await.is_none());
    assert!(!loader.is_loaded());
    assert_eq!(loader.last_load_error(), Some(StateErrorKind::NotFound));
}

#[tokio::test]
async fn unsupported_schema_in_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.json");
    std::fs::write(&path, r#"{"metadata": {"schema_version": "v99"}, "runs": []}"#).unwrap();

    let mut loader = StateLoader::local(LoaderOptions::review(Some(path)));
    assert!(loader.verify());
    let err = loader.try_load().await.unwrap_err();
    assert_eq!(err.kind(), StateErrorKind::SchemaVersion);
    assert!(!loader.is_loaded());
}

#[tokio::test]
async fn export_overwrites_previous_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("recce_state.json");
    let mut loader = StateLoader::local(LoaderOptions::local(&path));

    let mut first = RecceState::new();
    first
        .add_run(Run::new(RunType::Query, json!({"sql_template": "select 1"}), None))
        .unwrap();
    assert!(loader.export(Some(first)).await.is_success());

    assert!(loader.export(Some(RecceState::new())).await.is_success());
    let reloaded = RecceState::from_file(&path).unwrap();
    assert!(reloaded.runs.is_empty());
}
