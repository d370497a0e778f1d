//! Handlers for the state subcommands.
use recce_state_core::api::{AppConfig, GitRepoInfo, RecceState, StateLoader};
use recce_state_plugins::factory;

use super::cli::{ExportArgs, InitArgs, LoaderArgs, ShowArgs};
use super::EXIT_STORAGE;

fn report_failure(loader: &StateLoader) {
    if let (_, Some(hint)) = loader.error_and_hint() {
        eprintln!("Hint: {hint}");
    }
}

pub async fn handle_init(args: InitArgs, cfg: &AppConfig) -> anyhow::Result<i32> {
    let mut state = RecceState::new();
    if let Some(branch) = args.branch {
        state.git = GitRepoInfo::from_current_repository(&move || Some(branch.clone()));
    }

    let mut loader = factory::build_state_loader(args.target.to_options(), cfg)?;
    let outcome = loader.export(Some(state)).await;
    if outcome.is_success() {
        println!("{outcome}");
        Ok(0)
    } else {
        eprintln!("{outcome}");
        report_failure(&loader);
        Ok(EXIT_STORAGE)
    }
}

pub async fn handle_verify(args: LoaderArgs, cfg: &AppConfig) -> anyhow::Result<i32> {
    let mut loader = factory::build_state_loader(args.to_options(), cfg)?;
    if loader.verify() {
        match loader.storage_kind() {
            Some(kind) => println!(
                "OK: {} ({})",
                kind.as_str(),
                if kind.is_remote() { "remote" } else { "local" }
            ),
            None => println!("OK (no persistence)"),
        }
        return Ok(0);
    }

    let (error, hint) = loader.error_and_hint();
    eprintln!("{}", error.unwrap_or("Verification failed."));
    if let Some(hint) = hint {
        eprintln!("Hint: {hint}");
    }
    Ok(super::EXIT_CONFIG)
}

pub async fn handle_show(args: ShowArgs, cfg: &AppConfig) -> anyhow::Result<i32> {
    let mut loader = factory::build_state_loader(args.source.to_options(), cfg)?;
    let state = loader.try_load().await?;

    if args.json {
        println!("{}", state.to_json()?);
        return Ok(0);
    }

    print!("{}", summarize(state));
    Ok(0)
}

pub async fn handle_export(args: ExportArgs, cfg: &AppConfig) -> anyhow::Result<i32> {
    let state = RecceState::from_file(&args.input)?;
    tracing::debug!(
        target: "recce.state",
        stage = "cli.export.in",
        input = %args.input.display(),
        runs = state.runs.len(),
        checks = state.checks.len()
    );

    let mut loader = factory::build_state_loader(args.target.to_options(), cfg)?;
    let outcome = loader.export(Some(state)).await;
    if outcome.is_success() {
        println!("{outcome}");
        Ok(0)
    } else {
        eprintln!("{outcome}");
        report_failure(&loader);
        Ok(EXIT_STORAGE)
    }
}

pub fn summarize(state: &RecceState) -> String {
    let mut out = String::new();
    out.push_str(&format!("Schema version: {}\n", state.schema_version()));
    if let Some(meta) = &state.metadata {
        if let Some(v) = &meta.tool_version {
            out.push_str(&format!("Recce version: {v}\n"));
        }
        if let Some(at) = &meta.generated_at {
            out.push_str(&format!("Generated at: {at}\n"));
        }
    }
    if let Some(branch) = state.git.as_ref().and_then(|g| g.branch.as_deref()) {
        out.push_str(&format!("Branch: {branch}\n"));
    }
    if let Some(pr) = &state.pull_request {
        let id = pr.id.as_ref().map(|id| id.to_string()).unwrap_or_default();
        let repo = pr.repository.as_deref().unwrap_or("-");
        out.push_str(&format!("Pull request: {repo}#{id}\n"));
    }
    out.push_str(&format!("Runs: {}\n", state.runs.len()));
    for run in &state.runs {
        out.push_str(&format!("  {} {} {}\n", run.id, run.run_type, run.run_at.to_rfc3339()));
    }
    out.push_str(&format!("Checks: {}\n", state.checks.len()));
    for check in &state.checks {
        out.push_str(&format!(
            "  {} {} {}\n",
            check.id,
            check.check_type,
            check.name.as_deref().unwrap_or("")
        ));
    }
    if state.artifacts.is_empty() {
        out.push_str("Artifacts: none\n");
    } else {
        out.push_str(&format!(
            "Artifacts: base={} current={}\n",
            state.artifacts.base.len(),
            state.artifacts.current.len()
        ));
    }
    out
}
