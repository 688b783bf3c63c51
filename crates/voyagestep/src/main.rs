use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use voyage_core::config::DEFAULT_MAX_CONTEXT_FIELDS;
use voyage_core::{
    CoreConfig, EchoGenerator, MemorySessionStore, MemoryStepStore, Orchestrator, Scenario, Step,
};

#[derive(Parser, Debug)]
#[command(
    name = "voyagestep",
    about = "Batch runner that plays a script of inputs into NDJSON steps"
)]
struct Args {
    /// Newline-delimited player inputs; blank lines are skipped.
    #[arg(long, value_name = "PATH")]
    script: PathBuf,

    /// Output NDJSON file path.
    #[arg(long, value_name = "PATH")]
    out: PathBuf,

    /// Scenario JSON document; the built-in crash landing is used otherwise.
    #[arg(long, value_name = "PATH")]
    scenario: Option<PathBuf>,

    /// Largest number of fields a game state may hold.
    #[arg(long = "max-fields", default_value_t = DEFAULT_MAX_CONTEXT_FIELDS)]
    max_fields: usize,
}

fn script_inputs(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Start a game and play every input in order. The opening step comes first.
async fn play(orchestrator: &Orchestrator, inputs: &[&str]) -> Result<Vec<Step>> {
    let start = orchestrator.start_game().await.context("failed to start game")?;
    let session_id = start.session_id;
    let mut steps = vec![start.step];
    for (line, input) in inputs.iter().enumerate() {
        let outcome = orchestrator
            .process_step(&session_id, input)
            .await
            .with_context(|| format!("script input {} ({:?}) failed", line + 1, input))?;
        steps.push(outcome.step);
    }
    Ok(steps)
}

fn offline_orchestrator(max_fields: usize, scenario: Scenario) -> Orchestrator {
    let config = CoreConfig {
        max_context_fields: max_fields,
        ..CoreConfig::default()
    };
    Orchestrator::new(
        config,
        Arc::new(MemoryStepStore::new()),
        Arc::new(MemorySessionStore::new()),
        Arc::new(EchoGenerator),
    )
    .with_scenario(scenario)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let scenario = match &args.scenario {
        Some(path) => Scenario::load_from_path(path)
            .with_context(|| format!("failed to read scenario {:?}", path))?,
        None => Scenario::default(),
    };
    let script = fs::read_to_string(&args.script)
        .with_context(|| format!("failed to read script {:?}", args.script))?;
    let inputs = script_inputs(&script);

    let orchestrator = offline_orchestrator(args.max_fields, scenario);
    let steps = play(&orchestrator, &inputs).await?;

    let file = File::create(&args.out).with_context(|| format!("failed to create {:?}", args.out))?;
    let mut writer = BufWriter::new(file);
    for step in &steps {
        writer.write_all(step.to_ndjson()?.as_bytes())?;
    }
    writer.flush()?;

    info!(steps = steps.len(), out = ?args.out, "script played");
    Ok(())
}
