use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use modflow::config::Config;
use modflow::engine::{compile_all, compile_main, Engine, InputPolicy};
use modflow::modules::Module;
use modflow::workflow::{
    load_registry, validate_registry, ModuleId, Payload, Value, ValueSpec, ValueType,
};

#[derive(Parser)]
#[command(name = "modflow")]
#[command(about = "Compile and run typed, composable workflows", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse, validate and compile every module in a workflow file
    Validate {
        /// Path to workflow YAML file
        file: PathBuf,
    },
    /// Compile one module and run it
    Run {
        /// Path to workflow YAML file
        file: PathBuf,
        /// Module ID to run
        #[arg(short, long)]
        module: String,
        /// Input values (can be repeated: --input name=value)
        #[arg(short, long = "input", value_parser = parse_var)]
        inputs: Vec<(String, String)>,
        /// Fail on inputs that cannot be resolved instead of omitting them
        #[arg(long)]
        strict: bool,
        /// Abort the run after this many seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Path to a config file (default: ~/.config/modflow/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn parse_var(s: &str) -> std::result::Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("Invalid variable format '{}'. Expected key=value", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "modflow=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { file } => cmd_validate(&file)?,
        Commands::Run {
            file,
            module,
            inputs,
            strict,
            timeout,
            config,
        } => cmd_run(&file, &module, &inputs, strict, timeout, config.as_deref()).await?,
    }

    Ok(())
}

fn cmd_validate(file: &Path) -> anyhow::Result<()> {
    let registry = load_registry(file)?;
    validate_registry(&registry)?;

    let report = compile_all(&registry);
    for id in report.table.ids() {
        if let Some(module) = report.table.get(id) {
            print_signature(module.as_ref());
        }
    }
    for (id, error) in &report.failures {
        println!("✗ {}: {}", id, error);
    }

    if !report.is_ok() {
        anyhow::bail!("{} module(s) failed to compile", report.failures.len());
    }

    println!();
    println!("✓ {} module(s) compiled", report.table.len());
    Ok(())
}

fn print_signature(module: &dyn Module) {
    let sig = module.signature();
    println!(
        "{:<30} {:<12} ({}) -> ({})",
        module.id(),
        module.module_type(),
        join_specs(&sig.input),
        join_specs(&sig.output)
    );
}

fn join_specs(specs: &[ValueSpec]) -> String {
    specs
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

async fn cmd_run(
    file: &Path,
    module_id: &str,
    inputs: &[(String, String)],
    strict: bool,
    timeout: Option<u64>,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };

    let registry = load_registry(file)?;
    let id = ModuleId::from(module_id);
    let table = compile_main(&registry, &id)?;

    let mut engine = Engine::from_config(table, &config);
    if strict {
        engine = engine.with_input_policy(InputPolicy::Strict);
    }
    if let Some(seconds) = timeout {
        engine = engine.with_timeout(Duration::from_secs(seconds));
    }

    let module = engine
        .modules()
        .get(&id)
        .ok_or_else(|| anyhow::anyhow!("Module not found: {}", module_id))?;

    let input = parse_inputs(module.as_ref(), inputs)?;

    match engine.execute(&module, input).await {
        Ok(outputs) => {
            println!("{}", serde_json::to_string_pretty(&render_outputs(&outputs))?);
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", serde_json::to_string_pretty(&e.to_json())?);
            Err(e.into())
        }
    }
}

/// Parse `name=value` pairs against the module's declared input types.
fn parse_inputs(module: &dyn Module, inputs: &[(String, String)]) -> anyhow::Result<Vec<Value>> {
    let declared = &module.signature().input;
    inputs
        .iter()
        .map(|(name, text)| {
            let spec = declared
                .iter()
                .find(|s| &s.name == name)
                .cloned()
                .unwrap_or_else(|| ValueSpec::new(name, ValueType::Any));
            let payload = Payload::parse_as(text, spec.value_type)
                .map_err(|e| anyhow::anyhow!("Input '{}': {}", name, e))?;
            Ok(Value::new(spec, payload))
        })
        .collect()
}

fn render_outputs(outputs: &[Value]) -> serde_json::Value {
    serde_json::Value::Array(
        outputs
            .iter()
            .map(|v| {
                serde_json::json!({
                    "name": v.name(),
                    "type": v.spec.value_type,
                    "value": serde_json::Value::from(v.payload.clone()),
                })
            })
            .collect(),
    )
}
