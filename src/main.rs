use clap::{Parser, Subcommand};
use hostguard::config;
use hostguard::telemetry::{init_logging, MetricsRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "hostguard")]
#[command(about = "An educational host-firewall simulator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation daemon
    Run {
        /// Path to the configuration file
        #[arg(short, long, default_value = "hostguard.toml")]
        config: PathBuf,

        /// Stop after this many evaluated packets (runs forever by default)
        #[arg(short, long)]
        packets: Option<u64>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Ask the advisor to audit the active rule set
    Audit {
        /// Path to the configuration file
        #[arg(short, long, default_value = "hostguard.toml")]
        config: PathBuf,
    },
    /// Ask the advisor a free-text security question
    Consult {
        /// Path to the configuration file
        #[arg(short, long, default_value = "hostguard.toml")]
        config: PathBuf,

        /// The question to ask
        question: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a configuration file without running
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "hostguard.toml")]
        config: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Some(Commands::Run { config, packets }) => cmd_run(&config, packets),
        Some(Commands::Config { action }) => match action {
            ConfigAction::Validate { config } => cmd_config_validate(&config),
        },
        Some(Commands::Audit { config }) => cmd_audit(&config),
        Some(Commands::Consult { config, question }) => cmd_consult(&config, &question),
        // Default: run with hostguard.toml (or built-in defaults)
        None => cmd_run(&PathBuf::from("hostguard.toml"), None),
    };

    if let Err(e) = outcome {
        eprintln!("[ERROR] {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(config_path: &PathBuf, max_packets: Option<u64>) -> Result<(), String> {
    use hostguard::narrator;
    use hostguard::sim::Simulator;
    use tokio::runtime::Runtime;

    let cfg = config::load_or_default(config_path).map_err(|e| e.to_string())?;
    init_logging(Some(&cfg.logging));

    if config_path.exists() {
        info!("Loaded {}", config_path.display());
    } else {
        info!(
            "{} not found, using built-in defaults",
            config_path.display()
        );
    }

    let validation = config::validate(&cfg);
    validation.print_diagnostics();
    if validation.has_errors() {
        return Err("configuration is invalid".to_string());
    }

    let metrics = Arc::new(MetricsRegistry::new());
    let narrator = narrator::from_config(&cfg.narrator);
    let mut simulator =
        Simulator::from_config(&cfg, narrator, metrics.clone()).map_err(|e| e.to_string())?;

    let rt = Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;
    rt.block_on(async {
        simulator.run(max_packets).await;
    });

    for (name, value) in metrics.export() {
        info!("{} = {}", name, value);
    }
    Ok(())
}

fn cmd_config_validate(config_path: &PathBuf) -> Result<(), String> {
    println!("[INFO] Validating {}...", config_path.display());

    let cfg = config::load(config_path).map_err(|e| e.to_string())?;

    let validation = config::validate(&cfg);
    validation.print_diagnostics();

    if validation.has_errors() {
        Err("Validation failed".to_string())
    } else {
        println!("[INFO] Configuration is valid");
        Ok(())
    }
}

fn cmd_audit(config_path: &PathBuf) -> Result<(), String> {
    use hostguard::advisor::AdvisorClient;
    use tokio::runtime::Runtime;

    let cfg = config::load_or_default(config_path).map_err(|e| e.to_string())?;
    init_logging(Some(&cfg.logging));

    let rules = cfg.rule_set().map_err(|e| e.to_string())?;
    let client = AdvisorClient::from_config(&cfg.advisor).map_err(|e| e.to_string())?;

    let rt = Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;
    let audit = rt
        .block_on(client.audit_rules(&rules))
        .map_err(|e| e.to_string())?;

    println!("Risk level: {}", audit.risk_level);
    println!();
    println!("{}", audit.summary);
    for (i, finding) in audit.findings.iter().enumerate() {
        println!();
        println!("{}. {}", i + 1, finding.description);
        println!("   -> {}", finding.recommendation);
    }
    Ok(())
}

fn cmd_consult(config_path: &PathBuf, question: &str) -> Result<(), String> {
    use hostguard::advisor::AdvisorClient;
    use tokio::runtime::Runtime;

    let cfg = config::load_or_default(config_path).map_err(|e| e.to_string())?;
    init_logging(Some(&cfg.logging));

    let client = AdvisorClient::from_config(&cfg.advisor).map_err(|e| e.to_string())?;

    let rt = Runtime::new().map_err(|e| format!("Failed to create runtime: {}", e))?;
    let answer = rt
        .block_on(client.consult(question))
        .map_err(|e| e.to_string())?;

    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!();
        println!("Sources:");
        for source in &answer.sources {
            println!("  {} <{}>", source.title, source.uri);
        }
    }
    Ok(())
}
