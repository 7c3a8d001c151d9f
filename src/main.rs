//! vault-sync CLI - note vault synchronization

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use vault_sync::view::SettingsPanel;
use vault_sync::{OperationOutcome, SettingField, SettingsStore, Vault};

#[derive(Parser)]
#[command(name = "vault-sync")]
#[command(about = "Synchronize a note vault with a remote git repository", long_about = None)]
struct Cli {
    /// Vault directory (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    vault: PathBuf,

    /// Settings file (defaults to the user configuration directory)
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new git repository in the vault
    Init,

    /// Clone the configured remote into the vault
    Clone,

    /// Commit every changed file
    Commit {
        /// Commit message; {date} and {time} are filled in
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Push the configured branch
    Push,

    /// Pull the configured branch
    Pull,

    /// Commit every changed file, then push
    Sync,

    /// Show repository status and available actions
    Status,

    /// Check that the remote is reachable with the configured token
    TestConnection,

    /// Show or edit settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show every setting
    Show,

    /// Change one setting
    Set {
        /// Setting name, e.g. remote_url
        field: String,
        /// New value
        value: String,
    },

    /// Print the settings file location
    Path,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings_path = match cli.settings {
        Some(path) => path,
        None => SettingsStore::default_path()
            .context("could not determine a configuration directory; pass --settings")?,
    };
    let vault = Vault::open(&cli.vault, SettingsStore::new(settings_path));

    let outcomes = match cli.command {
        Commands::Config { action } => return run_config(&vault, action, cli.json),
        Commands::Status => return show_status(&vault, cli.json),
        command => {
            // The operation reloads settings and reports a bad file itself
            if let Err(e) = vault.check_first_run_warning() {
                tracing::warn!(error = %e, "could not check first-run warning");
            }
            run_operation(&vault, command).await
        }
    };

    print_outcomes(&outcomes, cli.json)?;

    if outcomes.iter().any(|outcome| !outcome.success) {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_operation(vault: &Vault, command: Commands) -> Vec<OperationOutcome> {
    match command {
        Commands::Init => vec![vault.init().await],
        Commands::Clone => vec![vault.clone_remote().await],
        Commands::Commit { message } => vec![vault.commit_all(message.as_deref()).await],
        Commands::Push => vec![vault.push().await],
        Commands::Pull => vec![vault.pull().await],
        Commands::Sync => vault.commit_and_push().await,
        Commands::TestConnection => vec![vault.test_connection().await],
        Commands::Status | Commands::Config { .. } => Vec::new(),
    }
}

fn print_outcomes(outcomes: &[OperationOutcome], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcomes)?);
        return Ok(());
    }

    for outcome in outcomes {
        let mark = if outcome.success { "ok" } else { "failed" };
        match &outcome.commit {
            Some(commit) => println!("{:?}: {} ({})", outcome.operation, mark, commit),
            None => println!("{:?}: {}", outcome.operation, mark),
        }
    }
    Ok(())
}

fn show_status(vault: &Vault, json: bool) -> anyhow::Result<()> {
    let panel = vault.status_panel();

    if json {
        println!("{}", serde_json::to_string_pretty(&panel)?);
        return Ok(());
    }

    let lang = vault.settings().load()?.language;
    println!("Vault: {}", vault.root().display());
    print!("{}", panel.render(lang));
    Ok(())
}

fn run_config(vault: &Vault, action: ConfigAction, json: bool) -> anyhow::Result<()> {
    let store = vault.settings();

    match action {
        ConfigAction::Show => {
            let panel = SettingsPanel::new(&store.load()?);
            if json {
                println!("{}", serde_json::to_string_pretty(&panel)?);
            } else {
                print!("{}", panel.render());
            }
        }
        ConfigAction::Set { field, value } => {
            let field: SettingField = field.parse()?;
            store.set(field, &value)?;
            println!("{} updated.", field);
        }
        ConfigAction::Path => {
            println!("{}", store.path().display());
        }
    }

    Ok(())
}
