mod settings;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use code_categorizer_core::{
    build_client, render_summary, ClassificationPrompt, CompletionClient, LlmOverrides,
    LlmSettings, OutputFormat, RowClassifier, TableFormat, Taxonomy,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use settings::{AppConfig, CliOverrides, FileConfig, Profile};

const HEALTH_PROBE_CODE: &str = "99213";

#[derive(Parser, Debug)]
#[command(
    name = "code-categorizer",
    author,
    version,
    about = "Assign billing categories to medical procedure codes with an LLM"
)]
struct Cli {
    /// Optional configuration file (TOML, YAML or JSON)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Input layout preset
    #[arg(long, value_enum, global = true)]
    profile: Option<Profile>,

    /// Input table (.csv, .xlsx, .xlsm, .xls, .ods)
    #[arg(long, value_name = "FILE", global = true)]
    input: Option<PathBuf>,

    /// Output table; parent directories are created
    #[arg(long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,

    /// Column holding the codes; renamed to `Item` in the output
    #[arg(long = "code-column", value_name = "NAME", global = true)]
    code_column: Option<String>,

    /// Category taxonomy (surgical or site-of-care)
    #[arg(long, value_name = "NAME", global = true)]
    taxonomy: Option<Taxonomy>,

    /// Input format when the extension is not conclusive (csv or spreadsheet)
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<TableFormat>,

    /// Completion provider (openai, azure, anthropic, noop)
    #[arg(long, global = true)]
    provider: Option<String>,

    /// Model or Azure deployment name
    #[arg(long, global = true)]
    model: Option<String>,

    /// Custom API base URL
    #[arg(long, value_name = "URL", global = true)]
    endpoint: Option<String>,

    /// HTTP timeout in seconds (client default when unset)
    #[arg(long = "timeout-secs", value_name = "SECS", global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Categorize every code in the input table and write the output table
    Classify {
        /// Emit the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the categories of the configured taxonomy
    Categories {
        /// Emit categories as JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Print the exact prompt sent for a code
    Prompt {
        /// Code value to render
        code: String,
    },
    /// Send one probe classification through the configured provider
    Health,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            profile: self.profile,
            input: self.input.clone(),
            output: self.output.clone(),
            code_column: self.code_column.clone(),
            taxonomy: self.taxonomy,
            format: self.format,
            llm: LlmOverrides {
                provider: self.provider.clone(),
                model: self.model.clone(),
                endpoint: self.endpoint.clone(),
                timeout_secs: self.timeout_secs,
                api_version: None,
            },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    let file = FileConfig::load(cli.config.as_deref())?;
    let config = AppConfig::resolve(file, cli.overrides())?;

    match cli.command.unwrap_or(Commands::Classify { json: false }) {
        Commands::Classify { json } => classify(&config, json).await?,
        Commands::Categories { json } => list_categories(config.classifier.taxonomy, json)?,
        Commands::Prompt { code } => print_prompt(config.classifier.taxonomy, &code),
        Commands::Health => health(&config).await?,
    }
    Ok(())
}

/// Resolve provider settings and wrap the client. Fails without a credential.
fn classifier_for(config: &AppConfig) -> Result<(RowClassifier, LlmSettings)> {
    let llm = LlmSettings::resolve(&config.llm_file, &config.llm_cli)?;
    let client = build_client(&llm)
        .with_context(|| format!("failed to initialise provider `{}`", llm.provider))?;
    Ok((RowClassifier::new(client, config.classifier.clone()), llm))
}

async fn classify(config: &AppConfig, json: bool) -> Result<()> {
    let (classifier, llm) = classifier_for(config)?;
    tracing::info!(
        profile = ?config.profile,
        provider = %llm.provider,
        "starting categorization"
    );
    let summary = config.job.run(&classifier).await?;

    if json {
        let payload = json!({
            "output": config.job.output.display().to_string(),
            "summary": summary,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("Updated file saved to {}", config.job.output.display());
    print!("{}", render_summary(&summary, OutputFormat::Human)?);
    Ok(())
}

fn list_categories(taxonomy: Taxonomy, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(taxonomy.labels())?);
        return Ok(());
    }

    println!(
        "{} categories in taxonomy {}",
        taxonomy.labels().len(),
        taxonomy
    );
    for label in taxonomy.labels() {
        println!("- {label}");
    }
    Ok(())
}

fn print_prompt(taxonomy: Taxonomy, code: &str) {
    let prompt = ClassificationPrompt::new(code, taxonomy);
    println!("[system]\n{}\n", prompt.system);
    println!("[user]\n{}", prompt.user);
}

async fn health(config: &AppConfig) -> Result<()> {
    let llm = LlmSettings::resolve(&config.llm_file, &config.llm_cli)?;
    println!("Checking provider {} ...", llm.provider);
    let client = build_client(&llm)?;
    let prompt = ClassificationPrompt::new(HEALTH_PROBE_CODE, config.classifier.taxonomy);
    match client.complete(&prompt).await {
        Ok(text) => {
            println!("ok (response: {:?})", text.trim());
            Ok(())
        }
        Err(err) => {
            println!("failed: {err:#}");
            Err(err).context("provider health check failed")
        }
    }
}

fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,hyper=warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
