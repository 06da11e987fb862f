// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use stock_research::analysis::{ChatCompletion, OpenAiChatClient};
use stock_research::embeddings::init_embedder;
use stock_research::index::init_index;
use stock_research::pipeline::StageSpinner;
use stock_research::utils::logging::{
    format_error, format_heading, format_info, format_success, format_warning, init_logger,
};
use stock_research::{
    Config, HealthCheck, HealthReport, HealthStatus, OperationTimer, PipelineOutput, ReportExporter,
    SearchPipeline, StatusSignal, Validator,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const SUMMARY_PREVIEW_CHARS: usize = 300;

#[derive(Parser)]
#[command(name = "stock_research")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Find public companies by description and get an AI comparison", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for companies matching a free-text description
    Search {
        /// Description of the kind of company, e.g. "companies that build data centers"
        query: String,

        #[arg(short = 'k', long, value_name = "NUM")]
        top_k: Option<usize>,

        #[arg(short, long)]
        namespace: Option<String>,

        /// Directory to write a JSON report of the run into
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[arg(short, long)]
        pretty: bool,

        /// Print the run as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Answer one query per input line until EOF, `exit` or `quit`
    Interactive,

    /// Check the embedding model, vector index and completion service
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logger(cli.color, cli.verbose);

    info!("Stock Research Pipeline");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).unwrap_or_else(|e| {
            warn!("Falling back to built-in defaults: {}", e);
            Config::default_config()
        })
    };

    match cli.command {
        Commands::Search {
            query,
            top_k,
            namespace,
            output,
            pretty,
            json,
        } => {
            let mut config = config;
            if let Some(top_k) = top_k {
                config.search.top_k = top_k;
            }
            if let Some(namespace) = namespace {
                config.search.namespace = namespace;
            }
            config.validate().context("Invalid search options")?;

            cmd_search(&config, &query, output, pretty, json, cli.color).await?;
        }
        Commands::Interactive => {
            cmd_interactive(&config, cli.color).await?;
        }
        Commands::Verify => {
            cmd_verify(&config).await?;
        }
    }

    Ok(())
}

async fn cmd_search(
    config: &Config,
    query: &str,
    output_dir: Option<PathBuf>,
    pretty: bool,
    json: bool,
    color: bool,
) -> Result<()> {
    let pipeline = SearchPipeline::initialize(config).await;

    if let Some(cause) = pipeline.initialization_error() {
        eprintln!("{}", format_error(&format!("Search is unavailable: {}", cause)));
        return Err(anyhow::anyhow!("Service initialization failed"));
    }

    let spinner = if json {
        StageSpinner::hidden()
    } else {
        StageSpinner::new(color)
    };
    let output = pipeline.run_observed(query, Some(&spinner)).await;
    drop(spinner);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize output")?
        );
    } else {
        render_output(&output);
    }

    if let Some(dir) = output_dir {
        let path = ReportExporter::new(dir)
            .context("Failed to prepare export directory")?
            .export(&output, pretty)
            .context("Failed to export report")?;
        eprintln!(
            "{}",
            format_success(&format!("Report written to {}", path.display()))
        );
    }

    Ok(())
}

async fn cmd_interactive(config: &Config, color: bool) -> Result<()> {
    let pipeline = SearchPipeline::initialize(config).await;

    if let Some(cause) = pipeline.initialization_error() {
        eprintln!("{}", format_error(&format!("Search is unavailable: {}", cause)));
    }

    println!(
        "{}",
        format_info("Describe a kind of company (e.g. companies that build data centers). Type `exit` to quit.")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{} ", ">".cyan().bold());
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };

        if matches!(line.trim(), "exit" | "quit") {
            break;
        }

        let spinner = StageSpinner::new(color);
        let output = pipeline.run_observed(&line, Some(&spinner)).await;
        drop(spinner);

        render_output(&output);
    }

    info!("Interactive session closed");
    Ok(())
}

async fn cmd_verify(config: &Config) -> Result<()> {
    info!("Checking external services");

    let timer = OperationTimer::new("embedding model");
    let outcome = match init_embedder(&config.embedding).await {
        Ok(embedder) => embedder.embed("health check").await.map(|vector| {
            format!("{} ({} dimensions)", embedder.model_name(), vector.len())
        }),
        Err(e) => Err(e),
    };
    let embedding = HealthCheck::from_outcome(
        "embedding model",
        outcome,
        HealthStatus::Unhealthy,
        timer.finish(),
    );

    let timer = OperationTimer::new("vector index");
    let outcome = match init_index(&config.index).await {
        Ok(index) => index.ping().await.map(|()| match index.dimension() {
            Some(dimension) => format!("{} (dimension {})", index.name(), dimension),
            None => index.name().to_string(),
        }),
        Err(e) => Err(e),
    };
    let index = HealthCheck::from_outcome(
        "vector index",
        outcome,
        HealthStatus::Unhealthy,
        timer.finish(),
    );

    // A failing completion service only turns analysis text into an error message.
    let timer = OperationTimer::new("completion service");
    let chat = OpenAiChatClient::new(&config.analysis);
    let outcome = chat.ping().await.map(|()| chat.model().to_string());
    let completion = HealthCheck::from_outcome(
        "completion service",
        outcome,
        HealthStatus::Degraded,
        timer.finish(),
    );

    let report = HealthReport::new(vec![embedding, index, completion], env!("CARGO_PKG_VERSION"));
    println!("{}", report.format());

    if report.has_failures() {
        return Err(anyhow::anyhow!("One or more required services are unavailable"));
    }

    Ok(())
}

fn render_output(output: &PipelineOutput) {
    if let Some(message) = output.status.message() {
        let line = match output.status {
            StatusSignal::EmptyQuery | StatusSignal::NoMatches => format_warning(&message),
            _ => format_error(&message),
        };
        println!("\n{}", line);

        if let Some(cause) = &output.retrieval_error {
            println!("{}", format_info(&format!("The index query failed: {}", cause)));
        }
        println!();
        return;
    }

    println!("\n{}\n", format_heading("Results"));

    for (idx, company) in output.companies.iter().enumerate() {
        println!(
            "{}. {} (Score: {:.4})",
            idx + 1,
            company.title().bold(),
            company.score
        );

        for (label, value) in company.display_fields() {
            let value = if label == "Business Summary" {
                Validator::truncate_text(value, SUMMARY_PREVIEW_CHARS)
            } else {
                value.to_string()
            };
            println!("   {}: {}", label.bold(), value);
        }
        println!();
    }

    if let Some(analysis) = &output.analysis {
        println!("{}\n", format_heading("Summary"));
        println!("{}\n", analysis);
    }
}
