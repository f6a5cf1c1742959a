//! Earnings analytics CLI
//!
//! Ask questions about the freelancer earnings dataset in plain language.

use clap::{Parser, Subcommand, ValueEnum};
use earnings_analytics::config::{expand_path, Config};
use earnings_analytics::{
    describe_schema, import_csv, AuditLog, HttpModel, JsonlAuditLog, ModelAssistant, NullAuditLog,
    Outcome, OutputMode, Pipeline, SqliteStore, TABLE_NAME,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Earnings analytics CLI - natural language questions over freelancer earnings
#[derive(Parser)]
#[command(name = "earnings")]
#[command(about = "Answer questions about freelancer earnings with LLM-generated, validated SQL", long_about = None)]
#[command(version)]
struct Cli {
    /// Database path (overrides EARNINGS_DB_PATH)
    #[arg(long, global = true)]
    db_path: Option<String>,

    /// Model name; the provider is picked from it (overrides EARNINGS_LLM_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Log output format (logs go to stderr)
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the table and import the CSV dataset
    Init {
        /// CSV file (overrides EARNINGS_CSV_PATH)
        #[arg(long)]
        csv: Option<String>,
    },

    /// Ask a question; prints the generated SQL and the result
    Ask {
        /// Question in natural language
        question: String,
    },

    /// Ask a question; prints only the answer
    Answer {
        /// Question in natural language
        question: String,
    },

    /// Run a fixed set of sample questions
    Demo,

    /// Show the table description given to the model
    Schema,
}

const DEMO_QUESTIONS: [&str; 10] = [
    "How much higher is the income of freelancers who accept cryptocurrency compared to other payment methods?",
    "How is freelancer income distributed by client region?",
    "What percentage of freelancers who consider themselves experts have completed fewer than 100 projects?",
    "What is the average client rating for projects lasting more than 30 days?",
    "How many freelancers were rehired?",
    "Hi, how are you?",
    "How do I use this system?",
    "What is two plus two?",
    "Tell me a joke.",
    "Help me with the command to run it.",
];

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let mut config = Config::from_env()?;
    if let Some(db_path) = &cli.db_path {
        config.db_path = expand_path(db_path);
    }
    if let Some(model) = cli.model.clone() {
        config = config.with_model(model, |key| std::env::var(key).ok());
    }

    match cli.command {
        Commands::Init { csv } => {
            let csv_path = csv.as_deref().map(expand_path).unwrap_or_else(|| config.csv_path.clone());
            cmd_init(&config, csv_path).await?;
        }
        Commands::Ask { question } => {
            cmd_ask(&config, &question, OutputMode::Verbose).await?;
        }
        Commands::Answer { question } => {
            cmd_ask(&config, &question, OutputMode::AnswerOnly).await?;
        }
        Commands::Demo => {
            let pipeline = build_pipeline(&config)?;
            cmd_demo(&pipeline).await;
        }
        Commands::Schema => {
            cmd_schema(&config).await?;
        }
    }

    Ok(())
}

fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    let model = HttpModel::from_config(&config.llm)?;
    info!(
        provider = model.provider().as_str(),
        model = %config.llm.model,
        "Model client ready"
    );

    let audit: Arc<dyn AuditLog> = match &config.audit_log {
        Some(path) => Arc::new(JsonlAuditLog::new(path.clone())),
        None => Arc::new(NullAuditLog),
    };
    let assistant = Arc::new(ModelAssistant::new(model, audit));
    let store = Arc::new(SqliteStore::new(config.db_path.clone()));
    Ok(Pipeline::new(assistant, store))
}

async fn cmd_init(config: &Config, csv_path: std::path::PathBuf) -> anyhow::Result<()> {
    let summary = import_csv(config.db_path.clone(), csv_path).await?;

    println!("Database initialized and data imported.");
    println!("  Path: {}", config.db_path.display());
    println!("  Table: {}", TABLE_NAME);
    println!("  Columns: {}", summary.columns.len());
    if let Some(pk) = &summary.primary_key {
        println!("  Primary key: {}", pk);
    }
    println!("  Rows: {}", summary.rows);
    Ok(())
}

async fn cmd_ask(config: &Config, question: &str, mode: OutputMode) -> anyhow::Result<()> {
    // a blank question needs neither a model client nor a database
    let outcome = if question.trim().is_empty() {
        Outcome::BlankInput
    } else {
        build_pipeline(config)?.handle(question).await
    };
    println!("{}", outcome.render(mode));
    Ok(())
}

async fn cmd_demo(pipeline: &Pipeline) {
    for question in DEMO_QUESTIONS {
        println!("Question: {}", question);
        let outcome = pipeline.handle(question).await;
        println!("{}\n", outcome.render(OutputMode::AnswerOnly));
    }
}

async fn cmd_schema(config: &Config) -> anyhow::Result<()> {
    let store = SqliteStore::new(config.db_path.clone());
    let schema = describe_schema(&store).await?;
    println!("{}", schema);
    Ok(())
}
