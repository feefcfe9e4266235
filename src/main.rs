use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hr_insight::analysis::{classify_sentiment, sample_profiles};
use hr_insight::llm::{ProviderKind, Providers};
use hr_insight::{AssistantConfig, ChatSession, QuestionRouter};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hr-insight")]
#[command(about = "Ask natural-language questions about the HR employee dataset")]
#[command(version)]
struct Args {
    /// Path to the SQLite database (or set HR_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Completion backend: local or remote
    #[arg(long, global = true, default_value = "remote")]
    provider: ProviderKind,

    /// Extra SQL generation attempts after the first (or set HR_MAX_RETRIES)
    #[arg(long, global = true)]
    max_retries: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question and exit
    Ask {
        /// The question in natural language
        question: String,
    },

    /// Interactive session that remembers earlier questions
    Chat,

    /// Print the table schema and a few sample rows
    Schema,

    /// Classify the sentiment of sampled employee profiles, or of given text
    Sentiment {
        /// Number of random profiles to classify
        #[arg(long, default_value_t = 12)]
        sample: usize,

        /// Classify this text instead of sampled profiles
        #[arg(long)]
        text: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = AssistantConfig::from_env().context("Failed to load configuration")?;
    if let Some(db) = args.db {
        config.database_path = db;
    }
    if let Some(max_retries) = args.max_retries {
        config.max_retries = max_retries;
    }
    config.validate()?;

    info!("Using database {} with {} provider", config.database_path.display(), args.provider);

    let providers = Providers::from_config(&config);
    let router = QuestionRouter::new(config, providers);

    match args.command {
        Commands::Ask { question } => {
            let answer = router.answer(&question, args.provider, &[]).await;
            println!("{}", answer);
            router.shutdown().await;
        }
        Commands::Chat => {
            let mut session = ChatSession::new(router, args.provider);
            let outcome = run_chat(&mut session).await;
            session.router().shutdown().await;
            outcome?;
        }
        Commands::Schema => {
            let sample_rows = router.config().sample_rows;
            let schema = router
                .introspector()
                .snapshot(sample_rows)
                .context("Failed to read schema")?;
            println!("{}", schema);
            let sample = schema.render_sample();
            if !sample.is_empty() {
                println!("\nSample rows:\n{}", sample);
            }
        }
        Commands::Sentiment { sample, text } => {
            let outcome = run_sentiment(&router, args.provider, sample, text).await;
            router.shutdown().await;
            outcome?;
        }
    }

    Ok(())
}

async fn run_sentiment(router: &QuestionRouter, kind: ProviderKind, sample: usize, text: Option<String>) -> Result<()> {
    let texts = match text {
        Some(text) => vec![text],
        None => {
            let config = router.config();
            sample_profiles(&config.database_path, &config.table_name, sample).context("Failed to sample profiles")?
        }
    };

    let provider = router.provider(kind);
    for text in texts {
        let sentiment = classify_sentiment(provider.as_ref(), &text)
            .await
            .context("Sentiment classification failed")?;
        println!("{:<8} {:.2}  {}", sentiment.label.to_string(), sentiment.score, text);
    }

    Ok(())
}

async fn run_chat(session: &mut ChatSession) -> Result<()> {
    println!("HR Insight chat ({} provider). Type /history to review, /quit to exit.", session.provider());

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n> ");
        io::stdout().flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };

        match line.trim() {
            "/quit" | "/exit" => break,
            "/history" => {
                let transcript = session.transcript();
                if transcript.is_empty() {
                    println!("(no messages yet)");
                } else {
                    println!("{}", transcript);
                }
            }
            question => {
                let answer = session.ask(question).await;
                println!("\n{}", answer);
            }
        }
    }

    Ok(())
}
