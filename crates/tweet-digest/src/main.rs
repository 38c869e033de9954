//! Tweet digest CLI - ranked digest of important tweets across handles.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tweet_digest::config::{AiProviderKind, AppConfig, HandleConfig};
use tweet_digest::notify::{EmailNotifier, NotificationSink};
use tweet_digest::pipeline::{DigestReport, DigestWriter, HandlePipeline, MultiHandleAggregator};
use tweet_digest::storage::SeenTweetStore;
use tweet_digest::twitter::HttpTimelineFetcher;
use tweet_digest::Classifier;

/// Tweets shown in the run summary.
const SUMMARY_TOP: usize = 5;

/// Tweet digest CLI - fetch timelines, score tweets and keep the important ones.
#[derive(Parser)]
#[command(name = "tweet-digest")]
#[command(about = "Multi-handle tweet digest with AI importance scoring")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./tweet-digest.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process all configured handles (or a subset) and write the digest
    Run {
        /// Comma-separated handles to process instead of the configured list
        #[arg(long, value_delimiter = ',')]
        handles: Option<Vec<String>>,

        /// Use keyword scoring only
        #[arg(long)]
        no_ai: bool,

        /// AI provider
        #[arg(long, value_enum)]
        provider: Option<AiProviderKind>,

        /// Send email notifications
        #[arg(long)]
        email: bool,

        /// Digest output file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Process a single handle
    Handle {
        /// Handle name (without @)
        name: String,

        /// Minimum importance score (1-10)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=10))]
        min_score: Option<u8>,

        /// Context passed to the AI classifier
        #[arg(long)]
        context: Option<String>,

        /// Use keyword scoring only
        #[arg(long)]
        no_ai: bool,

        /// AI provider
        #[arg(long, value_enum)]
        provider: Option<AiProviderKind>,
    },

    /// Show the seen-tweet store
    Seen,

    /// Send a test email to verify SMTP settings
    TestEmail,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        EnvFilter::new("tweet_digest=debug,info")
    } else {
        EnvFilter::new("tweet_digest=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Run {
            handles,
            no_ai,
            provider,
            email,
            output,
        } => {
            let mut config = config;
            apply_ai_overrides(&mut config, no_ai, provider);
            if email {
                config.email.enabled = true;
            }
            let output = output.unwrap_or_else(|| PathBuf::from(&config.scraper.output_file));
            run_digest(config, handles, &output).await
        }
        Commands::Handle {
            name,
            min_score,
            context,
            no_ai,
            provider,
        } => {
            let mut config = config;
            apply_ai_overrides(&mut config, no_ai, provider);
            let defaults = config.handle_config(&name);
            let handle_config = HandleConfig::new(
                min_score.unwrap_or(defaults.min_score),
                context.unwrap_or(defaults.context),
            );
            run_handle(config, &name, handle_config).await
        }
        Commands::Seen => {
            run_seen(&config);
            Ok(())
        }
        Commands::TestEmail => run_test_email(&config).await,
    }
}

fn apply_ai_overrides(config: &mut AppConfig, no_ai: bool, provider: Option<AiProviderKind>) {
    if no_ai {
        config.ai.enabled = false;
    }
    if let Some(provider) = provider {
        config.ai.provider = provider;
    }
}

fn build_pipeline(config: &AppConfig) -> Result<HandlePipeline> {
    let fetcher = HttpTimelineFetcher::new(
        config.scraper.base_url.as_str(),
        &config.scraper.user_agent,
        config.scraper.timeout(),
    )
    .context("Failed to create HTTP client")?;

    let classifier = Classifier::from_config(&config.ai, &config.keywords, config.ai.enabled)
        .context("Failed to create classifier")?;

    let seen = SeenTweetStore::load(&config.scraper.seen_tweets_file);
    tracing::debug!(seen = seen.len(), "Loaded seen tweets");

    Ok(HandlePipeline::new(
        Arc::new(fetcher),
        Arc::new(classifier),
        Arc::new(Mutex::new(seen)),
    ))
}

async fn run_digest(config: AppConfig, handles: Option<Vec<String>>, output: &Path) -> Result<()> {
    let pipeline = build_pipeline(&config)?;
    let classifier = pipeline.classifier();
    if classifier.ai_requested() && classifier.is_available() {
        println!("🤖 AI classification: {}", config.ai.provider);
    } else {
        println!("🔤 Keyword classification");
    }

    let mut aggregator = MultiHandleAggregator::new(pipeline, &config);
    if config.email.enabled {
        let notifier: Arc<dyn NotificationSink> =
            Arc::new(EmailNotifier::from_env(config.email.min_score_for_email));
        aggregator = aggregator.with_notifier(notifier);
    }

    let report = aggregator.run(handles.as_deref()).await;

    if report.stats.total_important_tweets > 0 {
        if let Err(e) = DigestWriter::save(&report, output) {
            tracing::error!(path = %output.display(), error = %e, "Failed to save digest");
        } else {
            println!("📁 Tweets saved to {}", output.display());
        }
    }

    print_summary(&report);
    Ok(())
}

async fn run_handle(config: AppConfig, name: &str, handle_config: HandleConfig) -> Result<()> {
    let pipeline = build_pipeline(&config)?;

    let result = match pipeline.run(name, &handle_config).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("❌ Failed to scrape @{name}: {e}");
            return Ok(());
        }
    };

    println!("\n📊 Summary (@{name})");
    println!("   Total tweets on page: {}", result.total_on_page);
    println!("   Already seen (skipped): {}", result.skipped_already_seen);
    println!("   ✅ Important tweets kept: {}", result.kept_important);
    println!("   ❌ Low-priority filtered: {}", result.filtered_out);
    println!("   📈 Min score threshold: {}", handle_config.min_score);

    if result.kept_important > 0 {
        let path = PathBuf::from(format!("tweets_{name}.json"));
        DigestWriter::save(&result, &path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\n✅ Found {} important tweets from @{name}", result.kept_important);
    } else {
        println!("\n✅ No important tweets found for @{name}");
    }
    Ok(())
}

fn run_seen(config: &AppConfig) {
    let seen = SeenTweetStore::load(&config.scraper.seen_tweets_file);
    println!("\n👀 Seen tweets: {}", seen.len());
    println!("   File: {}", seen.path().display());
    println!("   Last updated: {}", seen.last_updated().unwrap_or("never"));
}

async fn run_test_email(config: &AppConfig) -> Result<()> {
    let notifier = EmailNotifier::from_env(config.email.min_score_for_email);
    if !notifier.enabled() {
        anyhow::bail!("Email not configured. Set EMAIL_USER, EMAIL_PASSWORD, RECIPIENT_EMAIL");
    }

    notifier
        .send_test()
        .await
        .context("Email configuration failed (for Gmail use an app password)")?;
    println!("✅ Email configuration is working!");
    Ok(())
}

fn print_summary(report: &DigestReport) {
    let stats = &report.stats;
    if stats.total_important_tweets == 0 {
        println!("\n❌ No important tweets found!");
        if !report.failed_handles.is_empty() {
            println!("   Failed handles: {}", report.failed_handles.join(", "));
        }
        return;
    }

    println!("\n{}", "=".repeat(60));
    println!("🎯 Multi-handle run complete");
    println!(
        "   📊 Handles processed: {}/{}",
        stats.successful_handles, stats.total_handles
    );
    println!("   ✅ Total important tweets: {}", stats.total_important_tweets);
    println!("   ❌ Total filtered tweets: {}", stats.total_filtered_tweets);
    if !report.failed_handles.is_empty() {
        println!("   ⚠️  Failed handles: {}", report.failed_handles.join(", "));
    }

    println!("\n🏆 Top important tweets");
    for (i, tweet) in report.top(SUMMARY_TOP).iter().enumerate() {
        let t = &tweet.tweet;
        let preview: String = t.text.chars().take(150).collect();
        println!(
            "\n--- #{} [@{}] [Score: {}/10 - {}] ---",
            i + 1,
            tweet.handle,
            tweet.importance_score,
            tweet.classifier_provider.to_string().to_uppercase()
        );
        println!("💡 {}", tweet.importance_reason);
        println!(
            "👤 {} ({})",
            t.author.as_deref().unwrap_or("N/A"),
            t.username.as_deref().unwrap_or("N/A")
        );
        println!("🕒 {}", t.display_date.as_deref().unwrap_or("N/A"));
        println!("📝 {preview}...");
        if t.is_pinned {
            println!("📌 PINNED");
        }
        if t.is_retweet {
            println!("🔄 RETWEET");
        }
    }
}
