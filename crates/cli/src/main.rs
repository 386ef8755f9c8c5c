mod echo;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use owo_colors::OwoColorize;
use readmode_core::{ExtractionStrategy, MarkdownConfig, Pipeline, PipelineConfig, PipelineOutcome, RetrievalStrategy};
use tracing_subscriber::EnvFilter;

use crate::echo::{
    format_size, print_banner, print_error, print_info, print_step, print_success, print_total, print_trace,
    print_warning,
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for the extracted article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Markdown,
    Html,
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "html" => Ok(Self::Html),
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: markdown, html, text, json", s)),
        }
    }
}

/// Fetch a readable article from a URL, falling back across services
#[derive(Parser, Debug)]
#[command(name = "readmode")]
#[command(version)]
#[command(about = "Fetch a readable article from any URL", long_about = None)]
struct Args {
    /// Article URL (http or https)
    #[arg(value_name = "URL", required_unless_present = "completions")]
    url: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (markdown, html, text, json)
    #[arg(short, long, default_value = "markdown", value_name = "FORMAT")]
    format: OutputFormat,

    /// Include reference table with all links (Markdown only)
    #[arg(long)]
    references: bool,

    /// Include TOML frontmatter (Markdown only)
    #[arg(long)]
    frontmatter: bool,

    /// Overall time budget in seconds
    #[arg(long, default_value = "45", value_name = "SECS")]
    timeout: u64,

    /// Retrieval strategies in order, e.g. "web-proxy,direct:crawler"
    #[arg(long, value_name = "LIST")]
    strategies: Option<String>,

    /// Extraction strategies in order, e.g. "readability,selectors"
    #[arg(long, value_name = "LIST")]
    extractors: Option<String>,

    /// Reader service endpoint template ({url} or {raw_url})
    #[arg(long, value_name = "TEMPLATE")]
    reader_proxy: Option<String>,

    /// Web proxy endpoint template ({url} or {raw_url})
    #[arg(long, value_name = "TEMPLATE")]
    web_proxy: Option<String>,

    /// Archive availability API template ({url} or {raw_url})
    #[arg(long, value_name = "TEMPLATE")]
    archive_api: Option<String>,

    /// Fail instead of accepting below-threshold readability output
    #[arg(long)]
    no_degraded: bool,

    /// Strip images from output
    #[arg(long)]
    no_images: bool,

    /// Print attempted strategies and enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

impl Args {
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let mut builder = PipelineConfig::builder()
            .overall_timeout(Duration::from_secs(self.timeout))
            .degraded_acceptance(!self.no_degraded)
            .strip_images(self.no_images);

        if let Some(list) = &self.strategies {
            let strategies = RetrievalStrategy::parse_list(list).map_err(anyhow::Error::msg)?;
            builder = builder.retrieval_strategies(strategies);
        }
        if let Some(list) = &self.extractors {
            let extractors = ExtractionStrategy::parse_list(list).map_err(anyhow::Error::msg)?;
            builder = builder.extraction_strategies(extractors);
        }
        if let Some(template) = &self.reader_proxy {
            builder = builder.reader_proxy(template.as_str());
        }
        if let Some(template) = &self.web_proxy {
            builder = builder.web_proxy(template.as_str());
        }
        if let Some(template) = &self.archive_api {
            builder = builder.archive_api(template.as_str());
        }
        Ok(builder.build())
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("readmode_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "readmode", &mut io::stdout());
        return Ok(());
    }

    let url = args.url.clone().unwrap_or_default();
    init_logging(args.verbose);

    if args.verbose {
        print_banner();
        print_info("Debug logging enabled");
        eprintln!();
    }
    if args.format != OutputFormat::Markdown && (args.frontmatter || args.references) {
        print_warning("--frontmatter and --references only apply to Markdown output");
    }

    if args.verbose {
        print_step(1, 3, &format!("Reading {}", url.bright_white().underline()));
    }

    let config = args.pipeline_config().context("Invalid strategy list")?;
    let pipeline = Pipeline::with_config(config).context("Failed to build HTTP client")?;
    let started = Instant::now();
    let (outcome, trace) = pipeline.run_traced(&url).await;

    if args.verbose {
        print_trace(&trace);
        print_total(started.elapsed());
    }

    let article = match outcome {
        PipelineOutcome::Success(article) => article,
        PipelineOutcome::Failure(err) => {
            print_error(&format!("{} (status {})", err.message, err.status_code()));
            bail!("{}", err.message);
        }
    };

    if args.verbose {
        print_step(2, 3, "Rendering article");
        eprintln!("  {} {}", "Title:".dimmed(), article.title.bright_white());
        if let Some(byline) = &article.byline {
            eprintln!("  {} {}", "Byline:".dimmed(), byline.bright_white());
        }
        eprintln!();
    }

    let output = match args.format {
        OutputFormat::Markdown => {
            let config = MarkdownConfig {
                include_frontmatter: args.frontmatter,
                include_references: args.references,
                strip_images: args.no_images,
                include_title_heading: true,
            };
            article.to_markdown(&config).context("Failed to convert to Markdown")?
        }
        OutputFormat::Html => article.content_html,
        OutputFormat::Text => article.plain_text,
        OutputFormat::Json => serde_json::to_string_pretty(&PipelineOutcome::Success(article).to_response())
            .context("Failed to serialize article")?,
    };

    if args.verbose {
        print_step(3, 3, "Writing output");
        eprintln!("  {} {}", "Format:".dimmed(), format!("{:?}", args.format).bright_white());
        eprintln!("  {} {}", "Size:".dimmed(), format_size(output.len()).bright_white());
        eprintln!();
    }

    match args.output {
        Some(path) => {
            fs::write(&path, output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            print_success(&format!("Output written to {}", path.display().bright_white()));
        }
        None => {
            println!("{}", output);
        }
    }

    Ok(())
}
