//! # Mealprep CLI
//!
//! Command-line interface for the meal prep agent.
//!
//! Usage:
//!   mealprep                       interactive chat (default)
//!   mealprep ask <PROMPT>...       one question, one answer
//!   mealprep search <QUERY>        query the catalog directly, no model
//!   mealprep cache <stats|export|clear>
//!   mealprep tools
//!
//! Examples:
//!   mealprep
//!   mealprep ask "plan me 5 high-protein meals under £3 each"
//!   mealprep --mock search "chicken breast" --limit 3
//!   mealprep cache stats

use clap::{Parser, Subcommand};
use mealprep_agent::{
    AgentConfig, Error, MealPrepAgent, OpenAIProvider, ProviderConfig, Result, ToolRegistry,
};
use mealprep_tesco::{Catalog, CatalogConfig, CatalogSource, NutritionCache};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "mealprep")]
#[command(author, version, about = "Meal prep planning agent on the Tesco catalog")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// OpenAI-compatible endpoint to send completions to
    #[arg(long, env = "OPENAI_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Model to request
    #[arg(long, env = "MEALPREP_MODEL", default_value = "gpt-4o-mini", global = true)]
    model: String,

    /// Token for the hosted product-scraper API
    #[arg(long, env = "APIFY_API_TOKEN", hide_env_values = true, global = true)]
    api_token: Option<String>,

    /// Use the built-in offline catalog instead of the live site
    #[arg(long, global = true)]
    mock: bool,

    /// Use the hosted scraper API instead of direct page fetches
    #[arg(long, global = true, conflicts_with = "mock")]
    api: bool,

    /// Where the nutrition cache lives
    #[arg(long, default_value = "tesco_nutrition_cache.json", global = true)]
    cache_file: PathBuf,

    /// Skip the nutrition cache entirely
    #[arg(long, global = true)]
    no_cache: bool,

    /// Verbose output (debug logging and tool traces)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the agent (default when no subcommand is given)
    Chat,
    /// Ask one question and exit
    Ask {
        /// The question
        #[arg(trailing_var_arg = true, required = true)]
        prompt: Vec<String>,
    },
    /// Search the catalog directly, without the model
    Search {
        /// What to search for
        query: String,

        /// Max results to show
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
    /// Inspect or maintain the nutrition cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// List the tools the model can call
    Tools,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Show entry counts, hits, and the most-used products
    Stats,
    /// Write every entry to a CSV file
    Export {
        /// Output file
        #[arg(short, long, default_value = "tesco_nutrition_cache.csv")]
        output: PathBuf,
    },
    /// Delete every cached entry
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

impl Cli {
    fn catalog_config(&self) -> CatalogConfig {
        let source = if self.mock {
            CatalogSource::Mock
        } else if self.api {
            CatalogSource::Api
        } else {
            CatalogSource::Web
        };

        let mut config = CatalogConfig::default().with_source(source);
        if let Some(token) = &self.api_token {
            config = config.with_api_token(token);
        }
        if !self.no_cache {
            config = config.with_cache_path(&self.cache_file);
        }
        config
    }

    /// Build the full agent stack. Fails fast on a missing API key so
    /// nobody waits on a network timeout to learn about it.
    fn build_agent(&self) -> Result<MealPrepAgent<OpenAIProvider>> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::config_invalid(
                    "OPENAI_API_KEY is not set (pass --api-key or export the variable)",
                )
            })?;

        let mut provider_config = ProviderConfig::openai(api_key).with_model(&self.model);
        if let Some(base_url) = &self.base_url {
            provider_config = provider_config.with_base_url(base_url);
        }
        let provider = OpenAIProvider::new(provider_config);

        let catalog = Catalog::new(self.catalog_config())?;
        let agent_config = AgentConfig {
            model: self.model.clone(),
            verbose: self.verbose,
            ..AgentConfig::default()
        };

        Ok(MealPrepAgent::with_config(
            provider,
            ToolRegistry::new(catalog),
            agent_config,
        ))
    }

    fn catalog_label(&self) -> &'static str {
        if self.mock {
            "mock"
        } else if self.api {
            "hosted api"
        } else {
            "tesco.com"
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

async fn cmd_chat(cli: &Cli) -> Result<()> {
    let mut agent = cli.build_agent()?;

    if !cli.quiet {
        println!("Meal prep agent - plan a week of batch cooking");
        println!("Model: {} | Catalog: {}", cli.model, cli.catalog_label());
        println!("Type 'quit' to leave.\n");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("You: ");
        io::stdout().flush().map_err(Error::from)?;

        let line = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(e)) => return Err(Error::from(e)),
            None => {
                println!("\nGoodbye!");
                return Ok(());
            }
        };

        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "bye") {
            println!("Goodbye!");
            return Ok(());
        }

        match agent.run("default", input).await {
            Ok(reply) => println!("Agent: {}\n", reply),
            Err(e) => eprintln!("error: {}\n", e),
        }
    }
}

async fn cmd_ask(cli: &Cli, prompt: &str) -> Result<()> {
    let mut agent = cli.build_agent()?;
    let reply = agent.run("default", prompt).await?;
    println!("{}", reply);

    if cli.verbose {
        let usage = agent.usage();
        eprintln!(
            "({} model calls, {} tokens)",
            usage.total_calls,
            usage.total_tokens()
        );
    }
    Ok(())
}

async fn cmd_search(cli: &Cli, query: &str, limit: usize) -> Result<()> {
    let catalog = Catalog::new(cli.catalog_config())?;
    let products = catalog.search(query, limit).await?;

    if products.is_empty() {
        println!("No products found for '{}'.", query);
        return Ok(());
    }

    for product in &products {
        let price = product.display_price.as_deref().unwrap_or("-");
        let unit = product.unit_price.as_deref().unwrap_or("");
        println!("{:<52} {:>8}  {:<12} {}", clip(&product.name, 50), price, unit, product.brand);
        if let Some(promotion) = &product.promotion {
            println!("{:<52} {}", "", promotion);
        }
    }
    Ok(())
}

fn cmd_cache_stats(cli: &Cli) -> Result<()> {
    let cache = NutritionCache::open(&cli.cache_file);
    let stats = cache.stats();

    println!("Cache file:      {}", cli.cache_file.display());
    println!("Cached products: {}", stats.total_cached_products);
    println!("Total hits:      {}", stats.total_cache_hits);
    println!("File size:       {} KB", stats.cache_file_size_kb);

    if !stats.most_popular.is_empty() {
        println!("Most requested:");
        for product in &stats.most_popular {
            println!("  {:>4}x {}", product.hits, product.name);
        }
    }
    Ok(())
}

fn cmd_cache_export(cli: &Cli, output: &Path) -> Result<()> {
    let cache = NutritionCache::open(&cli.cache_file);
    let rows = cache.export_csv(output)?;
    println!("Exported {} products to {}", rows, output.display());
    Ok(())
}

fn cmd_cache_clear(cli: &Cli, yes: bool) -> Result<()> {
    let mut cache = NutritionCache::open(&cli.cache_file);
    if cache.is_empty() {
        println!("Cache is already empty.");
        return Ok(());
    }

    if !yes {
        print!("Delete {} cached products? [y/N] ", cache.len());
        io::stdout().flush().map_err(Error::from)?;

        let mut answer = String::new();
        io::stdin().read_line(&mut answer).map_err(Error::from)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = cache.len();
    cache.clear()?;
    println!("Removed {} cached products.", removed);
    Ok(())
}

fn cmd_tools() {
    for def in ToolRegistry::definitions() {
        println!("{}", def.name);
        println!("    {}", def.description);
    }
}

fn clip(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len).collect();
        format!("{}…", cut)
    }
}

async fn run(cli: Cli) -> Result<()> {
    match &cli.command {
        None | Some(Commands::Chat) => cmd_chat(&cli).await,
        Some(Commands::Ask { prompt }) => {
            let prompt = prompt.join(" ");
            cmd_ask(&cli, &prompt).await
        }
        Some(Commands::Search { query, limit }) => cmd_search(&cli, query, *limit).await,
        Some(Commands::Cache { action }) => match action {
            CacheAction::Stats => cmd_cache_stats(&cli),
            CacheAction::Export { output } => cmd_cache_export(&cli, output),
            CacheAction::Clear { yes } => cmd_cache_clear(&cli, *yes),
        },
        Some(Commands::Tools) => {
            cmd_tools();
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
