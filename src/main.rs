//! Market admin command-line entry point.

use clap::{Parser, Subcommand};
use dialoguer::{Confirm, Input};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use market_admin::config::Config;
use market_admin::display::{details_lines, markets_table, notice_line};
use market_admin::market::auth::TOKEN_KEY;
use market_admin::market::{provider_from_config, AdminClient, MarketRow, TokenStore};
use market_admin::metrics;
use market_admin::views::{MarketForm, MarketListView, Notice, ResultDeclarationView};

/// Admin client for numbers-game betting markets.
#[derive(Parser, Debug)]
#[command(name = "market-admin")]
#[command(about = "Manage betting markets through the admin API")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List markets with betting status and latest results (default).
    Markets,

    /// Open or close betting on a market.
    Toggle {
        /// The market's marketId.
        market_id: String,
    },

    /// Delete a market.
    Delete {
        /// Backend id or marketId of the market.
        id: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Add a market. Missing fields are prompted for.
    Add {
        /// Market name.
        #[arg(long)]
        name: Option<String>,

        /// Opening time, 24-hour HH:MM.
        #[arg(long)]
        open_time: Option<String>,

        /// Closing time, 24-hour HH:MM.
        #[arg(long)]
        close_time: Option<String>,

        /// Open betting immediately.
        #[arg(long)]
        betting_open: bool,
    },

    /// Show a market's details and results.
    Results {
        /// marketId to show (defaults to the first market).
        #[arg(long)]
        market: Option<String>,
    },

    /// Declare open and close results for a market.
    Declare {
        /// marketId to declare for (defaults to the first market).
        #[arg(long)]
        market: Option<String>,

        /// Open result.
        #[arg(long)]
        open_result: String,

        /// Close result.
        #[arg(long)]
        close_result: String,
    },

    /// Manage the persisted admin token.
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Check configuration validity.
    CheckConfig,
}

#[derive(Subcommand, Debug)]
enum TokenAction {
    /// Store a bearer token.
    Set {
        /// The token.
        token: String,
    },
    /// Remove the stored token.
    Clear,
    /// Show whether a token is stored.
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("market_admin=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Initialize metrics
    metrics::init_metrics();

    // Handle subcommands
    match args.command {
        None | Some(Command::Markets) => cmd_markets().await,
        Some(Command::Toggle { market_id }) => cmd_toggle(&market_id).await,
        Some(Command::Delete { id, yes }) => cmd_delete(&id, yes).await,
        Some(Command::Add {
            name,
            open_time,
            close_time,
            betting_open,
        }) => cmd_add(name, open_time, close_time, betting_open).await,
        Some(Command::Results { market }) => cmd_results(market.as_deref()).await,
        Some(Command::Declare {
            market,
            open_result,
            close_result,
        }) => cmd_declare(market.as_deref(), open_result, close_result).await,
        Some(Command::Token { action }) => cmd_token(action),
        Some(Command::CheckConfig) => cmd_check_config(),
    }
}

/// Load and validate configuration.
fn load_config() -> anyhow::Result<Config> {
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
    }

    Ok(config)
}

/// Build the API client with the configured token provider.
fn build_client(config: &Config) -> anyhow::Result<AdminClient> {
    let client = AdminClient::new(config, provider_from_config(config))?;
    info!(base_url = %client.base_url(), "Admin client ready");
    Ok(client)
}

/// Mount the list view, printing the failure message if the fetch fails.
async fn mounted_list(config: &Config) -> anyhow::Result<MarketListView<AdminClient>> {
    let mut view = MarketListView::new(build_client(config)?);
    if let Err(e) = view.mount().await {
        println!("{}", markets_table(view.state(), view.rows()));
        return Err(e.into());
    }
    Ok(view)
}

fn print_notice(notice: Option<&Notice>) {
    if let Some(notice) = notice {
        println!("{}", notice_line(notice));
    }
}

fn print_banner(title: &str) {
    println!("======================================================================");
    println!("MARKET ADMIN - {}", title);
    println!("======================================================================");
}

/// List markets.
async fn cmd_markets() -> anyhow::Result<()> {
    let config = load_config()?;
    let view = mounted_list(&config).await?;

    print_banner("MARKETS");
    println!("{}", markets_table(view.state(), view.rows()));
    Ok(())
}

/// Flip betting for one market.
async fn cmd_toggle(market_id: &str) -> anyhow::Result<()> {
    let config = load_config()?;
    let mut view = mounted_list(&config).await?;

    let current = view
        .find(market_id)
        .map(|row| row.market.is_betting_open)
        .unwrap_or_default();
    let result = view.toggle_betting(market_id, current).await;

    print_notice(view.notice());
    result?;

    println!("{}", markets_table(view.state(), view.rows()));
    Ok(())
}

/// Ask the operator before deleting.
fn confirm_delete(row: &MarketRow) -> bool {
    Confirm::new()
        .with_prompt(format!(
            "Are you sure you want to delete market {} ({})?",
            row.market.name,
            row.market_id()
        ))
        .default(false)
        .interact()
        .unwrap_or_else(|e| {
            warn!("Confirmation prompt failed: {}", e);
            false
        })
}

/// Delete one market after confirmation.
async fn cmd_delete(key: &str, yes: bool) -> anyhow::Result<()> {
    let config = load_config()?;
    let mut view = mounted_list(&config).await?;

    let id = view
        .resolve(key)
        .map(|row| row.id.clone())
        .unwrap_or_else(|| key.to_string());

    let result = view
        .delete_market(&id, |row| yes || confirm_delete(row))
        .await;

    print_notice(view.notice());
    if !result? {
        println!("Delete cancelled.");
        return Ok(());
    }

    println!("{}", markets_table(view.state(), view.rows()));
    Ok(())
}

fn prompt_field(value: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match value {
        Some(value) => Ok(value),
        None => Ok(Input::<String>::new().with_prompt(prompt).interact_text()?),
    }
}

/// Fill and submit the add-market form.
async fn cmd_add(
    name: Option<String>,
    open_time: Option<String>,
    close_time: Option<String>,
    betting_open: bool,
) -> anyhow::Result<()> {
    let config = load_config()?;
    let mut view = mounted_list(&config).await?;

    let mut form = MarketForm::open();
    form.name = prompt_field(name, "Market name")?;
    form.open_time = prompt_field(open_time, "Open time (HH:MM)")?;
    form.close_time = prompt_field(close_time, "Close time (HH:MM)")?;
    form.is_betting_open = betting_open;

    let result = form.submit(&mut view).await;

    if let Some(inline) = form.error() {
        println!("ERROR: {}", inline);
    }
    let created = result?;
    info!(market_id = %created.market_id, "Form closed after save");

    print_notice(view.notice());
    println!("{}", markets_table(view.state(), view.rows()));
    Ok(())
}

async fn mounted_results(
    config: &Config,
    market: Option<&str>,
) -> anyhow::Result<ResultDeclarationView<AdminClient>> {
    let mut view = ResultDeclarationView::new(build_client(config)?);
    if let Err(e) = view.mount().await {
        println!("Error: {}", market_admin::views::LOAD_FAILED);
        return Err(e.into());
    }
    if let Some(market_id) = market {
        view.select(market_id)?;
    }
    Ok(view)
}

fn print_details<A: market_admin::market::MarketApi>(view: &ResultDeclarationView<A>) {
    match view.details() {
        Some(details) => {
            for line in details_lines(&details) {
                println!("{}", line);
            }
        }
        None => println!("No markets."),
    }
}

/// Show details of one market.
async fn cmd_results(market: Option<&str>) -> anyhow::Result<()> {
    let config = load_config()?;
    let view = mounted_results(&config, market).await?;

    print_banner("MARKET DETAILS");
    print_details(&view);
    Ok(())
}

/// Declare results for one market.
async fn cmd_declare(
    market: Option<&str>,
    open_result: String,
    close_result: String,
) -> anyhow::Result<()> {
    let config = load_config()?;
    let mut view = mounted_results(&config, market).await?;

    view.set_results(open_result, close_result);
    let result = view.submit().await;

    print_notice(view.notice());
    result?;

    print_details(&view);
    Ok(())
}

/// Manage the persisted token.
fn cmd_token(action: TokenAction) -> anyhow::Result<()> {
    let config = load_config()?;
    let store = TokenStore::from_config(&config)?;

    match action {
        TokenAction::Set { token } => {
            store.set(TOKEN_KEY, token.trim())?;
            println!("Token stored in {}", store.path().display());
        }
        TokenAction::Clear => {
            if store.remove(TOKEN_KEY)? {
                println!("Token removed from {}", store.path().display());
            } else {
                println!("No token stored.");
            }
        }
        TokenAction::Show => match store.get(TOKEN_KEY)? {
            Some(token) => println!("Token: {}", mask(&token)),
            None => println!("No token stored."),
        },
    }

    Ok(())
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}... ({} chars)", visible, token.chars().count())
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    print_banner("CONFIGURATION CHECK");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  API URL: {}", config.admin_api_url);
    println!(
        "  Token Source: {}",
        if config.admin_token.is_some() {
            "ADMIN_TOKEN".to_string()
        } else {
            match config.token_store_path() {
                Some(path) => format!("token store ({})", path.display()),
                None => "none".to_string(),
            }
        }
    );
    match config.http_timeout_ms {
        Some(ms) => println!("  Request Timeout: {}ms", ms),
        None => println!("  Request Timeout: none"),
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}
