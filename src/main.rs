use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use weblibri_client::*;

#[derive(Parser, Debug)]
#[command(name = "weblibri", version, about = "Browse a weblibri library and open converted books")]
struct Cli {
    /// Base URL of the JSON API
    #[arg(long, env = "WEBLIBRI_API_ROOT", default_value = DEFAULT_API_ROOT)]
    api_root: String,

    /// Path prefix the web application is mounted under
    #[arg(long, env = "WEBLIBRI_APP_PREFIX", default_value = "")]
    app_prefix: String,

    /// Delay before the first readiness poll, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_INITIAL_DELAY_MS)]
    initial_delay: u64,

    /// Upper bound on the poll delay, in milliseconds (unbounded if unset)
    #[arg(long, value_name = "MS")]
    max_delay: Option<u64>,

    /// Per-request timeout, in seconds (none if unset)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// More output; repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the library with download links
    List,
    /// Open an item in the reader, waiting for conversion if needed
    Open { id: String },
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_root: self.api_root.clone(),
            app_prefix: self.app_prefix.clone(),
            poll: PollConfig {
                initial_delay: Duration::from_millis(self.initial_delay),
                max_delay: self.max_delay.map(Duration::from_millis),
                ..Default::default()
            },
            request_timeout: self.timeout.map(Duration::from_secs),
        }
    }
}

/// Progress "dialog" on the terminal. Ctrl-C dismisses every open session
/// through the registry, so the handle is not kept here.
struct TerminalDialog;

impl ProgressDialog for TerminalDialog {
    fn show(&self, item: &ItemId, _on_dismiss: DismissHandle) {
        eprintln!("Converting item {}, press Ctrl-C to give up...", item);
    }
}

struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, target: &str) {
        println!("{}", target);
    }
}

async fn list(client: &LibraryClient) -> Result<()> {
    let items = client.fetch_items().await.context("Failed to fetch the library")?;
    for item in &items {
        let links: Vec<String> = client
            .links()
            .download_links(item)
            .into_iter()
            .map(|link| format!("{} <{}>", link.format, link.href))
            .collect();
        println!("{}\t{}\t{}\t{}", item.id, item.title, item.author_sort, links.join(" "));
    }
    Ok(())
}

/// Wait for `handle` to finish; if `shutdown` fires first, dismiss every
/// live session and wait for this one to wind down.
async fn wait_or_shutdown(
    lifecycle: &SessionLifecycle,
    handle: &SessionHandle,
    shutdown: impl Future<Output = ()>,
) -> SessionState {
    tokio::select! {
        state = handle.wait() => state,
        _ = shutdown => {
            lifecycle.registry().dismiss_all().await;
            handle.wait().await
        }
    }
}

async fn open(client: Arc<LibraryClient>, config: &ClientConfig, id: String) -> Result<()> {
    let links = client.links().clone();
    let lifecycle = SessionLifecycle::new(
        client,
        Arc::new(TerminalDialog),
        Arc::new(PrintNavigator),
        links,
        config.poll.clone(),
    );

    let handle = match lifecycle.open_item(ItemId::new(id)).await? {
        OpenOutcome::Navigated(_) => return Ok(()),
        OpenOutcome::Converting(handle) => handle,
    };

    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("Cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    let state = wait_or_shutdown(&lifecycle, &handle, ctrl_c).await;

    if state == SessionState::Cancelled {
        anyhow::bail!("Conversion of item {} was cancelled", handle.item_id());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = cli.client_config();
    config.validate().context("Invalid configuration")?;
    let client = Arc::new(LibraryClient::new(&config)?);

    match cli.command {
        Command::List => list(&client).await,
        Command::Open { id } => open(client, &config, id).await,
    }
}
