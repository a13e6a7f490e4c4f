use clap::Parser;
use hydrus_browser::api::client::{HydrusClient, MediaApi, PERMISSION_SEARCH_FILES};
use hydrus_browser::api::types::{ByteRange, FileRef, MetadataQuery, DEFAULT_TAG_SERVICE};
use hydrus_browser::app::shell::AppShell;
use hydrus_browser::browse::search::{fetch_results, parse_tags};
use hydrus_browser::browse::store::ResultStore;
use hydrus_browser::browse::tags::TagGroups;
use hydrus_browser::core::config::Config;
use hydrus_browser::core::error::{Error, Result};
use hydrus_browser::core::logging;
use hydrus_browser::ui::cli::{Cli, Commands, ConnectionArgs};
use hydrus_browser::ui::tui::BrowserTui;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Init { force }) = &cli.command {
        logging::init_stderr(cli.verbose);
        return handle_init(&cli.connection, *force);
    }

    let config = load_config(&cli.connection)?;

    let Some(command) = cli.command else {
        let _guard = logging::init_file(&config.log_dir, cli.verbose)?;
        return handle_tui(config, cli.query).await;
    };

    logging::init_stderr(cli.verbose);
    let client = HydrusClient::from_config(&config)?;

    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Version => handle_version(&client).await,
        Commands::Search { query, page } => {
            handle_search(&client, &query, page, config.settings.page_size).await
        }
        Commands::Metadata { file_ids, json } => handle_metadata(&client, file_ids, json).await,
        Commands::Thumbnail { file_id, hash, output } => {
            let file = FileRef::from_parts(file_id, hash, "get_thumbnail")?;
            let bytes = client.get_thumbnail(&file).await?;
            write_output(&output, &bytes).await
        }
        Commands::File { file_id, hash, output, start, end } => {
            let file = FileRef::from_parts(file_id, hash, "get_file")?;
            let range = start.map(|start| ByteRange::new(start, end));
            let bytes = client.get_file(&file, range).await?;
            write_output(&output, &bytes).await
        }
        Commands::Url { file_id } => {
            println!("{}", client.file_url(file_id)?);
            Ok(())
        }
        Commands::Permissions { name } => handle_permissions(&client, &name).await,
    }
}

/// Read config.toml, apply command-line overrides, then validate the result
fn load_config(args: &ConnectionArgs) -> Result<Config> {
    let mut config = Config::load(args.base_dir())?;
    args.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn handle_init(args: &ConnectionArgs, force: bool) -> Result<()> {
    let mut config = Config::new(args.base_dir())?;
    args.apply(&mut config);
    config.validate()?;

    if config.is_initialized() && !force {
        println!("hydrus-browser is already initialized at: {:?}", config.config_path);
        println!("To overwrite it, run 'hydrus-browser init --force'.");
        return Ok(());
    }

    config.init()?;
    println!("✓ Wrote configuration: {:?}", config.config_path);
    println!("✓ Created log directory: {:?}", config.log_dir);
    println!("\nNext steps:");
    println!("  1. Get an access key: hydrus-browser permissions");
    println!("  2. Put it in {:?} as access_key", config.config_path);
    println!("  3. Browse: hydrus-browser");
    Ok(())
}

async fn handle_tui(config: Config, query: Option<String>) -> Result<()> {
    let client = HydrusClient::from_config(&config)?;
    tracing::info!(url = client.base_url(), "starting tui");

    let api: Arc<dyn MediaApi> = Arc::new(client);
    let (mut shell, events) = AppShell::new(api, config.settings.page_size, config.download_dir());
    if let Some(query) = query {
        shell.set_search_value(query);
    }

    BrowserTui::new(shell, events).run().await
}

async fn handle_version(client: &HydrusClient) -> Result<()> {
    let version = client.api_version().await?;
    println!("API version: {}", version.version);
    println!("Hydrus version: {}", version.hydrus_version);
    Ok(())
}

async fn handle_search(client: &HydrusClient, query: &str, page: usize, page_size: usize) -> Result<()> {
    let tags = parse_tags(query);
    if tags.is_empty() {
        return Err(Error::Config("No tags given".to_string()));
    }

    let results = fetch_results(client, &tags).await?;
    let mut store = ResultStore::new(page_size);
    store.reset(results);

    if store.is_empty() {
        println!("No results found for: {}", tags.join(" "));
        return Ok(());
    }

    let shown = store.set_page(page);
    println!(
        "{} results, page {}/{}:",
        store.len(),
        shown,
        store.total_pages()
    );

    let offset = (shown - 1) * store.page_size();
    for (i, result) in store.page().iter().enumerate() {
        let Some(metadata) = &result.metadata else {
            continue;
        };
        let dims = match (metadata.width, metadata.height) {
            (Some(w), Some(h)) => format!("{}x{}", w, h),
            _ => "-".to_string(),
        };
        println!(
            "{:4}. #{:<8} {:<16} {:>11} {}",
            offset + i + 1,
            metadata.file_id,
            metadata.mime,
            dims,
            metadata.hash
        );
    }
    Ok(())
}

async fn handle_metadata(client: &HydrusClient, file_ids: Vec<u64>, json: bool) -> Result<()> {
    let metadata = client.file_metadata(&MetadataQuery::FileIds(file_ids)).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    for entry in &metadata {
        println!("#{} {} ({})", entry.file_id, entry.hash, entry.mime);
        let groups = TagGroups::from_tags(entry.display_tags(DEFAULT_TAG_SERVICE));
        for (kind, tags) in groups.sections() {
            if tags.is_empty() {
                continue;
            }
            let texts: Vec<&str> = tags.iter().map(|t| t.text).collect();
            println!("  {}: {}", kind.label(), texts.join(", "));
        }
    }
    Ok(())
}

async fn handle_permissions(client: &HydrusClient, name: &str) -> Result<()> {
    println!("Requesting a new access key. Confirm the request in hydrus...");
    let key = client
        .request_new_permissions(name, &[PERMISSION_SEARCH_FILES])
        .await?;
    println!("Access key: {}", key);
    println!("Add it to config.toml as access_key = \"{}\"", key);
    Ok(())
}

async fn write_output(path: &str, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes).await?;
    println!("✓ Wrote {} bytes to {}", bytes.len(), path);
    Ok(())
}
