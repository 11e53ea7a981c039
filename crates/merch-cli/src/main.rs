//! Operator CLI: inspect the catalog and verify configuration without
//! going through the web server.

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use merch_airtable::{AirtableClient, FetchOptions, ListParams};
use merch_core::normalize::{normalize, DisplayTier};
use merch_core::AppConfig;

#[derive(Debug, Parser)]
#[command(name = "merch-cli")]
#[command(about = "Merch catalog command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List normalized catalog products.
    Products {
        /// Maximum number of records to fetch.
        #[arg(long, default_value_t = 25)]
        limit: u32,
        /// View name to read from, overriding the configured one.
        #[arg(long)]
        view: Option<String>,
    },
    /// Fetch one raw record by id.
    Record { id: String },
    /// Verify the configured token and endpoint.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = merch_core::load_app_config()?;

    match cli.command {
        Commands::Products { limit, view } => {
            let client = build_client(&config)?;
            let page = client
                .list_records(&ListParams {
                    max_records: Some(limit),
                    view,
                    ..ListParams::default()
                })
                .await?;
            for record in &page.records {
                let product = normalize(record, DisplayTier::Sample);
                println!(
                    "{}  {}  {}  [{}]",
                    product.id,
                    product.name_en,
                    product.price,
                    product.categories.join(", ")
                );
            }
            if let Some(offset) = page.offset {
                println!("(more records available, next offset: {offset})");
            }
        }
        Commands::Record { id } => {
            let client = build_client(&config)?;
            let record = client.get_record(&id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::CheckConfig => {
            let client = build_client(&config)?;
            let page = client
                .list_records(&ListParams {
                    max_records: Some(1),
                    ..ListParams::default()
                })
                .await?;
            println!(
                "ok: base {} table {} reachable, {} record(s) sampled",
                client.endpoint().base_id(),
                client.endpoint().table_id(),
                page.records.len()
            );
        }
    }

    Ok(())
}

fn build_client(config: &AppConfig) -> anyhow::Result<AirtableClient> {
    let token = config
        .airtable_api_token
        .as_deref()
        .context("AIRTABLE_API_TOKEN is not set")?;
    let url = config
        .airtable_products_url
        .as_deref()
        .context("AIRTABLE_PRODUCTS_URL is not set")?;
    let options = FetchOptions {
        timeout_ms: config.gateway_timeout_ms,
        retries: config.gateway_max_retries,
        backoff_base_ms: config.gateway_backoff_base_ms,
        revalidate_secs: None,
    };
    Ok(AirtableClient::new(token, url, options)?)
}
