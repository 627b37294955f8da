use clap::Parser;
use sales_etl::adapters::http::catalog_key;
use sales_etl::core::etl::completion_message;
use sales_etl::core::filter::apply_filter;
use sales_etl::core::reader::{decode_input, parse_transactions};
use sales_etl::core::{ConfigProvider, Storage};
use sales_etl::utils::{logger, validation::Validate};
use sales_etl::{EtlEngine, LocalStorage, SalesPipeline, TomlConfig};
use std::collections::BTreeSet;

#[derive(Parser)]
#[command(name = "toml-sales-etl")]
#[command(about = "Sales enrichment ETL driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "sales-etl.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Dry run - parse the input and show what would be processed without calling the catalog
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(e.exit_code());
        }
    };

    // 初始化日誌
    let verbose = args.verbose || config.logging.verbose;
    if config.logging.json {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }

    tracing::info!("🚀 Starting TOML-based sales ETL");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code());
    }

    display_config_summary(&config, &args);

    let storage = LocalStorage::new(config.working_dir());

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No catalog requests or output files");
        perform_dry_run(&storage, &config).await?;
        return Ok(());
    }

    let pipeline = SalesPipeline::from_config(storage, config)?;
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(outcome) => {
            tracing::info!("✅ Sales ETL run completed successfully!");
            println!("{}", completion_message(&outcome));
        }
        Err(e) => {
            tracing::error!(
                "❌ Sales ETL run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Pipeline: {}", config.pipeline_name());
    if let Some(description) = &config.pipeline.description {
        println!("  Description: {}", description);
    }
    println!("  Working Dir: {}", config.working_dir());
    println!("  Input: {}", config.input_path());
    if config.enrichment_enabled() {
        println!(
            "  Catalog: {} (timeout {}s)",
            config.api_endpoint(),
            config.request_timeout_secs()
        );
    } else {
        println!("  Catalog: disabled");
    }
    println!("  Top Products: {}", config.top_n());

    let filter = config.filter();
    if !filter.is_empty() {
        println!("  Filter: {:?}", filter);
    }

    println!("  Enriched Output: {}", config.enriched_output_path());
    println!("  Report: {}", config.report_output_path());
    if let Some(path) = config.report_json_path() {
        println!("  JSON Report: {}", path);
    }

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(storage: &LocalStorage, config: &TomlConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");

    let bytes = storage.read_file(config.input_path()).await?;
    let batch = parse_transactions(&decode_input(&bytes))?;
    println!("  Parsed transactions: {}", batch.transactions.len());
    println!("  Malformed lines: {}", batch.skipped.len());
    for skipped in &batch.skipped {
        println!("    {}", skipped);
    }
    println!(
        "  Anomalous records: {}",
        batch.anomalies.flagged_transactions
    );

    let (kept, filtered_out) = apply_filter(batch.transactions, &config.filter());
    println!("  Filtered out: {}", filtered_out);

    // 無數字的商品代號不會送出請求
    let keys: BTreeSet<u64> = kept
        .iter()
        .filter_map(|t| catalog_key(&t.product_id))
        .collect();
    if config.enrichment_enabled() {
        println!("  Catalog requests needed: {}", keys.len());
    } else {
        println!("  Catalog requests needed: 0 (enrichment disabled)");
    }

    println!();
    println!("✅ Dry run analysis complete.");
    Ok(())
}
