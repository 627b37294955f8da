use httpmock::prelude::*;
use regex::Regex;
use sales_etl::core::reader::parse_enriched;
use sales_etl::domain::model::EnrichmentStatus;
use sales_etl::{CliConfig, EtlEngine, EtlError, LocalStorage, SalesPipeline, TomlConfig};
use std::path::Path;
use tempfile::TempDir;

const SALES_DATA: &str = "\
TransactionID|Date|ProductID|ProductName|Quantity|UnitPrice|CustomerID|Region
T001|2024-01-15|P101|Laptop|2|1,200.00|C001|North
T002|2024-01-16|P101|Laptop|1|1200.00|C002|South
T003|2024-01-16|P102|Mouse|10|25.50|C003|North
";

fn cli_config(working_dir: &Path, api_endpoint: String) -> CliConfig {
    CliConfig {
        working_dir: working_dir.to_str().unwrap().to_string(),
        input: "data/sales_data.txt".to_string(),
        enriched_output: "data/enriched_sales_data.txt".to_string(),
        report_output: "output/sales_report.txt".to_string(),
        report_json: None,
        api_endpoint,
        timeout_secs: 5,
        top_n: 5,
        region: None,
        min_amount: None,
        max_amount: None,
        no_enrich: false,
        include_header: false,
        verbose: false,
        log_json: false,
    }
}

fn write_input(dir: &Path, content: &[u8]) {
    let data_dir = dir.join("data");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::write(data_dir.join("sales_data.txt"), content).unwrap();
}

fn read_output(dir: &Path, path: &str) -> String {
    std::fs::read_to_string(dir.join(path)).unwrap()
}

#[tokio::test]
async fn test_end_to_end_with_mock_catalog() {
    let temp_dir = TempDir::new().unwrap();
    write_input(temp_dir.path(), SALES_DATA.as_bytes());

    let server = MockServer::start();
    let laptop_mock = server.mock(|when, then| {
        when.method(GET).path("/products/101");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({
                "id": 101,
                "title": "Gaming Laptop",
                "category": "laptops",
                "brand": "Acme",
                "price": 1299.99,
                "rating": 4.5
            }));
    });
    let mouse_mock = server.mock(|when, then| {
        when.method(GET).path("/products/102");
        then.status(404);
    });

    let mut config = cli_config(temp_dir.path(), server.url("/products/{id}"));
    config.report_json = Some("output/sales_report.json".to_string());

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = SalesPipeline::from_config(storage, config).unwrap();
    let engine = EtlEngine::new(pipeline);
    let outcome = engine.run().await.unwrap();

    // 同一商品只查詢一次
    laptop_mock.assert_hits(1);
    mouse_mock.assert_hits(1);

    let summary = &outcome.summary;
    assert_eq!(summary.total_transactions, 3);
    assert_eq!(summary.enriched, 2);
    assert_eq!(summary.enrichment_failed, 1);
    assert_eq!(summary.stats.catalog_lookups, 2);
    assert_eq!(summary.unmatched_products, vec!["P102".to_string()]);
    assert!((summary.total_revenue - 3855.0).abs() < 1e-9);

    let enriched = read_output(temp_dir.path(), "data/enriched_sales_data.txt");
    let lines: Vec<&str> = enriched.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("T001|2024-01-15|P101|Laptop|2|1200|C001|North|Gaming Laptop|laptops|Acme|"));
    assert!(lines[0].ends_with("|success"));
    assert!(lines[2].starts_with("T003|"));
    assert!(lines[2].ends_with("|||||failure"));

    let report = read_output(temp_dir.path(), "output/sales_report.txt");
    assert!(report.contains("SUMMARY"));
    assert!(report.contains("Total Revenue:         3,855.00"));
    assert!(report.contains("ENRICHMENT RATE"));
    assert!(report.contains("Unmatched Products:    P102"));
    assert!(report.contains("REGIONAL BREAKDOWN"));
    assert!(report.contains("TOP PRODUCTS"));
    assert!(report.contains("Gaming Laptop"));

    let json: serde_json::Value =
        serde_json::from_str(&read_output(temp_dir.path(), "output/sales_report.json")).unwrap();
    assert_eq!(json["total_transactions"], 3);
    assert_eq!(json["enriched"], 2);
}

#[tokio::test]
async fn test_ids_with_same_catalog_key_share_one_request() {
    let temp_dir = TempDir::new().unwrap();
    let input = "\
T001|2024-01-15|P101|Laptop|1|1200.00|C001|North
T002|2024-01-16|SKU-101|Laptop|1|1200.00|C002|South
";
    write_input(temp_dir.path(), input.as_bytes());

    let server = MockServer::start();
    let laptop_mock = server.mock(|when, then| {
        when.method(GET).path("/products/101");
        then.status(200)
            .json_body(serde_json::json!({ "title": "Gaming Laptop" }));
    });

    let config = cli_config(temp_dir.path(), server.url("/products/{id}"));
    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = SalesPipeline::from_config(storage, config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    laptop_mock.assert_hits(1);
    assert_eq!(outcome.summary.enriched, 2);
    assert_eq!(outcome.summary.stats.catalog_lookups, 1);
}

#[tokio::test]
async fn test_malformed_lines_are_skipped_and_reported() {
    let temp_dir = TempDir::new().unwrap();
    let input = "\
T001|2024-01-15|P101|Laptop|2|1200.00|C001|North
T002|2024-01-16|P101|Laptop|two|1200.00|C002|South
T003|not-a-date|P102|Mouse|10|25.50|C003|North
T004|2024-01-17|P102|Mouse|1
T005|2024-01-18|P102|Mouse|0|25.50|C005|East
";
    write_input(temp_dir.path(), input.as_bytes());

    let mut config = cli_config(temp_dir.path(), "http://127.0.0.1:9/products/{id}".to_string());
    config.no_enrich = true;

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = SalesPipeline::from_config(storage, config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    let summary = &outcome.summary;
    assert_eq!(summary.total_transactions, 2);
    assert_eq!(summary.not_attempted, 2);
    assert_eq!(summary.stats.catalog_lookups, 0);

    let skipped_lines: Vec<u64> = summary.stats.skipped.iter().map(|e| e.line).collect();
    assert_eq!(skipped_lines, vec![2, 3, 4]);
    assert_eq!(summary.stats.anomalies.non_positive_quantity, 1);

    let enriched = read_output(temp_dir.path(), "data/enriched_sales_data.txt");
    assert!(enriched.lines().all(|l| l.ends_with("|not_attempted")));

    let report = read_output(temp_dir.path(), "output/sales_report.txt");
    assert!(report.contains("Skipped Lines:         3"));
    assert!(report.contains("line 2: invalid quantity 'two'"));
}

#[tokio::test]
async fn test_empty_input_produces_empty_outputs() {
    let temp_dir = TempDir::new().unwrap();
    write_input(temp_dir.path(), b"");

    let server = MockServer::start();
    let catalog_mock = server.mock(|when, then| {
        when.method(GET);
        then.status(200);
    });

    let config = cli_config(temp_dir.path(), server.url("/products/{id}"));
    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = SalesPipeline::from_config(storage, config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    catalog_mock.assert_hits(0);
    assert_eq!(outcome.summary.total_transactions, 0);
    assert_eq!(outcome.summary.total_revenue, 0.0);
    assert_eq!(outcome.summary.enrichment_success_rate, 0.0);

    let enriched = read_output(temp_dir.path(), "data/enriched_sales_data.txt");
    assert!(enriched.is_empty());

    let report = read_output(temp_dir.path(), "output/sales_report.txt");
    assert!(report.contains("Total Transactions:    0"));
    assert!(report.contains("(none)"));
}

#[tokio::test]
async fn test_latin1_input_is_decoded() {
    let temp_dir = TempDir::new().unwrap();
    let mut input = b"T001|2024-01-15|P101|Caf".to_vec();
    input.push(0xE9);
    input.extend_from_slice(b" Mug|3|9.99|C001|North\n");
    write_input(temp_dir.path(), &input);

    let mut config = cli_config(temp_dir.path(), "http://127.0.0.1:9/products/{id}".to_string());
    config.no_enrich = true;

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = SalesPipeline::from_config(storage, config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    assert_eq!(outcome.summary.total_transactions, 1);
    let enriched = read_output(temp_dir.path(), "data/enriched_sales_data.txt");
    assert!(enriched.contains("Café Mug"));
}

#[tokio::test]
async fn test_missing_input_is_read_error() {
    let temp_dir = TempDir::new().unwrap();

    let config = cli_config(temp_dir.path(), "http://127.0.0.1:9/products/{id}".to_string());
    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = SalesPipeline::from_config(storage, config).unwrap();
    let result = EtlEngine::new(pipeline).run().await;

    let err = result.unwrap_err();
    assert!(matches!(err, EtlError::ReadError { .. }));
    assert_ne!(err.exit_code(), 0);
}

#[tokio::test]
async fn test_unwritable_output_is_write_error() {
    let temp_dir = TempDir::new().unwrap();
    write_input(temp_dir.path(), SALES_DATA.as_bytes());
    // 以檔案佔住輸出目錄的位置
    std::fs::write(temp_dir.path().join("blocked"), b"").unwrap();

    let mut config = cli_config(temp_dir.path(), "http://127.0.0.1:9/products/{id}".to_string());
    config.no_enrich = true;
    config.enriched_output = "blocked/enriched.txt".to_string();

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = SalesPipeline::from_config(storage, config).unwrap();
    let result = EtlEngine::new(pipeline).run().await;

    assert!(matches!(result, Err(EtlError::WriteError { .. })));
}

#[tokio::test]
async fn test_enriched_output_revenue_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    write_input(temp_dir.path(), SALES_DATA.as_bytes());

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path_matches(Regex::new(r"^/products/\d+$").unwrap());
        then.status(200).json_body(serde_json::json!({
            "title": "Catalog Item",
            "category": "misc",
            "price": 10.0
        }));
    });

    let mut config = cli_config(temp_dir.path(), server.url("/products/{id}"));
    config.include_header = true;

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = SalesPipeline::from_config(storage, config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    let enriched = read_output(temp_dir.path(), "data/enriched_sales_data.txt");
    assert!(enriched.starts_with("TransactionID|Date|ProductID"));

    let batch = parse_enriched(&enriched).unwrap();
    assert!(batch.skipped.is_empty());
    assert_eq!(batch.transactions.len(), 3);

    let revenue: f64 = batch.transactions.iter().map(|t| t.revenue()).sum();
    assert!((revenue - outcome.summary.total_revenue).abs() < 1e-9);
}

#[tokio::test]
async fn test_region_filter_limits_lookups() {
    let temp_dir = TempDir::new().unwrap();
    write_input(temp_dir.path(), SALES_DATA.as_bytes());

    let server = MockServer::start();
    let catalog_mock = server.mock(|when, then| {
        when.method(GET).path_matches(Regex::new(r"^/products/\d+$").unwrap());
        then.status(200).json_body(serde_json::json!({ "title": "Catalog Item" }));
    });

    let mut config = cli_config(temp_dir.path(), server.url("/products/{id}"));
    config.region = Some("South".to_string());

    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = SalesPipeline::from_config(storage, config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    catalog_mock.assert_hits(1);
    assert_eq!(outcome.summary.total_transactions, 1);
    assert_eq!(outcome.summary.stats.filtered_out, 2);
    assert_eq!(outcome.summary.regions.len(), 1);
    assert_eq!(outcome.summary.regions[0].region, "South");
}

#[tokio::test]
async fn test_toml_config_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    write_input(temp_dir.path(), SALES_DATA.as_bytes());

    let server = MockServer::start();
    let catalog_mock = server.mock(|when, then| {
        when.method(GET).path_matches(Regex::new(r"^/catalog/\d+$").unwrap());
        then.status(200).json_body(serde_json::json!({
            "title": "Catalog Item",
            "category": "misc"
        }));
    });

    let toml_content = format!(
        r#"
[pipeline]
name = "toml-e2e"

[input]
working_dir = "{}"
path = "data/sales_data.txt"

[catalog]
endpoint = "{}"
timeout_seconds = 5

[transform]
top_n = 1

[output]
enriched_path = "out/enriched.txt"
report_path = "out/report.txt"
include_header = true
"#,
        temp_dir.path().to_str().unwrap().replace('\\', "/"),
        server.url("/catalog/{id}")
    );
    let config_path = temp_dir.path().join("sales-etl.toml");
    std::fs::write(&config_path, toml_content).unwrap();

    let config = TomlConfig::from_file(&config_path).unwrap();
    let storage = LocalStorage::new(temp_dir.path());
    let pipeline = SalesPipeline::from_config(storage, config).unwrap();
    let outcome = EtlEngine::new(pipeline).run().await.unwrap();

    catalog_mock.assert_hits(2);
    assert_eq!(outcome.summary.top_products.len(), 1);
    assert_eq!(outcome.summary.top_products[0].product_id, "P102");

    let enriched = read_output(temp_dir.path(), "out/enriched.txt");
    let batch = parse_enriched(&enriched).unwrap();
    assert_eq!(batch.transactions.len(), 3);
    assert!(enriched
        .lines()
        .skip(1)
        .all(|l| l.ends_with(EnrichmentStatus::Success.as_str())));
    assert!(temp_dir.path().join("out/report.txt").exists());
}
