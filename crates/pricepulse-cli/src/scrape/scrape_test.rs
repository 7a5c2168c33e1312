use std::path::{Path, PathBuf};

use pricepulse_core::{parse_platforms, Environment};
use pricepulse_sheets::{MemoryStore, RowStore, SheetsError};

use super::*;

const PLATFORMS: &str = r##"
platforms:
  - name: shop
    sheet: Shop
    output_file: shop.csv
    home_url: "home"
    location_inputs: ["input.pin"]
    card_selector: "div.card"
    identity: name
    brand_filter: query
    scroll:
      measure: count
      mode: step
      containers: ["#list"]
      wait: { min_ms: 0, max_ms: 0 }
      required_stable_iterations: 1
      max_iterations: 3
    fields:
      name: ["span.name"]
      current_price: ["span.price"]
    discount:
      no_discount: na
    missing_original: sentinel
    extra_columns: [identity]
    collections:
      - { name: Main, target: "listing" }
  - name: other
    sheet: Other
    output_file: other.csv
    card_selector: "a"
    identity: name
    brand_filter: query
    scroll:
      measure: count
      mode: step
      containers: ["#list"]
      wait: { min_ms: 0, max_ms: 0 }
      required_stable_iterations: 1
      max_iterations: 3
    fields:
      name: ["span"]
    missing_original: sentinel
    collections:
      - { name: Main, target: "other-listing" }
"##;

const LISTING: &str = r#"<html><body><div id="list">
    <div class="card"><span class="name">Pepe Brief</span><span class="price">₹399</span></div>
    <div class="card"><span class="name">Pepe "Classic" Trunk</span><span class="price">₹549</span></div>
</div></body></html>"#;

fn platforms() -> PlatformsFile {
    parse_platforms(PLATFORMS).expect("test platforms parse")
}

fn app_config(output_dir: &Path) -> AppConfig {
    AppConfig {
        env: Environment::Test,
        log_level: "info".to_string(),
        platforms_path: PathBuf::from("unused.yaml"),
        location: "560012".to_string(),
        output_dir: output_dir.to_path_buf(),
        spreadsheet_id: None,
        sheets_access_token: None,
        sheets_base_url: "https://sheets.example.test".to_string(),
        request_timeout_secs: 5,
        navigation_retries: 0,
        retry_backoff_base_ms: 0,
        run_budget_secs: 60,
        user_agent: "pricepulse-test".to_string(),
    }
}

fn profile(name: &str) -> PlatformProfile {
    let config = platforms().find(name).unwrap().clone();
    PlatformProfile::compile(config).unwrap()
}

/// Rejects every call, standing in for an unreachable spreadsheet.
struct FailingStore;

impl RowStore for FailingStore {
    async fn clear(&self, _: &str) -> Result<(), SheetsError> {
        Err(SheetsError::Api {
            status: 403,
            message: "The caller does not have permission".to_string(),
        })
    }
    async fn write_rows(&self, _: &str, _: &[Vec<String>]) -> Result<(), SheetsError> {
        Ok(())
    }
    async fn read_rows(&self, _: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        Ok(Vec::new())
    }
}

#[test]
fn html_target_splits_at_last_equals() {
    let (target, file) =
        parse_html_target("https://shop.test/dc/?filter=abc==&name=Pepe=./dump.html").unwrap();
    assert_eq!(target, "https://shop.test/dc/?filter=abc==&name=Pepe");
    assert_eq!(file, PathBuf::from("./dump.html"));
}

#[test]
fn html_target_requires_both_halves() {
    assert!(parse_html_target("listing.html").is_err());
    assert!(parse_html_target("=listing.html").is_err());
    assert!(parse_html_target("listing=").is_err());
}

#[test]
fn select_platforms_filters_case_insensitively() {
    let file = platforms();
    let selected = select_platforms(&file, Some("SHOP")).unwrap();
    assert_eq!(selected.len(), 1);
    assert_eq!(selected[0].name, "shop");
    assert_eq!(select_platforms(&file, None).unwrap().len(), 2);
}

#[test]
fn select_platforms_unknown_name_lists_known_ones() {
    let err = select_platforms(&platforms(), Some("bigbasket")).unwrap_err();
    assert!(err.to_string().contains("shop, other"));
}

#[test]
fn sheets_client_needs_spreadsheet_and_token() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = app_config(dir.path());
    assert!(build_sheets_client(&config, Some("sid")).unwrap().is_none());

    config.sheets_access_token = Some("token".to_string());
    assert!(build_sheets_client(&config, None).unwrap().is_none());
    assert!(build_sheets_client(&config, Some("sid")).unwrap().is_some());
}

#[test]
fn html_targets_are_loaded_once_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let saved = dir.path().join("listing.html");
    std::fs::write(&saved, LISTING).unwrap();

    assert!(load_html_targets(&[]).unwrap().is_none());
    assert!(load_html_targets(&[("listing".to_string(), saved)])
        .unwrap()
        .is_some());

    let err = load_html_targets(&[("listing".to_string(), dir.path().join("missing.html"))])
        .unwrap_err();
    assert!(format!("{err:#}").contains("missing.html"));
}

#[tokio::test]
async fn unreadable_html_file_stops_before_any_platform_runs() {
    let dir = tempfile::tempdir().unwrap();
    let config = app_config(dir.path());
    let saved = dir.path().join("listing.html");
    std::fs::write(&saved, LISTING).unwrap();
    let args = ScrapeArgs {
        platform: None,
        html: vec![
            ("listing".to_string(), saved),
            ("other-listing".to_string(), dir.path().join("missing.html")),
        ],
        no_sheets: true,
    };

    let err = run_scrape(&config, &platforms(), &args).await.unwrap_err();

    assert!(format!("{err:#}").contains("other-listing"));
    assert!(!dir.path().join("shop.csv").exists());
}

#[tokio::test]
async fn saved_pages_serve_every_selected_platform() {
    let dir = tempfile::tempdir().unwrap();
    let config = app_config(dir.path());
    let saved = dir.path().join("listing.html");
    std::fs::write(&saved, LISTING).unwrap();
    let args = ScrapeArgs {
        platform: Some("shop".to_string()),
        html: vec![("listing".to_string(), saved)],
        no_sheets: true,
    };

    run_scrape(&config, &platforms(), &args).await.unwrap();

    let csv = std::fs::read_to_string(dir.path().join("shop.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);
}

#[tokio::test]
async fn platform_run_writes_csv_then_sheet() {
    let dir = tempfile::tempdir().unwrap();
    let config = app_config(dir.path());
    let store = MemoryStore::new().with_tab("Shop", vec![vec!["stale".to_string()]; 5]);
    let mut page = HtmlPage::new()
        .with_document("home", r#"<input class="pin">"#)
        .with_document("listing", LISTING);

    let outcome = run_platform(&mut page, Some(&store), &profile("shop"), &config, true).await;

    assert!(outcome.succeeded);
    assert_eq!(outcome.records, 2);
    assert_eq!(outcome.sheet_written, Some(true));
    assert_eq!(page.location(), Some("560012"));

    let csv = std::fs::read_to_string(dir.path().join("shop.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        r#""name","unit","current_price","original_price","discount","id""#
    );
    assert_eq!(
        lines[2],
        r#""Pepe ""Classic"" Trunk","NA","549","NA","NA","Pepe ""Classic"" Trunk""#
    );

    let sheet = store.rows("Shop");
    assert_eq!(sheet.len(), 3);
    assert_eq!(sheet[1][0], "Pepe Brief");
}

#[tokio::test]
async fn sheet_failure_keeps_csv_and_still_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let config = app_config(dir.path());
    let mut page = HtmlPage::new().with_document("listing", LISTING);

    let outcome = run_platform(&mut page, Some(&FailingStore), &profile("shop"), &config, false).await;

    assert!(outcome.csv_written);
    assert_eq!(outcome.sheet_written, Some(false));
    assert!(outcome.succeeded);
    assert!(dir.path().join("shop.csv").exists());
}

#[tokio::test]
async fn unreachable_home_page_fails_platform() {
    let dir = tempfile::tempdir().unwrap();
    let config = app_config(dir.path());
    let mut page = HtmlPage::new().with_document("listing", LISTING);

    let outcome =
        run_platform(&mut page, None::<&MemoryStore>, &profile("shop"), &config, true).await;

    assert!(!outcome.succeeded);
    assert!(!dir.path().join("shop.csv").exists());
}

#[tokio::test]
async fn platform_with_no_completed_collection_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = app_config(dir.path());
    let store = MemoryStore::new().with_tab("Other", vec![vec!["keep".to_string()]]);
    let mut page = HtmlPage::new();

    let outcome = run_platform(&mut page, Some(&store), &profile("other"), &config, false).await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.failed_collections, 1);
    assert_eq!(store.rows("Other"), vec![vec!["keep".to_string()]]);
    assert!(!dir.path().join("other.csv").exists());
}

#[test]
fn summary_fails_only_when_every_platform_failed() {
    let ok = PlatformOutcome {
        records: 3,
        csv_written: true,
        succeeded: true,
        ..PlatformOutcome::failed("shop")
    };
    assert!(summarize(&[ok, PlatformOutcome::failed("other")]).is_ok());
    assert!(summarize(&[PlatformOutcome::failed("shop"), PlatformOutcome::failed("other")]).is_err());
}
