//! End-to-end aggregation over static listings.
//!
//! Each test registers pre-rendered listing documents with an `HtmlPage` and
//! runs the full load, converge, extract and dedup pipeline over them.

use std::time::Duration;

use pricepulse_core::{parse_platforms, StockStatus};
use pricepulse_scraper::{
    open_session, Aggregator, CollectionStatus, HtmlPage, PlatformProfile, RetryPolicy,
    RunSettings,
};

const PROFILE: &str = r##"
platforms:
  - name: teststore
    sheet: Test
    output_file: test.csv
    home_url: "home"
    location_inputs: ["input.pincode"]
    card_selector: "div.card"
    identity: dom_id
    brand_filter: query
    scroll:
      measure: height
      mode: to_end
      containers: ["#list"]
      wait: { min_ms: 0, max_ms: 0 }
      required_stable_iterations: 2
      max_iterations: 6
    fields:
      name: ["div.name"]
      current_price: ["div.price"]
      original_price: ["div.mrp"]
      stock: ["div.overlay"]
    discount:
      no_discount: zero_percent
      suffix: "% OFF"
    missing_original: use_current
    extra_columns: [stock]
    collections:
      - { name: A, target: "listing-a" }
      - { name: B, target: "listing-b" }
      - { name: C, target: "listing-c" }
"##;

fn profile() -> PlatformProfile {
    let file = parse_platforms(PROFILE).expect("test profile parses");
    PlatformProfile::compile(file.platforms[0].clone()).expect("test profile compiles")
}

fn settings() -> RunSettings {
    RunSettings::new(
        RetryPolicy {
            max_retries: 1,
            backoff_base_ms: 0,
        },
        None,
    )
}

fn card(id: &str, name: &str) -> String {
    format!(
        r#"<div class="card" id="{id}">
            <div class="name">{name}</div>
            <div class="price">₹499</div>
            <div class="mrp">₹999</div>
        </div>"#
    )
}

/// A listing with `count` cards named `{prefix} 1..=count`.
fn listing(prefix: &str, count: usize) -> String {
    let cards: String = (1..=count)
        .map(|i| card(&format!("{prefix}-{i}"), &format!("{prefix} Product {i}")))
        .collect();
    format!(r#"<html><body><div id="list">{cards}</div></body></html>"#)
}

#[tokio::test]
async fn failed_collection_does_not_abort_the_run() {
    let profile = profile();
    // B renders cards but the scroll container is gone.
    let broken = format!("<html><body>{}</body></html>", card("b-1", "B Product 1"));
    let mut page = HtmlPage::new()
        .with_document("listing-a", listing("A", 12))
        .with_document("listing-b", broken)
        .with_document("listing-c", listing("C", 8));

    let report = Aggregator::new(&mut page, &profile, settings())
        .aggregate()
        .await;

    assert_eq!(report.records.len(), 20);
    assert_eq!(report.outcomes.len(), 3);
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].collection, "B");
    assert!(matches!(
        failures[0].status,
        CollectionStatus::Failed { ref error } if error.contains("structural mismatch")
    ));
    assert!(!report.nothing_completed());

    let first = &report.records[0];
    assert_eq!(first.identity, "A-1");
    assert_eq!(first.current_price, "499");
    assert_eq!(first.discount, "50% OFF");
    assert_eq!(first.stock, StockStatus::InStock);
    assert_eq!(report.records[12].name, "C Product 1");
}

#[tokio::test]
async fn duplicates_keep_first_occurrence() {
    let profile = profile();
    let a = format!(
        r#"<div id="list">{}{}{}</div>"#,
        card("x1", "Brief"),
        card("x1", "Brief again"),
        card("x2", "Trunk"),
    );
    let b = format!(
        r#"<div id="list">{}{}</div>"#,
        card("y1", "Trunk"),
        card("y2", "Vest"),
    );
    let mut page = HtmlPage::new()
        .with_document("listing-a", a)
        .with_document("listing-b", b)
        .with_document("listing-c", listing("C", 1));

    let report = Aggregator::new(&mut page, &profile, settings())
        .aggregate()
        .await;

    let names: Vec<_> = report.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Brief", "Trunk", "Vest", "C Product 1"]);
    assert!(matches!(
        report.outcomes[0].status,
        CollectionStatus::Completed { materialized: 3, extracted: 3, kept: 2, converged: true }
    ));
    assert!(matches!(
        report.outcomes[1].status,
        CollectionStatus::Completed { kept: 1, .. }
    ));
}

#[tokio::test]
async fn same_name_variants_within_a_collection_are_all_kept() {
    let profile = profile();
    let a = format!(
        r#"<div id="list">{}{}</div>"#,
        card("x1", "Pepe Jeans Men Trunk"),
        card("x2", "Pepe Jeans Men Trunk"),
    );
    let b = format!(
        r#"<div id="list">{}{}</div>"#,
        card("y1", "Pepe Jeans Men Trunk"),
        card("y2", "Pepe Jeans Men Vest"),
    );
    let mut page = HtmlPage::new()
        .with_document("listing-a", a)
        .with_document("listing-b", b)
        .with_document("listing-c", listing("C", 1));

    let report = Aggregator::new(&mut page, &profile, settings())
        .aggregate()
        .await;

    let ids: Vec<_> = report.records.iter().map(|r| r.identity.as_str()).collect();
    assert_eq!(ids, vec!["x1", "x2", "y2", "C-1"]);
    assert!(matches!(
        report.outcomes[0].status,
        CollectionStatus::Completed { extracted: 2, kept: 2, .. }
    ));
}

#[tokio::test]
async fn unloadable_collection_fails_after_retries() {
    let profile = profile();
    let mut page = HtmlPage::new()
        .with_document("listing-a", listing("A", 2))
        .with_document("listing-c", listing("C", 2));

    let report = Aggregator::new(&mut page, &profile, settings())
        .aggregate()
        .await;

    assert_eq!(report.records.len(), 4);
    assert!(matches!(
        report.outcomes[1].status,
        CollectionStatus::Failed { ref error } if error.contains("listing-b")
    ));
}

#[tokio::test]
async fn exhausted_budget_skips_remaining_collections() {
    let profile = profile();
    let mut page = HtmlPage::new().with_document("listing-a", listing("A", 2));
    let settings = RunSettings::new(
        RetryPolicy {
            max_retries: 0,
            backoff_base_ms: 0,
        },
        Some(Duration::ZERO),
    );

    let report = Aggregator::new(&mut page, &profile, settings)
        .aggregate()
        .await;

    assert!(report.records.is_empty());
    assert!(report.nothing_completed());
    assert!(report
        .outcomes
        .iter()
        .all(|o| matches!(o.status, CollectionStatus::Skipped { .. })));
}

#[tokio::test]
async fn session_sets_location_from_home_page() {
    let profile = profile();
    let mut page = HtmlPage::new().with_document(
        "home",
        r#"<html><body><input class="pincode"></body></html>"#,
    );

    let applied = open_session(&mut page, &profile, "560012").await.unwrap();

    assert!(applied);
    assert_eq!(page.location(), Some("560012"));
}
