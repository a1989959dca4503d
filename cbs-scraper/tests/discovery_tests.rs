//! Integration tests for per-date discovery
//!
//! Every test drives a DiscoveryProber against the in-memory MockTransport
//! and a TempDir-backed document store.

mod helpers;

use cbs_scraper::services::date_cache::DateCache;
use cbs_scraper::services::discovery_prober::ProberOptions;
use cbs_scraper::services::{DateFlow, ScrapeController};
use helpers::*;
use tempfile::TempDir;

// ============================================================================
// Letter walk
// ============================================================================

#[tokio::test]
async fn test_first_letter_not_found_probes_once() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2023, 1, 1);

    let mut prober = prober(&transport, &temp_dir, ProberOptions::default());
    assert_eq!(prober.scrape_date(day).await, DateFlow::Continue);

    assert_eq!(transport.calls(), vec![endpoints().page_url(&id(day, 'a'))]);
    let result = prober.into_result();
    assert_eq!(result.downloaded, 0);
    assert_eq!(result.failed, 0);

    let cache = DateCache::load(&temp_dir.path().join("pdfs"));
    let entry = cache.lookup("2023-01-01").unwrap();
    assert!(!entry.had_documents);
    assert_eq!(entry.documents_found, 0);
}

#[tokio::test]
async fn test_walk_stops_at_first_gap() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    publish_letters(&transport, day, 'k', "European Central Bank");
    // Published but unreachable behind the gap at 'l'
    publish(&transport, &id(day, 'm'), "Speech by Mr Late, Bank of England");

    let mut prober = prober(&transport, &temp_dir, ProberOptions::default());
    prober.scrape_date(day).await;

    let pages = transport.page_calls();
    assert_eq!(pages.len(), 12);
    assert_eq!(pages.last().unwrap(), &endpoints().page_url(&id(day, 'l')));
    assert!(!pages.contains(&endpoints().page_url(&id(day, 'm'))));
    assert_eq!(transport.document_calls().len(), 11);

    let result = prober.into_result();
    assert_eq!(result.downloaded, 11);

    let store = store(&temp_dir);
    for letter in 'a'..='k' {
        let path = store.document_path("european central bank", &id(day, letter).code());
        assert_eq!(std::fs::read(&path).unwrap(), PDF_BYTES);
    }

    let cache = DateCache::load(store.documents_root());
    assert_eq!(cache.lookup("2024-05-03").unwrap().documents_found, 11);
}

#[tokio::test]
async fn test_walk_ends_after_last_letter() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    publish_letters(&transport, day, 'z', "Bank of Japan");

    let mut prober = prober(&transport, &temp_dir, ProberOptions::default());
    assert_eq!(prober.scrape_date(day).await, DateFlow::Continue);

    let pages = transport.page_calls();
    assert_eq!(pages.len(), 26);
    assert_eq!(pages.last().unwrap(), &endpoints().page_url(&id(day, 'z')));
    assert_eq!(transport.document_calls().len(), 26);
    assert_eq!(prober.into_result().downloaded, 26);

    let store = store(&temp_dir);
    let cache = DateCache::load(store.documents_root());
    let entry = cache.lookup("2024-05-03").unwrap();
    assert!(entry.had_documents);
    assert_eq!(entry.documents_found, 26);
}

#[tokio::test]
async fn test_second_run_uses_cache() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    publish_letters(&transport, day, 'c', "Bank of England");

    let mut first = prober(&transport, &temp_dir, ProberOptions::default());
    first.scrape_date(day).await;
    assert_eq!(first.into_result().downloaded, 3);

    let store = store(&temp_dir);
    let before = store.load_metadata("bank of england");
    transport.clear_calls();

    let mut second = prober(&transport, &temp_dir, ProberOptions::default());
    assert_eq!(second.scrape_date(day).await, DateFlow::Continue);

    assert!(transport.calls().is_empty());
    let result = second.into_result();
    assert_eq!(result.downloaded, 0);
    assert_eq!(result.skipped, 3);
    assert_eq!(store.load_metadata("bank of england"), before);
}

#[tokio::test]
async fn test_force_ignores_cache_and_stored_documents() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    publish_letters(&transport, day, 'b', "Bank of England");

    prober(&transport, &temp_dir, ProberOptions::default())
        .scrape_date(day)
        .await;
    transport.clear_calls();

    let options = ProberOptions {
        force: true,
        ..Default::default()
    };
    let mut forced = prober(&transport, &temp_dir, options);
    forced.scrape_date(day).await;

    assert_eq!(transport.page_calls().len(), 3);
    assert_eq!(forced.into_result().downloaded, 2);
}

// ============================================================================
// Cache keys
// ============================================================================

#[tokio::test]
async fn test_filtered_and_unfiltered_runs_cache_separately() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2023, 1, 1);

    prober(&transport, &temp_dir, ProberOptions::default())
        .scrape_date(day)
        .await;
    assert_eq!(transport.page_calls().len(), 1);

    let filtered = ProberOptions {
        institutions: Some(vec!["Bank of England".to_string()]),
        ..Default::default()
    };
    prober(&transport, &temp_dir, filtered)
        .scrape_date(day)
        .await;
    // The unfiltered entry did not short-circuit the filtered run
    assert_eq!(transport.page_calls().len(), 2);

    let cache = DateCache::load(&temp_dir.path().join("pdfs"));
    assert!(cache.lookup("2023-01-01").is_some());
    assert!(cache.lookup("2023-01-01|Bank of England").is_some());
    assert_eq!(cache.len(), 2);
}

// ============================================================================
// Limits, filters and failures
// ============================================================================

#[tokio::test]
async fn test_limit_stops_run_without_caching() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    publish_letters(&transport, day, 'e', "Bank of England");

    let options = ProberOptions {
        limit: Some(2),
        ..Default::default()
    };
    let mut prober = prober(&transport, &temp_dir, options);

    assert_eq!(prober.scrape_date(day).await, DateFlow::Stop);
    assert_eq!(transport.page_calls().len(), 2);
    assert!(prober.limit_reached());
    assert_eq!(prober.scrape_date(date(2024, 5, 4)).await, DateFlow::Stop);
    assert_eq!(prober.into_result().downloaded, 2);

    let cache = DateCache::load(&temp_dir.path().join("pdfs"));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_filter_skips_other_institutions() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    let ecb = id(day, 'a');
    let boe = id(day, 'b');
    publish(&transport, &ecb, &speech_text("Ms A", "European Central Bank", "3 May 2024"));
    publish(&transport, &boe, &speech_text("Mr B", "Bank of England", "3 May 2024"));

    let options = ProberOptions {
        // Alias form; compared after canonicalization
        institutions: Some(vec!["ECB".to_string()]),
        ..Default::default()
    };
    let mut prober = prober(&transport, &temp_dir, options);
    prober.scrape_date(day).await;

    assert_eq!(transport.document_calls(), vec![endpoints().document_url(&ecb)]);
    let result = prober.into_result();
    assert_eq!(result.downloaded, 1);
    assert_eq!(result.skipped, 1);

    let store = store(&temp_dir);
    assert!(store.document_path("european central bank", &ecb.code()).exists());
    assert!(!store.category_dir("bank of england").exists());
}

#[tokio::test]
async fn test_failed_identifier_does_not_stop_date() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    publish_letters(&transport, day, 'c', "Bank of England");
    transport.respond(&endpoints().page_url(&id(day, 'b')), 500, "Server Error");
    transport.fail(&endpoints().document_url(&id(day, 'c')), "connection reset");

    let mut prober = prober(&transport, &temp_dir, ProberOptions::default());
    assert_eq!(prober.scrape_date(day).await, DateFlow::Continue);

    assert_eq!(transport.page_calls().len(), 4);
    let result = prober.into_result();
    assert_eq!(result.downloaded, 1);
    assert_eq!(result.failed, 2);
    assert!(result.errors.contains_key("240503b"));
    assert!(result.errors.contains_key("240503c"));

    // The date still counts as checked: a and c were found, b never answered
    let cache = DateCache::load(&temp_dir.path().join("pdfs"));
    assert_eq!(cache.lookup("2024-05-03").unwrap().documents_found, 2);

    transport.clear_calls();
    let mut again = helpers::prober(&transport, &temp_dir, ProberOptions::default());
    assert_eq!(again.scrape_date(day).await, DateFlow::Continue);
    assert!(transport.calls().is_empty());
}

#[tokio::test]
async fn test_unrecordable_metadata_leaves_no_document() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    publish_letters(&transport, day, 'a', "Bank of England");

    let store = store(&temp_dir);
    // A folder where the mapping file should be makes every metadata write fail
    std::fs::create_dir_all(store.metadata_path("bank of england")).unwrap();

    let mut prober = prober(&transport, &temp_dir, ProberOptions::default());
    prober.scrape_date(day).await;

    let result = prober.into_result();
    assert_eq!(result.downloaded, 0);
    assert_eq!(result.failed, 1);
    assert!(result.errors.contains_key("240503a"));
    assert!(!store.document_path("bank of england", "240503a").exists());
    assert!(!store.text_log_path("bank of england").exists());
    assert!(!store.existing_codes().contains("240503a"));
}

#[tokio::test]
async fn test_stored_documents_skip_probe() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    publish_letters(&transport, day, 'b', "Bank of England");

    let store = store(&temp_dir);
    store
        .write_document("bank of england", &id(day, 'a').code(), b"existing")
        .unwrap();

    let mut prober = prober(&transport, &temp_dir, ProberOptions::default());
    prober.scrape_date(day).await;

    assert!(!transport
        .page_calls()
        .contains(&endpoints().page_url(&id(day, 'a'))));
    let result = prober.into_result();
    assert_eq!(result.skipped, 1);
    assert_eq!(result.downloaded, 1);

    // Not overwritten
    let kept = store.document_path("bank of england", &id(day, 'a').code());
    assert_eq!(std::fs::read(kept).unwrap(), b"existing");

    let cache = DateCache::load(store.documents_root());
    assert_eq!(cache.lookup("2024-05-03").unwrap().documents_found, 2);
}

// ============================================================================
// Persistence
// ============================================================================

#[tokio::test]
async fn test_found_speech_persists_metadata_and_log() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    let speech = id(day, 'a');
    let text = "Speech by Mr. John Smith, Governor of the European Central Bank, at the Annual Conference, 3 May 2024.";
    publish(&transport, &speech, text);

    prober(&transport, &temp_dir, ProberOptions::default())
        .scrape_date(day)
        .await;

    let store = store(&temp_dir);
    let entries = store.load_metadata("european central bank");
    let entry = &entries["240503a"];
    assert_eq!(entry.raw_text, text);
    assert_eq!(entry.date.as_deref(), Some("2024-05-03"));
    assert_eq!(entry.fields.speaker.as_deref(), Some("Mr. John Smith"));
    assert_eq!(entry.fields.speech_date.as_deref(), Some("3 May 2024"));

    let log = std::fs::read_to_string(store.text_log_path("european central bank")).unwrap();
    assert_eq!(log, format!("240503a: {}\n", text));
}

#[tokio::test]
async fn test_unresolved_speech_goes_to_unknown() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    let day = date(2024, 5, 3);
    publish(
        &transport,
        &id(day, 'a'),
        "Speech by Mr Nobody, Chair of the Atlantis Monetary Board, 3 May 2024.",
    );

    prober(&transport, &temp_dir, ProberOptions::default())
        .scrape_date(day)
        .await;

    let store = store(&temp_dir);
    assert!(store.document_path("unknown", "240503a").exists());
    assert!(store.load_metadata("unknown").contains_key("240503a"));
}

// ============================================================================
// Date ranges
// ============================================================================

#[tokio::test]
async fn test_controller_walks_range_in_order() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    publish_letters(&transport, date(2024, 5, 2), 'a', "Bank of Japan");
    publish_letters(&transport, date(2024, 5, 4), 'b', "Bank of Japan");

    let prober = prober(&transport, &temp_dir, ProberOptions::default());
    let result = ScrapeController::new(prober)
        .run(date(2024, 5, 1), date(2024, 5, 4), date(2024, 6, 1))
        .await
        .unwrap();

    assert_eq!(result.downloaded, 3);
    let first_pages: Vec<String> = transport
        .page_calls()
        .into_iter()
        .filter(|url| url.ends_with("a.htm"))
        .collect();
    assert_eq!(
        first_pages,
        vec![
            endpoints().page_url(&id(date(2024, 5, 1), 'a')),
            endpoints().page_url(&id(date(2024, 5, 2), 'a')),
            endpoints().page_url(&id(date(2024, 5, 3), 'a')),
            endpoints().page_url(&id(date(2024, 5, 4), 'a')),
        ]
    );
}

#[tokio::test]
async fn test_controller_stops_at_limit() {
    let temp_dir = TempDir::new().unwrap();
    let transport = MockTransport::new();
    publish_letters(&transport, date(2024, 5, 1), 'c', "Bank of Japan");
    publish_letters(&transport, date(2024, 5, 2), 'c', "Bank of Japan");

    let options = ProberOptions {
        limit: Some(4),
        ..Default::default()
    };
    let prober = prober(&transport, &temp_dir, options);
    let result = ScrapeController::new(prober)
        .run(date(2024, 5, 1), date(2024, 5, 10), date(2024, 6, 1))
        .await
        .unwrap();

    assert_eq!(result.downloaded, 4);
    assert!(transport
        .calls()
        .iter()
        .all(|url| !url.contains("240503")));
}
