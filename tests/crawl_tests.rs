//! Integration tests for the crawlers
//!
//! These tests use wiremock to stand in for the HTTP-driven sites and run
//! the full crawl cycle end-to-end: listing pagination, detail extraction,
//! normalization, and record emission.

use motorlot::config::CrawlerConfig;
use motorlot::crawler::CrawlDriver;
use motorlot::output::{JsonLinesSink, MemorySink, RecordSink};
use motorlot::record::normalize;
use motorlot::sites::{AutotraderSpider, BringATrailerSpider, CargurusSpider, CarsDotComSpider};
use motorlot::{ListingRecord, Site};
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent("MotorlotTest/1.0")
        .build()
        .expect("Failed to build test client")
}

async fn run_crawl(
    spider: Arc<dyn motorlot::sites::Spider>,
    sink: Arc<MemorySink>,
) -> motorlot::output::CrawlStats {
    let driver = CrawlDriver::new(CrawlerConfig::default(), sink);
    driver.run(spider).await.expect("Crawl failed")
}

#[tokio::test]
async fn test_cargurus_crawl_two_pages_then_empty() {
    let mock_server = MockServer::start().await;

    // First offset page carries two ids, second is empty.
    Mock::given(method("GET"))
        .and(path("/Cars/searchResults.action"))
        .and(query_param("offset", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"[{"id": 101}, {"id": 102}]"#),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Cars/searchResults.action"))
        .and(query_param("offset", "15"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Cars/detailListingJson.action"))
        .and(query_param("inventoryListing", "101"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"listing": {"year": 2018, "makeName": "Audi", "modelName": "A4", "vin": "WAUENAF49JA123456", "priceString": "$23,987"}}"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Cars/detailListingJson.action"))
        .and(query_param("inventoryListing", "102"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"listing": {"year": 2020, "makeName": "Mazda", "modelName": "MX-5 Miata"}}"#,
        ))
        .mount(&mock_server)
        .await;

    let spider = Arc::new(CargurusSpider::with_base_url(test_client(), mock_server.uri()));
    let sink = Arc::new(MemorySink::new());
    let stats = run_crawl(spider, sink.clone()).await;

    assert_eq!(stats.listing_pages, 2);
    assert_eq!(stats.items_discovered, 2);
    assert_eq!(stats.records_emitted, 2);

    let records = sink.records();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.source == Site::Cargurus));
    let audi = records
        .iter()
        .find(|r| r.make == "Audi")
        .expect("Audi record missing");
    assert_eq!(audi.year, "2018");
    assert_eq!(audi.vin, "WAUENAF49JA123456");
    assert_eq!(audi.price, "$23,987");
    assert!(audi.reserve);
}

#[tokio::test]
async fn test_autotrader_crawl_stops_on_stack_trace() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/searchresults/base"))
        .and(query_param("firstRecord", "0"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"listings": [{"id": "719428025"}]}"#),
        )
        .mount(&mock_server)
        .await;
    // Throttle response on the second page.
    Mock::given(method("GET"))
        .and(path("/rest/searchresults/base"))
        .and(query_param("firstRecord", "25"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"stackTrace": "rate limited"}"#),
        )
        .mount(&mock_server)
        .await;

    let bootstrap = r#"{"initialState": {"inventory": {"719428025": {"year": 2021, "make": "Ford", "model": "F-150", "vin": "1FTFW1E55MKE12345", "pricingDetail": {"salePrice": 43999}}}, "owners": {"1": {"name": "Sunrise Ford"}}}}"#;
    Mock::given(method("GET"))
        .and(path("/cars-for-sale/vehicledetails.xhtml"))
        .and(query_param("listingId", "719428025"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "<html><body><div id=\"mountNode\"></div><script>window.__BONNET_DATA__={}</script></body></html>",
            bootstrap
        )))
        .mount(&mock_server)
        .await;

    let spider = Arc::new(AutotraderSpider::with_base_url(test_client(), mock_server.uri()));
    let sink = Arc::new(MemorySink::new());
    let stats = run_crawl(spider, sink.clone()).await;

    // The throttled page still counts as visited but yields nothing.
    assert_eq!(stats.listing_pages, 2);
    assert_eq!(stats.records_emitted, 1);

    let records = sink.records();
    assert_eq!(records[0].make, "Ford");
    assert_eq!(records[0].price, "43999$");
    assert_eq!(records[0].seller, "Sunrise Ford");
    // Missing dealer flag falls back to the dealer seller type.
    assert_eq!(records[0].seller_type, "dealer");
}

#[tokio::test]
async fn test_autotrader_unparsable_detail_yields_no_record() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/searchresults/base"))
        .and(query_param("firstRecord", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"listings": [{"id": "1"}]}"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/searchresults/base"))
        .and(query_param("firstRecord", "25"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"listings": []}"#))
        .mount(&mock_server)
        .await;
    // No bootstrap script on the detail page; the whole item is dropped.
    Mock::given(method("GET"))
        .and(path("/cars-for-sale/vehicledetails.xhtml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><div id=\"mountNode\"></div></body></html>"),
        )
        .mount(&mock_server)
        .await;

    let spider = Arc::new(AutotraderSpider::with_base_url(test_client(), mock_server.uri()));
    let sink = Arc::new(MemorySink::new());
    let stats = run_crawl(spider, sink.clone()).await;

    assert_eq!(stats.items_discovered, 1);
    assert_eq!(stats.items_skipped, 1);
    assert_eq!(stats.records_emitted, 0);
    assert!(sink.records().is_empty());
}

fn cars_results_page(vehicle_ids: &str, active_page: &str) -> String {
    format!(
        r#"<html><body>
          <div class="sds-page-section listings-page" data-site-activity='{{"vehicleArray": [{}]}}'></div>
          <ul><li class="sds-pagination__item active">{}</li></ul>
        </body></html>"#,
        vehicle_ids, active_page
    )
}

#[tokio::test]
async fn test_cars_crawl_stops_on_repeated_page_marker() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shopping/results/"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(cars_results_page(
            r#"{"listing_id": "abc123"}"#,
            "1",
        )))
        .mount(&mock_server)
        .await;
    // Past the last page the site keeps serving the same page.
    Mock::given(method("GET"))
        .and(path("/shopping/results/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(cars_results_page(
            r#"{"listing_id": "abc123"}"#,
            "1",
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/vehicledetail/abc123/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
              <h1 class="listing-title">2017 Mazda MX-5 Miata Club</h1>
              <div class="price-section "><span class="primary-price">$19,481</span></div>
              <div class="dealer-address">Tampa, FL 33614</div>
            </body></html>"#,
        ))
        .mount(&mock_server)
        .await;

    let spider = Arc::new(CarsDotComSpider::with_base_url(test_client(), mock_server.uri()));
    let sink = Arc::new(MemorySink::new());
    let stats = run_crawl(spider, sink.clone()).await;

    assert_eq!(stats.listing_pages, 2);
    // The second page repeats the item; crawl-wide dedup emits it once.
    assert_eq!(stats.records_emitted, 1);
    assert_eq!(stats.duplicates, 1);

    let records = sink.records();
    assert_eq!(records[0].year, "2017");
    assert_eq!(records[0].price, "$19,481");
    assert_eq!(records[0].location, "Tampa, FL 33614");
    assert_eq!(records[0].make, "");
}

#[tokio::test]
async fn test_cars_missing_activity_payload_terminates_cleanly() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/shopping/results/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>No results.</p></body></html>"),
        )
        .mount(&mock_server)
        .await;

    let spider = Arc::new(CarsDotComSpider::with_base_url(test_client(), mock_server.uri()));
    let sink = Arc::new(MemorySink::new());
    let stats = run_crawl(spider, sink.clone()).await;

    assert_eq!(stats.listing_pages, 1);
    assert_eq!(stats.records_emitted, 0);
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_bringatrailer_single_listing_page_crawl() {
    let mock_server = MockServer::start().await;
    let detail_url = format!("{}/listing/1987-porsche-911/", mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/auctions/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body>
              <script id="bat-theme-auctions-current-initial-data">
                var auctionsCurrentInitialData = [{{"url": "{}"}}];
              </script>
            </body></html>"#,
            detail_url
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/listing/1987-porsche-911/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r##"<html><body>
              <h1 class="post-title listing-post-title">1987 Porsche 911 Carrera Coupe</h1>
              <span class="info-value noborder-tiny"><strong>$20,500</strong></span>
              <span data-ends="1677000000">2/21/23</span>
              <table><tr><td class="listing-stats-value number-bids-value">14</td></tr></table>
              <div class="item"><ul>
                <li><a href="#">WP0AB0918HS121234</a></li>
                <li>93k Miles Shown</li>
                <li>3.2-Liter Flat-Six</li>
                <li>5-Speed Manual Transaxle</li>
              </ul></div>
              <p><strong>Make</strong> Porsche</p>
              <script id="bat-theme-viewmodels-js-extra">
                var VMS = {"comments": [{"markup": "<p>bid placed</p>", "bidAmount": 20500, "authorName": "garage99", "timestamp": 1677000000}]};
              </script>
            </body></html>"##,
        ))
        .mount(&mock_server)
        .await;

    let spider = Arc::new(BringATrailerSpider::with_base_url(test_client(), mock_server.uri()));
    let sink = Arc::new(MemorySink::new());
    let stats = run_crawl(spider, sink.clone()).await;

    // The auction list is a single page.
    assert_eq!(stats.listing_pages, 1);
    assert_eq!(stats.records_emitted, 1);

    let records = sink.records();
    assert_eq!(records[0].source, Site::BringATrailer);
    assert_eq!(records[0].year, "1987");
    assert_eq!(records[0].title_status, "1987 Porsche 911 Carrera Coupe");
    assert_eq!(records[0].price, "$20,500");
    assert_eq!(records[0].auction_end_date, "02/21/2023");
    assert_eq!(records[0].vin, "WP0AB0918HS121234");
    assert_eq!(records[0].make, "Porsche");
    assert_eq!(records[0].bids.len(), 1);
    assert_eq!(records[0].bids[0].amount, "20500$");
}

#[tokio::test]
async fn test_json_lines_sink_writes_one_record_per_line() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let records_path = dir.path().join("records.jsonl");
    let sink = JsonLinesSink::create(&records_path).expect("Failed to create sink");

    let record = normalize(Default::default(), Site::Cargurus, "https://x/detail/1");
    sink.emit(&record).expect("emit failed");
    sink.emit(&record).expect("emit failed");
    sink.finalize().expect("finalize failed");

    let contents = std::fs::read_to_string(&records_path).expect("Failed to read records");
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);

    // Lines round-trip and keep the fixed field order.
    let parsed: ListingRecord = serde_json::from_str(lines[0]).expect("Invalid record line");
    assert_eq!(parsed.source, Site::Cargurus);
    assert!(lines[0].starts_with(r#"{"source":"cargurus.com","year":"#));
    assert!(lines[0].trim_end().ends_with(r#""source_page":"https://x/detail/1"}"#));
}
