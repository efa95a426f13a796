//! End-to-end tests: the full router served on an ephemeral port over
//! in-memory stores, driven with `reqwest`.

#![allow(clippy::panic, clippy::indexing_slicing)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use image_qc_gateway::api;
use image_qc_gateway::app_state::AppState;
use image_qc_gateway::config::CorsOrigins;
use image_qc_gateway::domain::source::DEFAULT_CREATED_BUCKET;
use image_qc_gateway::domain::{EventBus, ImageRecord, ProductRow, Role};
use image_qc_gateway::service::{CatalogService, ReviewService, RoleService};
use image_qc_gateway::store::memory::{
    MemoryReviewStore, MemoryReviewerDirectory, MemorySourceTable,
};
use image_qc_gateway::store::read_only::{ReadOnlyReviewStore, ViewerOnlyDirectory};
use image_qc_gateway::store::{ReviewStore, ReviewerDirectory};

const REVIEWER: &str = "reviewer@example.com";
const VIEWER: &str = "viewer@example.com";

struct TestApp {
    base: String,
    client: reqwest::Client,
    reviews: Arc<MemoryReviewStore>,
}

fn product(pvid: &str, brand: &str, category: &str, images: u8) -> ProductRow {
    ProductRow {
        product_variant_id: pvid.to_string(),
        brand_name: brand.to_string(),
        product_name: format!("{brand} {pvid}"),
        category_name: category.to_string(),
        subcategory_name: "Sub".to_string(),
        l3_category_name: "Leaf".to_string(),
        created_date_bucket_label: DEFAULT_CREATED_BUCKET.to_string(),
        images: (1..=images)
            .map(|i| ImageRecord {
                image_index: i,
                image_url: format!("https://cdn.example.com/{pvid}/{i}.jpg"),
                aspect_ratio_value: Some("1:1".to_string()),
                meta_3x4: None,
                hide_padding: Some(false),
                dpi: Some(300.0),
                white_bg: Some(true),
            })
            .collect(),
    }
}

fn catalog() -> Arc<MemorySourceTable> {
    Arc::new(MemorySourceTable::with_rows([
        product("PV-001", "Acme", "Shoes", 2),
        product("PV-002", "Acme", "Bags", 1),
        product("PV-003", "Globex", "Shoes", 1),
        product("PV-004", "Globex", "Watches", 3),
    ]))
}

async fn serve(
    reviews: Arc<dyn ReviewStore>,
    directory: Arc<dyn ReviewerDirectory>,
) -> (String, reqwest::Client) {
    let roles = Arc::new(RoleService::new(directory, Duration::from_secs(60)));
    let state = AppState {
        catalog: Arc::new(CatalogService::new(catalog(), Arc::clone(&reviews))),
        reviews: Arc::new(ReviewService::new(
            reviews,
            Arc::clone(&roles),
            EventBus::new(64),
        )),
        roles,
        default_page_size: 100,
        max_page_size: 100,
    };
    let app = api::build_app(state, &CorsOrigins::Any, Duration::from_secs(10));

    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), reqwest::Client::new())
}

async fn spawn_app() -> TestApp {
    let directory = Arc::new(MemoryReviewerDirectory::new());
    directory.assign(REVIEWER, Role::Reviewer).await;
    directory.assign(VIEWER, Role::Viewer).await;
    let reviews = Arc::new(MemoryReviewStore::new());
    let (base, client) = serve(Arc::clone(&reviews) as Arc<dyn ReviewStore>, directory).await;
    TestApp {
        base,
        client,
        reviews,
    }
}

impl TestApp {
    async fn get(&self, path: &str) -> (u16, Value) {
        let Ok(resp) = self.client.get(format!("{}{path}", self.base)).send().await else {
            panic!("GET {path} failed");
        };
        let status = resp.status().as_u16();
        let Ok(body) = resp.json::<Value>().await else {
            panic!("GET {path} returned non-JSON");
        };
        (status, body)
    }

    async fn post(&self, path: &str, body: &Value) -> (u16, Value) {
        let Ok(resp) = self
            .client
            .post(format!("{}{path}", self.base))
            .json(body)
            .send()
            .await
        else {
            panic!("POST {path} failed");
        };
        let status = resp.status().as_u16();
        let Ok(body) = resp.json::<Value>().await else {
            panic!("POST {path} returned non-JSON");
        };
        (status, body)
    }

    async fn toggle(&self, pvid: &str, index: u8, actor: &str) -> (u16, Value) {
        self.post(
            "/api/v1/qc/toggle",
            &json!({ "product_variant_id": pvid, "image_index": index, "actor": actor }),
        )
        .await
    }
}

fn ids(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|p| p["product_variant_id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn health_reports_writable_store() {
    let app = spawn_app().await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["review_store"], "read_write");
}

#[tokio::test]
async fn images_without_state_show_defaults() {
    let app = spawn_app().await;
    let (status, body) = app.get("/api/v1/images").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body), ["PV-001", "PV-002", "PV-003", "PV-004"]);
    assert_eq!(body["has_more"], false);
    assert_eq!(body["review_state_degraded"], false);

    let first = &body["items"][0];
    assert_eq!(first["pvid_review_status"], "NOT_REVIEWED");
    let image = &first["images"][0];
    assert_eq!(image["review_status"], "NOT_REVIEWED");
    assert_eq!(image["remark"], Value::Null);
    for flag in [
        "image_blur",
        "cropped_image",
        "mrp_present_in_image",
        "image_quality",
        "aspect_ratio",
    ] {
        assert_eq!(image["issues"][flag], false, "{flag} should default to false");
    }
}

#[tokio::test]
async fn toggling_twice_restores_status_and_logs_both() {
    let app = spawn_app().await;

    let (status, first) = app.toggle("PV-003", 1, REVIEWER).await;
    assert_eq!(status, 200);
    assert_eq!(first["new_status"], "REVIEWED");

    let (_, listed) = app.get("/api/v1/images?product_variant_id=pv-003").await;
    assert_eq!(listed["items"][0]["pvid_review_status"], "REVIEWED");

    let (status, second) = app.toggle("PV-003", 1, REVIEWER).await;
    assert_eq!(status, 200);
    assert_eq!(second["new_status"], "NOT_REVIEWED");
    assert_ne!(first["event_id"], second["event_id"]);

    let (status, history) = app
        .get("/api/v1/qc/history?product_variant_id=PV-003&image_index=1")
        .await;
    assert_eq!(status, 200);
    let Some(events) = history["events"].as_array() else {
        panic!("events missing");
    };
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["event_type"], "STATUS_CHANGE");
    assert_eq!(events[0]["actor"], REVIEWER);
}

#[tokio::test]
async fn viewer_cannot_write() {
    let app = spawn_app().await;
    let (status, body) = app.toggle("PV-001", 1, VIEWER).await;
    assert_eq!(status, 403);
    assert_eq!(body["error"]["code"], 2003);

    let (status, _) = app.toggle("PV-001", 1, "stranger@example.com").await;
    assert_eq!(status, 403);
    assert!(app.reviews.events().await.is_empty());
}

#[tokio::test]
async fn invalid_requests_are_rejected() {
    let app = spawn_app().await;

    let (status, body) = app
        .post(
            "/api/v1/qc/issues/toggle",
            &json!({
                "product_variant_id": "PV-001",
                "image_index": 1,
                "actor": REVIEWER,
                "issue_key": "too_dark",
            }),
        )
        .await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1002);

    let (status, body) = app.toggle("PV-001", 11, REVIEWER).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);

    let (status, body) = app.toggle("  ", 1, REVIEWER).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);

    let (status, body) = app.toggle("PV-001", 1, "not-an-email").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1004);

    let (status, body) = app.get("/api/v1/images?status=DONE").await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1003);

    assert!(app.reviews.events().await.is_empty());
}

#[tokio::test]
async fn issue_toggle_sets_and_flips() {
    let app = spawn_app().await;
    let request = |value: Value| {
        json!({
            "product_variant_id": "PV-002",
            "image_index": 1,
            "actor": REVIEWER,
            "issue_key": "cropped_image",
            "value": value,
        })
    };

    let (status, body) = app.post("/api/v1/qc/issues/toggle", &request(json!(true))).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["value"], true);
    assert_eq!(body["issues"]["cropped_image"], true);

    let (status, body) = app.post("/api/v1/qc/issues/toggle", &request(Value::Null)).await;
    assert_eq!(status, 200);
    assert_eq!(body["value"], false);

    let (_, listed) = app.get("/api/v1/images?product_variant_id=PV-002").await;
    let image = &listed["items"][0]["images"][0];
    assert_eq!(image["issues"]["cropped_image"], false);
    assert_eq!(image["review_status"], "NOT_REVIEWED");
    assert_eq!(image["updated_by"], REVIEWER);
}

#[tokio::test]
async fn remark_is_saved_and_cleared() {
    let app = spawn_app().await;
    let remark = |text: &str| {
        json!({
            "product_variant_id": "PV-001",
            "image_index": 2,
            "actor": REVIEWER,
            "remark": text,
        })
    };

    let (status, body) = app.post("/api/v1/qc/remark", &remark("  logo cut off  ")).await;
    assert_eq!(status, 200);
    assert_eq!(body["remark"], "logo cut off");

    let (status, body) = app.post("/api/v1/qc/remark", &remark("")).await;
    assert_eq!(status, 200);
    assert_eq!(body["remark"], Value::Null);

    let long = "x".repeat(2001);
    let (status, body) = app.post("/api/v1/qc/remark", &remark(&long)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], 1001);
}

#[tokio::test]
async fn reviewed_filter_pages_exactly() {
    let app = spawn_app().await;
    for (pvid, images) in [("PV-001", 2), ("PV-003", 1), ("PV-004", 3)] {
        for index in 1..=images {
            let (status, _) = app.toggle(pvid, index, REVIEWER).await;
            assert_eq!(status, 200);
        }
    }
    // Partially reviewed: stays out of REVIEWED.
    let (status, _) = app.toggle("PV-002", 1, REVIEWER).await;
    assert_eq!(status, 200);
    let (status, _) = app.toggle("PV-002", 1, REVIEWER).await;
    assert_eq!(status, 200);

    let (status, page1) = app.get("/api/v1/images?status=REVIEWED&page_size=2").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&page1), ["PV-001", "PV-003"]);
    assert_eq!(page1["has_more"], true);

    let (_, page2) = app
        .get("/api/v1/images?status=REVIEWED&page_size=2&page=2")
        .await;
    assert_eq!(ids(&page2), ["PV-004"]);
    assert_eq!(page2["has_more"], false);
}

#[tokio::test]
async fn not_reviewed_pages_may_be_short() {
    let app = spawn_app().await;
    for index in 1..=2 {
        let (status, _) = app.toggle("PV-001", index, REVIEWER).await;
        assert_eq!(status, 200);
    }

    let (status, page1) = app
        .get("/api/v1/images?status=NOT_REVIEWED&page_size=2")
        .await;
    assert_eq!(status, 200);
    assert_eq!(ids(&page1), ["PV-002"]);
    assert_eq!(page1["has_more"], true);

    let (_, page2) = app
        .get("/api/v1/images?status=NOT_REVIEWED&page_size=2&page=2")
        .await;
    assert_eq!(ids(&page2), ["PV-003", "PV-004"]);
}

#[tokio::test]
async fn source_filters_are_applied() {
    let app = spawn_app().await;

    let (_, body) = app
        .get("/api/v1/images?category_name=Shoes&category_name=Watches")
        .await;
    assert_eq!(ids(&body), ["PV-001", "PV-003", "PV-004"]);

    let (_, body) = app
        .get("/api/v1/images?brand=Globex&category_name=All")
        .await;
    assert_eq!(ids(&body), ["PV-003", "PV-004"]);

    let (_, body) = app.get("/api/v1/images?brand=All&product_variant_id=00").await;
    assert_eq!(ids(&body).len(), 4);
}

#[tokio::test]
async fn filter_options_lead_with_all() {
    let app = spawn_app().await;
    let (status, body) = app.get("/api/v1/filters").await;
    assert_eq!(status, 200);
    assert_eq!(body["brands"], json!(["All", "Acme", "Globex"]));
    assert_eq!(body["categories"], json!(["All", "Bags", "Shoes", "Watches"]));
    assert_eq!(
        body["created_date_buckets"],
        json!(["All", DEFAULT_CREATED_BUCKET])
    );
}

#[tokio::test]
async fn role_lookup_normalises_and_defaults() {
    let app = spawn_app().await;

    let (status, body) = app.get("/api/v1/me/role?email=Reviewer@Example.com").await;
    assert_eq!(status, 200);
    assert_eq!(body["email"], REVIEWER);
    assert_eq!(body["role"], "reviewer");
    assert_eq!(body["exists"], true);
    assert_eq!(body["can_write"], true);

    let (_, body) = app.get("/api/v1/me/role?email=nobody@example.com").await;
    assert_eq!(body["role"], "viewer");
    assert_eq!(body["exists"], false);
}

#[tokio::test]
async fn read_only_mode_serves_reads_and_rejects_writes() {
    let (base, client) = serve(Arc::new(ReadOnlyReviewStore), Arc::new(ViewerOnlyDirectory)).await;
    let app = TestApp {
        base,
        client,
        reviews: Arc::new(MemoryReviewStore::new()),
    };

    let (_, health) = app.get("/health").await;
    assert_eq!(health["review_store"], "read_only");

    let (status, body) = app.get("/api/v1/images").await;
    assert_eq!(status, 200);
    assert_eq!(ids(&body).len(), 4);

    let (status, body) = app.toggle("PV-001", 1, REVIEWER).await;
    assert_eq!(status, 503);
    assert_eq!(body["error"]["code"], 5001);
}

#[tokio::test]
async fn review_store_outage_degrades_listing() {
    let app = spawn_app().await;
    app.reviews.set_unavailable(true);

    let (status, body) = app.get("/api/v1/images").await;
    assert_eq!(status, 200);
    assert_eq!(body["review_state_degraded"], true);

    let (status, body) = app.get("/api/v1/images?status=REVIEWED").await;
    assert_eq!(status, 503);
    assert_eq!(body["error"]["code"], 5003);
}
