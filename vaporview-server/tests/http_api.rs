use std::fs;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use vaporview_scraper::{Review, ReviewScraper, ScrapeError, ScrapeOutcome};
use vaporview_server::{router, AppState};
use vaporview_store::ReviewStore;

/// Programmable stand-in for the browser-backed scraper, so the HTTP layer
/// can be exercised without a live WebDriver.
enum Behavior {
    Reviews {
        image_url: Option<String>,
        reviews: Vec<Review>,
    },
    ReviewSectionMissing,
    SessionError(&'static str),
}

struct StubScraper {
    behavior: Behavior,
}

#[async_trait::async_trait]
impl ReviewScraper for StubScraper {
    async fn scrape(&self, _game_name: &str) -> Result<ScrapeOutcome, ScrapeError> {
        match &self.behavior {
            Behavior::Reviews { image_url, reviews } => Ok(ScrapeOutcome {
                image_url: image_url.clone(),
                reviews: reviews.clone(),
            }),
            Behavior::ReviewSectionMissing => Err(ScrapeError::ReviewSectionMissing),
            Behavior::SessionError(msg) => Err(ScrapeError::Session(anyhow::anyhow!(*msg))),
        }
    }
}

fn review(comment: &str) -> Review {
    Review {
        recommended: "Recommended".into(),
        hours_played: "7.7 hrs on record".into(),
        date_posted: "Posted: 1 March".into(),
        comment: comment.into(),
    }
}

fn app(data_dir: &Path, behavior: Behavior) -> Router {
    let store = ReviewStore::open(data_dir).expect("open store");
    let state = Arc::new(AppState {
        scraper: Arc::new(StubScraper { behavior }),
        store: Mutex::new(store),
    });
    router(state)
}

fn scrape_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/scrape")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn home_returns_welcome_message() {
    let tmp = TempDir::new().unwrap();
    let app = app(
        tmp.path(),
        Behavior::Reviews {
            image_url: None,
            reviews: vec![],
        },
    );

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(json["message"].as_str().unwrap().contains("game_name"));
}

#[tokio::test]
async fn missing_game_name_yields_400_with_error() {
    let tmp = TempDir::new().unwrap();
    let app = app(
        tmp.path(),
        Behavior::Reviews {
            image_url: None,
            reviews: vec![],
        },
    );

    let response = app.oneshot(scrape_request("{}")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("game_name"));
}

#[tokio::test]
async fn non_json_body_yields_400() {
    let tmp = TempDir::new().unwrap();
    let app = app(
        tmp.path(),
        Behavior::Reviews {
            image_url: None,
            reviews: vec![],
        },
    );

    let response = app.oneshot(scrape_request("not json at all")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn missing_review_section_yields_404_and_untouched_store() {
    let tmp = TempDir::new().unwrap();
    let app = app(tmp.path(), Behavior::ReviewSectionMissing);
    let games_before = fs::read_to_string(tmp.path().join("games.json")).unwrap();
    let images_before = fs::read_to_string(tmp.path().join("image_urls.json")).unwrap();

    let response = app
        .oneshot(scrape_request(r#"{"game_name":"Game A"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("reviews section"));

    assert_eq!(
        fs::read_to_string(tmp.path().join("games.json")).unwrap(),
        games_before
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("image_urls.json")).unwrap(),
        images_before
    );
}

#[tokio::test]
async fn session_failure_yields_500_with_message() {
    let tmp = TempDir::new().unwrap();
    let app = app(tmp.path(), Behavior::SessionError("webdriver went away"));

    let response = app
        .oneshot(scrape_request(r#"{"game_name":"Game A"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "Exception occurred: webdriver went away".to_string()
    );
}

#[tokio::test]
async fn successful_scrape_persists_and_echoes_results() {
    let tmp = TempDir::new().unwrap();
    let app = app(
        tmp.path(),
        Behavior::Reviews {
            image_url: Some("https://cdn.example/header.jpg".into()),
            reviews: vec![review("loved it"), review("hated it")],
        },
    );

    let response = app
        .oneshot(scrape_request(r#"{"game_name":"Game A"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["game_name"], "Game A");
    assert_eq!(json["image_url"], "https://cdn.example/header.jpg");
    assert_eq!(json["reviews"].as_array().unwrap().len(), 2);
    assert_eq!(json["reviews"][0]["Comment"], "loved it");

    let store = ReviewStore::open(tmp.path()).unwrap();
    assert_eq!(store.reviews_for("Game A").unwrap().len(), 2);
    assert_eq!(store.images(), vec!["https://cdn.example/header.jpg"]);
}

#[tokio::test]
async fn rescraping_the_same_game_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let app = app(
        tmp.path(),
        Behavior::Reviews {
            image_url: Some("https://cdn.example/header.jpg".into()),
            reviews: vec![review("loved it")],
        },
    );

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(scrape_request(r#"{"game_name":"Game A"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let store = ReviewStore::open(tmp.path()).unwrap();
    assert_eq!(store.reviews_for("Game A").unwrap().len(), 1);
    assert_eq!(store.images().len(), 1);
}
