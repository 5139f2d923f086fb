//! Flat-file JSON persistence for scraped reviews and header images.
//!
//! Two human-readable files under one data directory:
//!
//! - `games.json`: object mapping game name to its ordered review list
//! - `image_urls.json`: ordered array of header image URLs
//!
//! Both stores are loaded fully, mutated, and rewritten wholesale on every
//! update. Insertion order is preserved end to end (`serde_json` with
//! `preserve_order`). Unreadable or corrupt files are treated as empty on
//! load, matching how the service has always recovered from bad state.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use vaporview_scraper::Review;

const GAMES_FILE: &str = "games.json";
const IMAGES_FILE: &str = "image_urls.json";

/// Handle on the two JSON stores. Cheap to clone paths around; all methods
/// reread from disk so external edits between requests are picked up.
pub struct ReviewStore {
    games_path: PathBuf,
    images_path: PathBuf,
}

impl ReviewStore {
    /// Open (and if necessary create) the data directory and seed both
    /// store files with empty contents.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create data dir: {}", data_dir.display()))?;

        let store = Self {
            games_path: data_dir.join(GAMES_FILE),
            images_path: data_dir.join(IMAGES_FILE),
        };
        if !store.games_path.exists() {
            store.write_file(&store.games_path, &Value::Object(Map::new()))?;
        }
        if !store.images_path.exists() {
            store.write_file(&store.images_path, &Value::Array(Vec::new()))?;
        }
        Ok(store)
    }

    pub fn games_path(&self) -> &Path {
        &self.games_path
    }

    pub fn images_path(&self) -> &Path {
        &self.images_path
    }

    /// Append reviews for `game_name` that are not already present, judged
    /// by composite key. Returns how many were actually added. The catalog
    /// entry is created on first merge; other games' entries pass through
    /// untouched.
    pub fn merge_reviews(&self, game_name: &str, reviews: &[Review]) -> Result<usize> {
        let mut catalog = self.load_catalog();

        let entry = catalog
            .entry(game_name.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        let mut existing: Vec<Review> = serde_json::from_value(entry.clone())
            .with_context(|| format!("malformed catalog entry for {game_name:?}"))?;

        let mut keys: HashSet<String> = existing.iter().map(Review::composite_key).collect();
        let mut added = 0usize;
        for review in reviews {
            if keys.insert(review.composite_key()) {
                existing.push(review.clone());
                added += 1;
            }
        }

        *entry = serde_json::to_value(&existing)?;
        self.write_file(&self.games_path, &Value::Object(catalog))?;
        info!(
            target: "store.merge",
            game = %game_name,
            scraped = reviews.len(),
            added,
            "catalog updated"
        );
        Ok(added)
    }

    /// Record a header image URL unless it is already registered. Returns
    /// whether the registry changed.
    pub fn record_image(&self, url: &str) -> Result<bool> {
        let mut urls = self.load_images();
        if urls.iter().any(|u| u == url) {
            return Ok(false);
        }
        urls.push(url.to_string());
        self.write_file(&self.images_path, &serde_json::to_value(&urls)?)?;
        info!(target: "store.images", %url, total = urls.len(), "image registered");
        Ok(true)
    }

    /// Reviews currently stored for `game_name`, in insertion order.
    pub fn reviews_for(&self, game_name: &str) -> Result<Vec<Review>> {
        match self.load_catalog().get(game_name) {
            Some(entry) => serde_json::from_value(entry.clone())
                .with_context(|| format!("malformed catalog entry for {game_name:?}")),
            None => Ok(Vec::new()),
        }
    }

    /// All registered image URLs, in insertion order.
    pub fn images(&self) -> Vec<String> {
        self.load_images()
    }

    fn load_catalog(&self) -> Map<String, Value> {
        match self.read_json(&self.games_path) {
            Some(Value::Object(map)) => map,
            Some(_) | None => Map::new(),
        }
    }

    fn load_images(&self) -> Vec<String> {
        match self.read_json(&self.images_path) {
            Some(value) => serde_json::from_value(value).unwrap_or_default(),
            None => Vec::new(),
        }
    }

    fn read_json(&self, path: &Path) -> Option<Value> {
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(
                    target: "store.load",
                    path = %path.display(),
                    error = %err,
                    "store file unreadable; treating as empty"
                );
                None
            }
        }
    }

    fn write_file(&self, path: &Path, value: &Value) -> Result<()> {
        let pretty = serde_json::to_string_pretty(value)?;
        fs::write(path, pretty)
            .with_context(|| format!("failed to write store file: {}", path.display()))
    }
}
