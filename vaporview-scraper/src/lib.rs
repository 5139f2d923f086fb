//! Scrape session for storefront user reviews.
//!
//! One session drives a fresh browser through the fixed navigation script:
//! search for the game, open its page, capture the header image URL, open the
//! user-review browse page, then scroll-and-extract a bounded number of
//! review cards.
//!
//! - [`Review`]: one scraped review record with its composite dedup key
//! - [`ReviewScraper`]: the trait seam the HTTP layer (and tests) depend on
//! - [`StorefrontScraper`]: fantoccini-backed implementation

pub mod review;
pub mod session;

pub use review::Review;
pub use session::{ReviewScraper, ScrapeError, ScrapeOutcome, StorefrontScraper};
