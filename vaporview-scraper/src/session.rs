use crate::review::Review;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use uuid::Uuid;
use vaporview_browser::storefront::driver::StoreDriver;
use vaporview_browser::storefront::page::{ClickError, StoreElement, StorePage};
use vaporview_common::{BrowserConfig, ScrapeConfig};

const SEARCH_BOX: &str = "#store_nav_search_term";
const FIRST_RESULT_CAPSULE: &str = "div.col.search_capsule img";
const HEADER_IMAGE: &str = "div#gameHeaderImageCtn img.game_header_image_full";
const REVIEW_SUMMARY_ROWS: &str = "a.user_reviews_summary_row";
const BROWSE_ALL_REVIEWS: &str = "div#ViewAllReviewssummary";
const REVIEW_CARD: &str = ".apphub_Card";
const CARD_TITLE: &str = ".title";
const CARD_HOURS: &str = ".hours";
const CARD_DATE: &str = ".date_posted";
const CARD_BODY: &str = ".apphub_CardTextContent";

/// The card body's last child node is the comment text; earlier children are
/// the date and "early access" banners.
const LAST_CHILD_TEXT: &str =
    "return arguments[0].childNodes[arguments[0].childNodes.length - 1].textContent;";

/// Session failures the HTTP layer tells apart.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("User reviews section not found")]
    ReviewSectionMissing,
    #[error("Browse all reviews link not found")]
    BrowseAllMissing,
    #[error(transparent)]
    Session(#[from] anyhow::Error),
}

/// What a completed session produced. The caller owns persistence.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub image_url: Option<String>,
    pub reviews: Vec<Review>,
}

/// A timed-out wait on the review summary rows means the section is missing,
/// not that the session broke.
fn require_section<T>(found: Option<T>) -> Result<T, ScrapeError> {
    found.ok_or(ScrapeError::ReviewSectionMissing)
}

/// Seam between the HTTP layer and browser automation, so handlers can be
/// exercised without a live WebDriver.
#[async_trait]
pub trait ReviewScraper: Send + Sync {
    async fn scrape(&self, game_name: &str) -> Result<ScrapeOutcome, ScrapeError>;
}

/// Concrete scraper backed by the fantoccini driver. One browser session per
/// call, torn down on every exit path.
pub struct StorefrontScraper {
    browser: BrowserConfig,
    scrape: ScrapeConfig,
}

impl StorefrontScraper {
    pub fn new(browser: BrowserConfig, scrape: ScrapeConfig) -> Self {
        Self { browser, scrape }
    }

    fn element_wait(&self) -> Duration {
        Duration::from_secs(self.scrape.element_wait_secs)
    }

    async fn run(
        &self,
        driver: &StoreDriver,
        game_name: &str,
        session: Uuid,
    ) -> Result<ScrapeOutcome, ScrapeError> {
        let page = driver.goto(&self.scrape.storefront_url).await?;

        self.search(&page, game_name).await?;
        self.open_first_result(&page).await?;
        let image_url = self.header_image(&page).await?;
        info!(
            target: "scrape.session",
            session = %session,
            image_found = image_url.is_some(),
            "store page open"
        );

        self.open_review_section(&page).await?;
        self.open_browse_all(&page).await?;

        let reviews = self.collect_reviews(&page, session).await?;
        Ok(ScrapeOutcome { image_url, reviews })
    }

    async fn search(&self, page: &StorePage, game_name: &str) -> Result<(), ScrapeError> {
        let search_box = page.wait_for(SEARCH_BOX, self.element_wait()).await?;
        search_box.type_and_submit(game_name).await?;
        Ok(())
    }

    async fn open_first_result(&self, page: &StorePage) -> Result<(), ScrapeError> {
        let capsule = page
            .wait_for(FIRST_RESULT_CAPSULE, self.element_wait())
            .await?;
        capsule.click().await.map_err(anyhow::Error::new)?;
        Ok(())
    }

    /// Header image URL; absence is non-fatal.
    async fn header_image(&self, page: &StorePage) -> Result<Option<String>, ScrapeError> {
        match page.try_wait_for(HEADER_IMAGE, self.element_wait()).await? {
            Some(image) => Ok(image.attr("src").await?),
            None => Ok(None),
        }
    }

    /// Open the "all reviews" summary row.
    ///
    /// Index 1 is the all-reviews row; the storefront renders the
    /// recent-reviews row first.
    /// FIXME(selector): positional, and silently wrong if the storefront ever
    /// reorders the rows — anchor on the row's own text instead.
    async fn open_review_section(&self, page: &StorePage) -> Result<(), ScrapeError> {
        let rows = require_section(
            page.try_wait_for_all(REVIEW_SUMMARY_ROWS, self.element_wait())
                .await?,
        )?;
        if rows.len() < 2 {
            return Err(ScrapeError::ReviewSectionMissing);
        }
        let target = rows[1].clone();

        page.scroll_into_view(&target).await?;
        sleep(Duration::from_secs(1)).await;
        // The shorter pre-click wait doubles as a liveness check: a row that
        // never becomes clickable again counts as a missing section.
        require_section(
            page.try_wait_for(
                REVIEW_SUMMARY_ROWS,
                Duration::from_secs(self.scrape.click_wait_secs),
            )
            .await?,
        )?;

        match target.click().await {
            Ok(()) => {}
            Err(ClickError::Intercepted) => {
                debug!(target: "scrape.click", "review link click intercepted; dispatching from script");
                page.script_click(&target).await?;
            }
            Err(ClickError::Stale) => {
                debug!(target: "scrape.click", "review link went stale; re-querying");
                let rows = page.find_all(REVIEW_SUMMARY_ROWS).await?;
                if rows.len() >= 2 {
                    page.script_click(&rows[1]).await?;
                }
            }
            Err(ClickError::Other(e)) => return Err(e.into()),
        }
        Ok(())
    }

    /// Any failure locating or activating the control maps to the 404 case.
    async fn open_browse_all(&self, page: &StorePage) -> Result<(), ScrapeError> {
        let browse = match page.try_wait_for(BROWSE_ALL_REVIEWS, self.element_wait()).await {
            Ok(Some(div)) => div,
            _ => return Err(ScrapeError::BrowseAllMissing),
        };
        if page
            .execute_on("arguments[0].querySelector('a').click();", &browse)
            .await
            .is_err()
        {
            return Err(ScrapeError::BrowseAllMissing);
        }
        Ok(())
    }

    /// Scroll-and-extract until the limit is reached, a pass yields nothing
    /// unseen, or the page stops growing.
    async fn collect_reviews(
        &self,
        page: &StorePage,
        session: Uuid,
    ) -> Result<Vec<Review>, ScrapeError> {
        let limit = self.scrape.review_limit;
        let mut total: Vec<Review> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut last_height = page.scroll_height().await?;

        while total.len() < limit {
            page.scroll_to_bottom().await?;
            sleep(Duration::from_secs(self.scrape.scroll_pause_secs)).await;

            let fresh = self
                .extract_visible(page, limit - total.len(), &mut seen)
                .await?;
            if fresh.is_empty() {
                break;
            }
            total.extend(fresh);

            let new_height = page.scroll_height().await?;
            if new_height == last_height {
                break;
            }
            last_height = new_height;
        }

        info!(
            target: "scrape.session",
            session = %session,
            reviews = total.len(),
            limit,
            "extraction finished"
        );
        Ok(total)
    }

    /// One pass over the currently rendered cards. Unreadable cards are
    /// skipped; already-seen composite keys are ignored.
    async fn extract_visible(
        &self,
        page: &StorePage,
        remaining: usize,
        seen: &mut HashSet<String>,
    ) -> Result<Vec<Review>> {
        let mut fresh = Vec::new();
        for card in page.find_all(REVIEW_CARD).await? {
            if fresh.len() >= remaining {
                break;
            }
            match self.read_card(page, &card).await {
                Ok(review) => {
                    if seen.insert(review.composite_key()) {
                        fresh.push(review);
                    }
                }
                Err(err) => {
                    debug!(target: "scrape.extract", error = %err, "skipping unreadable review card");
                }
            }
        }
        Ok(fresh)
    }

    async fn read_card(&self, page: &StorePage, card: &StoreElement) -> Result<Review> {
        let recommended = card.find(CARD_TITLE).await?.text().await?.trim().to_string();
        let hours_played = card.find(CARD_HOURS).await?.text().await?.trim().to_string();
        let date_posted = card.find(CARD_DATE).await?.text().await?.trim().to_string();

        let body = card.find(CARD_BODY).await?;
        let comment = page
            .execute_on(LAST_CHILD_TEXT, &body)
            .await?
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Review {
            recommended,
            hours_played,
            date_posted,
            comment,
        })
    }
}

#[async_trait]
impl ReviewScraper for StorefrontScraper {
    async fn scrape(&self, game_name: &str) -> Result<ScrapeOutcome, ScrapeError> {
        let session = Uuid::new_v4();
        info!(
            target: "scrape.session",
            session = %session,
            game = %game_name,
            "starting scrape session"
        );

        let driver = StoreDriver::connect(&self.browser)
            .await
            .map_err(ScrapeError::Session)?;
        let result = self.run(&driver, game_name, session).await;

        // Teardown happens on every exit path; a failed quit is logged, not
        // surfaced over the session result.
        if let Err(err) = driver.close().await {
            warn!(
                target: "scrape.session",
                session = %session,
                error = %err,
                "failed to close browser session"
            );
        }

        match &result {
            Ok(outcome) => info!(
                target: "scrape.session",
                session = %session,
                reviews = outcome.reviews.len(),
                "scrape session complete"
            ),
            Err(err) => warn!(
                target: "scrape.session",
                session = %session,
                error = %err,
                "scrape session failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timed_out_section_wait_maps_to_missing_section() {
        let err = require_section::<()>(None).unwrap_err();
        assert!(matches!(err, ScrapeError::ReviewSectionMissing));
    }

    #[test]
    fn present_section_passes_through() {
        assert_eq!(require_section(Some(7)).unwrap(), 7);
    }
}
