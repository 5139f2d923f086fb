use anyhow::Result;
use fantoccini::{elements::Element, error::CmdError, key::Key, Client, Locator};
use serde_json::Value;
use fantoccini::error::ErrorStatus;
use std::time::Duration;

/// Why a direct click on an element did not land.
///
/// The scrape session falls back to script-dispatched clicks for the first
/// two variants; anything else propagates.
#[derive(Debug, thiserror::Error)]
pub enum ClickError {
    #[error("click intercepted by another element")]
    Intercepted,
    #[error("element went stale before the click landed")]
    Stale,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn classify_click(err: CmdError) -> ClickError {
    if let CmdError::Standard(ref w) = err {
        if w.error == ErrorStatus::ElementClickIntercepted {
            return ClickError::Intercepted;
        }
        if w.error == ErrorStatus::StaleElementReference {
            return ClickError::Stale;
        }
    }
    ClickError::Other(anyhow::Error::new(err))
}

/// Page wrapper providing bounded element waits, script execution, and
/// scroll helpers over a live WebDriver session.
pub struct StorePage {
    client: Client,
}

impl StorePage {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Wait up to `timeout` for an element matching the CSS selector.
    pub async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<StoreElement> {
        let element = self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await?;
        Ok(StoreElement::new(element))
    }

    /// Like [`wait_for`](Self::wait_for), but a timeout yields `None`
    /// instead of an error.
    pub async fn try_wait_for(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<StoreElement>> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await
        {
            Ok(element) => Ok(Some(StoreElement::new(element))),
            Err(CmdError::WaitTimeout) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Wait for at least one match, then return everything currently
    /// matching the selector; a timeout yields `None`.
    pub async fn try_wait_for_all(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<Vec<StoreElement>>> {
        if self.try_wait_for(selector, timeout).await?.is_none() {
            return Ok(None);
        }
        Ok(Some(self.find_all(selector).await?))
    }

    /// Find zero or more elements by CSS selector, without waiting.
    pub async fn find_all(&self, selector: &str) -> Result<Vec<StoreElement>> {
        let elements = self.client.find_all(Locator::Css(selector)).await?;
        Ok(elements.into_iter().map(StoreElement::new).collect())
    }

    /// Run a script with the given arguments and return its result.
    pub async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value> {
        self.client
            .execute(script, args)
            .await
            .map_err(anyhow::Error::from)
    }

    /// Run a script with `element` bound to `arguments[0]`.
    pub async fn execute_on(&self, script: &str, element: &StoreElement) -> Result<Value> {
        let arg = serde_json::to_value(&element.element)?;
        self.execute(script, vec![arg]).await
    }

    /// Scroll the element to the vertical center of the viewport.
    pub async fn scroll_into_view(&self, element: &StoreElement) -> Result<()> {
        self.execute_on("arguments[0].scrollIntoView({block: 'center'});", element)
            .await?;
        Ok(())
    }

    /// Dispatch a click from script, bypassing hit-testing entirely.
    pub async fn script_click(&self, element: &StoreElement) -> Result<()> {
        self.execute_on("arguments[0].click();", element).await?;
        Ok(())
    }

    /// Scroll the window to the bottom of the document.
    pub async fn scroll_to_bottom(&self) -> Result<()> {
        self.execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await?;
        Ok(())
    }

    /// Current document height, used to detect when infinite scroll has
    /// stopped loading more content.
    pub async fn scroll_height(&self) -> Result<u64> {
        let value = self
            .execute("return document.body.scrollHeight;", vec![])
            .await?;
        value
            .as_u64()
            .or_else(|| value.as_f64().map(|f| f as u64))
            .ok_or_else(|| anyhow::anyhow!("scrollHeight was not a number: {value}"))
    }
}

/// Wrapper for DOM elements with typed helpers consistent with [`StorePage`].
#[derive(Clone)]
pub struct StoreElement {
    pub(crate) element: Element,
}

impl StoreElement {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    /// Type `text` into the element and submit with Enter.
    pub async fn type_and_submit(&self, text: &str) -> Result<()> {
        let mut keys = text.to_string();
        keys.push(char::from(Key::Enter));
        self.element.send_keys(&keys).await?;
        Ok(())
    }

    /// Click the element directly, classifying interception and staleness
    /// so callers can fall back.
    pub async fn click(&self) -> std::result::Result<(), ClickError> {
        self.element
            .clone()
            .click()
            .await
            .map(|_| ())
            .map_err(classify_click)
    }

    /// Find a child element by CSS selector.
    pub async fn find(&self, selector: &str) -> Result<StoreElement> {
        let element = self.element.find(Locator::Css(selector)).await?;
        Ok(StoreElement::new(element))
    }

    /// Read an attribute value.
    pub async fn attr(&self, attribute: &str) -> Result<Option<String>> {
        self.element
            .attr(attribute)
            .await
            .map_err(anyhow::Error::from)
    }

    /// Return the element's visible text.
    pub async fn text(&self) -> Result<String> {
        self.element.text().await.map_err(anyhow::Error::from)
    }
}
