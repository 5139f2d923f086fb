//! Driver layer for storefront browser automation.
//!
//! This crate exposes the WebDriver client wrapper and page/element helpers
//! the scrape session uses to navigate a store page and read review cards.
//!
//! - [`storefront::driver::StoreDriver`]: WebDriver client wrapper
//! - [`storefront::page::StorePage`]: bounded waits, script execution, scrolling
//! - [`storefront::page::StoreElement`]: text/attribute/click helpers

pub mod storefront;
