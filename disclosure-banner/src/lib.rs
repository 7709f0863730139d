//! Disclosure Banner - detail-page counterpart of the badge engine
//!
//! On an entry's own store page, surfaces the page's "AI Generated Content
//! Disclosure" section as a banner above the title, and keeps it in step
//! with the page as it mutates or navigates in place.

pub mod banner;
pub mod config;
pub mod watcher;

pub use banner::{BannerError, BannerState, DetailBanner, Disclosure};
pub use config::BannerConfig;
pub use watcher::{applies_to, BannerWatcher};
