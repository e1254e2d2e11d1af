pub mod error;
pub mod locator;
pub mod session;

pub use error::ScanError;
pub use locator::{AttrMatcher, TagQuery, find_all, find_tag};
pub use session::{CacheStore, Page, Session};
