pub mod alert;
pub mod client;
pub mod error;
pub mod extract;

pub use alert::WebhookNotifier;
pub use client::{classify_status, FetchOutcome, PageFetcher, StatusClass};
pub use error::ScraperError;
pub use extract::{CountExtractor, ExtractorRules};
