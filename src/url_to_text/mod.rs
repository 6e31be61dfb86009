pub mod fetchers;
pub mod html;

pub use fetchers::{PageFetcher, RequestFetcher};
pub use html::{page_text, HtmlRecipeScraper, PageAnalysis};
