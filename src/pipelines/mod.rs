pub mod text;
pub mod url;

pub use text::parse_completion;
pub use url::{validate_url, RecipeExtractor};
