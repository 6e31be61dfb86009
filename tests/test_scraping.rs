use recipe_extract::url_to_text::RequestFetcher;
use recipe_extract::{
    DeviceVariant, ExtractionMethod, ExtractorConfig, HtmlRecipeScraper, RecipeExtractor,
};
use std::sync::Arc;
use std::time::Duration;

fn extractor() -> RecipeExtractor {
    RecipeExtractor::builder()
        .config(ExtractorConfig::default())
        .fetcher(Arc::new(
            RequestFetcher::new(Some(Duration::from_secs(5))).unwrap(),
        ))
        .heuristic_only()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_json_ld_page_over_http() {
    let mut server = mockito::Server::new_async().await;
    let html = r#"
        <!DOCTYPE html>
        <html>
        <head>
            <title>Recipe Page</title>
            <script type="application/ld+json">
            {
                "@context": "https://schema.org/",
                "@type": "Recipe",
                "name": "Ultimate Chocolate Cake",
                "description": "The best chocolate cake recipe",
                "prepTime": "PT30M",
                "cookTime": "PT45M",
                "recipeYield": "12 servings",
                "recipeIngredient": [
                    "2 cups flour",
                    "1 cup sugar",
                    "1/2 cup cocoa powder"
                ],
                "recipeInstructions": "Mix ingredients and bake."
            }
            </script>
        </head>
        <body><h1>Recipe</h1></body>
        </html>
    "#;
    let mock = server
        .mock("GET", "/recipe")
        .match_header("user-agent", mockito::Matcher::Regex("Mobile".to_string()))
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(html)
        .create_async()
        .await;

    let url = format!("{}/recipe", server.url());
    let recipe = extractor()
        .extract(&url, DeviceVariant::Mobile)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(recipe.method, ExtractionMethod::Simple);
    let fields = recipe.fields();
    assert_eq!(fields.title, "Ultimate Chocolate Cake");
    assert_eq!(fields.ingredients.len(), 3);
    assert_eq!(fields.instructions, vec!["Mix ingredients and bake."]);
    assert_eq!(fields.prep_time.as_deref(), Some("30 minutes"));
    assert_eq!(fields.servings.as_deref(), Some("12 servings"));

    let markdown = recipe.markdown();
    assert!(markdown.starts_with("# Ultimate Chocolate Cake"));
    assert!(markdown.contains("1. Mix ingredients and bake."));
}

#[tokio::test]
async fn test_not_found_degrades_to_error_fallback() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .create_async()
        .await;

    let url = format!("{}/missing", server.url());
    let recipe = extractor()
        .extract(&url, DeviceVariant::Desktop)
        .await
        .unwrap();

    assert_eq!(recipe.method, ExtractionMethod::ErrorFallback);
    assert!(recipe.markdown().contains("404 Not Found"));
}

#[test]
fn test_microdata_page() {
    let html = r#"
        <html><body>
        <div itemscope itemtype="https://schema.org/Recipe">
            <h1 itemprop="name">Banana Bread</h1>
            <ul>
                <li itemprop="recipeIngredient">3 ripe bananas</li>
                <li itemprop="recipeIngredient">2 cups flour</li>
            </ul>
            <div itemprop="recipeInstructions">Mash the bananas and fold in the flour.</div>
        </div>
        </body></html>
    "#;

    let recipe = HtmlRecipeScraper::new()
        .scrape("https://example.com/banana-bread", html)
        .unwrap();
    assert_eq!(recipe.title, "Banana Bread");
    assert_eq!(recipe.ingredients, vec!["3 ripe bananas", "2 cups flour"]);
    assert_eq!(recipe.instructions.len(), 1);
}

#[test]
fn test_recipe_card_plugin_page_keeps_groups() {
    let html = r#"
        <html><body>
        <nav class="main-menu"><ul><li>Recipes</li><li>About</li></ul></nav>
        <div class="wprm-recipe-container">
            <h2 class="wprm-recipe-name">Lasagna</h2>
            <div class="wprm-recipe-ingredients-container">
                <h3 class="wprm-recipe-group-name">MEAT SAUCE:</h3>
                <ul><li>1 lb ground beef</li><li>1 jar marinara</li></ul>
                <h3 class="wprm-recipe-group-name">CHEESE FILLING:</h3>
                <ul><li>2 cups ricotta</li></ul>
            </div>
            <div class="wprm-recipe-instructions-container">
                <ol><li>Brown the beef, then add the marinara.</li><li>Layer and bake for 45 minutes.</li></ol>
            </div>
        </div>
        </body></html>
    "#;

    let recipe = HtmlRecipeScraper::new()
        .scrape("https://example.com/lasagna", html)
        .unwrap();
    assert_eq!(recipe.title, "Lasagna");
    assert_eq!(
        recipe.ingredients,
        vec!["1 lb ground beef", "1 jar marinara", "2 cups ricotta"]
    );
    assert_eq!(recipe.group("MEAT SAUCE").unwrap().items.len(), 2);
    assert_eq!(
        recipe.group("CHEESE FILLING").unwrap().items,
        vec!["2 cups ricotta"]
    );
}
