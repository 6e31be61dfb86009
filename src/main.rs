use log::{debug, error};
use std::env;
use std::process::ExitCode;

use recipe_extract::{
    aggregate_grocery_list, DeviceVariant, GroceryView, RecipeExtractor, RecipeIngredients,
};

const USAGE: &str = "Usage:
  recipe-extract extract <url> [--mobile] [--json]
  recipe-extract grocery <file.json>";

async fn run_extract(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let url = args
        .iter()
        .find(|arg| !arg.starts_with("--"))
        .ok_or("Please provide a URL")?;
    let variant = if args.iter().any(|arg| arg == "--mobile") {
        DeviceVariant::Mobile
    } else {
        DeviceVariant::Desktop
    };
    let as_json = args.iter().any(|arg| arg == "--json");

    let extractor = RecipeExtractor::builder().build()?;
    let recipe = extractor.extract(url, variant).await?;
    debug!("Extracted {} using {}", url, recipe.method);

    if as_json {
        println!("{}", serde_json::to_string_pretty(&recipe)?);
    } else {
        println!("{}", recipe.markdown());
    }
    Ok(())
}

fn print_view(view: &GroceryView) {
    for section in &view.sections {
        println!("## {}", section.name);
        for item in &section.items {
            if item.quantity.is_empty() {
                println!("- {}", item.name);
            } else {
                println!("- {} ({})", item.name, item.quantity);
            }
        }
        println!();
    }
}

async fn run_grocery(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.first().ok_or("Please provide a JSON file")?;
    let contents = tokio::fs::read_to_string(path).await?;
    let recipes: Vec<RecipeIngredients> = serde_json::from_str(&contents)?;

    print_view(&aggregate_grocery_list(&recipes, &[]));
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let result = match args.split_first() {
        Some((command, rest)) if command == "extract" => run_extract(rest).await,
        Some((command, rest)) if command == "grocery" => run_grocery(rest).await,
        _ => {
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
