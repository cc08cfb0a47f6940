use anyhow::{anyhow, Context, Result};
use food_match::api_connection::UsdaClient;
use food_match::cli::parse_args;
use food_match::config::MatcherConfig;
use food_match::ingredient_loader::{load_ingredients, parse_inline_ingredients};
use food_match::matcher::{FoodMatcher, IngredientOutcome};
use food_match::nutrients::{nutrient_ids, nutritional_profile, per_kcal, NutrientTable};
use food_match::search::{EmbeddingEngine, EmbeddingScorer, HybridRanker, ResultCache};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn print_table(title: &str, table: &NutrientTable) {
    println!("{}", title);
    for entry in table.iter() {
        let label = nutrient_ids::label_key(entry.nutrient_id).unwrap_or(entry.name.as_str());
        println!("  {:<24} {:>12.3} {}", label, entry.amount_per_100g, entry.unit);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli_args = parse_args();
    let config = MatcherConfig::from_env().context("Failed to read configuration")?;
    let alpha = cli_args.alpha.unwrap_or(config.default_alpha);

    let ingredients = match (&cli_args.foods, &cli_args.ingredients_file) {
        (Some(foods), _) => parse_inline_ingredients(foods)?,
        (None, Some(path)) => load_ingredients(Path::new(path))?,
        (None, None) => return Err(anyhow!("Pass --foods or --ingredients-file")),
    };

    let catalog = UsdaClient::new(&config).context("Failed to create FoodData Central client")?;
    let ranker = if cli_args.lexical_only {
        HybridRanker::lexical_only()
    } else {
        // Loaded before the first ranking, bounded by the model timeout.
        HybridRanker::new(EmbeddingScorer::new(Arc::new(EmbeddingEngine::new())))
    };
    let cache = ResultCache::open(&config.cache_path);
    let matcher =
        FoodMatcher::new(catalog, ranker, cache, config.page_size).with_model_load_timeout(config.model_load_timeout);

    let progress_updater = |message: String| {
        println!("{}", message);
    };

    let total = ingredients.len();
    let mut resolver = matcher.resolve(ingredients, alpha, cli_args.branded)?;
    let mut idx = 0;
    while let Some(outcome) = resolver.next().await {
        idx += 1;
        match &outcome {
            IngredientOutcome::Resolved { ingredient, best } => {
                progress_updater(format!(
                    "[{}/{}] '{}' ({} g) -> '{}' (fdcId {}, score {:.3})",
                    idx, total, ingredient.name, ingredient.grams, best.candidate.description, best.candidate.id, best.hybrid_score
                ));
                if cli_args.per_kcal {
                    if let Some(table) = &ingredient.nutrient_table {
                        match per_kcal(table) {
                            Ok(scaled) => print_table("   per kcal:", &scaled),
                            Err(e) => progress_updater(format!("   -> {}", e)),
                        }
                    }
                }
            }
            IngredientOutcome::NoMatch { ingredient } => {
                progress_updater(format!("[{}/{}] '{}': no match found", idx, total, ingredient.name));
            }
            IngredientOutcome::Failed { ingredient, error } => {
                progress_updater(format!("[{}/{}] '{}': {}", idx, total, ingredient.name, error));
            }
        }
    }

    let profile = nutritional_profile(resolver.processed());
    match profile.total_mass_g {
        Some(mass) => {
            print_table(&format!("\nCombined nutrients for {:.1} g:", mass), &profile.aggregated);
            print_table("\nPer 100 g of the mix:", &profile.per_100g);
        }
        None => println!("\nNo ingredient could be resolved."),
    }

    Ok(())
}
