use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::Ingredient;
use crate::nutrients::table::{NutrientEntry, NutrientTable, AGGREGATE_SOURCE_ID};

/// Combined absolute amounts for a set of ingredients, plus the same values
/// normalized back to 100 g of the whole mix.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NutritionalProfile {
    pub total_mass_g: Option<f64>,
    pub aggregated: NutrientTable,
    pub per_100g: NutrientTable,
}

/// Grams-weighted sum of every ingredient's per-100 g table.
///
/// A nutrient present in only some ingredients gets the partial sum. Ingredients
/// without a nutrient table (unresolved, failed fetch) or without a finite
/// positive mass contribute nothing, so
/// aggregating any prefix of a recipe is itself a valid table. Contributions are
/// summed in sorted order, which makes the result independent of ingredient order.
pub fn aggregate(ingredients: &[Ingredient]) -> NutrientTable {
    let mut contributions: BTreeMap<u32, (NutrientEntry, Vec<f64>)> = BTreeMap::new();

    for ingredient in ingredients {
        let Some(table) = &ingredient.nutrient_table else {
            continue;
        };
        if !ingredient.has_valid_quantity() {
            continue;
        }
        let scale = ingredient.grams / 100.0;
        for entry in table.iter() {
            let slot = contributions
                .entry(entry.nutrient_id)
                .or_insert_with(|| (entry.clone(), Vec::new()));
            // Keep the smallest (name, unit) so metadata does not depend on order either.
            if (&entry.name, &entry.unit) < (&slot.0.name, &slot.0.unit) {
                slot.0.name = entry.name.clone();
                slot.0.unit = entry.unit.clone();
            }
            slot.1.push(entry.amount_per_100g * scale);
        }
    }

    NutrientTable::from_entries(
        AGGREGATE_SOURCE_ID,
        contributions.into_values().map(|(template, mut amounts)| {
            amounts.sort_by(f64::total_cmp);
            NutrientEntry {
                amount_per_100g: amounts.iter().sum(),
                ..template
            }
        }),
    )
}

pub fn nutritional_profile(ingredients: &[Ingredient]) -> NutritionalProfile {
    let aggregated = aggregate(ingredients);
    let total_mass_g: f64 = ingredients
        .iter()
        .filter(|i| i.nutrient_table.is_some() && i.has_valid_quantity())
        .map(|i| i.grams)
        .sum();

    let per_100g = if total_mass_g > 0.0 {
        let scale_factor = 100.0 / total_mass_g;
        NutrientTable::from_entries(
            AGGREGATE_SOURCE_ID,
            aggregated.iter().map(|entry| NutrientEntry {
                amount_per_100g: entry.amount_per_100g * scale_factor,
                ..entry.clone()
            }),
        )
    } else {
        NutrientTable::new(AGGREGATE_SOURCE_ID)
    };

    NutritionalProfile {
        total_mass_g: if total_mass_g > 0.0 { Some(total_mass_g) } else { None },
        aggregated,
        per_100g,
    }
}

/// One nutrient side by side across several tables; absent means 0.
pub fn compare_nutrient(tables: &[NutrientTable], nutrient_id: u32) -> Vec<(String, f64)> {
    tables
        .iter()
        .map(|t| (t.source_id().to_string(), t.amount(nutrient_id).unwrap_or(0.0)))
        .collect()
}
