use crate::error::NutrientError;
use crate::nutrients::table::{nutrient_ids, NutrientEntry, NutrientTable};

/// What a table gets divided by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reference {
    /// A fixed quantity, e.g. the total kcal of a serving.
    Amount(f64),
    /// The table's own amount of this nutrient.
    Nutrient(u32),
}

/// Returns a new table with every amount divided by the reference quantity.
pub fn preprocess(table: &NutrientTable, reference: Reference) -> Result<NutrientTable, NutrientError> {
    let divisor = match reference {
        Reference::Amount(amount) => amount,
        Reference::Nutrient(nutrient_id) => table.amount(nutrient_id).ok_or_else(|| {
            NutrientError::MissingReferenceNutrient {
                source_id: table.source_id().to_string(),
                reason: format!("nutrient {} not present", nutrient_id),
            }
        })?,
    };

    if !divisor.is_finite() || divisor <= 0.0 {
        return Err(NutrientError::MissingReferenceNutrient {
            source_id: table.source_id().to_string(),
            reason: format!("reference quantity {} is not a positive number", divisor),
        });
    }

    Ok(NutrientTable::from_entries(
        table.source_id(),
        table.iter().map(|entry| NutrientEntry {
            amount_per_100g: entry.amount_per_100g / divisor,
            ..entry.clone()
        }),
    ))
}

/// Scales a table to "per kcal" using its own energy entry.
pub fn per_kcal(table: &NutrientTable) -> Result<NutrientTable, NutrientError> {
    preprocess(table, Reference::Nutrient(nutrient_ids::ENERGY_KCAL))
}
