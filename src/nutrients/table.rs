use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Source id given to tables built by combining several ingredients.
pub const AGGREGATE_SOURCE_ID: &str = "aggregate";

/// FoodData Central nutrient ids for the nutrients a label usually shows.
pub mod nutrient_ids {
    pub const PROTEIN: u32 = 1003;
    pub const CARBOHYDRATE: u32 = 1005;
    pub const ENERGY_KCAL: u32 = 1008;
    pub const FIBER: u32 = 1079;
    pub const CALCIUM: u32 = 1087;
    pub const IRON: u32 = 1089;
    pub const SODIUM: u32 = 1093;
    pub const VITAMIN_A: u32 = 1104;
    pub const VITAMIN_C: u32 = 1162;
    pub const CHOLESTEROL: u32 = 1253;
    pub const TRANS_FAT: u32 = 1257;
    pub const SATURATED_FAT: u32 = 1258;
    pub const SUGARS: u32 = 2000;

    /// Short key for a well-known nutrient id, `None` for anything else.
    pub fn label_key(nutrient_id: u32) -> Option<&'static str> {
        let key = match nutrient_id {
            PROTEIN => "protein",
            CARBOHYDRATE => "carbs",
            ENERGY_KCAL => "energy",
            FIBER => "fiber",
            CALCIUM => "calcium",
            IRON => "iron",
            SODIUM => "sodium",
            VITAMIN_A => "vit_a",
            VITAMIN_C => "vit_c",
            CHOLESTEROL => "cholesterol",
            TRANS_FAT => "trans_fat",
            SATURATED_FAT => "sat_fat",
            SUGARS => "sugars",
            _ => return None,
        };
        Some(key)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NutrientEntry {
    pub nutrient_id: u32,
    pub name: String,
    pub unit: String,
    pub amount_per_100g: f64,
}

/// Per-100 g nutrient amounts for one catalog record, ordered by nutrient id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NutrientTable {
    source_id: String,
    entries: BTreeMap<u32, NutrientEntry>,
}

impl NutrientTable {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Builds a table from entries; a repeated nutrient id keeps the last one.
    pub fn from_entries(
        source_id: impl Into<String>,
        entries: impl IntoIterator<Item = NutrientEntry>,
    ) -> Self {
        let mut table = Self::new(source_id);
        for entry in entries {
            table.insert(entry);
        }
        table
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn insert(&mut self, entry: NutrientEntry) -> Option<NutrientEntry> {
        self.entries.insert(entry.nutrient_id, entry)
    }

    pub fn get(&self, nutrient_id: u32) -> Option<&NutrientEntry> {
        self.entries.get(&nutrient_id)
    }

    pub fn amount(&self, nutrient_id: u32) -> Option<f64> {
        self.get(nutrient_id).map(|e| e.amount_per_100g)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NutrientEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
