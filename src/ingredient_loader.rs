use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::warn;

use crate::models::Ingredient;

const NAME_COL: &str = "name";
const GRAMS_COL: &str = "grams";

fn parse_grams(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|g| g.is_finite() && *g > 0.0)
}

/// Reads a `name,grams` CSV. Rows with a blank name are skipped; rows whose
/// grams are missing, unparsable or not positive are skipped with a warning.
pub fn load_ingredients(csv_path: &Path) -> Result<Vec<Ingredient>> {
    if !csv_path.exists() {
        return Err(anyhow::anyhow!("Ingredient CSV file not found at: {:?}", csv_path));
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open ingredient CSV file at {:?}", csv_path))?;
    let mut rdr = ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(file);

    let headers = rdr.headers()?.clone();
    let find_col = |col: &str| {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(col))
            .ok_or_else(|| anyhow::anyhow!("Column '{}' not found", col))
    };
    let name_idx = find_col(NAME_COL)?;
    let grams_idx = find_col(GRAMS_COL)?;

    let mut ingredients = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read record at row index {}", row_index))?;

        let name = record.get(name_idx).unwrap_or("").trim().to_string();
        if name.is_empty() {
            continue;
        }
        match record.get(grams_idx).and_then(parse_grams) {
            Some(grams) => ingredients.push(Ingredient::new(name, grams)),
            None => warn!(row = row_index + 1, ingredient = %name, "skipping ingredient without a positive gram amount"),
        }
    }

    if ingredients.is_empty() {
        return Err(anyhow::anyhow!("No valid ingredients loaded from {:?}", csv_path));
    }

    Ok(ingredients)
}

/// Parses inline `name:grams` pairs separated by commas, e.g.
/// `"chicken breast:200, black beans:50"`. A pair without `:grams` defaults to 100 g.
pub fn parse_inline_ingredients(input: &str) -> Result<Vec<Ingredient>> {
    let mut ingredients = Vec::new();
    for segment in input.split(',') {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let (name, grams) = match segment.rsplit_once(':') {
            Some((name, grams)) => {
                let grams = parse_grams(grams)
                    .ok_or_else(|| anyhow::anyhow!("Invalid gram amount in '{}'", segment))?;
                (name.trim(), grams)
            }
            None => (segment, 100.0),
        };
        if name.is_empty() {
            return Err(anyhow::anyhow!("Missing food name in '{}'", segment));
        }
        ingredients.push(Ingredient::new(name, grams));
    }
    Ok(ingredients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_ingredients_success() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "name,grams")?;
        writeln!(file, "Chicken breast, 200")?;
        writeln!(file, "\"Beans, black\",50.5")?;
        writeln!(file, ",10")?; // Empty name
        writeln!(file, "Salt,none")?; // Invalid grams
        writeln!(file, "Water,0")?; // Non-positive grams
        file.flush()?;

        let ingredients = load_ingredients(file.path())?;
        assert_eq!(ingredients.len(), 2);
        assert_eq!(ingredients[0].name, "Chicken breast");
        assert_eq!(ingredients[0].grams, 200.0);
        assert_eq!(ingredients[1].name, "Beans, black");
        assert_eq!(ingredients[1].grams, 50.5);
        assert!(ingredients.iter().all(|i| i.resolved_candidate.is_none()));
        Ok(())
    }

    #[test]
    fn test_load_ingredients_missing_column() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "name,quantity")?;
        writeln!(file, "Apple,100")?;
        file.flush()?;

        let result = load_ingredients(file.path());
        assert!(result.unwrap_err().to_string().contains("Column 'grams' not found"));
        Ok(())
    }

    #[test]
    fn test_load_ingredients_only_headers() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "name,grams")?;
        file.flush()?;

        let result = load_ingredients(file.path());
        assert!(result.unwrap_err().to_string().contains("No valid ingredients loaded"));
        Ok(())
    }

    #[test]
    fn test_load_ingredients_file_not_found() {
        let result = load_ingredients(Path::new("this_file_does_not_exist.csv"));
        assert!(result.unwrap_err().to_string().contains("Ingredient CSV file not found"));
    }

    #[test]
    fn test_parse_inline_ingredients() -> Result<()> {
        let ingredients = parse_inline_ingredients("chicken breast:200, black beans : 50,, avocado")?;
        let pairs: Vec<(&str, f64)> = ingredients.iter().map(|i| (i.name.as_str(), i.grams)).collect();
        assert_eq!(pairs, vec![("chicken breast", 200.0), ("black beans", 50.0), ("avocado", 100.0)]);

        assert!(parse_inline_ingredients("rice:-5").is_err());
        assert!(parse_inline_ingredients(":20").is_err());
        Ok(())
    }
}
