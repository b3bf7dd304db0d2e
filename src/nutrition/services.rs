use super::dto::Nutrition;

#[derive(Debug, Clone, Copy, Default)]
struct Macros {
    calories: f64,
    protein: f64,
    fat: f64,
    carbs: f64,
}

impl std::ops::AddAssign for Macros {
    fn add_assign(&mut self, rhs: Self) {
        self.calories += rhs.calories;
        self.protein += rhs.protein;
        self.fat += rhs.fat;
        self.carbs += rhs.carbs;
    }
}

const fn macros(calories: f64, protein: f64, fat: f64, carbs: f64) -> Macros {
    Macros {
        calories,
        protein,
        fat,
        carbs,
    }
}

// Per typical portion. Scanned in order; the first key contained in the item wins,
// so "chicken" shadows "chicken breast".
const LOOKUP: &[(&str, Macros)] = &[
    ("chicken", macros(250.0, 30.0, 8.0, 0.0)),
    ("chicken breast", macros(220.0, 32.0, 6.0, 0.0)),
    ("broccoli", macros(55.0, 3.7, 0.6, 11.0)),
    ("rice", macros(200.0, 4.5, 0.4, 44.0)),
    ("garlic", macros(5.0, 0.2, 0.0, 1.0)),
    ("olive oil", macros(120.0, 0.0, 14.0, 0.0)),
    ("soy sauce", macros(10.0, 1.0, 0.0, 1.0)),
];

const DEFAULT_MACROS: Macros = macros(50.0, 1.0, 1.0, 5.0);

fn lookup(item: &str) -> Macros {
    LOOKUP
        .iter()
        .find(|(key, _)| item.contains(key))
        .map(|(_, m)| *m)
        .unwrap_or(DEFAULT_MACROS)
}

fn grams(value: f64) -> String {
    format!("{:.1}g", (value * 10.0).round() / 10.0)
}

/// Estimate per-serving nutrition by substring lookup of each ingredient.
/// A non-positive `servings` leaves the totals undivided.
pub fn estimate(ingredients: &[String], servings: i64) -> Nutrition {
    let mut totals = Macros::default();
    for item in ingredients {
        totals += lookup(&item.trim().to_lowercase());
    }

    let divisor = if servings > 0 { servings as f64 } else { 1.0 };
    Nutrition {
        calories: (totals.calories / divisor).trunc() as i64,
        protein: grams(totals.protein / divisor),
        fat: grams(totals.fat / divisor),
        carbs: grams(totals.carbs / divisor),
    }
}
