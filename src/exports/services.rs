use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use serde_json::Value;

use super::dto::RecipeDocument;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;
const LINE_HEIGHT: f32 = 7.0;
// Approximate Helvetica advance per point of font size, in millimetres.
const CHAR_WIDTH_PER_PT: f32 = 0.5 * 0.3528;

/// Cursor over an A4 document that starts a new page when it runs out of room.
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    pages: usize,
}

impl PageWriter {
    fn new(title: &str) -> anyhow::Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
            pages: 1,
        })
    }

    fn ensure_room(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.pages += 1;
            let (page, layer) = self.doc.add_page(
                Mm(PAGE_WIDTH),
                Mm(PAGE_HEIGHT),
                format!("Layer {}", self.pages),
            );
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
    }

    fn text_at(&mut self, text: &str, size: f32, x: f32, bold: bool) {
        self.ensure_room(LINE_HEIGHT);
        self.y -= LINE_HEIGHT;
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn line(&mut self, text: &str, size: f32, bold: bool) {
        self.text_at(text, size, MARGIN, bold);
    }

    fn paragraph(&mut self, text: &str, size: f32) {
        for line in wrap_text(text, chars_per_line(size)) {
            self.line(&line, size, false);
        }
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn finish(self) -> anyhow::Result<Vec<u8>> {
        Ok(self.doc.save_to_bytes()?)
    }
}

fn chars_per_line(size: f32) -> usize {
    ((PAGE_WIDTH - 2.0 * MARGIN) / (size * CHAR_WIDTH_PER_PT)) as usize
}

/// Built-in PDF fonts only cover Latin-1.
fn latin1(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' | '\n' | '\r' => ' ',
            c if (c as u32) < 0x20 => ' ',
            c if (c as u32) <= 0xFF => c,
            _ => '?',
        })
        .collect()
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn display_value(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Render a recipe as an A4 PDF. The nutrition section is left out when empty.
pub fn render_recipe_pdf(recipe: &RecipeDocument) -> anyhow::Result<Vec<u8>> {
    let title = latin1(recipe.title.trim());
    let mut w = PageWriter::new(&title)?;

    for line in wrap_text(&title, chars_per_line(TITLE_SIZE)) {
        let width = line.chars().count() as f32 * TITLE_SIZE * CHAR_WIDTH_PER_PT;
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN);
        w.text_at(&line, TITLE_SIZE, x, true);
    }
    w.gap(LINE_HEIGHT);

    w.line("Ingredients:", HEADING_SIZE, true);
    for item in &recipe.ingredients {
        w.paragraph(&format!("- {}", latin1(item)), BODY_SIZE);
    }
    w.gap(LINE_HEIGHT / 2.0);

    w.line("Steps:", HEADING_SIZE, true);
    for step in &recipe.steps {
        w.paragraph(&latin1(step), BODY_SIZE);
    }
    w.gap(LINE_HEIGHT / 2.0);

    if !recipe.nutrition.is_empty() {
        w.line("Nutrition:", HEADING_SIZE, true);
        let summary = recipe
            .nutrition
            .iter()
            .map(|(k, v)| format!("{}: {}", k, display_value(v)))
            .collect::<Vec<_>>()
            .join(", ");
        w.paragraph(&latin1(&summary), BODY_SIZE);
    }

    w.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn document(nutrition: Map<String, Value>) -> RecipeDocument {
        RecipeDocument {
            title: "Mock Chicken Stir Fry".into(),
            ingredients: vec!["chicken".into(), "broccoli".into()],
            steps: vec!["1. Cut chicken.".into(), "2. Stir fry with veggies.".into()],
            nutrition,
        }
    }

    #[test]
    fn renders_pdf_bytes() {
        let nutrition = json!({ "calories": 450, "protein": "35g" })
            .as_object()
            .cloned()
            .unwrap();
        let bytes = render_recipe_pdf(&document(nutrition)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn empty_nutrition_still_renders() {
        let bytes = render_recipe_pdf(&document(Map::new())).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn long_recipes_spill_onto_new_pages() {
        let mut doc = document(Map::new());
        doc.steps = (1..=80)
            .map(|i| format!("{i}. Stir gently and taste, adjusting the seasoning as you go."))
            .collect();
        doc.title = "Soupe à l'oignon 🍲".into();
        let bytes = render_recipe_pdf(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn wrap_keeps_words_whole() {
        let lines = wrap_text("one two three four five", 9);
        assert_eq!(lines, vec!["one two", "three", "four five"]);
        assert!(wrap_text("   ", 10).is_empty());
    }

    #[test]
    fn non_latin1_is_replaced() {
        assert_eq!(latin1("crème brûlée 🍮"), "crème brûlée ?");
        assert_eq!(latin1("a\tb"), "a b");
    }
}
