use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A product row after validation at the ingestion boundary.
///
/// Supabase hands us loosely-typed JSON objects; everything is defaulted or
/// coerced here so the rest of the pipeline only sees well-formed values.
/// An `id` of 0 marks an unidentifiable row that must never be indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub tags: Vec<String>,
    pub stock: i64,
}

impl Product {
    /// Parses a raw Supabase row. Never fails: missing or malformed fields
    /// fall back to empty/zero, and the id falls back to 0.
    pub fn from_row(row: &Map<String, Value>) -> Self {
        let id = parse_id(row.get("id")).or_else(|| parse_id(row.get("produto_id"))).unwrap_or(0);

        // New `categoria` column, with fallback to the legacy `modelo` field.
        let category = match string_field(row, "categoria") {
            c if c.is_empty() => string_field(row, "modelo"),
            c => c,
        };

        Self {
            id,
            name: string_field(row, "nome"),
            description: string_field(row, "descricao"),
            price: number_field(row.get("preco")),
            category,
            tags: parse_tags(row.get("tags")),
            stock: number_field(row.get("estoque")) as i64,
        }
    }

    /// The sentence handed to the embedding models. Pure and deterministic:
    /// the same row always produces the same text.
    pub fn embedding_text(&self) -> String {
        format!(
            "Nome: {}. Categoria: {}. Tags: {}. Descrição: {}",
            self.name,
            self.category,
            self.tags.join(", "),
            self.description
        )
    }
}

fn string_field(row: &Map<String, Value>, key: &str) -> String {
    match row.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn parse_id(value: Option<&Value>) -> Option<i64> {
    let id = match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().map(|f| f as i64))?
        }
        _ => return None,
    };
    (id != 0).then_some(id)
}

fn number_field(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Tags arrive either as a comma-delimited string or as a JSON array.
/// Both forms normalize to the same trimmed list.
fn parse_tags(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .filter(|t| !t.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// Tally returned by a synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub inserted: usize,
    pub failed: usize,
}

impl SyncReport {
    /// Whether any record in the batch failed to index. Drives the process
    /// exit status; a batch with failures still runs to completion.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().expect("test row must be an object").clone()
    }

    #[test]
    fn parses_a_full_row() {
        let p = Product::from_row(&row(json!({
            "id": 7,
            "nome": "Berbequim",
            "descricao": "Berbequim sem fios 18V",
            "preco": 129.9,
            "categoria": "Ferramentas",
            "tags": ["bricolage", "oficina"],
            "estoque": 12
        })));
        assert_eq!(p.id, 7);
        assert_eq!(p.name, "Berbequim");
        assert_eq!(p.price, 129.9);
        assert_eq!(p.category, "Ferramentas");
        assert_eq!(p.tags, vec!["bricolage", "oficina"]);
        assert_eq!(p.stock, 12);
    }

    #[test]
    fn missing_fields_default() {
        let p = Product::from_row(&row(json!({})));
        assert_eq!(p.id, 0);
        assert_eq!(p.name, "");
        assert_eq!(p.description, "");
        assert_eq!(p.price, 0.0);
        assert_eq!(p.category, "");
        assert!(p.tags.is_empty());
        assert_eq!(p.stock, 0);
    }

    #[test]
    fn id_falls_back_to_produto_id() {
        let p = Product::from_row(&row(json!({ "produto_id": 42 })));
        assert_eq!(p.id, 42);
    }

    #[test]
    fn id_accepts_numeric_strings_and_rejects_garbage() {
        assert_eq!(Product::from_row(&row(json!({ "id": "15" }))).id, 15);
        assert_eq!(Product::from_row(&row(json!({ "id": "15.0" }))).id, 15);
        assert_eq!(Product::from_row(&row(json!({ "id": "abc" }))).id, 0);
        assert_eq!(Product::from_row(&row(json!({ "id": null }))).id, 0);
        assert_eq!(Product::from_row(&row(json!({ "id": [1] }))).id, 0);
    }

    #[test]
    fn category_falls_back_to_legacy_modelo() {
        let p = Product::from_row(&row(json!({ "id": 1, "modelo": "XP-200" })));
        assert_eq!(p.category, "XP-200");

        let p = Product::from_row(&row(json!({ "id": 1, "categoria": "", "modelo": "XP-200" })));
        assert_eq!(p.category, "XP-200");

        let p = Product::from_row(&row(json!({ "id": 1, "categoria": "Impressoras", "modelo": "XP-200" })));
        assert_eq!(p.category, "Impressoras");
    }

    #[test]
    fn tags_string_and_list_normalize_identically() {
        let from_string = Product::from_row(&row(json!({ "id": 1, "tags": "a, b ,c," })));
        let from_list = Product::from_row(&row(json!({ "id": 1, "tags": ["a", "b", "c"] })));
        assert_eq!(from_string.tags, from_list.tags);
        assert_eq!(from_string.embedding_text(), from_list.embedding_text());
        assert!(from_string.embedding_text().contains("Tags: a, b, c."));
    }

    #[test]
    fn embedding_text_is_deterministic() {
        let p = Product::from_row(&row(json!({
            "id": 3,
            "nome": "Cadeira",
            "categoria": "Mobiliário",
            "tags": "escritório, ergonómica",
            "descricao": "Cadeira de escritório ajustável"
        })));
        let expected = "Nome: Cadeira. Categoria: Mobiliário. Tags: escritório, ergonómica. \
                        Descrição: Cadeira de escritório ajustável";
        assert_eq!(p.embedding_text(), expected);
        assert_eq!(p.embedding_text(), p.embedding_text());
    }

    #[test]
    fn sync_report_flags_failures() {
        assert!(!SyncReport::default().has_failures());
        assert!(!SyncReport { inserted: 3, failed: 0 }.has_failures());
        assert!(SyncReport { inserted: 0, failed: 1 }.has_failures());
    }

    #[test]
    fn numeric_fields_accept_strings() {
        let p = Product::from_row(&row(json!({ "id": 1, "preco": "19.90", "estoque": "3" })));
        assert_eq!(p.price, 19.90);
        assert_eq!(p.stock, 3);
    }
}
