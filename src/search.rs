//! Field/value matching over catalog products.

use serde::Serialize;

use crate::model::{Catalog, Product};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub field: String,
    pub value: String,
}

impl Query {
    pub fn new(field: &str, value: &str) -> Self {
        Self {
            field: field.trim().to_string(),
            value: value.trim().to_string(),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        matches(&self.field, &self.value, product)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    #[default]
    TopLevel,
    All,
}

/// Field names compare case-insensitively, values exactly. Falls back to
/// the first child only.
pub fn matches(field: &str, value: &str, product: &Product) -> bool {
    if product
        .values
        .iter()
        .any(|v| equal_fold(&v.attribute_id, field) && v.text == value)
    {
        return true;
    }

    if product
        .value_groups
        .iter()
        .filter(|g| equal_fold(&g.attribute_id, field))
        .any(|g| g.values.iter().any(|v| v.text == value))
    {
        return true;
    }

    match product.children.first() {
        Some(child) => matches(field, value, child),
        None => false,
    }
}

pub fn search<'a>(catalog: &'a Catalog, query: &Query, scope: SearchScope) -> Vec<&'a Product> {
    match scope {
        SearchScope::TopLevel => catalog.top_level().filter(|p| query.matches(p)).collect(),
        SearchScope::All => catalog
            .products()
            .iter()
            .filter(|p| query.matches(p))
            .collect(),
    }
}

// Simple case folding: character by character, one character in, one out.
fn equal_fold(a: &str, b: &str) -> bool {
    a.chars().map(fold).eq(b.chars().map(fold))
}

// Upper then lower, so every member of a case orbit ('s', 'S', 'ſ') lands on
// the same character. Mappings that expand ('ß' to "SS") leave it unchanged.
fn fold(c: char) -> char {
    let upper = single(c.to_uppercase()).unwrap_or(c);
    single(upper.to_lowercase()).unwrap_or(upper)
}

fn single(mut mapped: impl Iterator<Item = char>) -> Option<char> {
    match (mapped.next(), mapped.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten_catalog;

    #[test]
    fn field_is_case_insensitive_value_is_not() {
        let product = Product::new("1").with_value("Color", "Red");
        assert!(matches("color", "Red", &product));
        assert!(matches("COLOR", "Red", &product));
        assert!(!matches("color", "red", &product));
        assert!(!matches("colour", "Red", &product));
    }

    #[test]
    fn field_comparison_uses_simple_folding() {
        assert!(equal_fold("ſize", "SIZE"));
        assert!(equal_fold("\u{212A}ind", "kind"));
        assert!(equal_fold("Maß", "MAẞ"));
        assert!(!equal_fold("maß", "mass"));
        assert!(!equal_fold("size", "sizes"));

        let product = Product::new("1").with_value("Σχήμα", "Round");
        assert!(matches("σχήμα", "Round", &product));
    }

    #[test]
    fn grouped_values_match_any_member() {
        let product = Product::new("1").with_group("Fits", &["A-100", "B-200"]);
        assert!(matches("fits", "B-200", &product));
        assert!(!matches("fits", "C-300", &product));
        assert!(!matches("other", "A-100", &product));
    }

    #[test]
    fn attribute_and_value_must_match_on_the_same_entry() {
        let product = Product::new("1")
            .with_value("Color", "Blue")
            .with_value("Size", "Red");
        assert!(!matches("color", "Red", &product));
    }

    #[test]
    fn falls_through_to_first_child() {
        let product = Product::new("1")
            .with_value("Color", "Red")
            .with_child(Product::new("2").with_value("Size", "M"));
        assert!(matches("size", "M", &product));
    }

    #[test]
    fn second_child_is_never_examined() {
        let product = Product::new("1")
            .with_child(Product::new("2").with_value("Size", "S"))
            .with_child(Product::new("3").with_value("Size", "M"));
        assert!(!matches("size", "M", &product));
        assert!(matches("size", "S", &product));
    }

    #[test]
    fn descends_through_first_children_only() {
        let product = Product::new("1").with_child(
            Product::new("2").with_child(Product::new("3").with_group("Fits", &["X"])),
        );
        assert!(matches("fits", "X", &product));
    }

    #[test]
    fn matching_is_idempotent() {
        let product = Product::new("1").with_child(Product::new("2").with_value("Size", "M"));
        let first = matches("size", "M", &product);
        let second = matches("size", "M", &product);
        assert_eq!(first, second);
    }

    #[test]
    fn query_trims_its_parts() {
        let query = Query::new("  color ", " Red\n");
        assert_eq!(query.field, "color");
        assert_eq!(query.value, "Red");
    }

    #[test]
    fn search_scope_controls_which_entries_are_tested() {
        let catalog = flatten_catalog(vec![
            Product::new("1")
                .with_value("Color", "Red")
                .with_child(Product::new("2").with_value("Size", "M")),
            Product::new("3").with_value("Color", "Blue"),
        ]);

        let query = Query::new("size", "M");
        let top: Vec<&str> = search(&catalog, &query, SearchScope::TopLevel)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(top, vec!["1"]);

        let all: Vec<&str> = search(&catalog, &query, SearchScope::All)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(all, vec!["1", "2"]);

        assert!(search(&catalog, &Query::new("color", "Green"), SearchScope::All).is_empty());
    }

    #[test]
    fn product_below_an_id_less_second_child_is_unreachable() {
        let decoded = vec![
            Product::new("1")
                .with_child(Product::new("a").with_value("Size", "S"))
                .with_child(Product::new("").with_child(Product::new("9").with_value("Size", "M"))),
        ];
        let direct: Vec<&Product> = decoded
            .iter()
            .filter(|p| matches("size", "M", p))
            .collect();
        assert!(direct.is_empty());

        let catalog = flatten_catalog(decoded);
        let query = Query::new("size", "M");
        assert!(search(&catalog, &query, SearchScope::TopLevel).is_empty());

        let all: Vec<&str> = search(&catalog, &query, SearchScope::All)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(all, vec!["9"]);
    }
}
