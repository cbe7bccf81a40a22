//! Catalog data model.
//!
//! Field names on the wire use the PascalCase keys of existing catalog
//! snapshots (`ID`, `ParentID`, `Values`, ...), so those files keep loading.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeValue {
    #[serde(rename = "AttributeID", default)]
    pub attribute_id: String,
    #[serde(rename = "Text", default)]
    pub text: String,
}

impl AttributeValue {
    pub fn new(attribute_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            attribute_id: attribute_id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeGroup {
    #[serde(rename = "AttributeID", default)]
    pub attribute_id: String,
    #[serde(rename = "Values", default, deserialize_with = "null_as_empty")]
    pub values: Vec<AttributeValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "Type", default)]
    pub kind: String,
    #[serde(rename = "Values", default, deserialize_with = "null_as_empty")]
    pub values: Vec<AttributeValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "ID", default)]
    pub id: String,
    #[serde(rename = "ParentID", default)]
    pub parent_id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Values", default, deserialize_with = "null_as_empty")]
    pub values: Vec<AttributeValue>,
    #[serde(rename = "ValueGroup", default, deserialize_with = "null_as_empty")]
    pub value_groups: Vec<AttributeGroup>,
    #[serde(rename = "CrossReference", default, deserialize_with = "null_as_empty")]
    pub cross_references: Vec<CrossReference>,
    #[serde(rename = "Children", default, deserialize_with = "null_as_empty")]
    pub children: Vec<Product>,
}

impl Product {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_value(mut self, attribute_id: &str, text: &str) -> Self {
        self.values.push(AttributeValue::new(attribute_id, text));
        self
    }

    pub fn with_group(mut self, attribute_id: &str, texts: &[&str]) -> Self {
        self.value_groups.push(AttributeGroup {
            attribute_id: attribute_id.to_string(),
            values: texts
                .iter()
                .map(|t| AttributeValue::new(attribute_id, *t))
                .collect(),
        });
        self
    }

    pub fn with_child(mut self, child: Product) -> Self {
        self.children.push(child);
        self
    }

    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Product::depth).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn into_products(self) -> Vec<Product> {
        self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    // parent_id is also empty below an id-less product, so top-level is
    // decided from the nested children instead.
    pub fn top_level(&self) -> impl Iterator<Item = &Product> {
        let nested = self.nested_ids();
        self.products
            .iter()
            .filter(move |p| !nested.contains(p.id.as_str()))
    }

    fn nested_ids(&self) -> HashSet<&str> {
        let mut nested = HashSet::new();
        for p in &self.products {
            collect_child_ids(&p.children, &mut nested);
        }
        nested
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn stats(&self) -> CatalogStats {
        let mut stats = CatalogStats {
            products: self.products.len(),
            ..CatalogStats::default()
        };
        let nested = self.nested_ids();
        for p in &self.products {
            if !nested.contains(p.id.as_str()) {
                stats.top_level += 1;
                stats.max_depth = stats.max_depth.max(p.depth());
            } else {
                stats.nested += 1;
            }
            stats.values += p.values.len();
            stats.value_groups += p.value_groups.len();
            stats.cross_references += p.cross_references.len();
        }
        stats
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogStats {
    pub products: usize,
    pub top_level: usize,
    pub nested: usize,
    pub values: usize,
    pub value_groups: usize,
    pub cross_references: usize,
    pub max_depth: usize,
}

// Identified children are catalog entries themselves, so their subtrees are
// visited from there. Id-less children are not, so descend through them.
fn collect_child_ids<'a>(children: &'a [Product], nested: &mut HashSet<&'a str>) {
    for child in children {
        if child.id.is_empty() {
            collect_child_ids(&child.children, nested);
        } else {
            nested.insert(child.id.as_str());
        }
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_with_null_sequences_deserializes() -> anyhow::Result<()> {
        let raw = r#"[{
            "ID": "1",
            "ParentID": "",
            "Name": "Drill",
            "Values": null,
            "ValueGroup": [{"AttributeID": "Fits", "Values": null}],
            "CrossReference": null,
            "Children": null
        }]"#;

        let catalog: Catalog = serde_json::from_str(raw)?;
        let product = &catalog.products()[0];
        assert_eq!(product.id, "1");
        assert_eq!(product.name, "Drill");
        assert!(product.values.is_empty());
        assert!(product.value_groups[0].values.is_empty());
        assert!(product.children.is_empty());
        Ok(())
    }

    #[test]
    fn serializes_with_snapshot_field_names() -> anyhow::Result<()> {
        let product = Product::new("7").with_name("Bit").with_value("Color", "Red");
        let json = serde_json::to_value(&product)?;
        assert_eq!(json["ID"], "7");
        assert_eq!(json["ParentID"], "");
        assert_eq!(json["Values"][0]["AttributeID"], "Color");
        assert_eq!(json["Values"][0]["Text"], "Red");
        assert!(json["ValueGroup"].as_array().is_some());
        assert!(json["CrossReference"].as_array().is_some());
        Ok(())
    }

    #[test]
    fn stats_count_levels_and_attributes() {
        let mut child = Product::new("2").with_value("Size", "M");
        child.parent_id = "1".to_string();
        let top = Product::new("1")
            .with_value("Color", "Red")
            .with_group("Fits", &["A", "B"])
            .with_child(child.clone());

        let stats = Catalog::new(vec![top, child]).stats();
        assert_eq!(stats.products, 2);
        assert_eq!(stats.top_level, 1);
        assert_eq!(stats.nested, 1);
        assert_eq!(stats.values, 2);
        assert_eq!(stats.value_groups, 1);
        assert_eq!(stats.max_depth, 2);
    }

    #[test]
    fn products_under_an_id_less_parent_are_not_top_level() {
        // As flattened: 9 sits below an id-less child of 1, so its parent_id is empty.
        let nine = Product::new("9").with_value("Size", "M");
        let top = Product::new("1")
            .with_child(Product::new("a"))
            .with_child(Product::new("").with_child(nine.clone()));
        let mut a = Product::new("a");
        a.parent_id = "1".to_string();

        let catalog = Catalog::new(vec![top, a, nine]);
        let top_level: Vec<&str> = catalog.top_level().map(|p| p.id.as_str()).collect();
        assert_eq!(top_level, vec!["1"]);

        let stats = catalog.stats();
        assert_eq!(stats.top_level, 1);
        assert_eq!(stats.nested, 2);
    }
}
