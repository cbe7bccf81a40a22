//! Nested product tree to flat catalog.

use crate::model::{Catalog, Product};

/// Returns the subtree with parent links set, plus its identified
/// descendants, each listed after its own descendants.
pub fn flatten_product(mut product: Product) -> (Product, Vec<Product>) {
    let mut flat = Vec::new();

    let children = std::mem::take(&mut product.children);
    product.children = children
        .into_iter()
        .map(|mut child| {
            child.parent_id = product.id.clone();
            let (child, descendants) = flatten_product(child);
            flat.extend(descendants);
            if !child.id.is_empty() {
                flat.push(child.clone());
            }
            child
        })
        .collect();

    (product, flat)
}

pub fn flatten_catalog(top_level: Vec<Product>) -> Catalog {
    let mut products = Vec::with_capacity(top_level.len());
    let mut descendants = Vec::new();

    for product in top_level {
        let (product, flat) = flatten_product(product);
        products.push(product);
        descendants.extend(flat);
    }

    products.extend(descendants);
    Catalog::new(products)
}
