use serde_json::{Map, Value, json};

/// A catalogue-shaped document: `categories` of `products`, each with a
/// small `meta` block, roughly `categories * (products * 9 + 4)` nodes.
pub fn generate_catalogue(categories: usize, products: usize) -> Value {
    let mut list = Vec::with_capacity(categories);
    for c in 0..categories {
        let items: Vec<Value> = (0..products)
            .map(|p| {
                json!({
                    "name": format!("Product {}-{}", c, p),
                    "price": (p as f64) * 1.25,
                    "in_stock": p % 3 != 0,
                    "tags": ["a", "b"],
                    "meta": {"sku": format!("SKU-{}-{}", c, p)},
                })
            })
            .collect();
        list.push(json!({
            "name": format!("Category {}", c),
            "slug": format!("category-{}", c),
            "products": items,
        }));
    }

    let mut root = Map::new();
    root.insert("categories".to_string(), Value::Array(list));
    root.insert("version".to_string(), json!(1));
    Value::Object(root)
}

/// `{"next": {"next": ... "leaf"}}` nested `levels` deep.
pub fn generate_chain(levels: usize) -> Value {
    let mut value = json!("leaf");
    for _ in 0..levels {
        value = json!({ "next": value });
    }
    value
}
