use super::*;

fn product_with(size: &str, in_stock: Option<bool>) -> Product {
    let mut product = Product::from_url("https://www.solebox.com/p");
    let mut s = Size::observed(size, false);
    s.is_in_stock = in_stock;
    product.sizes.push(s);
    product
}

#[test]
fn unknown_size_is_added_and_counts_as_change() {
    let mut product = Product::from_url("https://www.solebox.com/p");

    assert!(apply_size_observation(&mut product, "42", false));
    assert_eq!(product.sizes.len(), 1);
    assert_eq!(product.sizes[0].size_eu.as_deref(), Some("42"));
    assert_eq!(product.sizes[0].is_in_stock, Some(false));
}

#[test]
fn restock_counts_as_change() {
    let mut product = product_with("42", Some(false));
    assert!(apply_size_observation(&mut product, "42", true));
    assert_eq!(product.sizes[0].is_in_stock, Some(true));
}

#[test]
fn going_out_of_stock_updates_state_silently() {
    let mut product = product_with("42", Some(true));
    assert!(!apply_size_observation(&mut product, "42", false));
    assert_eq!(product.sizes[0].is_in_stock, Some(false));
}

#[test]
fn staying_in_stock_is_not_a_change() {
    let mut product = product_with("42", Some(true));
    assert!(!apply_size_observation(&mut product, "42", true));
}

#[test]
fn unknown_stock_state_becoming_in_stock_is_not_a_restock() {
    let mut product = product_with("42", None);
    assert!(!apply_size_observation(&mut product, "42", true));
    assert_eq!(product.sizes[0].is_in_stock, Some(true));
}

#[test]
fn sizes_keep_insertion_order() {
    let mut product = Product::from_url("https://www.solebox.com/p");
    for size in ["40", "41"] {
        apply_size_observation(&mut product, size, true);
    }
    apply_size_observation(&mut product, "42", true);

    let order: Vec<&str> = product
        .sizes
        .iter()
        .filter_map(|s| s.size_eu.as_deref())
        .collect();
    assert_eq!(order, ["40", "41", "42"]);

    // A later pass over the same sizes must not duplicate them.
    for size in ["40", "41", "42"] {
        apply_size_observation(&mut product, size, true);
    }
    assert_eq!(product.sizes.len(), 3);
}
