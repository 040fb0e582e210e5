//! The size diff rule shared by every site extractor.

use shopwatch_core::{Product, Size};

/// Folds one observed `(sizeEU, in-stock)` pair into the product.
///
/// An unknown size is appended and counts as a change; a known size counts
/// as a change only on the out-of-stock → in-stock transition (a restock).
/// The stock flag is always brought up to date, so a silent sell-out is
/// persisted and the next restock is detectable.
pub fn apply_size_observation(product: &mut Product, size_str: &str, in_stock: bool) -> bool {
    match product.find_size_mut(size_str) {
        Some(size) => {
            let was = size.is_in_stock;
            size.is_in_stock = Some(in_stock);
            if was == Some(false) && in_stock {
                tracing::debug!(size = size_str, url = %product.url, "size has been restocked");
                true
            } else {
                false
            }
        }
        None => {
            product.add_size(Size::observed(size_str, in_stock));
            tracing::debug!(size = size_str, url = %product.url, "new size detected and added");
            true
        }
    }
}

#[cfg(test)]
#[path = "sizes_test.rs"]
mod tests;
