//! Testing utilities and mock implementations.
//!
//! Mocks for the provider and stock catalog boundaries, so the autopilot
//! and acquisition loops can be exercised without network access.
//!
//! # Example
//!
//! ```rust,ignore
//! use mirage_core::testing::{fixtures, MockImageProvider, MockStockCatalog};
//!
//! let gemini = MockImageProvider::new(ProviderKind::Gemini);
//! let catalog = MockStockCatalog::new();
//! catalog.set_page(1, fixtures::stock_page(1, 3)).await;
//! ```

mod mock_provider;
mod mock_stock_catalog;

pub use mock_provider::{MockImageProvider, RecordedGeneration};
pub use mock_stock_catalog::{MockStockCatalog, RecordedStockSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::stock::StockResource;
    use crate::topics::Topic;

    /// A small JPEG-looking payload: SOI marker, filler, EOI marker.
    pub fn image_bytes() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend(std::iter::repeat(0x42).take(2048));
        bytes.extend([0xFF, 0xD9]);
        bytes
    }

    /// Create a stock resource with reasonable defaults.
    pub fn stock_resource(id: &str, title: &str) -> StockResource {
        StockResource {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://www.freepik.com/free-photo/{}", id),
            tags: vec!["dubai".to_string(), "travel".to_string()],
        }
    }

    /// A page of resources with IDs `{page}0{n}`, titled after a landmark so
    /// they categorise predictably.
    pub fn stock_page(page: u32, count: usize) -> Vec<StockResource> {
        (1..=count)
            .map(|n| {
                stock_resource(
                    &format!("{}0{}", page, n),
                    &format!("Burj Khalifa skyline view {}", n),
                )
            })
            .collect()
    }

    /// Create a topic with reasonable defaults.
    pub fn topic(name: &str, category: &str, priority: u8) -> Topic {
        Topic {
            name: name.to_string(),
            category: category.to_string(),
            keywords: vec![name.to_lowercase()],
            priority,
        }
    }
}
