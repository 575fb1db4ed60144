//! # Category Module
//!
//! Flattens the two-level taxonomy from the config (category path →
//! subcategory names) into a lookup table keyed by the normalized
//! subcategory name.
//!
//! ## Usage
//!
//! ```rust
//! use auto_catalog_core::category::{CategoryEntry, CategoryTable};
//!
//! let table = CategoryTable::build(
//!     &[CategoryEntry {
//!         path: "Finance".to_string(),
//!         subcategories: vec!["Invoices".to_string(), "Taxes".to_string()],
//!     }],
//!     "Inbox",
//! )
//! .unwrap();
//!
//! assert_eq!(table.get("invoices"), Some("Finance/Invoices"));
//! assert_eq!(table.fallback(), "Inbox");
//! assert_eq!(table.destinations(), vec!["Finance/Invoices", "Finance/Taxes"]);
//! ```

mod table;

pub use table::{join_destination, normalize_key, CategoryEntry, CategoryTable, KeyCollision};
