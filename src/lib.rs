//! # HVAC Classifier
//!
//! Finds the HVAC equipment in an IFC building model, decides which of it is
//! electronically controlled, locates each element by storey and room, and
//! derives building-automation (BAS) codes in the AMEV or VDI 3814 layout.
//!
//! ## Features
//!
//! - Load IFC files (IFC2x3 and IFC4 schemas) into an element graph
//! - Resolve storey and space through containment, aggregation, space
//!   boundaries or placement height
//! - Detect electronic control from types, keywords, properties and connections
//! - Generate AMEV / VDI codes and convert between the two layouts
//! - Inventory with materials, placement, statistics and name search
//! - Export to CSV and JSON
//!
//! ## Example
//!
//! ```no_run
//! use hvac_classifier::bas::Standard;
//! use hvac_classifier::classify::Classifier;
//! use hvac_classifier::parser::load_ifc_file;
//! use hvac_classifier::rules::Rules;
//!
//! let model = load_ifc_file("model.ifc").expect("Failed to load");
//! let rules = Rules::default();
//! let run = Classifier::new(&model, &rules).classify_all(Standard::Amev, true);
//! for result in &run.flat_results {
//!     println!("{} {}", result.bas_code, result.element_name);
//! }
//! ```

pub mod bas;
pub mod classify;
pub mod error;
pub mod export;
pub mod graph;
pub mod inventory;
pub mod model;
pub mod parser;
pub mod rules;
pub mod spatial;
