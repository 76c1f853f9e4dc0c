//! Loading aggregate schema documents from XML.
//!
//! This crate is the I/O side of the schema compiler front end. It reads an
//! XML schema document, builds the parse rule from a YAML
//! [`CompilerConfig`], and runs validation from `aggregate-schema-core`.
//!
//! # Quick start
//!
//! ```no_run
//! use aggregate_schema_loader::{CompilerConfig, LoadedSchema, LoaderError};
//!
//! let config = CompilerConfig::load("schema-compiler.yml").unwrap();
//! match LoadedSchema::from_file("schema.xml", &config) {
//!     Ok(loaded) => println!("{}", loaded.schema().markdown_dump()),
//!     Err(LoaderError::Validation(errors)) => eprintln!("{errors}"),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

mod config;
mod error;
mod loader;
mod xml;

pub use config::{CompilerConfig, ReportConfig, RuleConfig};
pub use error::{LoaderError, Result};
pub use loader::{LoadedSchema, LoaderBuilder, SchemaSource};
pub use xml::parse_document;
