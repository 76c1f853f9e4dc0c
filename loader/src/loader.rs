//! Schema loading with builder pattern and fallback chains.
//!
//! [`LoadedSchema`] runs the whole front end on one source: read the XML,
//! build the parse context from a [`CompilerConfig`], validate. A failed
//! validation is logged per offending node and, when configured, written as
//! a JSON error report before the errors are returned.
//!
//! ```no_run
//! use aggregate_schema_loader::{CompilerConfig, LoadedSchema};
//!
//! let config = CompilerConfig::load("schema-compiler.yml").unwrap();
//! let loaded = LoadedSchema::from_file("schema.xml", &config).unwrap();
//! println!("{} ({})", loaded.schema().context().document().name(), loaded.checksum());
//!
//! // First readable file wins.
//! let loaded = LoadedSchema::builder()
//!     .with_config(config)
//!     .from_file("local/schema.xml")
//!     .from_file("/etc/app/schema.xml")
//!     .build()
//!     .unwrap();
//! ```

use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use aggregate_schema_core::{ApplicationSchema, SchemaErrors, SchemaParseContext};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::config::CompilerConfig;
use crate::error::{LoaderError, Result};
use crate::xml::parse_document;

/// Describes where a [`LoadedSchema`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    /// An XML file on disk.
    File(PathBuf),
    /// XML text held in memory.
    Inline(String),
    /// A fallback chain; the schema came from one of these.
    Multiple(Vec<SchemaSource>),
}

/// A validated schema together with its provenance.
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    schema: ApplicationSchema,
    checksum: String,
    source: SchemaSource,
}

impl LoadedSchema {
    /// Returns a new [`LoaderBuilder`] for configuring a fallback chain.
    pub fn builder() -> LoaderBuilder {
        LoaderBuilder::new()
    }

    /// Loads and validates an XML schema file.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Io`] if the file cannot be read,
    /// [`LoaderError::Xml`] or [`LoaderError::InvalidDocument`] if it is not
    /// a schema document, [`LoaderError::Rule`] if the configuration yields
    /// an inconsistent rule, and [`LoaderError::Validation`] with every
    /// validation error otherwise.
    pub fn from_file(path: impl AsRef<Path>, config: &CompilerConfig) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading schema file");
        let xml = std::fs::read_to_string(path)?;
        Self::load(&xml, SchemaSource::File(path.to_path_buf()), config)
    }

    /// Loads and validates XML text.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file), minus I/O on the input.
    pub fn from_xml(xml: &str, config: &CompilerConfig) -> Result<Self> {
        Self::load(xml, SchemaSource::Inline(xml.to_string()), config)
    }

    fn load(xml: &str, source: SchemaSource, config: &CompilerConfig) -> Result<Self> {
        let checksum = format!("{:x}", Sha256::digest(xml.as_bytes()));
        let document = parse_document(xml)?;
        let ctx = SchemaParseContext::new(Arc::new(document), config.to_rule())?;

        let schema = match ApplicationSchema::build(Arc::new(ctx)) {
            Ok(schema) => schema,
            Err(errors) => {
                for node in errors.nodes() {
                    warn!(path = %node.path, errors = node.len(), "Invalid schema node");
                }
                if let Some(path) = &config.report.errors_json {
                    write_report(path, &errors)?;
                }
                return Err(LoaderError::Validation(errors));
            }
        };

        info!(
            document = schema.context().document().name(),
            roots = schema.root_aggregates().len(),
            checksum = %checksum,
            "Loaded schema"
        );
        Ok(Self {
            schema,
            checksum,
            source,
        })
    }

    pub fn schema(&self) -> &ApplicationSchema {
        &self.schema
    }

    pub fn into_schema(self) -> ApplicationSchema {
        self.schema
    }

    /// Hex SHA-256 of the XML text the schema was built from.
    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn source(&self) -> &SchemaSource {
        &self.source
    }
}

/// Writes the JSON error report of a failed load.
fn write_report(path: &Path, errors: &SchemaErrors) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &errors.report())?;
    debug!(path = %path.display(), nodes = errors.nodes().len(), "Wrote error report");
    Ok(())
}

/// Builder for loading a [`LoadedSchema`] from a fallback chain.
///
/// Sources are tried in the order they are added. A source that cannot be
/// read is skipped; any other failure (malformed XML, invalid schema) is
/// returned as is. If no source can be read,
/// [`LoaderError::NoSourcesAvailable`] is returned.
#[derive(Debug, Default)]
pub struct LoaderBuilder {
    sources: Vec<SchemaSource>,
    config: CompilerConfig,
}

impl LoaderBuilder {
    /// Creates a builder with no sources and the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Adds an XML file as a source.
    pub fn from_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(SchemaSource::File(path.into()));
        self
    }

    /// Adds XML text as a source.
    pub fn from_xml(mut self, xml: impl Into<String>) -> Self {
        self.sources.push(SchemaSource::Inline(xml.into()));
        self
    }

    /// Loads from the first readable source.
    pub fn build(self) -> Result<LoadedSchema> {
        let all_sources = self.sources.clone();

        for source in &self.sources {
            let result = match source {
                SchemaSource::File(path) => LoadedSchema::from_file(path, &self.config),
                SchemaSource::Inline(xml) => LoadedSchema::from_xml(xml, &self.config),
                SchemaSource::Multiple(_) => continue,
            };

            match result {
                Ok(mut loaded) => {
                    loaded.source = SchemaSource::Multiple(all_sources);
                    return Ok(loaded);
                }
                Err(LoaderError::Io(e)) => {
                    debug!(source = ?source, error = %e, "Schema source unavailable");
                }
                Err(e) => return Err(e),
            }
        }

        Err(LoaderError::NoSourcesAvailable)
    }
}
