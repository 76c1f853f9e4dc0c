//! XML reading.
//!
//! The document element names the schema; every element below it becomes a
//! raw node with its attributes in source order. Namespace declarations and
//! text content are ignored.

use aggregate_schema_core::{DocumentBuilder, NodeId, SchemaDocument};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::error::{LoaderError, Result};

/// Parses XML text into a [`SchemaDocument`].
///
/// # Errors
///
/// Returns [`LoaderError::Xml`] for malformed XML and
/// [`LoaderError::InvalidDocument`] when there is no single document element.
///
/// # Examples
///
/// ```
/// use aggregate_schema_loader::parse_document;
///
/// let doc = parse_document(r#"
///     <Sales>
///       <Order Type="data-model">
///         <No Type="int" IsKey="True" />
///       </Order>
///     </Sales>"#).unwrap();
/// assert_eq!(doc.name(), "Sales");
/// assert_eq!(doc.path(doc.find_path(&["Order", "No"]).unwrap()), "Order/No");
/// ```
pub fn parse_document(xml: &str) -> Result<SchemaDocument> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut builder: Option<DocumentBuilder> = None;
    let mut finished = false;
    // Open elements below the document element.
    let mut open: Vec<NodeId> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if let Some(id) = element(&mut builder, &mut finished, &open, &e)? {
                    open.push(id);
                }
            }
            Event::Empty(e) => {
                if element(&mut builder, &mut finished, &open, &e)?.is_none() {
                    finished = true;
                }
            }
            Event::End(_) => {
                if open.pop().is_none() {
                    finished = true;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let builder =
        builder.ok_or_else(|| LoaderError::InvalidDocument("missing document element".into()))?;
    if !finished {
        return Err(LoaderError::InvalidDocument(
            "unexpected end of document".into(),
        ));
    }
    let document = builder.build();
    debug!(document = document.name(), nodes = document.len(), "Parsed XML");
    Ok(document)
}

/// Handles an opening element. Returns the new node, or `None` for the
/// document element itself.
fn element(
    builder: &mut Option<DocumentBuilder>,
    finished: &mut bool,
    open: &[NodeId],
    e: &BytesStart<'_>,
) -> Result<Option<NodeId>> {
    let name = utf8(e.local_name().as_ref())?;
    let b = match builder {
        Some(b) => b,
        None => {
            *builder = Some(DocumentBuilder::new(name));
            return Ok(None);
        }
    };
    if *finished {
        return Err(LoaderError::InvalidDocument(format!(
            "element '{name}' after the document element"
        )));
    }

    let attributes = attributes(e)?;
    let pairs = attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()));
    let id = match open.last() {
        Some(parent) => b.add_child(*parent, name, pairs),
        None => b.add_root(name, pairs),
    };
    Ok(Some(id))
}

fn attributes(e: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = utf8(attr.key.as_ref())?;
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr.unescape_value()?.into_owned();
        out.push((key, value));
    }
    Ok(out)
}

fn utf8(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|e| LoaderError::InvalidDocument(format!("invalid UTF-8 in name: {e}")))
}
