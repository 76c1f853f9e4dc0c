use std::path::{Path, PathBuf};

use aggregate_schema_core::{ErrorCategory, ErrorReport, Member, ModelKind};
use aggregate_schema_loader::{CompilerConfig, LoadedSchema, LoaderError, SchemaSource};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const LIBRARY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Library>
  <Genre Type="enum">
    <Novel key="1" />
    <Poetry key="2" DisplayName="Poems" />
  </Genre>
  <Author Type="data-model" GenerateDefaultQueryModel="True">
    <AuthorId Type="word" IsKey="True" />
    <Name Type="word" IsRequired="True" MaxLength="100" />
  </Author>
  <Book Type="data-model" DisplayName="Book">
    <Isbn Type="word" IsKey="True" />
    <Title Type="description" />
    <Genre Type="Genre" />
    <Writer Type="ref-to:Author" />
    <Chapters Type="children">
      <No Type="int" IsKey="True" />
      <Heading Type="word" />
    </Chapters>
  </Book>
  <ShelfView Type="query-model">
    <Shelf Type="word" IsKey="True" />
    <Featured Type="ref-to:Author" />
  </ShelfView>
  <Borrow Type="command-model">
    <Member Type="word" />
    <Requested Type="ref-to:Author" RefToObject="DisplayData" />
  </Borrow>
</Library>
"#;

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

// ---------------------------------------------------------------------------
// End-to-end loading
// ---------------------------------------------------------------------------

#[test]
fn test_load_library_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "library.xml", LIBRARY);

    let loaded = LoadedSchema::from_file(&path, &CompilerConfig::default()).unwrap();
    let schema = loaded.schema();

    assert_eq!(schema.context().document().name(), "Library");
    assert_eq!(schema.root_aggregates().len(), 5);
    assert_eq!(schema.roots_of(ModelKind::DataModel).len(), 2);
    assert_eq!(schema.roots_of(ModelKind::CommandModel).len(), 1);

    let author = schema.find_root("Author").unwrap();
    // Book, ShelfView and Borrow all point at Author.
    assert_eq!(author.ref_froms().len(), 3);

    let book = schema.find_root("Book").unwrap();
    let members = book.members();
    assert!(members.iter().any(|m| matches!(m, Member::NestedMany(a) if a.name() == "Chapters")));
}

#[test]
fn test_dump_of_loaded_schema() {
    let loaded = LoadedSchema::from_xml(LIBRARY, &CompilerConfig::default()).unwrap();
    let dump = loaded.schema().markdown_dump();

    assert!(dump.starts_with("# Library\n"));
    assert!(dump.contains("    Book *-- \"*\" Chapters : Chapters"));
    assert!(dump.contains("    Book --> Author : Writer"));
    assert!(dump.contains("`x.Chapters.Select(x => x.Heading)`"));
}

// ---------------------------------------------------------------------------
// Configuration workflow
// ---------------------------------------------------------------------------

#[test]
fn test_custom_vocabulary_from_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write(
        dir.path(),
        "compiler.yml",
        r#"
version: "1.0"
rule:
  discriminator: is
  children_marker: array
  ref_prefix: "link:"
"#,
    );
    let xml = LIBRARY
        .replace("Type=", "is=")
        .replace("\"children\"", "\"array\"")
        .replace("ref-to:", "link:");
    let schema_path = write(dir.path(), "library.xml", &xml);

    let config = CompilerConfig::load(&config_path).unwrap();
    let loaded = LoadedSchema::from_file(&schema_path, &config).unwrap();
    assert_eq!(loaded.schema().all_aggregates().len(), 6);

    // The default vocabulary no longer matches anything.
    let err = LoadedSchema::from_xml(LIBRARY, &config).unwrap_err();
    assert!(matches!(err, LoaderError::Validation(_)));
}

#[test]
fn test_excluded_model_is_reported_per_root() {
    let config: CompilerConfig =
        serde_yaml::from_str("version: \"1.0\"\nexclude: [command-model]\n").unwrap();
    let err = LoadedSchema::from_xml(LIBRARY, &config).unwrap_err();
    let LoaderError::Validation(errors) = err else {
        panic!("expected validation errors, got {err}");
    };
    let borrow = errors
        .nodes()
        .iter()
        .find(|n| n.path == "Borrow")
        .expect("Borrow should be reported");
    assert!(borrow.errors[0].to_string().starts_with("unknown model 'command-model'"));
}

// ---------------------------------------------------------------------------
// Error reports
// ---------------------------------------------------------------------------

#[test]
fn test_json_report_lists_every_node() {
    let dir = tempfile::tempdir().unwrap();
    let report_path = dir.path().join("errors.json");
    let mut config = CompilerConfig::default();
    config.report.errors_json = Some(report_path.clone());

    let broken = LIBRARY
        .replace(r#"<Shelf Type="word" IsKey="True" />"#, "")
        .replace(r#" RefToObject="DisplayData""#, "")
        .replace(r#"<Title Type="description" />"#, r#"<Title Type="text" />"#);
    let err = LoadedSchema::from_xml(&broken, &config).unwrap_err();
    let LoaderError::Validation(errors) = err else {
        panic!("expected validation errors, got {err}");
    };

    let file = std::fs::File::open(&report_path).unwrap();
    let report: ErrorReport = serde_json::from_reader(std::io::BufReader::new(file)).unwrap();
    assert_eq!(report, errors.report());

    let paths: Vec<&str> = report.nodes.iter().map(|n| n.path.as_str()).collect();
    assert_eq!(paths, vec!["Book/Title", "ShelfView", "Borrow/Requested"]);

    let counts = errors.count_by_category();
    assert_eq!(counts.get(&ErrorCategory::TypeResolution), Some(&1));
    assert_eq!(counts.get(&ErrorCategory::Structural), Some(&1));
    assert_eq!(counts.get(&ErrorCategory::Reference), Some(&1));
}

// ---------------------------------------------------------------------------
// Builder fallback chain
// ---------------------------------------------------------------------------

#[test]
fn test_builder_fallback_to_inline() {
    let loaded = LoadedSchema::builder()
        .from_file("/nonexistent/library.xml")
        .from_xml(LIBRARY)
        .build()
        .unwrap();

    let SchemaSource::Multiple(sources) = loaded.source() else {
        panic!("expected a fallback chain");
    };
    assert_eq!(sources.len(), 2);
    assert_eq!(loaded.schema().root_aggregates().len(), 5);
}

#[test]
fn test_builder_reports_malformed_xml() {
    let result = LoadedSchema::builder()
        .from_xml("<Library><Author></Library>")
        .from_xml(LIBRARY)
        .build();
    assert!(matches!(result, Err(LoaderError::Xml(_))));
}
