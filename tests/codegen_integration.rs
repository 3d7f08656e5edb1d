//! Integration tests generating models from the fixture schemas.

use std::fs;
use std::path::PathBuf;

use keel::codegen::ResolutionError;
use keel::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/schemas")
        .join(name)
}

fn database(schema: &str) -> SqliteDatabase {
    let mut db = SqliteDatabase::open_in_memory().unwrap();
    db.execute(&fs::read_to_string(fixture(schema)).unwrap())
        .unwrap();
    db
}

fn position(order: &[&String], model: &str) -> usize {
    order.iter().position(|m| m.as_str() == model).unwrap()
}

#[test]
fn test_library_models_follow_references() {
    let generator = Generator::from_config(fixture("library.toml")).unwrap();
    let data = generator.template_data(&mut database("library.sql")).unwrap();
    let order: Vec<&String> = data.tables.keys().collect();

    assert_eq!(order.len(), 5);
    assert!(!data.tables.contains_key("TmpImport"));
    assert_eq!(order[0], "Authors");
    assert!(position(&order, "Publishers") < position(&order, "Books"));
    assert!(position(&order, "Books") < position(&order, "BookTags"));
    assert!(position(&order, "Tags") < position(&order, "BookTags"));
}

#[test]
fn test_library_model_details() {
    let generator = Generator::from_config(fixture("library.toml")).unwrap();
    let data = generator.template_data(&mut database("library.sql")).unwrap();

    let book_tags = &data.tables["BookTags"];
    assert_eq!(book_tags.primary_keys, vec!["book_id", "tag_id"]);

    let authors = &data.tables["Authors"];
    let mentor = authors.columns.iter().find(|c| c.name == "mentor_id").unwrap();
    assert_eq!(mentor.params["references"], Value::from("Authors"));

    let tags = &data.tables["Tags"];
    let label = tags.columns.iter().find(|c| c.name == "label").unwrap();
    assert_eq!(label.params["unique"], Value::Bool(true));
    assert_eq!(label.params["max_length"], Value::from(32));

    let books = &data.tables["Books"];
    let title = books.columns.iter().find(|c| c.name == "title").unwrap();
    assert_eq!(title.params["index"], Value::Bool(true));
}

#[test]
fn test_generate_writes_output_file() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("out/models.json");
    let mut config: GeneratorConfig = fs::read_to_string(fixture("library.toml"))
        .unwrap()
        .parse()
        .unwrap();
    config.output.path = output.clone();

    let generator = Generator::new(config);
    let written = generator
        .generate(&mut database("library.sql"), &generator.default_renderer())
        .unwrap();
    assert_eq!(written, output);

    let json: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(json["tables"]["Books"]["table_name"], Value::from("books"));
}

#[test]
fn test_excluding_referenced_table_fails() {
    let mut config: GeneratorConfig = fs::read_to_string(fixture("library.toml"))
        .unwrap()
        .parse()
        .unwrap();
    config.models.exclude_tables.push("publishers".to_string());

    let err = Generator::new(config)
        .template_data(&mut database("library.sql"))
        .unwrap_err();
    match err {
        CodegenError::Resolution(ResolutionError::RequiredTableExcluded { table, required_by }) => {
            assert_eq!(table, "publishers");
            assert_eq!(required_by, "books");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_include_list_limits_models() {
    let generator = Generator::new("[models]\ninclude_tables = [\"tags\", \"publishers\"]\n".parse().unwrap());
    let data = generator.template_data(&mut database("library.sql")).unwrap();
    assert_eq!(data.tables.keys().collect::<Vec<_>>(), vec!["Publishers", "Tags"]);
}

#[test]
fn test_reference_cycle_fails() {
    let generator = Generator::new(GeneratorConfig::default());
    let err = generator.template_data(&mut database("cycle.sql")).unwrap_err();
    match err {
        CodegenError::Resolution(ResolutionError::CycleDetected { table, path }) => {
            assert_eq!(table, "players");
            assert_eq!(path, vec!["players", "teams"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}
