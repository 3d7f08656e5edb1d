//! Model generation from a live SQLite catalog.

use keel_codegen::{CodegenError, GeneratorConfig, Generator, ResolutionError};
use keel_migrate::Connection;
use keel_sqlite::SqliteDatabase;
use pretty_assertions::assert_eq;
use serde_json::Value;

fn blog() -> SqliteDatabase {
    let mut db = SqliteDatabase::open_in_memory().unwrap();
    db.execute(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, email VARCHAR(200) NOT NULL UNIQUE);
         CREATE TABLE posts (
             id INTEGER PRIMARY KEY,
             author_id INTEGER NOT NULL REFERENCES users(id),
             title TEXT NOT NULL,
             created DATETIME
         );
         CREATE TABLE comments (
             id INTEGER PRIMARY KEY,
             post_id INTEGER NOT NULL REFERENCES posts(id),
             parent_id INTEGER REFERENCES comments(id),
             body TEXT
         );
         CREATE TABLE migrations (name TEXT PRIMARY KEY, parent TEXT, hash TEXT, applied_at TEXT);",
    )
    .unwrap();
    db
}

fn config(toml: &str) -> GeneratorConfig {
    toml.parse().unwrap()
}

#[test]
fn test_models_follow_dependency_order() {
    let generator = Generator::new(config("[models]\nexclude_tables = [\"migrations\"]\n"));
    let data = generator.template_data(&mut blog()).unwrap();

    assert_eq!(
        data.tables.keys().collect::<Vec<_>>(),
        vec!["Users", "Posts", "Comments"]
    );

    let posts = &data.tables["Posts"];
    let author = posts.columns.iter().find(|c| c.name == "author_id").unwrap();
    assert_eq!(author.params["references"], Value::from("Users"));
    assert_eq!(posts.columns.iter().find(|c| c.name == "created").unwrap().field_type, "Option<NaiveDateTime>");

    let comments = &data.tables["Comments"];
    let parent = comments.columns.iter().find(|c| c.name == "parent_id").unwrap();
    assert_eq!(parent.params["references"], Value::from("Comments"));
}

#[test]
fn test_excluding_required_table_fails() {
    let generator = Generator::new(config("[models]\nexclude_tables = [\"/^us/\"]\n"));
    let err = generator.template_data(&mut blog()).unwrap_err();
    match err {
        CodegenError::Resolution(ResolutionError::RequiredTableExcluded { table, required_by }) => {
            assert_eq!(table, "users");
            assert_eq!(required_by, "posts");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_reference_cycle_fails() {
    let mut db = blog();
    db.execute(
        "CREATE TABLE a (id INTEGER PRIMARY KEY, b_id INTEGER REFERENCES b(id));
         CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER REFERENCES a(id));",
    )
    .unwrap();

    let err = Generator::default().template_data(&mut db).unwrap_err();
    assert!(matches!(
        err,
        CodegenError::Resolution(ResolutionError::CycleDetected { .. })
    ));
}

#[test]
fn test_generate_writes_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("models.json");
    let mut config = config("[models]\ninclude_tables = [\"users\"]\n");
    config.output.path = path.clone();

    let generator = Generator::new(config);
    let written = generator
        .generate(&mut blog(), &generator.default_renderer())
        .unwrap();
    assert_eq!(written, path);

    let json: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(json["database"], "sqlite");
    assert_eq!(json["tables"].as_object().unwrap().len(), 1);
    let email = &json["tables"]["Users"]["columns"][1];
    assert_eq!(email["name"], "email");
    assert_eq!(email["params"]["unique"], true);
    assert_eq!(email["params"]["max_length"], 200);
}

#[test]
fn test_composite_key_drops_integer_id_column() {
    let mut db = SqliteDatabase::open_in_memory().unwrap();
    db.execute(
        "CREATE TABLE memberships (
             id INTEGER NOT NULL,
             group_id INTEGER NOT NULL,
             role TEXT,
             PRIMARY KEY (id, group_id)
         );",
    )
    .unwrap();

    let data = Generator::default().template_data(&mut db).unwrap();
    let memberships = &data.tables["Memberships"];
    let names: Vec<&str> = memberships.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["group_id", "role"]);
    assert_eq!(memberships.primary_keys, vec!["group_id", "id"]);
    assert!(memberships.columns.iter().all(|c| !c.params.contains_key("primary_key")));
}
