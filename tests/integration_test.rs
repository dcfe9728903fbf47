//! End-to-end checks of the leveler.
//!
//! These tests:
//! 1. Generate random acyclic schemas from a fixed seed and verify the
//!    level invariants on each
//! 2. Run the delimited-file pipeline (read, level, write, read back)
//! 3. Level schemas read from real SQLite databases

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, NamedTempFile};

use schema_leveler::input::{load_level_list, resolve_snapshot};
use schema_leveler::parser::DEFAULT_DELIMITER;
use schema_leveler::product::sqlite::{read_metadata, read_snapshot};
use schema_leveler::schema::{plan_loads, LoadStrategy};
use schema_leveler::writer::save_level_list;
use schema_leveler::{
    compute_levels, DependencyLeveler, LevelAssignment, LevelError, LevelFormat, Relation,
    UnknownTablePolicy,
};

// =============================================================================
// Test Configuration
// =============================================================================

/// Random seed for reproducible schemas
const RANDOM_SEED: u64 = 42;

/// Number of random schemas per property
const SCHEMA_COUNT: usize = 25;

// =============================================================================
// Schema Generation
// =============================================================================

struct RandomSchema {
    tables: Vec<String>,
    relations: Vec<Relation>,
}

/// Build an acyclic schema: table `i` may only reference tables `j < i`.
/// Table order and relation order are shuffled afterwards.
fn random_schema(rng: &mut StdRng) -> RandomSchema {
    let count = rng.gen_range(1..40);
    let names: Vec<String> = (0..count).map(|i| format!("t{:03}", i)).collect();
    let mut relations = Vec::new();

    for i in 1..count {
        let parents = rng.gen_range(0..4);
        for _ in 0..parents {
            let j = rng.gen_range(0..i);
            relations.push(Relation::new(&names[i], &names[j]));
        }
    }

    let mut tables = names;
    tables.shuffle(rng);
    relations.shuffle(rng);

    RandomSchema { tables, relations }
}

fn schemas() -> Vec<RandomSchema> {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    (0..SCHEMA_COUNT).map(|_| random_schema(&mut rng)).collect()
}

fn cross_parents(relations: &[Relation]) -> HashMap<&str, Vec<&str>> {
    let mut parents: HashMap<&str, Vec<&str>> = HashMap::new();
    for r in relations.iter().filter(|r| !r.is_self()) {
        parents.entry(r.child.as_str()).or_default().push(r.parent.as_str());
    }
    parents
}

// =============================================================================
// Level Invariants
// =============================================================================

#[test]
fn test_every_table_gets_exactly_one_level() {
    for schema in schemas() {
        let levels = compute_levels(&schema.tables, &schema.relations).unwrap();
        assert_eq!(levels.len(), schema.tables.len());
        for table in &schema.tables {
            assert!(levels.get(table).unwrap() >= 1, "{} not leveled", table);
        }
    }
}

#[test]
fn test_children_sit_above_parents() {
    for schema in schemas() {
        let levels = compute_levels(&schema.tables, &schema.relations).unwrap();
        for r in schema.relations.iter().filter(|r| !r.is_self()) {
            assert!(
                levels.get(&r.child) > levels.get(&r.parent),
                "{} -> {} violates ordering",
                r.child,
                r.parent
            );
        }
    }
}

#[test]
fn test_levels_are_tight() {
    for schema in schemas() {
        let levels = compute_levels(&schema.tables, &schema.relations).unwrap();
        let parents = cross_parents(&schema.relations);

        for table in &schema.tables {
            let expected = match parents.get(table.as_str()) {
                Some(ps) => 1 + ps.iter().map(|p| levels.get(p).unwrap()).max().unwrap(),
                None => 1,
            };
            assert_eq!(levels.get(table), Some(expected), "{} is not tight", table);
        }
    }
}

#[test]
fn test_same_input_same_output() {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED + 1);
    for schema in schemas() {
        let first = compute_levels(&schema.tables, &schema.relations).unwrap();
        let second = compute_levels(&schema.tables, &schema.relations).unwrap();
        assert_eq!(first.ordered(), second.ordered());

        // Relation order does not matter either
        let mut shuffled = schema.relations.clone();
        shuffled.shuffle(&mut rng);
        let third = compute_levels(&schema.tables, &shuffled).unwrap();
        assert_eq!(first, third);
    }
}

#[test]
fn test_self_loops_and_duplicates_change_nothing() {
    let mut rng = StdRng::seed_from_u64(RANDOM_SEED + 2);
    for schema in schemas() {
        let baseline = compute_levels(&schema.tables, &schema.relations).unwrap();

        let mut noisy = schema.relations.clone();
        for table in &schema.tables {
            if rng.gen_bool(0.3) {
                noisy.push(Relation::new(table, table));
            }
        }
        let copies: Vec<Relation> = schema
            .relations
            .iter()
            .filter(|_| rng.gen_bool(0.5))
            .cloned()
            .collect();
        noisy.extend(copies);
        noisy.shuffle(&mut rng);

        let levels = compute_levels(&schema.tables, &noisy).unwrap();
        assert_eq!(baseline, levels);
    }
}

#[test]
fn test_reversed_edge_is_reported_as_cycle() {
    for schema in schemas() {
        let Some(edge) = schema.relations.first().cloned() else {
            continue;
        };

        let mut relations = schema.relations.clone();
        relations.push(Relation::new(&edge.parent, &edge.child));

        match compute_levels(&schema.tables, &relations) {
            Err(LevelError::CyclicDependency { tables }) => {
                assert!(tables.contains(&edge.child));
                assert!(tables.contains(&edge.parent));
                let mut sorted = tables.clone();
                sorted.sort();
                assert_eq!(tables, sorted);
            }
            other => panic!("expected a cycle error, got {:?}", other),
        }
    }
}

#[test]
fn test_long_chain_terminates() {
    let tables: Vec<String> = (0..500).map(|i| format!("chain_{}", i)).collect();
    let relations: Vec<Relation> = tables
        .windows(2)
        .map(|pair| Relation::new(&pair[1], &pair[0]))
        .collect();

    let levels = compute_levels(&tables, &relations).unwrap();
    assert_eq!(levels.get("chain_0"), Some(1));
    assert_eq!(levels.get("chain_499"), Some(500));
    assert_eq!(levels.max_level(), Some(500));
}

// =============================================================================
// Delimited File Pipeline
// =============================================================================

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_file_pipeline_round_trip() {
    let dir = tempdir().unwrap();
    let tables = write(
        dir.path(),
        "tables.csv",
        "table_name|table_comment\n\
         customers|\n\
         orders|\n\
         order_items|\n\
         products|\n\
         categories|tree of categories\n\
         settings|\n",
    );
    let relations = write(
        dir.path(),
        "relations.csv",
        "table_name|parent_table_name|column_child|column_parent|constraint_name|on_update|on_delete\n\
         orders|customers|customer_id|id|fk_orders_customer|NO ACTION|CASCADE\n\
         order_items|orders|order_id|id|fk_items_order|NO ACTION|CASCADE\n\
         order_items|products|product_id|id|fk_items_product|NO ACTION|RESTRICT\n\
         order_items|products|variant_id|variant_id|fk_items_product|NO ACTION|RESTRICT\n\
         products|categories|category_id|id|fk_products_category|NO ACTION|SET NULL\n\
         categories|categories|parent_id|id|fk_categories_parent|NO ACTION|SET NULL\n",
    );

    let snapshot = resolve_snapshot(
        None,
        Some(tables.as_path()),
        Some(relations.as_path()),
        DEFAULT_DELIMITER,
    )
    .unwrap();
    let levels = compute_levels(&snapshot.tables, &snapshot.relations()).unwrap();

    let expected = [
        ("categories", 1),
        ("customers", 1),
        ("settings", 1),
        ("orders", 2),
        ("products", 2),
        ("order_items", 3),
    ];
    let ordered: Vec<(String, u32)> = levels
        .ordered()
        .into_iter()
        .map(|row| (row.table, row.level))
        .collect();
    let expected: Vec<(String, u32)> = expected.iter().map(|(t, l)| (t.to_string(), *l)).collect();
    assert_eq!(ordered, expected);

    let output = dir.path().join("levels.csv");
    save_level_list(&output, &levels, LevelFormat::Prefixed).unwrap();
    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("table name|LEVEL\ncategories|LV 1\n"));

    let reloaded: LevelAssignment = load_level_list(&output, DEFAULT_DELIMITER).unwrap();
    assert_eq!(reloaded, levels);
}

#[test]
fn test_unknown_parent_policy() {
    let tables = ["orders".to_string()];
    let relations = [Relation::new("orders", "customers")];

    let err = compute_levels(&tables, &relations).unwrap_err();
    assert!(matches!(err, LevelError::UnknownTableReference { .. }));

    let levels = DependencyLeveler::with_policy(UnknownTablePolicy::Ignore)
        .compute_levels(&tables, &relations)
        .unwrap();
    assert_eq!(levels.get("orders"), Some(1));
}

// =============================================================================
// SQLite Databases
// =============================================================================

fn database(sql: &str) -> NamedTempFile {
    let file = NamedTempFile::new().unwrap();
    let conn = Connection::open(file.path()).unwrap();
    conn.execute_batch(sql).unwrap();
    file
}

#[test]
fn test_level_sqlite_shop() {
    let db = database(
        "CREATE TABLE customers (id INTEGER PRIMARY KEY);
         CREATE TABLE employees (
             id INTEGER PRIMARY KEY,
             manager_id INTEGER REFERENCES employees(id)
         );
         CREATE TABLE products (id INTEGER, variant INTEGER, PRIMARY KEY (id, variant));
         CREATE TABLE orders (
             id INTEGER PRIMARY KEY,
             customer_id INTEGER REFERENCES customers(id),
             handled_by INTEGER REFERENCES employees(id)
         );
         CREATE TABLE order_items (
             order_id INTEGER REFERENCES orders(id),
             product_id INTEGER,
             variant INTEGER,
             FOREIGN KEY (product_id, variant) REFERENCES products(id, variant)
         );",
    );

    let snapshot = read_snapshot(db.path()).unwrap();
    assert_eq!(snapshot.tables.len(), 5);

    let levels = compute_levels(&snapshot.tables, &snapshot.relations()).unwrap();
    assert_eq!(levels.get("customers"), Some(1));
    assert_eq!(levels.get("employees"), Some(1));
    assert_eq!(levels.get("products"), Some(1));
    assert_eq!(levels.get("orders"), Some(2));
    assert_eq!(levels.get("order_items"), Some(3));
}

#[test]
fn test_level_sqlite_cycle() {
    let db = database(
        "CREATE TABLE departments (
             id INTEGER PRIMARY KEY,
             head_id INTEGER REFERENCES staff(id)
         );
         CREATE TABLE staff (
             id INTEGER PRIMARY KEY,
             department_id INTEGER REFERENCES departments(id)
         );
         CREATE TABLE badges (
             id INTEGER PRIMARY KEY,
             staff_id INTEGER REFERENCES staff(id)
         );
         CREATE TABLE sites (id INTEGER PRIMARY KEY);",
    );

    let snapshot = resolve_snapshot(Some(db.path()), None, None, DEFAULT_DELIMITER).unwrap();
    let err = compute_levels(&snapshot.tables, &snapshot.relations()).unwrap_err();
    assert_eq!(
        err,
        LevelError::CyclicDependency {
            tables: vec!["badges".into(), "departments".into(), "staff".into()]
        }
    );
}

#[test]
fn test_sqlite_load_plan() {
    let db = database(
        "CREATE TABLE Regions (code TEXT PRIMARY KEY);
         CREATE TABLE customers (
             id INTEGER PRIMARY KEY,
             region TEXT REFERENCES REGIONS(code)
         );
         CREATE TABLE orders (
             id INTEGER PRIMARY KEY,
             customer_id INTEGER REFERENCES Customers(id),
             ordered_at DATETIME
         );
         CREATE TABLE import_log (line TEXT, loaded_at TIMESTAMP);",
    );

    let snapshot = read_snapshot(db.path()).unwrap();
    let levels = compute_levels(&snapshot.tables, &snapshot.relations()).unwrap();
    let metadata = read_metadata(db.path()).unwrap();

    let plan: Vec<(String, u32, LoadStrategy)> = plan_loads(&levels, &metadata)
        .into_iter()
        .map(|row| (row.table, row.level, row.strategy))
        .collect();
    let expected = [
        ("Regions", 1, LoadStrategy::UpsertAll),
        ("import_log", 1, LoadStrategy::TruncateInsert),
        ("customers", 2, LoadStrategy::UpsertByForeignKey),
        ("orders", 3, LoadStrategy::UpsertByDate),
    ];
    let expected: Vec<(String, u32, LoadStrategy)> = expected
        .iter()
        .map(|(t, l, s)| (t.to_string(), *l, *s))
        .collect();
    assert_eq!(plan, expected);
}
