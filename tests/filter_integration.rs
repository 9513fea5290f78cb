//! Decrypt filter integration tests
//!
//! End-to-end protect → store → filter flows with a real `Agent`,
//! including access rules added and lifted between scans.

use a3s_rowguard::{
    AccessRule, Agent, ChunkCipher, KeyAttributes, MemoryCursor, ProtectedColumns,
    RowDecryptFilter, RowProtector, RowguardConfig, RESTRICTED,
};
use indexmap::IndexMap;
use serde_json::{json, Value};

const COLUMNS: [&str; 4] = ["first", "last", "zip", "department"];

const CONFIG: &str = r#"
protected_columns = ["first", "last", "zip"]

column "first" {
  attributes = { classification = ["pii"] }
}

column "last" {
  attributes = { classification = ["pii"] }
}

column "zip" {
  attributes = { classification = ["location"] }
}
"#;

struct Table {
    agent: Agent,
    protected: ProtectedColumns,
    rows: Vec<Vec<Value>>,
}

impl Table {
    fn seeded() -> Self {
        let cfg = RowguardConfig::parse(CONFIG).unwrap();
        let agent = Agent::new();
        let protected = cfg.protected();
        let column_attributes = cfg.column_attributes();

        let records = [
            ("James", "Smith", "10001", "Engineering"),
            ("Mary", "Johnson", "60614", "HR"),
            ("Robert", "Garcia", "94103", "Marketing"),
        ];

        let mut rows = Vec::new();
        {
            let protector = RowProtector::new(&agent, &protected, &column_attributes);
            for (first, last, zip, department) in records {
                let extra = KeyAttributes::new().with("department", department);
                let stored = protector
                    .protect(
                        &COLUMNS,
                        &[Some(first), Some(last), Some(zip), Some(department)],
                        &extra,
                    )
                    .unwrap();
                rows.push(stored.into_iter().map(Value::from).collect());
            }
        }

        Self {
            agent,
            protected,
            rows,
        }
    }

    fn read(&self) -> a3s_rowguard::RowSet {
        let mut cursor = MemoryCursor::new(
            COLUMNS.iter().map(|c| c.to_string()).collect(),
            self.rows.clone(),
        )
        .unwrap();
        RowDecryptFilter::new(&self.agent, &self.protected)
            .handle(&mut cursor)
            .unwrap()
    }
}

fn column(rows: &a3s_rowguard::RowSet, name: &str) -> Vec<String> {
    let index = rows.column_index(name).unwrap();
    rows.iter()
        .map(|r| r.get(index).unwrap_or_default().to_string())
        .collect()
}

// ─── Two-row scenario ────────────────────────────────────────────

#[test]
fn test_decryptable_row_kept_denied_row_dropped() {
    let agent = Agent::new();
    let cipher = ChunkCipher::new(&agent);
    let allowed = cipher
        .encrypt("Alice", &KeyAttributes::new().with("group", "open"))
        .unwrap();
    let denied = cipher
        .encrypt("Bob", &KeyAttributes::new().with("group", "closed"))
        .unwrap();
    agent
        .restrict(AccessRule::deny("group", vec!["closed".into()]))
        .unwrap();

    let mut cursor = MemoryCursor::new(
        vec!["first".into(), "last".into(), "zip".into()],
        vec![
            vec![json!(allowed), json!("Anders"), json!("12345")],
            vec![json!(denied), json!("Brown"), json!("67890")],
        ],
    )
    .unwrap();

    let protected = ProtectedColumns::new(["first", "zip"]);
    let rows = RowDecryptFilter::new(&agent, &protected)
        .handle(&mut cursor)
        .unwrap();

    assert_eq!(rows.len(), 1);
    let row = &rows.rows()[0];
    assert_eq!(row.get(0), Some("Alice"));
    assert_eq!(row.get(1), Some("Anders"));
    assert_eq!(row.get(2), Some("12345"));
}

#[test]
fn test_rows_without_protected_values_always_excluded() {
    let agent = Agent::new();
    let mut cursor = MemoryCursor::new(
        vec!["first".into(), "zip".into()],
        vec![
            vec![json!("Plain"), json!("11111")],
            vec![json!(null), json!(null)],
        ],
    )
    .unwrap();

    let protected = ProtectedColumns::new(["first", "zip"]);
    let rows = RowDecryptFilter::new(&agent, &protected)
        .handle(&mut cursor)
        .unwrap();
    assert!(rows.is_empty());
    assert_eq!(rows.columns(), &["first", "zip"]);
}

#[test]
fn test_ciphertext_in_unprotected_column_passes_through() {
    let agent = Agent::new();
    let chunk = ChunkCipher::new(&agent)
        .encrypt("Hidden", &KeyAttributes::new())
        .unwrap();
    let open = ChunkCipher::new(&agent)
        .encrypt("Shown", &KeyAttributes::new())
        .unwrap();

    let mut cursor = MemoryCursor::new(
        vec!["first".into(), "notes".into()],
        vec![vec![json!(open), json!(chunk.clone())]],
    )
    .unwrap();
    let protected = ProtectedColumns::new(["first"]);
    let rows = RowDecryptFilter::new(&agent, &protected)
        .handle(&mut cursor)
        .unwrap();

    assert_eq!(rows.rows()[0].get(0), Some("Shown"));
    assert_eq!(rows.rows()[0].get(1), Some(chunk.as_str()));
}

// ─── Policy walkthrough ──────────────────────────────────────────

#[test]
fn test_read_all_records_without_rules() {
    let table = Table::seeded();
    let rows = table.read();

    assert_eq!(rows.len(), 3);
    assert_eq!(column(&rows, "first"), vec!["James", "Mary", "Robert"]);
    assert_eq!(column(&rows, "zip"), vec!["10001", "60614", "94103"]);
    assert_eq!(column(&rows, "department"), vec!["Engineering", "HR", "Marketing"]);
}

#[test]
fn test_stored_values_are_protected() {
    let table = Table::seeded();
    for row in &table.rows {
        for value in &row[..3] {
            assert!(a3s_rowguard::ChunkInfo::is_encrypted(value.as_str()));
        }
        assert!(!a3s_rowguard::ChunkInfo::is_encrypted(row[3].as_str()));
    }
}

#[test]
fn test_pii_rule_masks_names_keeps_rows() {
    let table = Table::seeded();
    table
        .agent
        .restrict(AccessRule::deny("classification", vec!["pii".into()]))
        .unwrap();

    let rows = table.read();
    assert_eq!(rows.len(), 3);
    for row in rows.iter() {
        assert!(row.is_restricted(0));
        assert!(row.is_restricted(1));
        assert!(!row.is_restricted(2));
    }
    assert_eq!(column(&rows, "last"), vec![RESTRICTED; 3]);
}

#[test]
fn test_policy_sequence_changes_visibility() {
    let table = Table::seeded();

    let pii = table
        .agent
        .restrict(AccessRule::deny("classification", vec!["pii".into()]))
        .unwrap();
    assert_eq!(table.read().len(), 3);

    let hr = table
        .agent
        .restrict(AccessRule::deny("department", vec!["HR".into()]))
        .unwrap();
    let rows = table.read();
    assert_eq!(column(&rows, "department"), vec!["Engineering", "Marketing"]);

    assert!(table.agent.lift(&pii).unwrap());
    let rows = table.read();
    assert_eq!(column(&rows, "first"), vec!["James", "Robert"]);

    assert!(table.agent.lift(&hr).unwrap());
    let rows = table.read();
    assert_eq!(column(&rows, "first"), vec!["James", "Mary", "Robert"]);
}

#[test]
fn test_agent_reused_across_sequential_scans() {
    let table = Table::seeded();
    let first = table.read();
    let second = table.read();
    assert_eq!(first, second);
}

#[test]
fn test_column_attributes_bound_to_keys() {
    let table = Table::seeded();
    let mut attributes: IndexMap<String, Vec<String>> = IndexMap::new();
    for value in &table.rows[1][..3] {
        let chunk = a3s_rowguard::ChunkInfo::parse(value.as_str().unwrap()).unwrap();
        let info = table.agent.key_info(chunk.key_id).unwrap();
        for (name, values) in info.attributes.iter() {
            attributes
                .entry(name.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
    }
    assert_eq!(attributes["department"], vec!["HR"; 3]);
    assert_eq!(attributes["classification"], vec!["pii", "pii", "location"]);
}
