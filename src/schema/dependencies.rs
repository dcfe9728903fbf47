use super::error::LevelError;
use super::levels::LevelAssignment;
use super::types::Relation;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Level given to tables with no foreign key to another table
pub const BASE_LEVEL: u32 = 1;

/// What to do with a relation naming a table outside the table list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownTablePolicy {
    /// Fail the run with `LevelError::UnknownTableReference`
    #[default]
    Reject,
    /// Drop the relation; the child keeps its remaining dependencies
    Ignore,
}

/// Assigns load-order levels to tables from their foreign keys
///
/// Level 1 holds every table without a foreign key to a *different* table.
/// Each following level holds the tables whose parents all sit on lower
/// levels, so loading level by level never inserts a row before the rows
/// it references.
#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyLeveler {
    policy: UnknownTablePolicy,
}

impl DependencyLeveler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: UnknownTablePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnknownTablePolicy {
        self.policy
    }

    /// Level every table in `tables`
    ///
    /// Either every table gets exactly one level or an error is returned;
    /// there is no partial result.
    pub fn compute_levels<S: AsRef<str>>(
        &self,
        tables: &[S],
        relations: &[Relation],
    ) -> Result<LevelAssignment, LevelError> {
        let known = table_set(tables)?;
        let parents = self.cross_parents(&known, relations)?;

        let mut assignment = LevelAssignment::new();
        let mut pending: Vec<&str> = Vec::new();

        for table in tables {
            let table = table.as_ref();
            if parents.contains_key(table) {
                pending.push(table);
            } else {
                assignment.insert(table, BASE_LEVEL);
            }
        }

        let mut level = BASE_LEVEL;

        // Every pass must level at least one table, otherwise the rest are
        // stuck behind a cycle. This bounds the loop by the table count.
        while !pending.is_empty() {
            let (ready, blocked): (Vec<&str>, Vec<&str>) =
                pending.into_iter().partition(|table| {
                    parents
                        .get(*table)
                        .map_or(true, |deps| deps.iter().all(|p| assignment.contains(p)))
                });

            if ready.is_empty() {
                let mut tables: Vec<String> = blocked.iter().map(|t| t.to_string()).collect();
                tables.sort();
                return Err(LevelError::CyclicDependency { tables });
            }

            level += 1;
            for table in ready {
                assignment.insert(table, level);
            }
            pending = blocked;
        }

        Ok(assignment)
    }

    /// Map of child -> distinct parents, without self-references
    ///
    /// Only children with at least one parent get an entry.
    fn cross_parents<'a>(
        &self,
        known: &HashSet<&str>,
        relations: &'a [Relation],
    ) -> Result<HashMap<&'a str, BTreeSet<&'a str>>, LevelError> {
        let mut parents: HashMap<&'a str, BTreeSet<&'a str>> = HashMap::new();

        for relation in relations {
            let missing = [&relation.child, &relation.parent]
                .into_iter()
                .find(|name| !known.contains(name.as_str()));

            if let Some(missing) = missing {
                match self.policy {
                    UnknownTablePolicy::Reject => {
                        return Err(LevelError::UnknownTableReference {
                            child: relation.child.clone(),
                            parent: relation.parent.clone(),
                            missing: missing.clone(),
                        });
                    }
                    UnknownTablePolicy::Ignore => continue,
                }
            }

            if relation.is_self() {
                continue;
            }

            parents
                .entry(relation.child.as_str())
                .or_default()
                .insert(relation.parent.as_str());
        }

        Ok(parents)
    }
}

/// Level `tables` with the default (rejecting) policy
pub fn compute_levels<S: AsRef<str>>(
    tables: &[S],
    relations: &[Relation],
) -> Result<LevelAssignment, LevelError> {
    DependencyLeveler::new().compute_levels(tables, relations)
}

fn table_set<S: AsRef<str>>(tables: &[S]) -> Result<HashSet<&str>, LevelError> {
    let mut known = HashSet::with_capacity(tables.len());
    for table in tables {
        let table = table.as_ref();
        if !known.insert(table) {
            return Err(LevelError::DuplicateTable {
                table: table.to_string(),
            });
        }
    }
    Ok(known)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(child: &str, parent: &str) -> Relation {
        Relation::new(child, parent)
    }

    fn levels_of(assignment: &LevelAssignment, tables: &[&str]) -> Vec<u32> {
        tables
            .iter()
            .map(|t| assignment.get(t).unwrap())
            .collect()
    }

    #[test]
    fn test_single_table_without_relations() {
        let levels = compute_levels(&["T1"], &[]).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels.get("T1"), Some(1));
    }

    #[test]
    fn test_self_reference_does_not_elevate() {
        let levels = compute_levels(&["T1"], &[rel("T1", "T1")]).unwrap();
        assert_eq!(levels.get("T1"), Some(1));
    }

    #[test]
    fn test_chain() {
        let levels = compute_levels(&["A", "B", "C"], &[rel("B", "A"), rel("C", "B")]).unwrap();
        assert_eq!(levels_of(&levels, &["A", "B", "C"]), [1, 2, 3]);
    }

    #[test]
    fn test_siblings_share_a_level() {
        let levels = compute_levels(&["A", "B", "C"], &[rel("B", "A"), rel("C", "A")]).unwrap();
        assert_eq!(levels_of(&levels, &["A", "B", "C"]), [1, 2, 2]);
    }

    #[test]
    fn test_two_table_cycle() {
        let err = compute_levels(&["A", "B"], &[rel("A", "B"), rel("B", "A")]).unwrap_err();
        assert_eq!(
            err,
            LevelError::CyclicDependency {
                tables: vec!["A".into(), "B".into()]
            }
        );
        assert_eq!(
            err.to_string(),
            "cannot determine load order: cycle involves tables A, B"
        );
    }

    #[test]
    fn test_self_loop_inside_chain_is_ignored() {
        let levels = compute_levels(
            &["A", "B", "C"],
            &[rel("B", "A"), rel("B", "B"), rel("C", "B")],
        )
        .unwrap();
        assert_eq!(levels_of(&levels, &["A", "B", "C"]), [1, 2, 3]);
    }

    #[test]
    fn test_level_is_one_above_highest_parent() {
        // D depends on a level-1 and a level-3 table
        let relations = [rel("B", "A"), rel("C", "B"), rel("D", "C"), rel("D", "E")];
        let levels = compute_levels(&["A", "B", "C", "D", "E"], &relations).unwrap();
        assert_eq!(levels_of(&levels, &["A", "B", "C", "D", "E"]), [1, 2, 3, 4, 1]);
    }

    #[test]
    fn test_duplicate_relations_collapse() {
        let relations = [rel("B", "A"), rel("B", "A"), rel("B", "A")];
        let levels = compute_levels(&["A", "B"], &relations).unwrap();
        assert_eq!(levels_of(&levels, &["A", "B"]), [1, 2]);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let err = compute_levels(&["A", "B", "A"], &[]).unwrap_err();
        assert_eq!(err, LevelError::DuplicateTable { table: "A".into() });
    }

    #[test]
    fn test_unknown_parent_rejected_by_default() {
        let err = compute_levels(&["orders"], &[rel("orders", "customers")]).unwrap_err();
        assert_eq!(
            err,
            LevelError::UnknownTableReference {
                child: "orders".into(),
                parent: "customers".into(),
                missing: "customers".into(),
            }
        );
    }

    #[test]
    fn test_unknown_tables_ignored_when_allowed() {
        let leveler = DependencyLeveler::with_policy(UnknownTablePolicy::Ignore);
        let relations = [
            rel("orders", "customers"),
            rel("orders", "regions"),
            rel("audit_log", "orders"),
            rel("regions", "countries"),
        ];
        let levels = leveler
            .compute_levels(&["orders", "regions"], &relations)
            .unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(levels.get("regions"), Some(1));
        assert_eq!(levels.get("orders"), Some(2));
        assert!(!levels.contains("audit_log"));
    }

    #[test]
    fn test_cycle_reports_blocked_dependents() {
        let relations = [rel("A", "B"), rel("B", "A"), rel("C", "A"), rel("D", "C")];
        let err = compute_levels(&["D", "C", "B", "A", "E"], &relations).unwrap_err();
        assert_eq!(
            err,
            LevelError::CyclicDependency {
                tables: vec!["A".into(), "B".into(), "C".into(), "D".into()]
            }
        );
    }

    #[test]
    fn test_three_table_cycle_with_self_loops() {
        let relations = [
            rel("A", "A"),
            rel("A", "B"),
            rel("B", "C"),
            rel("C", "A"),
            rel("C", "C"),
        ];
        let err = compute_levels(&["A", "B", "C"], &relations).unwrap_err();
        assert!(matches!(err, LevelError::CyclicDependency { tables } if tables.len() == 3));
    }

    #[test]
    fn test_empty_input() {
        let tables: [&str; 0] = [];
        let levels = compute_levels(&tables, &[]).unwrap();
        assert!(levels.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let tables = ["orders", "customers", "order_items", "products", "categories"];
        let relations = [
            rel("orders", "customers"),
            rel("order_items", "orders"),
            rel("order_items", "products"),
            rel("products", "categories"),
            rel("categories", "categories"),
        ];
        let first = compute_levels(&tables, &relations).unwrap();
        let second = compute_levels(&tables, &relations).unwrap();
        assert_eq!(first.ordered(), second.ordered());
        assert_eq!(first.get("order_items"), Some(3));
    }
}
