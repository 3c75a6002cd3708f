use crate::error::{PipelineError, Result};
use crate::structs::{
    AreaRow, ConceptRow, DatapointRow, DatapointsBlock, DiscreteConceptRow, SourceRow, SourceTable,
};
use crate::text::to_concept_id;
use log::debug;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Splits a composite `"CODE|Name"` area value into code and display name.
///
/// Extra separators are tolerated (only the first two segments are used);
/// a missing separator is malformed input and fails the run.
fn split_area<'a>(composite: &'a str, path: &Path) -> Result<(&'a str, &'a str)> {
    let mut parts = composite.split('|');
    match (parts.next(), parts.next()) {
        (Some(code), Some(name)) => Ok((code, name)),
        _ => Err(PipelineError::Data(format!(
            "{}: malformed area value {composite:?}, expected \"code|name\"",
            path.display()
        ))),
    }
}

/// Unions the distinct (variable name, variable id) pairs of every table
/// into the continuous concept list.
///
/// Deduplication is on the raw pair, so two different names that normalize
/// to the same identifier both survive, with a colliding `concept` value.
/// Rows are sorted by (concept, variable_id, name) so output is
/// reproducible regardless of source ordering.
pub fn extract_concepts_continuous(tables: &[SourceTable]) -> Vec<ConceptRow> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut concepts = Vec::new();
    for table in tables {
        for row in &table.rows {
            if seen.insert((row.variable_name.as_str(), row.variable_id.as_str())) {
                concepts.push(ConceptRow {
                    concept: to_concept_id(&row.variable_name),
                    concept_type: "measure".to_string(),
                    name: row.variable_name.clone(),
                    variable_id: row.variable_id.clone(),
                });
            }
        }
    }
    debug!("{} distinct continuous concepts", concepts.len());

    // Sort by concept, then variable id, then name
    concepts.sort_by(|a, b| {
        a.concept
            .cmp(&b.concept)
            .then_with(|| a.variable_id.cmp(&b.variable_id))
            .then_with(|| a.name.cmp(&b.name))
    });
    concepts
}

/// The five fixed metadata concepts the source files don't carry.
pub fn extract_concepts_discrete() -> Vec<DiscreteConceptRow> {
    vec![
        DiscreteConceptRow { concept: "name", name: "Name", concept_type: "string" },
        DiscreteConceptRow { concept: "year", name: "Year", concept_type: "time" },
        DiscreteConceptRow { concept: "area", name: "Area", concept_type: "entity_domain" },
        DiscreteConceptRow { concept: "area_id", name: "Area Id", concept_type: "string" },
        DiscreteConceptRow { concept: "variable_id", name: "Variable Id", concept_type: "string" },
    ]
}

/// Unions the distinct areas of every table into the entity list.
///
/// Deduplication happens on the raw (composite, area id) pair before the
/// composite is split; entries whose codes normalize to the same
/// identifier all survive as separate rows. Rows are sorted by
/// (area, area_id) for reproducibility.
///
/// # Errors
/// Returns a data error naming the file when a composite has no `|`
/// separator.
pub fn extract_entities_area(tables: &[SourceTable]) -> Result<Vec<AreaRow>> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut areas = Vec::new();
    for table in tables {
        for row in &table.rows {
            if seen.insert((row.area.as_str(), row.area_id.as_str())) {
                let (code, name) = split_area(&row.area, &table.path)?;
                areas.push(AreaRow {
                    area: to_concept_id(code),
                    name: name.to_string(),
                    area_id: row.area_id.clone(),
                });
            }
        }
    }
    debug!("{} distinct areas", areas.len());

    areas.sort_by(|a, b| a.area.cmp(&b.area).then_with(|| a.area_id.cmp(&b.area_id)));
    Ok(areas)
}

/// Lazily yields one (concept, rows) block per distinct variable name per
/// table: variables in sorted order within a table, tables in load order,
/// rows in source order.
///
/// A variable appearing in several files is yielded once per file; the
/// writer accumulates blocks that share a concept into one table. The
/// sequence is finite and restartable: calling this again produces the
/// same blocks.
///
/// # Errors
/// A malformed composite area surfaces as an `Err` item while draining,
/// aborting the run and leaving earlier stages' files on disk.
pub fn extract_datapoints(
    tables: &[SourceTable],
) -> impl Iterator<Item = Result<DatapointsBlock>> + '_ {
    tables.iter().flat_map(|table| {
        let mut groups: BTreeMap<&str, Vec<&SourceRow>> = BTreeMap::new();
        for row in &table.rows {
            groups.entry(row.variable_name.as_str()).or_default().push(row);
        }
        groups.into_iter().map(move |(variable_name, rows)| {
            let rows = rows
                .into_iter()
                .map(|row| {
                    let (code, _) = split_area(&row.area, &table.path)?;
                    Ok(DatapointRow {
                        area: to_concept_id(code),
                        year: row.year,
                        value: row.value,
                    })
                })
                .collect::<Result<Vec<DatapointRow>>>()?;
            Ok(DatapointsBlock {
                concept: to_concept_id(variable_name),
                rows,
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn row(variable: &str, id: &str, area: &str, area_id: &str, year: i32, value: f64) -> SourceRow {
        SourceRow {
            variable_name: variable.to_string(),
            variable_id: id.to_string(),
            area: area.to_string(),
            area_id: area_id.to_string(),
            year,
            value,
        }
    }

    fn table(path: &str, rows: Vec<SourceRow>) -> SourceTable {
        SourceTable {
            path: PathBuf::from(path),
            rows,
        }
    }

    #[test]
    fn test_continuous_concepts_dedupe_and_sort() {
        let tables = vec![
            table(
                "b.csv",
                vec![
                    row("Population", "SP.POP", "US|United States", "US", 2000, 1.0),
                    row("GDP", "NY.GDP", "US|United States", "US", 2000, 2.0),
                ],
            ),
            table(
                "a.csv",
                vec![row("GDP", "NY.GDP", "FR|France", "FR", 2001, 3.0)],
            ),
        ];

        let concepts = extract_concepts_continuous(&tables);
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].concept, "gdp");
        assert_eq!(concepts[0].concept_type, "measure");
        assert_eq!(concepts[0].name, "GDP");
        assert_eq!(concepts[0].variable_id, "NY.GDP");
        assert_eq!(concepts[1].concept, "population");
    }

    #[test]
    fn test_continuous_concepts_collision_not_merged() {
        let tables = vec![table(
            "a.csv",
            vec![
                row("Total GDP", "V1", "US|United States", "US", 2000, 1.0),
                row("Total-GDP", "V2", "US|United States", "US", 2000, 2.0),
            ],
        )];

        let concepts = extract_concepts_continuous(&tables);
        assert_eq!(concepts.len(), 2);
        assert_eq!(concepts[0].concept, "total_gdp");
        assert_eq!(concepts[1].concept, "total_gdp");
        assert_ne!(concepts[0].variable_id, concepts[1].variable_id);
    }

    #[test]
    fn test_discrete_concepts_fixed_table() {
        let discrete = extract_concepts_discrete();
        assert_eq!(discrete.len(), 5);
        assert_eq!(discrete[0].concept, "name");
        assert_eq!(discrete[1].concept_type, "time");
        assert_eq!(discrete[2].concept_type, "entity_domain");
        assert_eq!(discrete[3].name, "Area Id");
        assert_eq!(discrete[4].concept, "variable_id");
    }

    #[test]
    fn test_area_entities_split_and_normalize() {
        let tables = vec![table(
            "a.csv",
            vec![
                row("GDP", "V", "US|United States", "US", 2000, 1.0),
                row("GDP", "V", "FR|France", "FR", 2000, 1.0),
                row("GDP", "V", "US|United States", "US", 2001, 2.0),
            ],
        )];

        let areas = extract_entities_area(&tables).unwrap();
        assert_eq!(
            areas,
            vec![
                AreaRow {
                    area: "fr".to_string(),
                    name: "France".to_string(),
                    area_id: "FR".to_string(),
                },
                AreaRow {
                    area: "us".to_string(),
                    name: "United States".to_string(),
                    area_id: "US".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_area_entities_extra_separator_tolerated() {
        let tables = vec![table(
            "a.csv",
            vec![row("GDP", "V", "MX|Mexico|estimate", "MX", 2000, 1.0)],
        )];

        let areas = extract_entities_area(&tables).unwrap();
        assert_eq!(areas[0].area, "mx");
        assert_eq!(areas[0].name, "Mexico");
    }

    #[test]
    fn test_area_entities_collision_rows_survive() {
        // Distinct composites whose codes normalize identically both stay,
        // leaving duplicate identifiers in the output.
        let tables = vec![table(
            "a.csv",
            vec![
                row("GDP", "V", "US |Alpha", "X1", 2000, 1.0),
                row("GDP", "V", "us|Beta", "X2", 2000, 1.0),
            ],
        )];

        let areas = extract_entities_area(&tables).unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].area, "us");
        assert_eq!(areas[1].area, "us");
    }

    #[test]
    fn test_area_entities_malformed_composite_fails() {
        let tables = vec![table(
            "bad.csv",
            vec![row("GDP", "V", "France", "FR", 2000, 1.0)],
        )];

        let err = extract_entities_area(&tables).unwrap_err();
        match err {
            PipelineError::Data(msg) => {
                assert!(msg.contains("bad.csv"));
                assert!(msg.contains("France"));
            }
            other => panic!("expected data error, got {other:?}"),
        }
    }

    #[test]
    fn test_datapoints_group_per_variable_sorted() {
        let tables = vec![table(
            "a.csv",
            vec![
                row("Population", "V2", "US|United States", "US", 2000, 300.0),
                row("GDP", "V1", "US|United States", "US", 2000, 100.0),
                row("Population", "V2", "FR|France", "FR", 2000, 60.0),
            ],
        )];

        let blocks = extract_datapoints(&tables)
            .collect::<Result<Vec<DatapointsBlock>>>()
            .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].concept, "gdp");
        assert_eq!(blocks[1].concept, "population");
        // Rows keep source order within a group.
        assert_eq!(blocks[1].rows[0].area, "us");
        assert_eq!(blocks[1].rows[1].area, "fr");
        assert_eq!(blocks[1].rows[1].year, 2000);
        assert_eq!(blocks[1].rows[1].value, 60.0);
    }

    #[test]
    fn test_datapoints_variable_across_tables_yields_two_blocks() {
        let tables = vec![
            table("a.csv", vec![row("GDP", "V", "US|United States", "US", 2000, 1.0)]),
            table("b.csv", vec![row("GDP", "V", "FR|France", "FR", 2000, 2.0)]),
        ];

        let blocks = extract_datapoints(&tables)
            .collect::<Result<Vec<DatapointsBlock>>>()
            .unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].concept, "gdp");
        assert_eq!(blocks[1].concept, "gdp");
        assert_eq!(blocks[0].rows[0].area, "us");
        assert_eq!(blocks[1].rows[0].area, "fr");
    }

    #[test]
    fn test_datapoints_restartable() {
        let tables = vec![table(
            "a.csv",
            vec![row("GDP", "V", "US|United States", "US", 2000, 1.0)],
        )];

        let first = extract_datapoints(&tables)
            .collect::<Result<Vec<DatapointsBlock>>>()
            .unwrap();
        let second = extract_datapoints(&tables)
            .collect::<Result<Vec<DatapointsBlock>>>()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_datapoints_malformed_composite_is_err_item() {
        let tables = vec![table(
            "bad.csv",
            vec![row("GDP", "V", "nodivider", "X", 2000, 1.0)],
        )];

        let result = extract_datapoints(&tables).collect::<Result<Vec<DatapointsBlock>>>();
        assert!(matches!(result, Err(PipelineError::Data(_))));
    }
}
