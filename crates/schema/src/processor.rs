//! Fact-to-table schema inference

use serde_json::{Map, Value};

use en_typing::DataType;

use crate::table::{Column, Columns, Table};

/// Infer the table schema of a single fact
///
/// Nested objects flatten into `parent_child` column names. Arrays are
/// stored serialized and map to `STRING`. Values without a lattice type
/// (booleans, nulls) contribute no column.
pub fn infer_table(name: impl Into<String>, fact: &Map<String, Value>) -> Table {
    let mut columns = Columns::new();
    collect_columns("", fact, &mut columns);
    Table {
        name: name.into(),
        columns,
        pk_fields: None,
        version: 0,
    }
}

fn collect_columns(prefix: &str, object: &Map<String, Value>, columns: &mut Columns) {
    for (key, value) in object {
        let column_name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}_{key}")
        };

        match value {
            Value::Object(nested) => collect_columns(&column_name, nested, columns),
            Value::Array(_) => columns.insert(column_name, Column::new(DataType::String)),
            scalar => {
                if let Ok(data_type) = DataType::from_value(scalar) {
                    columns.insert(column_name, Column::new(data_type));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fact(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test fact must be an object"),
        }
    }

    #[test]
    fn test_infer_flat_fact() {
        let table = infer_table(
            "events",
            &fact(json!({"name": "click", "count": 3, "ratio": 0.5})),
        );

        assert_eq!(table.columns.len(), 3);
        assert_eq!(table.columns.get("name").unwrap().get_type(), DataType::String);
        assert_eq!(table.columns.get("count").unwrap().get_type(), DataType::Int64);
        assert_eq!(table.columns.get("ratio").unwrap().get_type(), DataType::Float64);
    }

    #[test]
    fn test_nested_objects_flatten() {
        let table = infer_table(
            "events",
            &fact(json!({"eventn_ctx": {"event_id": "e1", "location": {"city": "NY"}}})),
        );

        assert_eq!(
            table.columns.get("eventn_ctx_event_id").unwrap().get_type(),
            DataType::String
        );
        assert_eq!(
            table
                .columns
                .get("eventn_ctx_location_city")
                .unwrap()
                .get_type(),
            DataType::String
        );
    }

    #[test]
    fn test_untyped_values_skipped() {
        let table = infer_table("events", &fact(json!({"flag": true, "missing": null})));
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_arrays_map_to_string() {
        let table = infer_table("events", &fact(json!({"tags": ["a", "b"]})));
        assert_eq!(table.columns.get("tags").unwrap().get_type(), DataType::String);
    }

    #[test]
    fn test_inferred_tables_merge_and_diff() {
        let mut current = infer_table("events", &fact(json!({"a": 1})));
        let incoming = infer_table("events", &fact(json!({"a": 2, "b": "x"})));

        let diff = current.diff(&incoming).unwrap();
        assert_eq!(diff.columns.len(), 1);
        assert!(diff.columns.contains("b"));

        // widening happens through merge: the column accumulates the float
        // occurrence and re-resolves
        current.columns.merge(&incoming.columns);
        current
            .columns
            .merge(&infer_table("events", &fact(json!({"a": 2.5}))).columns);
        assert_eq!(current.columns.get("a").unwrap().get_type(), DataType::Float64);
    }
}
