/*!
fields.rs - metadata field selection for `show`.

  - COMMON_INFO_FIELDS / SUMMARY_FIELDS : static field sets
  - classify            : split requested names into common-info sub-fields
                          and top-level includes
  - project_common_info : lift requested sub-fields out of `common-info`
*/

use serde_json::{Map, Value};

use crate::cmd::tabular::{FieldError, ShapeError};

/// Aggregate key holding the common-info sub-fields.
pub const COMMON_INFO: &str = "common-info";

/// Sub-fields served through `common-info` rather than their own endpoint.
pub const COMMON_INFO_FIELDS: &[&str] = &["bugs-url", "homepage"];

/// Fields requested when neither --list, --all nor explicit fields are given.
pub const SUMMARY_FIELDS: &[&str] = &[
    "perm",
    "charm-metadata",
    "bundle-metadata",
    "bugs-url",
    "homepage",
    "published",
    "promulgated",
    "owner",
    "terms",
    "id-name",
    "id-revision",
];

/// Outcome of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    /// `common-info` itself was named by the user.
    pub common_info_requested: bool,
    /// Requested names belonging to the common-info group, in input order.
    pub common_fields: Vec<String>,
    /// What actually goes into the `include=` query.
    pub includes: Vec<String>,
}

pub fn classify(fields: &[String]) -> Classified {
    let mut common_fields = Vec::with_capacity(COMMON_INFO_FIELDS.len());
    let mut includes = Vec::with_capacity(fields.len() + 1);
    let mut common_info_requested = false;

    for f in fields {
        if f == COMMON_INFO {
            common_info_requested = true;
        }
        if COMMON_INFO_FIELDS.contains(&f.as_str()) {
            common_fields.push(f.clone());
        } else {
            includes.push(f.clone());
        }
    }
    if !common_fields.is_empty() && !common_info_requested {
        includes.push(COMMON_INFO.to_string());
    }

    Classified {
        common_info_requested,
        common_fields,
        includes,
    }
}

/// Copy each requested sub-field of `common-info` to a top-level key.
///
/// Missing sub-fields become `""`. A missing or null `common-info` behaves
/// like an empty object; any other non-object value is a shape error.
/// `common-info` is removed afterwards unless the user asked for it.
pub fn project_common_info(
    meta: &mut Map<String, Value>,
    classified: &Classified,
) -> Result<(), ShapeError> {
    if classified.common_fields.is_empty() {
        return Ok(());
    }

    let common = match meta.get(COMMON_INFO) {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(m)) => m.clone(),
        Some(other) => {
            return Err(ShapeError::new(vec![FieldError::new(
                COMMON_INFO,
                format!("expected object, found {}", kind_of(other)),
            )]));
        }
    };

    for f in &classified.common_fields {
        let v = common
            .get(f)
            .cloned()
            .unwrap_or_else(|| Value::String(String::new()));
        meta.insert(f.clone(), v);
    }
    if !classified.common_info_requested {
        meta.remove(COMMON_INFO);
    }
    Ok(())
}

/// Human name of a JSON value's kind, for error messages.
pub fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn object(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn classify_moves_common_fields_behind_aggregate() {
        let c = classify(&names(&["perm", "homepage", "id-name", "bugs-url"]));
        assert!(!c.common_info_requested);
        assert_eq!(c.common_fields, names(&["homepage", "bugs-url"]));
        assert_eq!(c.includes, names(&["perm", "id-name", "common-info"]));
    }

    #[test]
    fn classify_without_common_fields_is_identity() {
        let input = names(&["perm", "owner"]);
        let c = classify(&input);
        assert!(c.common_fields.is_empty());
        assert_eq!(c.includes, input);
    }

    #[test]
    fn classify_never_appends_aggregate_twice() {
        let c = classify(&names(&["common-info", "homepage"]));
        assert!(c.common_info_requested);
        assert_eq!(c.includes, names(&["common-info"]));
        assert_eq!(c.common_fields, names(&["homepage"]));

        let c = classify(&names(&["common-info"]));
        assert!(c.common_info_requested);
        assert!(c.common_fields.is_empty());
        assert_eq!(c.includes, names(&["common-info"]));
    }

    #[test]
    fn classify_summary_fields() {
        let input: Vec<String> = SUMMARY_FIELDS.iter().map(|s| s.to_string()).collect();
        let c = classify(&input);
        assert_eq!(c.common_fields, names(&["bugs-url", "homepage"]));
        assert_eq!(c.includes.len(), SUMMARY_FIELDS.len() - 2 + 1);
        assert_eq!(c.includes.last().map(String::as_str), Some(COMMON_INFO));
    }

    #[test]
    fn projection_copies_and_defaults() {
        let mut meta = object(json!({
            "perm": {"Read": ["everyone"]},
            "common-info": {"homepage": "https://example.com", "other": 1}
        }));
        let c = classify(&names(&["perm", "homepage", "bugs-url"]));
        project_common_info(&mut meta, &c).unwrap();

        assert_eq!(meta["homepage"], json!("https://example.com"));
        assert_eq!(meta["bugs-url"], json!(""));
        assert!(!meta.contains_key("common-info"));
        assert!(meta.contains_key("perm"));
    }

    #[test]
    fn projection_keeps_aggregate_when_requested() {
        let mut meta = object(json!({"common-info": {"bugs-url": "https://bugs"}}));
        let c = classify(&names(&["common-info", "bugs-url"]));
        project_common_info(&mut meta, &c).unwrap();
        assert_eq!(meta["bugs-url"], json!("https://bugs"));
        assert!(meta.contains_key("common-info"));
    }

    #[test]
    fn projection_treats_missing_aggregate_as_empty() {
        let mut meta = Map::new();
        let c = classify(&names(&["homepage"]));
        project_common_info(&mut meta, &c).unwrap();
        assert_eq!(meta["homepage"], json!(""));
    }

    #[test]
    fn projection_rejects_non_object_aggregate() {
        let mut meta = object(json!({"common-info": ["nope"]}));
        let c = classify(&names(&["homepage"]));
        let err = project_common_info(&mut meta, &c).unwrap_err();
        assert_eq!(err.fields[0].field, "common-info");
        assert!(err.to_string().contains("expected object, found array"));
    }

    #[test]
    fn projection_noop_without_common_fields() {
        let mut meta = object(json!({"common-info": "whatever"}));
        let c = classify(&names(&["perm"]));
        project_common_info(&mut meta, &c).unwrap();
        assert_eq!(meta["common-info"], json!("whatever"));
    }
}
