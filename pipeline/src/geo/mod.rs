//! GeoJSON country filter.
//!
//! Keeps the features of a `FeatureCollection` whose properties name one of
//! the requested countries. Matching is exact after lowercasing and checks
//! the usual name and ISO code properties of Natural Earth style exports.

use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::{GeoError, InputError, OutputError, PipelineResult};
use crate::logs::{log_info, log_success};

/// Properties that may hold a country name or code.
pub const NAME_PROPERTIES: [&str; 14] = [
    "NAME",
    "Name",
    "name",
    "admin",
    "sovereignt",
    "sovereignty",
    "name_en",
    "name_long",
    "postal",
    "iso_a2",
    "iso_a3",
    "adm0_a3",
    "gu_a3",
    "brk_a3",
];

fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.to_lowercase()),
        other => Some(other.to_string().to_lowercase()),
    }
}

/// Whether a feature names one of `targets` (already lowercased).
pub fn feature_matches(feature: &Value, targets: &[String]) -> bool {
    let Some(props) = feature.get("properties").and_then(Value::as_object) else {
        return false;
    };
    NAME_PROPERTIES
        .iter()
        .filter_map(|key| props.get(*key).and_then(property_text))
        .any(|text| targets.iter().any(|t| *t == text))
}

/// Filter a collection in place of its `features` member.
///
/// Other members of the collection are kept. A collection without a
/// `features` array comes back with an empty one.
pub fn filter_features(mut collection: Value, countries: &[String]) -> Result<(Value, usize), GeoError> {
    if countries.is_empty() {
        return Err(GeoError::NoCountries);
    }
    let targets: Vec<String> = countries.iter().map(|c| c.to_lowercase()).collect();

    let features: Vec<Value> = match collection.get_mut("features").map(Value::take) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(|f| feature_matches(f, &targets))
            .collect(),
        _ => Vec::new(),
    };
    let kept = features.len();

    if let Value::Object(map) = &mut collection {
        map.insert("features".to_string(), Value::Array(features));
    }
    Ok((collection, kept))
}

/// Filter a GeoJSON file and write the pretty-printed result.
pub fn filter_file(input: &Path, output: &Path, countries: &[String]) -> PipelineResult<usize> {
    log_info(format!("🗺️  Filtering {} for {} countries", input.display(), countries.len()));
    let content = fs::read_to_string(input).map_err(|source| InputError::Unreadable {
        path: input.to_path_buf(),
        source,
    })?;
    let collection: Value = serde_json::from_str(&content).map_err(GeoError::Json)?;

    let (filtered, kept) = filter_features(collection, countries)?;

    let json = serde_json::to_string_pretty(&filtered).map_err(GeoError::Json)?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(OutputError::Io)?;
    }
    fs::write(output, json).map_err(OutputError::Io)?;
    log_success(format!("Extracted {} features to {}", kept, output.display()));

    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "type": "FeatureCollection",
            "name": "countries",
            "features": [
                {"type": "Feature", "properties": {"ADMIN": "x", "admin": "Iraq", "iso_a3": "IRQ"}, "geometry": null},
                {"type": "Feature", "properties": {"name": "Yemen", "iso_a3": "YEM"}, "geometry": null},
                {"type": "Feature", "properties": {"name": "France", "iso_a3": "FRA"}, "geometry": null},
                {"type": "Feature", "geometry": null}
            ]
        })
    }

    fn names(collection: &Value) -> Vec<String> {
        collection["features"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["properties"]["iso_a3"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_filter_by_name_and_code() {
        let (filtered, kept) =
            filter_features(sample(), &["iraq".to_string(), "YEM".to_string()]).unwrap();
        assert_eq!(kept, 2);
        assert_eq!(names(&filtered), vec!["IRQ", "YEM"]);
        assert_eq!(filtered["name"], "countries");
        assert_eq!(filtered["type"], "FeatureCollection");
    }

    #[test]
    fn test_match_is_exact() {
        let (_, kept) = filter_features(sample(), &["Ira".to_string()]).unwrap();
        assert_eq!(kept, 0);
    }

    #[test]
    fn test_numeric_property_matches_its_text() {
        let collection = json!({"features": [{"properties": {"postal": 964, "iso_a3": "IRQ"}}]});
        let (_, kept) = filter_features(collection, &["964".to_string()]).unwrap();
        assert_eq!(kept, 1);
    }

    #[test]
    fn test_no_countries() {
        assert!(matches!(filter_features(sample(), &[]), Err(GeoError::NoCountries)));
    }

    #[test]
    fn test_missing_features_gives_empty_result() {
        let (filtered, kept) = filter_features(json!({"type": "FeatureCollection"}), &["Iraq".to_string()]).unwrap();
        assert_eq!(kept, 0);
        assert_eq!(filtered["features"], json!([]));
    }

    #[test]
    fn test_filter_file() {
        crate::logs::LOG_SINK.set_format(crate::logs::LogFormat::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("world.geojson");
        let output = dir.path().join("me/middle_east.geojson");
        fs::write(&input, sample().to_string()).unwrap();

        let kept = filter_file(&input, &output, &["Yemen".to_string()]).unwrap();
        assert_eq!(kept, 1);

        let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(names(&written), vec!["YEM"]);
    }

    #[test]
    fn test_filter_file_bad_json() {
        crate::logs::LOG_SINK.set_format(crate::logs::LogFormat::Quiet);
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.geojson");
        fs::write(&input, "{ not json").unwrap();

        let err = filter_file(&input, &dir.path().join("out.geojson"), &["Iraq".to_string()]).unwrap_err();
        assert!(matches!(err, PipelineError::Geo(GeoError::Json(_))));
    }
}
