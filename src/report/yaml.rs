//! YAML rendering with readable numbers and multi-line strings.

use anyhow::{Context, Result};
use serde::Serialize;
use yaml_rust_davvid::{Yaml, YamlEmitter};

/// Serializes data to a YAML document.
pub fn to_yaml<T: Serialize>(data: &T) -> Result<String> {
    let serde_value = serde_yaml::to_value(data).context("Failed to serialize to serde value")?;
    let yaml_value = convert(&serde_value);

    let mut output = String::new();
    let mut emitter = YamlEmitter::new(&mut output);
    emitter.multiline_strings(true);
    emitter.dump(&yaml_value).context("Failed to emit YAML")?;

    Ok(output)
}

fn convert(value: &serde_yaml::Value) -> Yaml {
    match value {
        serde_yaml::Value::Null => Yaml::Null,
        serde_yaml::Value::Bool(b) => Yaml::Boolean(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Yaml::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Yaml::Real(format_real(f))
            } else {
                Yaml::String(n.to_string())
            }
        }
        serde_yaml::Value::String(s) => Yaml::String(s.clone()),
        serde_yaml::Value::Sequence(seq) => Yaml::Array(seq.iter().map(convert).collect()),
        serde_yaml::Value::Mapping(map) => {
            let mut hash = yaml_rust_davvid::yaml::Hash::new();
            for (k, v) in map {
                hash.insert(convert(k), convert(v));
            }
            Yaml::Hash(hash)
        }
        serde_yaml::Value::Tagged(tagged) => convert(&tagged.value),
    }
}

// Four decimals, trailing zeros dropped, always with a decimal point.
fn format_real(value: f64) -> String {
    let fixed = format!("{value:.4}");
    let trimmed = fixed.trim_end_matches('0');
    if trimmed.ends_with('.') {
        format!("{trimmed}0")
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn reals_are_rounded() {
        assert_eq!(format_real(33.333_333_333), "33.3333");
        assert_eq!(format_real(50.0), "50.0");
        assert_eq!(format_real(0.95), "0.95");
    }

    #[test]
    fn emits_nested_mappings() {
        let mut data = BTreeMap::new();
        data.insert("ai_percentage", 100.0 / 3.0);
        let yaml = to_yaml(&data).unwrap();
        assert!(yaml.contains("ai_percentage: 33.3333"));
    }

    #[test]
    fn multiline_strings_use_block_style() {
        let data = BTreeMap::from([("message", "first line\nsecond line")]);
        let yaml = to_yaml(&data).unwrap();
        assert!(yaml.contains("message: |"));
    }
}
