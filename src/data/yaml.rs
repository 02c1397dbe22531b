//! YAML processing utilities.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use yaml_rust_davvid::{Yaml, YamlEmitter};

/// Serializes a value to YAML for display, writing multi-line strings as blocks.
///
/// Block scalars normalise trailing newlines, so output meant to be read back
/// exactly should use `serde_yaml` directly.
pub fn to_yaml<T: Serialize>(data: &T) -> Result<String> {
    let value = serde_yaml::to_value(data).context("Failed to serialize to serde value")?;

    let mut output = String::new();
    let mut emitter = YamlEmitter::new(&mut output);
    emitter.multiline_strings(true);
    emitter
        .dump(&to_emitter_value(&value))
        .context("Failed to emit YAML")?;

    Ok(output)
}

/// Deserializes a YAML string.
pub fn from_yaml<T: for<'de> Deserialize<'de>>(yaml: &str) -> Result<T> {
    serde_yaml::from_str(yaml).context("Failed to deserialize YAML")
}

fn to_emitter_value(value: &serde_yaml::Value) -> Yaml {
    match value {
        serde_yaml::Value::Null => Yaml::Null,
        serde_yaml::Value::Bool(b) => Yaml::Boolean(*b),
        serde_yaml::Value::Number(n) => n.as_i64().map_or_else(
            || {
                n.as_f64()
                    .map_or_else(|| Yaml::String(n.to_string()), |f| Yaml::Real(f.to_string()))
            },
            Yaml::Integer,
        ),
        serde_yaml::Value::String(s) => Yaml::String(s.clone()),
        serde_yaml::Value::Sequence(items) => Yaml::Array(items.iter().map(to_emitter_value).collect()),
        serde_yaml::Value::Mapping(map) => Yaml::Hash(
            map.iter()
                .map(|(k, v)| (to_emitter_value(k), to_emitter_value(v)))
                .collect(),
        ),
        serde_yaml::Value::Tagged(tagged) => to_emitter_value(&tagged.value),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn multiline_strings_become_blocks() {
        let mut data = BTreeMap::new();
        data.insert("message", "Subject\n\nBody\n");

        let yaml = to_yaml(&data).unwrap();

        assert!(yaml.contains("message: |"), "{yaml}");
    }

    #[test]
    fn from_yaml_reads_mappings() {
        let data: BTreeMap<String, u32> = from_yaml("a: 1\nb: 2\n").unwrap();
        assert_eq!(data["b"], 2);
    }
}
