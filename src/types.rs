use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Link relation under which the CMS publishes an instance's delete url.
pub const DELETE_LINK_REL: &str = "urn:eim:linkrel:delete";

/// Body of create and update requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceBody<P> {
    pub name: String,
    pub properties: P,
}

/// An instance as listed by the CMS.
///
/// Fields are read tolerantly: a null or non-string scalar never fails the
/// whole collection, and `_links` entries may take any HAL shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(rename = "type", default, deserialize_with = "lenient::string")]
    pub type_name: String,
    #[serde(default)]
    pub properties: Value,
    #[serde(rename = "_links", default)]
    pub links: Value,
}

impl Instance {
    /// The `href` of the delete link. A relation holding an array of links
    /// uses its first entry.
    pub fn delete_href(&self) -> Option<&str> {
        let link = match self.links.get(DELETE_LINK_REL)? {
            Value::Array(links) => links.first()?,
            link => link,
        };
        link.get("href")?.as_str().filter(|href| !href.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceCollection {
    #[serde(rename = "_embedded", default)]
    pub embedded: Option<EmbeddedCollection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddedCollection {
    #[serde(default)]
    pub collection: Vec<Instance>,
}

impl InstanceCollection {
    pub fn into_instances(self) -> Vec<Instance> {
        self.embedded.map(|e| e.collection).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanetProperties {
    pub diameter: i64,
    pub length_of_day: f64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub number_of_moons: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mean_temperature: Option<i64>,
}

/// A planet as found in the sample data file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlanetRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::int")]
    pub diameter: i64,
    #[serde(default, deserialize_with = "lenient::float")]
    pub length_of_day: f64,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub number_of_moons: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_int")]
    pub mean_temperature: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BatchFailure {
    pub item: String,
    pub reason: String,
}

/// Outcome of a workflow touching many instances.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn record_success(&mut self, item: impl Into<String>) {
        self.succeeded.push(item.into());
    }

    pub fn record_failure(&mut self, item: impl Into<String>, reason: impl ToString) {
        self.failed.push(BatchFailure {
            item: item.into(),
            reason: reason.to_string(),
        });
    }

    pub fn failed_items(&self) -> Vec<&str> {
        self.failed.iter().map(|f| f.item.as_str()).collect()
    }
}

// Values are read the way a loose JSON path lookup would: floats are
// truncated, numeric strings parsed, null means absent.
mod lenient {
    use serde::{Deserialize, Deserializer, de::Error};
    use serde_json::Value;

    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    fn as_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
            }
            other => as_f64(other).map(|f| f as i64),
        }
    }

    pub fn int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        Ok(opt_int(deserializer)?.unwrap_or_default())
    }

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(0.0),
            ref v => as_f64(v).ok_or_else(|| D::Error::custom(format!("expected a number, got {v}"))),
        }
    }

    // Null becomes empty, numbers and booleans keep their JSON text.
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => String::new(),
        })
    }

    pub fn opt_int<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(None),
            ref v => as_i64(v)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("expected an integer, got {v}"))),
        }
    }
}
