//! Planet workflows: mapping the sample data onto `un_planet` instances.
//!
//! Creation deliberately leaves out `number_of_moons` and `mean_temperature`;
//! those are filled in by a later update.

use std::path::Path;

use serde_json::Value;

use crate::{
    Error, Res,
    cms::InstanceClient,
    error,
    http::read_file_as_string,
    info,
    types::{BatchReport, Instance, InstanceBody, PlanetProperties, PlanetRecord},
};

pub const PLANET_CATEGORY: &str = "object";
pub const PLANET_TYPE: &str = "un_planet";

const SEPARATOR: &str = "-----------------------------------------------------";

/// Reads and parses the sample data file.
pub async fn read_planet_data(path: &Path) -> Res<Vec<PlanetRecord>> {
    let json = read_file_as_string(path).await?;
    serde_json::from_str(&json).map_err(|e| {
        error!("Cannot parse planet data in {}: {}", path.display(), e);
        Error::Json(e)
    })
}

/// Body used on creation; optional properties are left out.
pub fn creation_body(record: &PlanetRecord) -> InstanceBody<PlanetProperties> {
    InstanceBody {
        name: record.name.clone(),
        properties: PlanetProperties {
            diameter: record.diameter,
            length_of_day: record.length_of_day,
            number_of_moons: None,
            mean_temperature: None,
        },
    }
}

/// Body used on update; every property is sent, absent values as zero.
pub fn update_body(record: &PlanetRecord) -> InstanceBody<PlanetProperties> {
    InstanceBody {
        name: record.name.clone(),
        properties: PlanetProperties {
            diameter: record.diameter,
            length_of_day: record.length_of_day,
            number_of_moons: Some(record.number_of_moons.unwrap_or_default()),
            mean_temperature: Some(record.mean_temperature.unwrap_or_default()),
        },
    }
}

/// Finds the id of the single instance called `name`.
pub fn find_instance_id<'a>(instances: &'a [Instance], name: &str) -> Res<&'a str> {
    let mut matches = instances.iter().filter(|i| i.name == name);
    match (matches.next(), matches.count()) {
        (Some(instance), 0) if !instance.id.is_empty() => Ok(instance.id.as_str()),
        (Some(_), 0) | (None, _) => Err(Error::InstanceNotFound {
            name: name.to_string(),
        }),
        (Some(_), more) => Err(Error::AmbiguousInstance {
            name: name.to_string(),
            count: more + 1,
        }),
    }
}

/// Creates one instance per planet in the sample data.
///
/// Failures of single planets are logged and collected; only an unreadable
/// sample file fails the whole workflow.
pub async fn create_planets(client: &InstanceClient, sample_path: &Path) -> Res<BatchReport> {
    let records = read_planet_data(sample_path).await?;
    let mut report = BatchReport::default();

    for record in &records {
        match client
            .create(PLANET_CATEGORY, PLANET_TYPE, &creation_body(record))
            .await
        {
            Ok(_) => report.record_success(record.name.as_str()),
            Err(e) => {
                error!("Cannot create planet {}: {}", record.name, e);
                report.record_failure(record.name.as_str(), e);
            }
        }
    }

    Ok(report)
}

/// Updates the existing planet instances with the full sample data,
/// including the properties left out on creation.
pub async fn update_planets(client: &InstanceClient, sample_path: &Path) -> Res<BatchReport> {
    let records = read_planet_data(sample_path).await?;
    let instances = client.list_by_type(PLANET_CATEGORY, PLANET_TYPE).await?;
    let mut report = BatchReport::default();

    for record in &records {
        let result = match find_instance_id(&instances, &record.name) {
            Ok(id) => {
                client
                    .update(PLANET_CATEGORY, PLANET_TYPE, &update_body(record), id)
                    .await
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(_) => report.record_success(record.name.as_str()),
            Err(e) => {
                error!("Cannot update planet {}: {}", record.name, e);
                report.record_failure(record.name.as_str(), e);
            }
        }
    }

    Ok(report)
}

pub async fn delete_planets(client: &InstanceClient) -> Res<BatchReport> {
    client.delete_all_of_type(PLANET_CATEGORY, PLANET_TYPE).await
}

/// Logs basic information about every planet instance and returns them.
pub async fn planet_info(client: &InstanceClient) -> Res<Vec<Instance>> {
    let instances = client.list_by_type(PLANET_CATEGORY, PLANET_TYPE).await?;

    for instance in &instances {
        info!("Id: {}", instance.id);
        info!("Type: {}", instance.type_name);
        info!("Name: {}", instance.name);
        info!("Diameter (km): {}", property(instance, "diameter"));
        info!("Length of day (hours): {}", property(instance, "length_of_day"));
        info!("Number of moons: {}", property(instance, "number_of_moons"));
        info!("Mean temperature (°C): {}", property(instance, "mean_temperature"));
        info!("{}", SEPARATOR);
    }

    if instances.is_empty() {
        info!("No instances of type {} found", PLANET_TYPE);
    }

    Ok(instances)
}

// Missing or null properties print as an empty string.
fn property(instance: &Instance, key: &str) -> String {
    match instance.properties.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn instance(id: &str, name: &str) -> Instance {
        serde_json::from_value(json!({"id": id, "name": name, "type": PLANET_TYPE})).unwrap()
    }

    fn mercury() -> PlanetRecord {
        serde_json::from_value(json!({
            "name": "Mercury",
            "diameter": 4879,
            "length_of_day": 4222.6,
            "number_of_moons": 0,
            "mean_temperature": 167
        }))
        .unwrap()
    }

    #[test]
    fn test_creation_body_omits_optional_properties() {
        let body = serde_json::to_value(creation_body(&mercury())).unwrap();
        assert_eq!(
            body,
            json!({"name": "Mercury", "properties": {"diameter": 4879, "length_of_day": 4222.6}})
        );
    }

    #[test]
    fn test_update_body_sends_zero_for_absent_values() {
        let mut record = mercury();
        record.number_of_moons = None;
        let body = serde_json::to_value(update_body(&record)).unwrap();
        assert_eq!(body["properties"]["number_of_moons"], json!(0));
        assert_eq!(body["properties"]["mean_temperature"], json!(167));
    }

    #[test]
    fn test_find_instance_id_is_strict() {
        let instances = vec![
            instance("1", "Mercury"),
            instance("2", "Venus"),
            instance("3", "Venus"),
            instance("", "Earth"),
        ];

        assert_eq!(find_instance_id(&instances, "Mercury").unwrap(), "1");
        assert!(matches!(
            find_instance_id(&instances, "Venus"),
            Err(Error::AmbiguousInstance { count: 2, .. })
        ));
        assert!(matches!(
            find_instance_id(&instances, "Mars"),
            Err(Error::InstanceNotFound { .. })
        ));
        assert!(matches!(
            find_instance_id(&instances, "Earth"),
            Err(Error::InstanceNotFound { .. })
        ));
    }

    #[test]
    fn test_property_rendering() {
        let instance: Instance = serde_json::from_value(json!({
            "id": "1",
            "properties": {"diameter": 4879, "length_of_day": 4222.6, "mean_temperature": null}
        }))
        .unwrap();

        assert_eq!(property(&instance, "diameter"), "4879");
        assert_eq!(property(&instance, "length_of_day"), "4222.6");
        assert_eq!(property(&instance, "mean_temperature"), "");
        assert_eq!(property(&instance, "number_of_moons"), "");
    }

    #[tokio::test]
    async fn test_read_planet_data_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[{\"name\": ").unwrap();
        assert!(matches!(
            read_planet_data(file.path()).await,
            Err(Error::Json(_))
        ));

        assert!(matches!(
            read_planet_data(Path::new("/no/such/planets.json")).await,
            Err(Error::Io { .. })
        ));
    }
}
