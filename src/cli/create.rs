use crate::{Res, config, planets, success};

use super::{conclude, instance_client};

/// Creates planet instances from the sample data file.
pub async fn create() -> Res<()> {
    let sample_path = config::sample_data_path()?;
    let client = instance_client()?;

    let report = planets::create_planets(&client, &sample_path).await?;
    conclude("create", report)?;
    success!("Planets created");
    Ok(())
}
