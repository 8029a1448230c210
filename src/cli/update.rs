use crate::{Res, config, planets, success};

use super::{conclude, instance_client};

/// Sets the properties left out on creation for every planet instance.
pub async fn update() -> Res<()> {
    let sample_path = config::sample_data_path()?;
    let client = instance_client()?;

    let report = planets::update_planets(&client, &sample_path).await?;
    conclude("update", report)?;
    success!("Planets updated");
    Ok(())
}
