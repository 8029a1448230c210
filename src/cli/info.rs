use crate::{Res, planets};

use super::instance_client;

/// Prints the planet instances stored in the CMS.
pub async fn info() -> Res<()> {
    let client = instance_client()?;
    planets::planet_info(&client).await?;
    Ok(())
}
