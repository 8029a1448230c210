use crate::{Res, planets, success};

use super::{conclude, instance_client, spinner};

pub async fn delete() -> Res<()> {
    let client = instance_client()?;

    let pb = spinner("Deleting planet instances...");
    let result = planets::delete_planets(&client).await;
    pb.finish_and_clear();

    let report = result?;
    if report.total() == 0 {
        success!("Nothing to delete here.");
        return Ok(());
    }

    conclude("delete", report)?;
    success!("Planets deleted");
    Ok(())
}
