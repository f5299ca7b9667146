//! Handler for `nupak lock`.

use miette::Result;

use nupak_ops::ops_lock::{self, LockOptions};
use nupak_ops::registry::IndexSpec;

pub async fn exec(indexes: Vec<IndexSpec>, force: bool) -> Result<()> {
    let project = super::current_project()?;
    let opts = LockOptions { indexes, force };
    ops_lock::lock(&project, &opts).await?;
    Ok(())
}
