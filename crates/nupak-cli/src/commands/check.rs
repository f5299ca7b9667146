//! Handler for `nupak check`.

use miette::Result;

use nupak_ops::ops_check;

pub fn exec() -> Result<()> {
    let project = super::current_project()?;
    ops_check::check(&project)?;
    Ok(())
}
