//! Handler for `nupak tree`.

use miette::Result;

use nupak_ops::ops_tree::{self, TreeOptions};

pub fn exec(depth: Option<usize>, why: Option<String>, invert: Option<String>) -> Result<()> {
    let project = super::current_project()?;
    let opts = TreeOptions { depth, why, invert };
    print!("{}", ops_tree::tree(&project, &opts)?);
    Ok(())
}
