//! Show version information

use anyhow::Result;

use crate::cli::Output;

pub fn execute(output: &Output) -> Result<()> {
    output.raw(&format!("{} {}", crate::PKG_NAME, crate::VERSION));
    output.table_row("Description", crate::PKG_DESCRIPTION);
    Ok(())
}
