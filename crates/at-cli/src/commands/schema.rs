use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::output::output;

/// Handle `atrack schema`.
pub fn handle(flags: &GlobalFlags) -> anyhow::Result<()> {
    let schema = at_core::payload::batch_payload_schema()
        .context("failed to generate batch payload schema")?;
    output(&schema, flags.format)
}
