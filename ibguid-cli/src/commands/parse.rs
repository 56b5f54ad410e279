//! `ibguid parse` command

use anyhow::{bail, Result};
use ibguid_core::Guid;

/// Print the canonical form of each GUID; fails if any is malformed.
pub fn parse(values: &[String]) -> Result<()> {
    let mut invalid = 0;

    for value in values {
        match value.parse::<Guid>() {
            Ok(guid) => println!("{}", guid),
            Err(e) => {
                eprintln!("{}: {}", value, e);
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        bail!("{} of {} GUIDs are invalid", invalid, values.len());
    }
    Ok(())
}
