//! `swolegen schema` and `swolegen validate`.

use std::path::Path;

use anyhow::{Context, Result, anyhow};

use swolegen_core::schema::{SchemaKind, SchemaValidator};

use crate::pipeline_cmds::read_source;

fn parse_kind(kind: &str) -> Result<SchemaKind> {
    kind.parse::<SchemaKind>().map_err(|e| anyhow!(e))
}

/// Print a schema document, or its fingerprint.
pub fn run_schema(kind: &str, fingerprint: bool) -> Result<()> {
    let kind = parse_kind(kind)?;
    if fingerprint {
        println!("{}  {}", kind.fingerprint(), kind.format_name());
    } else {
        println!("{}", kind.document().trim_end());
    }
    Ok(())
}

/// Check a file against a schema without calling any provider.
pub fn run_validate(kind: &str, file: &Path) -> Result<()> {
    let kind = parse_kind(kind)?;
    let raw = read_source(file)?;
    let validator = SchemaValidator::new().context("failed to compile schemas")?;
    validator
        .validate(kind, &raw)
        .with_context(|| format!("{} is not a valid {kind}", file.display()))?;
    println!("{}: valid {kind} (schema {})", file.display(), &kind.fingerprint()[..12]);
    Ok(())
}
