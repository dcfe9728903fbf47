use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Placeholders understood by `render_scripts`
pub const PLACEHOLDERS: [&str; 3] = ["{schema}", "{table}", "{level}"];

/// Render one command line per table of a level
///
/// `{schema}`, `{table}` and `{level}` in `template` are replaced; anything
/// else is copied as is.
pub fn render_scripts(template: &str, schema: &str, level: u32, tables: &[&str]) -> Vec<String> {
    let level = level.to_string();
    tables
        .iter()
        .map(|table| {
            template
                .replace("{schema}", schema)
                .replace("{level}", &level)
                .replace("{table}", table)
        })
        .collect()
}

/// Write lines to `out`, one per line
pub fn write_lines<W: Write>(mut out: W, lines: &[String]) -> std::io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

/// Write a script list file, replacing any existing one
pub fn save_lines(path: &Path, lines: &[String]) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create script list: {:?}", path))?;
    write_lines(BufWriter::new(file), lines)
        .with_context(|| format!("Failed to write script list: {:?}", path))?;

    tracing::info!(path = %path.display(), commands = lines.len(), "Script list written");
    Ok(())
}
