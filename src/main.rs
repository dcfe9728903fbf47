use anyhow::{bail, Context, Result};
use schema_leveler::{
    cli::{Cli, Commands, OutputFormat, SourceArgs},
    credentials::CredentialList,
    input::{load_level_list, resolve_metadata, resolve_snapshot},
    logging,
    parser::DEFAULT_DELIMITER,
    product::MetadataQuery,
    schema::{
        plan_loads, DependencyLeveler, LevelAssignment, LevelFormat, LoadStrategy,
        UnknownTablePolicy,
    },
    writer::{
        render_scripts, save_level_list, save_lines, write_json, write_level_list, write_lines,
        write_load_plan, PLACEHOLDERS,
    },
};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;
use std::time::Instant;

fn main() -> Result<()> {
    let cli = Cli::parse_args();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Level {
            source,
            output,
            format,
            prefixed,
        } => {
            let start = Instant::now();
            let assignment = level_tables(&source)?;
            let level_format = level_format(prefixed);

            match (format, output) {
                (OutputFormat::Pipe, Some(path)) => {
                    save_level_list(&path, &assignment, level_format)?;
                }
                (OutputFormat::Pipe, None) => {
                    write_level_list(io::stdout().lock(), &assignment, level_format)?;
                }
                (OutputFormat::Json, Some(path)) => {
                    write_json(create(&path)?, &assignment.ordered())?;
                }
                (OutputFormat::Json, None) => {
                    write_json(io::stdout().lock(), &assignment.ordered())?;
                }
            }

            tracing::info!(
                tables = assignment.len(),
                levels = assignment.max_level().unwrap_or(0),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Leveling complete"
            );
        }

        Commands::Plan {
            source,
            columns,
            constraints,
            output,
            format,
            prefixed,
        } => {
            let assignment = level_tables(&source)?;
            let metadata = resolve_metadata(
                source.sqlite.as_deref(),
                columns.as_deref(),
                constraints.as_deref(),
                source.delimiter,
            )?;
            let plan = plan_loads(&assignment, &metadata);

            match (format, output) {
                (OutputFormat::Pipe, Some(path)) => {
                    write_load_plan(create(&path)?, &plan, level_format(prefixed))
                        .with_context(|| format!("Failed to write load plan: {:?}", path))?;
                }
                (OutputFormat::Pipe, None) => {
                    write_load_plan(io::stdout().lock(), &plan, level_format(prefixed))?;
                }
                (OutputFormat::Json, Some(path)) => {
                    write_json(create(&path)?, &plan)?;
                }
                (OutputFormat::Json, None) => {
                    write_json(io::stdout().lock(), &plan)?;
                }
            }

            let truncated = plan
                .iter()
                .filter(|row| row.strategy == LoadStrategy::TruncateInsert)
                .count();
            tracing::info!(tables = plan.len(), truncated, "Load plan complete");
        }

        Commands::Batches { level_list, level } => {
            let assignment = load_level_list(&level_list, DEFAULT_DELIMITER)?;

            let batches: Vec<_> = assignment
                .batches()
                .into_iter()
                .filter(|(l, _)| level.map_or(true, |wanted| *l == wanted))
                .collect();

            if batches.is_empty() {
                if let Some(wanted) = level {
                    bail!("No tables at level {} in {:?}", wanted, level_list);
                }
            }

            for (level, tables) in batches {
                println!("Level {} ({} tables):", level, tables.len());
                for table in tables {
                    println!("  {}", table);
                }
            }
        }

        Commands::Scripts {
            level_list,
            level,
            schema,
            template,
            output,
        } => {
            let assignment = load_level_list(&level_list, DEFAULT_DELIMITER)?;
            let tables = assignment.tables_at(level);
            if tables.is_empty() {
                bail!("No tables at level {} in {:?}", level, level_list);
            }

            if !PLACEHOLDERS.iter().any(|p| template.contains(p)) {
                tracing::warn!("Template has no placeholder, every command will be identical");
            }

            let lines = render_scripts(&template, &schema, level, &tables);
            match output {
                Some(path) => save_lines(&path, &lines)?,
                None => write_lines(io::stdout().lock(), &lines)?,
            }
        }

        Commands::Queries {
            product,
            schema,
            kind,
        } => {
            let adapter = product.adapter();
            let queries = match kind {
                Some(kind) => vec![MetadataQuery::from(kind)],
                None => MetadataQuery::ALL.to_vec(),
            };

            for query in queries {
                println!("-- {} {}", product, query.name());
                println!("{};\n", query.sql(adapter, &schema));
            }
        }

        Commands::Credentials { file } => {
            let path = match file {
                Some(path) => path,
                None => CredentialList::default_path()
                    .context("Could not determine config directory")?,
            };

            let credentials = CredentialList::load(&path)?;
            println!("Available connections ({:?}):\n", path);
            for (idx, credential) in credentials.iter().enumerate() {
                println!("  {}. {}", idx + 1, credential);
                println!("     {}", credential.masked_url());
            }

            credentials.validate()?;
            println!("\nNo duplicate credentials");
        }
    }

    Ok(())
}

fn level_tables(source: &SourceArgs) -> Result<LevelAssignment> {
    let snapshot = resolve_snapshot(
        source.sqlite.as_deref(),
        source.tables.as_deref(),
        source.relations.as_deref(),
        source.delimiter,
    )?;

    let policy = if source.allow_unknown {
        UnknownTablePolicy::Ignore
    } else {
        UnknownTablePolicy::Reject
    };
    DependencyLeveler::with_policy(policy)
        .compute_levels(&snapshot.tables, &snapshot.relations())
        .context("Failed to level tables")
}

fn level_format(prefixed: bool) -> LevelFormat {
    if prefixed {
        LevelFormat::Prefixed
    } else {
        LevelFormat::Bare
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create: {:?}", path))?;
    Ok(BufWriter::new(file))
}
