// ==========================================
// Sigorta CRM - CLI entry point
// ==========================================
// Subcommands:
//   import <file> [--overwrite] [--comma] [--db <path>]
//   check <file> [--comma] [--db <path>]
//   sync-profiles [--db <path>]
// ==========================================

use sigorta_crm::config::{ConfigManager, ImportConfigReader};
use sigorta_crm::domain::{
    CancelFlag, CsvFormat, DateRepairMode, ImportFormat, PolicyRecord,
};
use sigorta_crm::importer::{ColumnLayout, RowDecoder, UniversalFileParser};
use sigorta_crm::repository::{CustomerProfileRepository, CustomerProfileRepositoryImpl};
use sigorta_crm::ImportApi;
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    sigorta_crm::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", sigorta_crm::APP_NAME, sigorta_crm::VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(|s| s.as_str()) else {
        print_usage();
        return Ok(());
    };

    let db_path = flag_value(&args, "--db").unwrap_or_else(default_db_path);
    prepare_database(&db_path)?;
    tracing::info!(db = %db_path, "using database");

    match command {
        "import" => {
            let file = positional(&args, 1).ok_or("import: missing file path")?;
            let overwrite = args.iter().any(|a| a == "--overwrite");
            let format = detect_format(&args, &file);

            let api = ImportApi::new(db_path);
            let result = api
                .import_file(&file, format, overwrite, CancelFlag::new())
                .await?;

            println!("batch:      {}", result.batch_id);
            println!("total rows: {}", result.total_rows);
            println!("created:    {}", result.created);
            println!("updated:    {}", result.updated);
            println!("duplicates: {}", result.duplicates);
            println!("errors:     {}", result.errors);
            println!("elapsed:    {} ms", result.elapsed_ms);
        }
        "check" => {
            let file = positional(&args, 1).ok_or("check: missing file path")?;
            let format = detect_format(&args, &file);
            // decode with the same configured repair mode the import uses,
            // so check and import always see the same rows
            let config = ConfigManager::new(&db_path)?;
            let repair_mode = config.get_date_repair_mode().await?;
            let records = parse_records(&file, format, repair_mode)?;

            let api = ImportApi::new(db_path);
            let check = api.check_duplicates(&records).await?;

            println!("rows parsed:            {}", records.len());
            println!("existing conflicts:     {}", check.duplicates.len());
            println!("intra-batch duplicates: {}", check.intra_batch_duplicates.len());
            for dup in &check.duplicates {
                println!(
                    "  row {}: national id {} already stored as {} ({})",
                    dup.incoming.row_number,
                    dup.national_id,
                    dup.existing.customer_name.as_deref().unwrap_or("?"),
                    dup.existing.account_code.as_deref().unwrap_or("-"),
                );
            }
        }
        "sync-profiles" => {
            let repo = CustomerProfileRepositoryImpl::new(&db_path)?;
            let count = repo.rebuild_profiles().await?;
            println!("customer profiles rebuilt: {}", count);
        }
        _ => {
            print_usage();
        }
    }

    Ok(())
}

fn print_usage() {
    println!("usage: sigorta-crm <command> [options]");
    println!();
    println!("commands:");
    println!("  import <file> [--overwrite] [--comma] [--db <path>]");
    println!("      import a legacy policy export (.csv/.txt/.xlsx)");
    println!("  check <file> [--comma] [--db <path>]");
    println!("      report duplicates against the customer store without writing");
    println!("  sync-profiles [--db <path>]");
    println!("      rebuild customer profiles from the policy store");
}

/// Positional argument at `idx`, skipping flag arguments and their values.
fn positional(args: &[String], idx: usize) -> Option<String> {
    let mut n = 0;
    let mut i = 0;
    while i < args.len() {
        if args[i].starts_with("--") {
            if args[i] == "--db" {
                i += 1; // skip the value too
            }
        } else {
            if n == idx {
                return Some(args[i].clone());
            }
            n += 1;
        }
        i += 1;
    }
    None
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn detect_format(args: &[String], file: &str) -> ImportFormat {
    if Path::new(file)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"))
    {
        ImportFormat::Excel
    } else if args.iter().any(|a| a == "--comma") {
        ImportFormat::Csv(CsvFormat::CommaQuoted)
    } else {
        ImportFormat::Csv(CsvFormat::SemicolonLegacy)
    }
}

fn default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    base.join("sigorta-crm")
        .join("sigorta_crm.db")
        .to_string_lossy()
        .to_string()
}

/// Open (creating parent directories if needed) and migrate the database.
fn prepare_database(db_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = sigorta_crm::db::open_sqlite_connection(db_path)?;
    sigorta_crm::db::ensure_schema(&conn)?;
    Ok(())
}

/// Parse and decode a file into records the way the importer does,
/// for the read-only `check` command.
fn parse_records(
    file: &str,
    format: ImportFormat,
    repair_mode: DateRepairMode,
) -> Result<Vec<PolicyRecord>, Box<dyn std::error::Error>> {
    let parsed = UniversalFileParser.parse(Path::new(file), format)?;
    let decoder = RowDecoder::new(ColumnLayout::by_name(&parsed.headers), repair_mode);

    let mut records = Vec::new();
    for row in &parsed.rows {
        match decoder.decode(row) {
            Ok(decoded) => records.push(decoded.record),
            Err(e) => tracing::warn!(row = row.row_number, error = %e, "row skipped"),
        }
    }
    Ok(records)
}
