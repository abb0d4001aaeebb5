// Small maintenance utility: find gross premiums that were inflated
// tenfold by the old import path and divide them back.
//
// Usage:
//   cargo run --bin fix_premiums -- <db_path> [--apply]
//
// Without --apply this only reports what would change. Thresholds come
// from the config_kv table, falling back to the compiled defaults.

use sigorta_crm::config::{ConfigManager, ImportConfigReader};
use sigorta_crm::db::open_sqlite_connection;
use sigorta_crm::maintenance::{CorrectionThresholds, PremiumCorrectionService};
use std::sync::{Arc, Mutex};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    sigorta_crm::logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let db_path = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .cloned()
        .ok_or("usage: fix_premiums <db_path> [--apply]")?;
    let apply = args.iter().any(|a| a == "--apply");

    let config = ConfigManager::new(&db_path)?;
    let thresholds = CorrectionThresholds {
        ratio: config.get_correction_ratio_threshold().await?,
        absolute: config.get_correction_absolute_threshold().await?,
    };

    let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));
    let service = PremiumCorrectionService::new(conn);

    let report = if apply {
        service.apply(thresholds)?
    } else {
        service.scan(thresholds)?
    };

    println!(
        "scanned {} records, {} suspect",
        report.scanned,
        report.suspects.len()
    );
    for s in &report.suspects {
        match s.ratio {
            Some(r) => println!(
                "  record {} ({}) gross {:.2} net {:.2} ratio {:.2} -> {:.2}",
                s.record_id,
                s.policy_no.as_deref().unwrap_or("-"),
                s.gross_premium,
                s.net_premium.unwrap_or(0.0),
                r,
                s.corrected_gross(),
            ),
            None => println!(
                "  record {} ({}) gross {:.2} (no net premium) -> {:.2}",
                s.record_id,
                s.policy_no.as_deref().unwrap_or("-"),
                s.gross_premium,
                s.corrected_gross(),
            ),
        }
    }

    if report.dry_run {
        println!("dry run, nothing changed (pass --apply to correct)");
    } else {
        println!("corrected {} records", report.corrected);
    }

    Ok(())
}
