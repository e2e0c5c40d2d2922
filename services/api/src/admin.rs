use campaign_dialer::config::AppConfig;
use campaign_dialer::contacts::{ContactService, ImportSummary};
use campaign_dialer::db;
use campaign_dialer::error::AppError;
use campaign_dialer::telemetry;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV file to import
    pub(crate) path: PathBuf,
}

pub(crate) async fn run_migrate() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let pool = db::connect(&config.database).await?;
    pool.close().await;
    println!("Schema ready at {}", config.database.url);
    Ok(())
}

pub(crate) async fn run_contact_import(args: ImportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let csv = std::fs::read(&args.path)?;
    let pool = db::connect(&config.database).await?;
    let summary = ContactService::new(pool.clone()).import_csv(&csv).await?;
    pool.close().await;

    info!(path = %args.path.display(), created = summary.created, errors = summary.errors, "contact import finished");
    print!("{}", render_summary(&summary));
    Ok(())
}

fn render_summary(summary: &ImportSummary) -> String {
    let mut output = format!("{}\n", summary.message);
    if summary.errors > 0 {
        output.push_str(&format!("{} rows failed:\n", summary.total_errors));
        for detail in &summary.error_details {
            output.push_str(&format!("  - {detail}\n"));
        }
        let hidden = summary.total_errors - summary.error_details.len();
        if hidden > 0 {
            output.push_str(&format!("  ... and {hidden} more\n"));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_errors_and_overflow() {
        let errors = (1..=12).map(|row| format!("Row {row}: Name is required")).collect();
        let rendered = render_summary(&ImportSummary::new(3, errors));
        assert!(rendered.starts_with("Import completed. Created 3 contacts.\n12 rows failed:\n"));
        assert!(rendered.contains("  - Row 10: Name is required\n"));
        assert!(!rendered.contains("Row 11"));
        assert!(rendered.ends_with("  ... and 2 more\n"));
    }

    #[test]
    fn clean_import_is_one_line() {
        let rendered = render_summary(&ImportSummary::new(2, Vec::new()));
        assert_eq!(rendered, "Import completed. Created 2 contacts.\n");
    }
}
