use chrono::Utc;
use clap::Subcommand;
use focusguard_core::clock::local_day_bounds;
use focusguard_core::{BudgetRepository, Database};

#[derive(Subcommand)]
pub enum UsageAction {
    /// Usage recorded for the current local day
    Today {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: UsageAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        UsageAction::Today { json } => {
            let (today, _) = local_day_bounds(Utc::now());
            let records = db.usage_records_for(today)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
                return Ok(());
            }
            if records.is_empty() {
                println!("no usage recorded for {today}");
            }
            for r in &records {
                let budget = db
                    .get_budget(&r.package_name)?
                    .map(|b| format!("{} min", b.daily_budget_minutes))
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{} min\tbudget {budget}", r.package_name, r.minutes_used);
            }
        }
    }
    Ok(())
}
