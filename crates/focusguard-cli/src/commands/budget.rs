use clap::Subcommand;
use focusguard_core::{BudgetRepository, Database, MonitoredAppBudget};

#[derive(Subcommand)]
pub enum BudgetAction {
    /// Create or update a daily budget
    Set {
        /// Package name (e.g. "com.example.feed")
        package: String,
        /// Allowed foreground minutes per day
        minutes: i64,
        /// Store the budget without enforcing it
        #[arg(long)]
        disabled: bool,
    },
    /// List all budgets
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a budget
    Remove {
        /// Package name
        package: String,
    },
}

pub fn run(action: BudgetAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        BudgetAction::Set {
            package,
            minutes,
            disabled,
        } => {
            let mut budget = MonitoredAppBudget::new(package, minutes);
            budget.enabled = !disabled;
            db.set_budget(&budget)?;
            println!("budget set: {} {} min", budget.package_name, budget.daily_budget_minutes);
        }
        BudgetAction::List { json } => {
            let budgets = db.get_monitored_budgets()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&budgets)?);
            } else if budgets.is_empty() {
                println!("no budgets");
            } else {
                for b in &budgets {
                    let state = if b.enabled { "enabled" } else { "disabled" };
                    println!("{}\t{} min\t{state}", b.package_name, b.daily_budget_minutes);
                }
            }
        }
        BudgetAction::Remove { package } => {
            if !db.remove_budget(&package)? {
                return Err(format!("no budget for {package}").into());
            }
            println!("budget removed: {package}");
        }
    }
    Ok(())
}
