use clap::Subcommand;
use downtime_core::storage::Database;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Aggregate session counts and minutes earned
    Show,
    /// Most recent sessions from the activity log
    Recent {
        /// Maximum number of sessions to print
        #[arg(long, default_value = "10")]
        limit: u64,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        StatsAction::Show => {
            let stats = db.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Recent { limit } => {
            let sessions = db.recent_sessions(limit)?;
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
    }
    Ok(())
}
