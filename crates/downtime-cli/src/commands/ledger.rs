use clap::Subcommand;
use downtime_core::storage::{Config, Database};
use downtime_core::RewardLedger;

#[derive(Subcommand)]
pub enum LedgerAction {
    /// Print the current reward minute balance
    Show,
    /// Apply a signed delta to the balance (spending is negative)
    Add {
        /// Minutes to add; negative values spend
        #[arg(allow_hyphen_values = true)]
        minutes: i64,
    },
}

pub fn run(action: LedgerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let balance = db.reward_minutes(config.rewards.initial_minutes)?;

    match action {
        LedgerAction::Show => {
            println!("{}", serde_json::json!({ "reward_minutes": balance }));
        }
        LedgerAction::Add { minutes } => {
            let mut ledger = RewardLedger::new(balance);
            let next = ledger.add_minutes(minutes);
            db.set_reward_minutes(next)?;
            println!("{}", serde_json::json!({ "reward_minutes": next }));
        }
    }
    Ok(())
}
