use clap::Subcommand;
use downtime_core::storage::{Config, Database};
use downtime_core::RepDetector;

pub const DETECTOR_KEY: &str = "rep_detector";

#[derive(Subcommand)]
pub enum RepsAction {
    /// Start a new rep session
    Start {
        /// Rep goal for the session (default from config)
        #[arg(long)]
        goal: Option<u32>,
    },
    /// Print the current rep session state as JSON
    Status,
    /// Reset the session count and calibration
    Reset,
}

pub fn load_detector(db: &Database, config: &Config) -> RepDetector {
    if let Ok(Some(json)) = db.kv_get(DETECTOR_KEY) {
        if let Ok(detector) = serde_json::from_str::<RepDetector>(&json) {
            return detector;
        }
    }
    RepDetector::new(config.rep_config(), config.reps.default_goal)
}

pub fn save_detector(
    db: &Database,
    detector: &RepDetector,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(detector)?;
    db.kv_set(DETECTOR_KEY, &json)?;
    Ok(())
}

pub fn run(action: RepsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();

    match action {
        RepsAction::Start { goal } => {
            let goal = goal.unwrap_or(config.reps.default_goal);
            let detector = RepDetector::new(config.rep_config(), goal);
            save_detector(&db, &detector)?;
            println!("{}", serde_json::to_string_pretty(&detector.snapshot())?);
        }
        RepsAction::Status => {
            let detector = load_detector(&db, &config);
            println!("{}", serde_json::to_string_pretty(&detector.snapshot())?);
        }
        RepsAction::Reset => {
            let mut detector = load_detector(&db, &config);
            let event = detector.reset();
            save_detector(&db, &detector)?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
    }

    Ok(())
}
