use clap::Subcommand;
use focustrack_core::{Database, SessionStore};

#[derive(Subcommand)]
pub enum SessionsAction {
    /// List recorded sessions, newest first
    List {
        /// Show at most this many sessions
        #[arg(long)]
        limit: Option<usize>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every recorded session
    Clear {
        /// Required; deleting history cannot be undone
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: SessionsAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;

    match action {
        SessionsAction::List { limit, json } => {
            let mut sessions = db.list_all()?;
            if let Some(limit) = limit {
                sessions.truncate(limit);
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
                return Ok(());
            }
            if sessions.is_empty() {
                println!("no sessions recorded yet");
            }
            for session in &sessions {
                let record = &session.record;
                let local = record.timestamp.with_timezone(&chrono::Local);
                println!(
                    "{:>4}  {}  {:>3} min  {:<12}  distractions: {}{}",
                    session.id,
                    local.format("%Y-%m-%d %H:%M"),
                    record.duration_minutes,
                    record.category,
                    record.distraction_count,
                    if record.completed { "" } else { "  (stopped early)" },
                );
            }
        }
        SessionsAction::Clear { yes } => {
            if !yes {
                return Err("refusing to delete all sessions without --yes".into());
            }
            let removed = db.delete_all()?;
            println!("deleted {removed} sessions");
        }
    }
    Ok(())
}
