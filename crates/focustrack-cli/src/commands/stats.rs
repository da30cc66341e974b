use clap::Args;
use focustrack_core::{Database, Report, SessionStore};

#[derive(Args)]
pub struct StatsArgs {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let report = Report::build(&db.list_all()?, chrono::Local::now());

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Today:        {} min in {} sessions", report.today_minutes, report.today_sessions);
    println!(
        "All time:     {} min in {} sessions ({} completed, {} stopped early)",
        report.all_time_minutes,
        report.total_sessions,
        report.completed_sessions,
        report.partial_sessions
    );
    println!("Distractions: {}", report.total_distractions);

    println!();
    println!("Last 7 days:");
    let peak = report.last_7_days.iter().map(|d| d.minutes).max().unwrap_or(0).max(1);
    for day in &report.last_7_days {
        let width = (day.minutes * 30 / peak) as usize;
        println!("  {}  {:>4} min  {}", day.date.format("%a %d"), day.minutes, "#".repeat(width));
    }

    if !report.by_category.is_empty() {
        println!();
        println!("By category:");
        for category in &report.by_category {
            println!(
                "  {:<12} {:>5} min  {:>5.1}%",
                category.name,
                category.minutes,
                report.category_share(category)
            );
        }
    }
    Ok(())
}
