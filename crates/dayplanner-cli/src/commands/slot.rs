use std::error::Error;

use chrono::{NaiveDate, NaiveTime};
use clap::Subcommand;
use dayplanner_core::storage::Config;
use dayplanner_core::PlacementEngine;

use super::{date_or_today, parse_date, parse_time, Workspace};

#[derive(Subcommand)]
pub enum SlotAction {
    /// Earliest free start time for a task of the given length
    Find {
        /// Duration in minutes
        #[arg(long)]
        duration: i64,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Check a time range for conflicts and suggest an alternative
    Check {
        #[arg(long, value_parser = parse_time)]
        start: NaiveTime,
        #[arg(long, value_parser = parse_time)]
        end: NaiveTime,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

pub fn run(action: SlotAction) -> Result<(), Box<dyn Error>> {
    let ws = Workspace::open()?;
    let config = Config::load_or_default();
    let engine = PlacementEngine::new().with_work_day(config.work_day.work_day()?);

    match action {
        SlotAction::Find { duration, date } => {
            let tasks = ws.store.get_tasks(date_or_today(date));
            match engine.find_next_available_slot(&tasks, duration)? {
                Some(start) => println!("{}", start.format("%H:%M")),
                None => println!("none available"),
            }
        }
        SlotAction::Check { start, end, date } => {
            let tasks = ws.store.get_tasks(date_or_today(date));
            let placement = engine.suggest_placement(&tasks, Some(start), Some(end), None)?;
            println!("{}", serde_json::to_string_pretty(&placement)?);
        }
    }
    Ok(())
}
