//! Task management commands for CLI.

use std::error::Error;

use chrono::{Duration, NaiveDate, NaiveTime};
use clap::Subcommand;
use dayplanner_core::storage::{sorted_by_start, Config};
use dayplanner_core::{MonthCounts, MonthlyStats, Placement, PlacementEngine, Task, TaskId, TaskView};
use serde::Serialize;

use super::{date_or_today, parse_date, parse_time, Workspace};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Start time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        start: Option<NaiveTime>,
        /// End time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        end: Option<NaiveTime>,
        /// Duration in minutes, used when start or end is missing
        #[arg(long)]
        duration: Option<i64>,
        /// Place the task in the next free slot of --duration minutes
        #[arg(long, requires = "duration", conflicts_with_all = ["start", "end"])]
        auto: bool,
        /// Date (YYYY-MM-DD, default: today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Add even if the time range overlaps another task
        #[arg(long)]
        force: bool,
    },
    /// List tasks for a day, in start order
    List {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Edit a task
    Edit {
        /// Task ID or unique prefix
        id: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New start time (HH:MM)
        #[arg(long, value_parser = parse_time, conflicts_with = "clear_start")]
        start: Option<NaiveTime>,
        /// New end time (HH:MM)
        #[arg(long, value_parser = parse_time, conflicts_with = "clear_end")]
        end: Option<NaiveTime>,
        /// Remove the start time
        #[arg(long)]
        clear_start: bool,
        /// Remove the end time
        #[arg(long)]
        clear_end: bool,
        /// New duration in minutes (untimed tasks only)
        #[arg(long)]
        duration: Option<i64>,
        /// Apply even if the new range overlaps another task
        #[arg(long)]
        force: bool,
    },
    /// First pending task of the day, in start order
    Current {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Mark one or more tasks (or every task) done
    Done {
        /// Task IDs or unique prefixes
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        ids: Vec<String>,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Mark the task pending again
        #[arg(long, conflicts_with = "all")]
        undo: bool,
        /// Complete every pending task on the day
        #[arg(long)]
        all: bool,
    },
    /// Remove a task
    Remove {
        /// Task ID or unique prefix
        id: String,
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
    /// Completion progress for a day and its month
    Progress {
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

#[derive(Serialize)]
struct ProgressReport {
    date: NaiveDate,
    done: usize,
    total: usize,
    percent: f64,
    pending: Vec<String>,
    month: String,
    month_completed: u32,
    month_total: u32,
    month_percent: f64,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn Error>> {
    let ws = Workspace::open()?;

    match action {
        TaskAction::Add {
            title,
            start,
            end,
            duration,
            auto,
            date,
            force,
        } => {
            let date = date_or_today(date);
            let engine = placement_engine()?;
            let tasks = ws.store.get_tasks(date);

            let (start, end) = match (auto, duration) {
                (true, Some(minutes)) => match engine.find_next_available_slot(&tasks, minutes)? {
                    Some(slot) => (Some(slot), Some(slot + Duration::minutes(minutes))),
                    None => return Err(format!("no free {minutes} minute slot on {date}").into()),
                },
                _ => (start, end),
            };

            let mut task = Task::new(&title, start, end)?;
            if let Some(minutes) = duration {
                task.set_duration_minutes(minutes);
            }
            // A searched slot may touch its neighbours, which the overlap rule counts.
            if !force && !auto {
                check_placement(&engine, &tasks, start, end, None)?;
            }

            let view = task.view();
            ws.store.add_task(date, task);
            ws.save()?;
            println!("Task created: {}", view.id);
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        TaskAction::List { date } => {
            let date = date_or_today(date);
            let views: Vec<TaskView> = sorted_by_start(ws.store.get_tasks(date))
                .iter()
                .map(Task::view)
                .collect();
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
        TaskAction::Edit {
            id,
            date,
            title,
            start,
            end,
            clear_start,
            clear_end,
            duration,
            force,
        } => {
            let date = date_or_today(date);
            let id = ws.resolve(date, &id)?;
            let current = ws
                .store
                .get_task(date, id)
                .ok_or_else(|| format!("task not found: {id}"))?;

            let touches_times = start.is_some() || end.is_some() || clear_start || clear_end;
            let new_start = if clear_start { None } else { start.or(current.start()) };
            let new_end = if clear_end { None } else { end.or(current.end()) };
            let valid_range = matches!((new_start, new_end), (Some(s), Some(e)) if e > s);
            // An inverted range is left for `set_times` to reject.
            if touches_times && valid_range && !force {
                let engine = placement_engine()?;
                check_placement(&engine, &ws.store.get_tasks(date), new_start, new_end, Some(id))?;
            }

            let updated = ws.store.update_task(date, id, |task| {
                if let Some(title) = &title {
                    task.set_title(title)?;
                }
                if touches_times {
                    task.set_times(new_start, new_end)?;
                }
                if let Some(minutes) = duration {
                    task.set_duration_minutes(minutes);
                }
                Ok(())
            })?;
            ws.save()?;
            println!("{}", serde_json::to_string_pretty(&updated.view())?);
        }
        TaskAction::Current { date } => {
            let date = date_or_today(date);
            match sorted_by_start(ws.store.get_tasks(date))
                .into_iter()
                .find(|t| !t.is_done())
            {
                Some(task) => println!("Current task: {task}"),
                None => println!("No pending tasks. All done!"),
            }
        }
        TaskAction::Done {
            ids,
            date,
            undo,
            all,
        } => {
            let date = date_or_today(date);
            if all {
                let changed = ws.store.mark_all_done(date);
                ws.save()?;
                println!("{changed} task(s) marked done");
            } else {
                // Resolve everything first so a bad id changes nothing.
                let ids = ids
                    .iter()
                    .map(|id| ws.resolve(date, id))
                    .collect::<Result<Vec<_>, _>>()?;
                for &id in &ids {
                    ws.store.set_done(date, id, !undo)?;
                }
                ws.save()?;
                for &id in &ids {
                    print_task(&ws, date, id)?;
                }
            }
        }
        TaskAction::Remove { id, date } => {
            let date = date_or_today(date);
            let id = ws.resolve(date, &id)?;
            match ws.store.remove_task(date, id) {
                Some(task) => {
                    ws.save()?;
                    println!("Task removed: {}", task.title());
                }
                None => return Err(format!("task not found: {id}").into()),
            }
        }
        TaskAction::Progress { date } => {
            let date = date_or_today(date);
            let day = ws.store.progress(date);
            let month: MonthCounts = ws.stats.get(date);
            let report = ProgressReport {
                date,
                done: day.done,
                total: day.total,
                percent: day.percent,
                pending: day.pending,
                month: MonthlyStats::month_key(date),
                month_completed: month.completed,
                month_total: month.total,
                month_percent: month.percent(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

fn placement_engine() -> Result<PlacementEngine, Box<dyn Error>> {
    let config = Config::load_or_default();
    Ok(PlacementEngine::new().with_work_day(config.work_day.work_day()?))
}

fn check_placement(
    engine: &PlacementEngine,
    tasks: &[Task],
    start: Option<NaiveTime>,
    end: Option<NaiveTime>,
    exclude: Option<TaskId>,
) -> Result<(), Box<dyn Error>> {
    match engine.suggest_placement(tasks, start, end, exclude)? {
        Placement::Free => Ok(()),
        Placement::Conflict {
            suggestion: Some((s, e)),
        } => Err(format!(
            "time range overlaps another task; next free slot is {}-{} (use --force to add anyway)",
            s.format("%H:%M"),
            e.format("%H:%M")
        )
        .into()),
        Placement::Conflict { suggestion: None } => {
            Err("time range overlaps another task and no free slot is left today".into())
        }
    }
}

fn print_task(ws: &Workspace, date: NaiveDate, id: TaskId) -> Result<(), Box<dyn Error>> {
    let task = ws
        .store
        .get_task(date, id)
        .ok_or_else(|| format!("task not found: {id}"))?;
    println!("{task}");
    Ok(())
}
