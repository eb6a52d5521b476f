use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use taskline_core::config::{resolve_data_file, resolve_default_priority};
use taskline_core::git::GitCli;
use taskline_core::lifecycle::{
    LifecycleManager, NewTask, StartOutcome, TaskFilter, TaskPatch,
};
use taskline_core::store::JsonTaskStore;
use taskline_core::task::Task;

mod version;

#[derive(Parser)]
#[command(
    name = "taskline",
    version = version::FULL,
    about = "Personal task tracker with git branch integration"
)]
struct Cli {
    /// Task data file (defaults to config resolution, then ~/.taskline/tasks.json)
    #[arg(long, global = true)]
    file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new task
    Add {
        title: String,
        #[arg(short, long)]
        description: Option<String>,
        /// high, medium or low
        #[arg(short, long)]
        priority: Option<String>,
        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },
    /// List tasks (archived tasks only with --status archived)
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show a single task
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Update fields of a task
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        priority: Option<String>,
        #[arg(long)]
        due: Option<String>,
        /// Target status; must be one legal step from the current one
        #[arg(long)]
        status: Option<String>,
    },
    /// Delete a task
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Start a task: switch to its feature branch and mark it in progress
    Start {
        id: String,
        /// Proceed even when the worktree has uncommitted changes
        #[arg(short, long)]
        yes: bool,
    },
    /// Mark an in-progress task completed
    Complete { id: String },
    /// Archive a completed task
    Archive { id: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let cwd = std::env::current_dir().context("resolve current dir")?;
    let data_file = cli.file.clone().unwrap_or_else(|| resolve_data_file(&cwd));
    let manager = LifecycleManager::new(JsonTaskStore::new(data_file), GitCli::new(&cwd));

    match cli.command {
        Command::Add {
            title,
            description,
            priority,
            due,
        } => {
            let priority = priority.or_else(|| resolve_default_priority(&cwd));
            let task = manager.create(NewTask {
                title,
                description,
                priority,
                due_date: due,
            })?;
            println!("{}", render_task_line(&task));
        }
        Command::List {
            status,
            priority,
            json,
        } => {
            let tasks = manager.list(&TaskFilter { status, priority })?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("no tasks");
            } else {
                for task in &tasks {
                    println!("{}", render_task_line(task));
                }
            }
        }
        Command::Show { id, json } => {
            let task = manager.get(&id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                print_task(&task);
            }
        }
        Command::Update {
            id,
            title,
            description,
            priority,
            due,
            status,
        } => {
            let patch = TaskPatch {
                title,
                description,
                priority,
                due_date: due,
                status,
            };
            if patch.is_empty() {
                bail!("nothing to update: pass at least one of --title, --description, --priority, --due, --status");
            }
            let task = manager.update(&id, patch)?;
            println!("{}", render_task_line(&task));
        }
        Command::Delete { id, yes } => {
            let task = manager.get(&id)?;
            if !yes && !confirm(&format!("Delete {:?}?", task.title))? {
                println!("delete aborted");
                return Ok(());
            }
            let removed = manager.delete(&id)?;
            println!("deleted {}", removed.id);
        }
        Command::Start { id, yes } => {
            let mut outcome = manager.start(&id, yes)?;
            if outcome == StartOutcome::NeedsConfirmation {
                let proceed =
                    confirm("The repository has uncommitted changes. Create the branch anyway?")?;
                if !proceed {
                    println!("start aborted");
                    return Ok(());
                }
                outcome = manager.start(&id, true)?;
            }
            match outcome {
                StartOutcome::Started {
                    task,
                    previous_branch,
                } => {
                    match (task.branch.as_deref(), previous_branch.as_deref()) {
                        (Some(branch), Some(previous)) => {
                            println!("switched from {previous} to {branch}");
                        }
                        (Some(branch), None) => println!("switched to {branch}"),
                        (None, _) => println!("note: not a git repository, no branch created"),
                    }
                    println!("{}", render_task_line(&task));
                }
                StartOutcome::NeedsConfirmation => bail!("start requires confirmation"),
            }
        }
        Command::Complete { id } => {
            let task = manager.complete(&id)?;
            println!("{}", render_task_line(&task));
        }
        Command::Archive { id } => {
            let task = manager.archive(&id)?;
            println!("{}", render_task_line(&task));
        }
    }
    Ok(())
}

fn render_task_line(task: &Task) -> String {
    let priority = task.priority.map(|priority| priority.as_str()).unwrap_or("-");
    let due = task.due_date.as_deref().unwrap_or("-");
    format!(
        "{} | {} | {} | {} | {}",
        task.id, task.status, priority, due, task.title
    )
}

fn print_task(task: &Task) {
    println!("id:       {}", task.id);
    println!("title:    {}", task.title);
    println!("status:   {}", task.status);
    if let Some(description) = &task.description {
        println!("desc:     {description}");
    }
    if let Some(priority) = task.priority {
        println!("priority: {priority}");
    }
    if let Some(due) = &task.due_date {
        println!("due:      {due}");
    }
    if let Some(branch) = &task.branch {
        println!("branch:   {branch}");
    }
    println!("created:  {}", task.created_at);
    println!("updated:  {}", task.updated_at);
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
