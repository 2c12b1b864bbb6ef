//! Command-line front end for the task backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use task_drafter::client::{SharedRepository, SharedSuggestions};
use task_drafter::{Config, DraftingSession, HttpTaskClient, Task, TaskCollection, TaskId};

#[derive(Debug, Parser)]
#[command(name = "task-drafter", version, about = "Manage tasks and draft their descriptions")]
struct Args {
    /// Base URL of the task backend (overrides TASKS_API_URL and --config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// JSON config file with `api_url` and `request_timeout_secs`
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List all tasks
    List,
    /// Show one task
    Show { id: TaskId },
    /// Add a task
    Add {
        title: String,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Toggle a task's completed flag
    Toggle { id: TaskId },
    /// Delete a task
    Delete { id: TaskId },
    /// Replace a task's description
    Describe { id: TaskId, text: String },
    /// Answer clarifying questions and generate a description
    Draft {
        id: TaskId,
        /// Save the generated description to the task
        #[arg(long)]
        save: bool,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("task_drafter=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = Config::from_env().context("Invalid environment configuration")?;
    if let Some(path) = &args.config {
        config = config
            .merge_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?;
    }
    if let Some(url) = &args.api_url {
        config = config.with_api_url(url.clone())?;
    }
    Ok(config)
}

fn render_task(task: &Task) -> String {
    let mark = if task.completed { "x" } else { " " };
    format!("[{}] {:>4}  {}", mark, task.id, task.title)
}

fn render_detail(task: &Task) {
    println!("{}", render_task(task));
    match &task.description {
        Some(text) if !text.is_empty() => println!("\n{}", text),
        Some(_) => println!("\n(empty description)"),
        None => println!("\n(no description)"),
    }
}

async fn run_list(repo: SharedRepository) -> anyhow::Result<()> {
    let tasks = TaskCollection::new(repo);
    tasks.refresh().await?;
    if tasks.is_empty() {
        println!("No tasks.");
    }
    for task in tasks.tasks() {
        println!("{}", render_task(&task));
    }
    Ok(())
}

async fn run_draft(
    id: TaskId,
    save: bool,
    repo: SharedRepository,
    suggestions: SharedSuggestions,
) -> anyhow::Result<()> {
    let session = DraftingSession::new(id, repo, suggestions);
    let task = session.load().await?;
    println!("Drafting a description for: {}", task.title);

    let questions = session.fetch_questions().await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    for (index, question) in questions.iter().enumerate() {
        println!("\n{}. {}", index + 1, question);
        // EOF leaves the remaining answers blank.
        let Some(answer) = lines.next_line().await.context("Failed to read answer")? else {
            break;
        };
        session.update_answer(index, answer.trim())?;
    }

    let description = session.generate_description().await?;
    println!("\n{}", description);

    if save {
        session.save_draft().await?;
        println!("\nSaved.");
    }
    Ok(())
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = load_config(&args)?;
    tracing::debug!("Using task backend at {}", config.api_url);

    let client = Arc::new(HttpTaskClient::new(&config)?);
    let repo: SharedRepository = client.clone();

    match args.command {
        Command::List => run_list(repo).await?,
        Command::Show { id } => {
            let task = repo.get(id).await?;
            render_detail(&task);
        }
        Command::Add { title, description } => {
            let tasks = TaskCollection::new(repo);
            match tasks.add_task(&title, description.as_deref()).await? {
                Some(task) => println!("{}", render_task(&task)),
                None => anyhow::bail!("Task title must not be blank"),
            }
        }
        Command::Toggle { id } => {
            let tasks = TaskCollection::new(repo);
            tasks.refresh().await?;
            let task = tasks.toggle_complete(id).await?;
            println!("{}", render_task(&task));
        }
        Command::Delete { id } => {
            let tasks = TaskCollection::new(repo);
            let task = tasks.delete_task(id).await?;
            println!("Deleted {}", render_task(&task));
        }
        Command::Describe { id, text } => {
            let session = DraftingSession::new(id, repo, client);
            session.load().await?;
            let task = session.save_description(&text).await?;
            render_detail(&task);
        }
        Command::Draft { id, save } => run_draft(id, save, repo, client).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    run(Args::parse()).await
}
