//! Onboarding CLI, a terminal front end for Onboarding Buddy
//!
//! Uses the onboarding-sdk RemoteClient to talk to a running server. `ingest`
//! runs in process against the configured backends instead.

use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use onboarding_sdk::{ChatRequest, ChatResponse, OnboardingClient, RemoteClient, Role, RosterEntry};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "onboarding", version, about = "Onboarding Buddy CLI")]
struct Cli {
    /// Server HTTP URL
    #[arg(long, default_value = "http://localhost:8000", global = true, env = "ONBOARDING_URL")]
    url: String,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question as an employee
    Ask {
        question: String,

        /// Employee id
        #[arg(long)]
        user: String,

        /// Show the policy text the answer was grounded on
        #[arg(long)]
        debug: bool,

        /// Only search this policy document
        #[arg(long)]
        policy_type: Option<String>,
    },
    /// List people holding a role (intern, full_time, manager, mentor)
    Roster { role: String },
    /// Check the server is up
    Status,
    /// Start an interactive session
    Shell {
        /// Employee id; picked interactively when omitted
        #[arg(long)]
        user: Option<String>,
    },
    /// Chunk, embed and upload policy documents using the local configuration
    Ingest {
        /// Directory of .txt policies; defaults to ingest.documents_dir
        dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let client = RemoteClient::new(&cli.url);

    let result = match cli.command {
        Commands::Ask {
            question,
            user,
            debug,
            policy_type,
        } => {
            let mut request = ChatRequest::new(user, question).with_debug(debug);
            if let Some(policy_type) = policy_type {
                request = request.with_policy_type(policy_type);
            }
            run_ask(&client, &request, cli.format).await
        }
        Commands::Roster { role } => run_roster(&client, &role, cli.format).await,
        Commands::Status => run_status(&client, cli.format).await,
        Commands::Shell { user } => run_shell(&client, user, cli.format).await,
        Commands::Ingest { dir } => run_ingest(dir, cli.format).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run_ask(
    client: &RemoteClient,
    request: &ChatRequest,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let reply = client.chat(request).await?;
    print_reply(&reply, format)
}

fn print_reply(reply: &ChatResponse, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reply)?),
        OutputFormat::Table => {
            println!("{}", reply.answer);
            if let Some(context) = &reply.context {
                let mut table = Table::new();
                table.set_content_arrangement(ContentArrangement::Dynamic);
                table.set_header(vec!["#", "Retrieved policy text"]);
                for (i, chunk) in context.iter().enumerate() {
                    table.add_row(vec![(i + 1).to_string(), chunk.clone()]);
                }
                println!();
                println!("{}", table);
            }
        }
    }
    Ok(())
}

async fn run_roster(
    client: &RemoteClient,
    role: &str,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    if Role::parse(role).is_none() {
        eprintln!(
            "note: {:?} is not one of {}",
            role,
            Role::ALL.map(|r| r.as_str()).join(", ")
        );
    }
    let people = client.list_by_role(role).await?;
    print_roster(&people, format)
}

fn print_roster(people: &[RosterEntry], format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(people)?),
        OutputFormat::Table => {
            if people.is_empty() {
                println!("(no people)");
                return Ok(());
            }
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["ID", "Name"]);
            for p in people {
                table.add_row(vec![p.id.clone(), p.name.clone()]);
            }
            println!("{}", table);
            println!("{} person(s)", people.len());
        }
    }
    Ok(())
}

async fn run_status(client: &RemoteClient, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let status = client.health().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
        OutputFormat::Table => {
            println!("Server:  {}", client.base_url());
            println!("Status:  {}", status.status);
        }
    }
    Ok(())
}

fn prompt(label: &str) -> std::io::Result<Option<String>> {
    eprint!("{}", label);
    std::io::stderr().flush()?;
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line)? == 0 {
        return Ok(None); // EOF
    }
    Ok(Some(line.trim().to_string()))
}

/// Role, then person, the way a new joiner would find themselves
async fn pick_user(client: &RemoteClient, format: OutputFormat) -> Result<Option<String>, Box<dyn std::error::Error>> {
    loop {
        let Some(role) = prompt("role (intern/full_time/manager/mentor)> ")? else {
            return Ok(None);
        };
        let people = client.list_by_role(&role).await?;
        if people.is_empty() {
            println!("Nobody found for {:?}.", role);
            continue;
        }
        print_roster(&people, format)?;
        let Some(id) = prompt("employee id> ")? else {
            return Ok(None);
        };
        if people.iter().any(|p| p.id == id) {
            return Ok(Some(id));
        }
        println!("{:?} is not in that list.", id);
    }
}

async fn run_shell(
    client: &RemoteClient,
    user: Option<String>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Onboarding Buddy Interactive Shell");
    println!("Ask questions, or :help for commands. :quit to exit.\n");

    let mut user = match user {
        Some(user) => user,
        None => match pick_user(client, format).await? {
            Some(user) => user,
            None => return Ok(()),
        },
    };
    let mut debug = false;
    let mut policy_type: Option<String> = None;

    loop {
        let Some(line) = prompt(&format!("{}> ", user))? else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        let (command, arg) = match line.split_once(' ') {
            Some((c, a)) => (c, a.trim()),
            None => (line.as_str(), ""),
        };
        match command {
            ":quit" | ":exit" | ":q" => break,
            ":help" | ":h" => {
                println!("Commands:");
                println!("  :roster <role>    List people holding a role");
                println!("  :user [id]        Switch employee (pick interactively without id)");
                println!("  :debug            Toggle showing retrieved policy text");
                println!("  :policy [type]    Restrict answers to one policy (clear without type)");
                println!("  :status           Server status");
                println!("  :quit             Exit shell");
                println!("  <question>        Ask as the current employee");
            }
            ":roster" => match client.list_by_role(arg).await {
                Ok(people) => print_roster(&people, format)?,
                Err(e) => eprintln!("Error: {}", e),
            },
            ":user" if !arg.is_empty() => user = arg.to_string(),
            ":user" => {
                if let Some(picked) = pick_user(client, format).await? {
                    user = picked;
                }
            }
            ":debug" => {
                debug = !debug;
                println!("debug {}", if debug { "on" } else { "off" });
            }
            ":policy" => {
                policy_type = (!arg.is_empty()).then(|| arg.to_string());
                println!("policy filter: {}", policy_type.as_deref().unwrap_or("none"));
            }
            ":status" => {
                if let Err(e) = run_status(client, format).await {
                    eprintln!("Error: {}", e);
                }
            }
            _ => {
                let mut request = ChatRequest::new(user.clone(), line.clone()).with_debug(debug);
                if let Some(p) = &policy_type {
                    request = request.with_policy_type(p.clone());
                }
                if let Err(e) = run_ask(client, &request, format).await {
                    eprintln!("Error: {}", e);
                }
            }
        }
    }

    println!("Bye!");
    Ok(())
}

async fn run_ingest(dir: Option<PathBuf>, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    onboarding_buddy::logging::init_tracing("warn");

    let config = onboarding_buddy::AppConfig::load()?;
    let dir = dir.unwrap_or_else(|| config.ingest.documents_dir.clone());
    let services = onboarding_buddy::build_services(&config).await?;
    let report = services.ingest(&dir).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            let mut table = Table::new();
            table.set_content_arrangement(ContentArrangement::Dynamic);
            table.set_header(vec!["File", "Policy type", "Chunks"]);
            for doc in &report.documents {
                table.add_row(vec![doc.filename.clone(), doc.policy_type.clone(), doc.chunks.to_string()]);
            }
            println!("{}", table);
            println!("{} chunk(s) uploaded", report.uploaded);
        }
    }
    Ok(())
}
