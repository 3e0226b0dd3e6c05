use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use compli::api::create_router;
use compli::client::prompts::{
    clean_mission_summary, first_reply_content, mission_prompt, mock_interview_opening,
    mock_interview_turn,
};
use compli::client::{
    Checklist, FileStore, GatewayClient, MissionCache, SavedCompanyNote, SearchHistory, SearchView,
    StarStory, Tab, ThemePreference, saved_companies,
};
use compli::config::CONFIG;
use compli::gateway::Gateway;
use compli::providers::{ChatMessage, http_client};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing_subscriber::EnvFilter;

const DEFAULT_GATEWAY: &str = "http://localhost:3000";
/// Caller id used by the chat commands when none is given.
const PUBLIC_USER: &str = "public";

#[derive(Parser)]
#[command(name = "compli")]
#[command(about = "Company research and interview prep for job seekers")]
struct Cli {
    /// Local state file (defaults to the platform data directory)
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve,

    /// Research a company through a running gateway
    Search {
        company: String,

        /// Only show contacts from this university
        #[arg(short, long)]
        university: Option<String>,

        /// Tab to print (overview, news, interviews, contacts, prep)
        #[arg(short, long, default_value = "overview")]
        tab: Tab,

        /// Print every tab
        #[arg(long)]
        all: bool,

        #[arg(long, default_value = DEFAULT_GATEWAY)]
        gateway: String,
    },

    /// Show or clear recent searches
    History {
        #[arg(long)]
        clear: bool,
    },

    /// List saved companies
    Saved,

    /// Show or edit notes for a company
    Note {
        company: String,

        #[arg(long)]
        notes: Option<String>,

        /// Questions to ask the interviewer
        #[arg(long)]
        questions: Option<String>,

        /// Flip the saved flag
        #[arg(long)]
        toggle_saved: bool,
    },

    /// Show or edit a company's prep checklist
    Check {
        company: String,

        /// Item id to mark done or undone
        #[arg(long)]
        toggle: Option<String>,

        /// Label of a new item
        #[arg(long)]
        add: Option<String>,
    },

    /// Show, set or toggle the theme
    Theme {
        value: Option<ThemePreference>,

        #[arg(long)]
        toggle: bool,
    },

    /// Mission and values summary for a company
    Mission {
        company: String,

        #[arg(long, default_value = PUBLIC_USER)]
        user_id: String,

        #[arg(long, default_value = DEFAULT_GATEWAY)]
        gateway: String,
    },

    /// Polish a STAR story
    Star {
        #[arg(long)]
        situation: String,
        #[arg(long)]
        task: String,
        #[arg(long)]
        action: String,
        #[arg(long)]
        result: Option<String>,

        #[arg(long, default_value = PUBLIC_USER)]
        user_id: String,

        #[arg(long, default_value = DEFAULT_GATEWAY)]
        gateway: String,
    },

    /// Interactive mock interview; an empty line ends it
    Mock {
        company: Option<String>,

        #[arg(short, long)]
        role: Option<String>,

        #[arg(long, default_value = PUBLIC_USER)]
        user_id: String,

        #[arg(long, default_value = DEFAULT_GATEWAY)]
        gateway: String,
    },

    /// Send feedback
    Feedback {
        message: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long, default_value = DEFAULT_GATEWAY)]
        gateway: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let cli = Cli::parse();
    let state_path = match cli.state {
        Some(path) => path,
        None => default_state_path(),
    };

    match cli.command {
        Commands::Serve => serve().await,
        Commands::Search {
            company,
            university,
            tab,
            all,
            gateway,
        } => {
            let store = FileStore::open(&state_path)?;
            let view = client(&gateway)?
                .search(&store, &company, university.as_deref())
                .await?;
            if all {
                for tab in Tab::ALL {
                    print_tab(&view, tab, &store)?;
                }
            } else {
                print_tab(&view, tab, &store)?;
            }
            Ok(())
        }
        Commands::History { clear } => {
            let store = FileStore::open(&state_path)?;
            if clear {
                SearchHistory::clear(&store)?;
                println!("History cleared.");
                return Ok(());
            }
            for company in SearchHistory::load(&store)?.entries() {
                println!("{company}");
            }
            Ok(())
        }
        Commands::Saved => {
            let store = FileStore::open(&state_path)?;
            let saved = saved_companies(&store)?;
            if saved.is_empty() {
                println!("No saved companies yet.");
            }
            for company in saved {
                println!("{company}");
            }
            Ok(())
        }
        Commands::Note {
            company,
            notes,
            questions,
            toggle_saved,
        } => {
            let store = FileStore::open(&state_path)?;
            let mut note = SavedCompanyNote::load(&store, &company)?;
            let changed = notes.is_some() || questions.is_some() || toggle_saved;
            if let Some(notes) = notes {
                note.notes = notes;
            }
            if let Some(questions) = questions {
                note.questions = questions;
            }
            if toggle_saved {
                note.toggle_saved();
            }
            if changed {
                note.save(&store, &company)?;
            }
            println!("Saved: {}", note.saved);
            println!("Notes:\n{}", note.notes);
            println!("Questions:\n{}", note.questions);
            Ok(())
        }
        Commands::Check {
            company,
            toggle,
            add,
        } => {
            let store = FileStore::open(&state_path)?;
            let mut list = Checklist::load(&store, &company)?;
            if let Some(id) = toggle.as_deref() {
                if !list.toggle(id) {
                    bail!("no checklist item with id {id}");
                }
            }
            if let Some(label) = add.as_deref() {
                list.add(label);
            }
            list.save(&store, &company)?;
            print_checklist(&list);
            Ok(())
        }
        Commands::Theme { value, toggle } => {
            let store = FileStore::open(&state_path)?;
            let current = ThemePreference::load(&store, false)?;
            let next = match (value, toggle) {
                (Some(v), _) => Some(v),
                (None, true) => Some(current.toggled()),
                (None, false) => None,
            };
            match next {
                Some(theme) => {
                    theme.save(&store)?;
                    println!("{theme}");
                }
                None => println!("{current}"),
            }
            Ok(())
        }
        Commands::Mission {
            company,
            user_id,
            gateway,
        } => {
            let store = FileStore::open(&state_path)?;
            let summary = mission(&client(&gateway)?, &store, &company, &user_id).await?;
            println!("{summary}");
            Ok(())
        }
        Commands::Star {
            situation,
            task,
            action,
            result,
            user_id,
            gateway,
        } => {
            let story = StarStory {
                situation,
                task,
                action,
                result,
            };
            let Some(prompt) = story.prompt() else {
                bail!("situation, task and action are all required");
            };
            let envelope = client(&gateway)?.chat(&user_id, &[prompt]).await?;
            let reply = first_reply_content(&envelope).context("No AI response received")?;
            println!("{reply}");
            Ok(())
        }
        Commands::Mock {
            company,
            role,
            user_id,
            gateway,
        } => mock_interview(&client(&gateway)?, company.as_deref(), role.as_deref(), &user_id).await,
        Commands::Feedback {
            message,
            name,
            email,
            gateway,
        } => {
            client(&gateway)?
                .feedback(name.as_deref(), email.as_deref(), &message)
                .await?;
            println!("Thanks for the feedback!");
            Ok(())
        }
    }
}

async fn serve() -> Result<()> {
    let gateway = Gateway::from_config(&CONFIG).await?;
    let app = create_router(Arc::new(gateway));

    let listener = tokio::net::TcpListener::bind(&CONFIG.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", CONFIG.bind_addr))?;
    log::info!("listening on {}", CONFIG.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("failed to listen for Ctrl+C: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => log::info!("received Ctrl+C, shutting down"),
        _ = terminate => log::info!("received SIGTERM, shutting down"),
    }
}

fn default_state_path() -> PathBuf {
    match directories::ProjectDirs::from("", "", "compli") {
        Some(dirs) => dirs.data_dir().join("local.json"),
        None => PathBuf::from("compli-local.json"),
    }
}

fn client(gateway: &str) -> Result<GatewayClient> {
    Ok(GatewayClient::new(http_client(CONFIG.http_timeout_secs)?, gateway))
}

async fn mission(client: &GatewayClient, store: &FileStore, company: &str, user_id: &str) -> Result<String> {
    let mut cache = MissionCache::load(store)?;
    if let Some(summary) = cache.get(company) {
        log::debug!("using cached mission summary for {company}");
        return Ok(summary.to_string());
    }
    let envelope = client.chat(user_id, &[mission_prompt(company)]).await?;
    let reply = first_reply_content(&envelope).context("No AI response received")?;
    let cleaned = clean_mission_summary(&reply);
    cache.insert(store, company, cleaned.clone())?;
    Ok(cleaned)
}

async fn mock_interview(
    client: &GatewayClient,
    company: Option<&str>,
    role: Option<&str>,
    user_id: &str,
) -> Result<()> {
    let opening = mock_interview_opening(company, role);
    println!("Interviewer: {}\n", opening.content);
    let mut transcript = vec![opening];

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let answer = line.trim();
        if answer.is_empty() {
            break;
        }
        transcript.push(ChatMessage::user(answer));

        let turn = mock_interview_turn(company, role, &transcript);
        let reply = match client.chat(user_id, &turn).await {
            Ok(envelope) => first_reply_content(&envelope),
            Err(e) => {
                log::warn!("mock interview turn failed: {e:#}");
                None
            }
        };
        let reply = reply.unwrap_or_else(|| "Sorry, something went wrong.".to_string());
        println!("\nInterviewer: {reply}\n");
        transcript.push(ChatMessage::assistant(reply));
    }
    Ok(())
}

fn print_tab(view: &SearchView, tab: Tab, store: &FileStore) -> Result<()> {
    println!("== {} ==", tab.as_str().to_uppercase());
    if let Some(err) = view.errors.get(&tab) {
        println!("(error: {err})");
    }
    match tab {
        Tab::Overview => {
            if let Some(site) = &view.site {
                println!("Website: {}", site.url);
                println!("{}", site.summary);
                for contact in site.contacts.iter().flatten() {
                    println!("- {} ({}) {}", contact.name, contact.position, contact.link);
                }
            }
        }
        Tab::News => {
            if view.news.is_empty() {
                println!("No news found.");
            }
            for item in &view.news {
                println!("- {}\n  {}", item.title, item.link);
            }
        }
        Tab::Interviews => {
            if let Some(record) = &view.interviews {
                println!("Employer:   {}", record.employer);
                println!("Interviews: {}", record.interview_count);
                println!("Difficulty: {}", record.difficulty);
                println!("Experience: {}", record.experience);
                println!("Job title:  {}", record.job_title);
                println!("Outcome:    {}", record.outcome);
                println!("Process:    {}", record.process);
                if let Some(note) = record.note.as_ref().or(record.error.as_ref()) {
                    println!("Note:       {note}");
                }
                for (i, q) in record.questions.iter().enumerate() {
                    println!("{:>2}. {q}", i + 1);
                }
            }
        }
        Tab::Contacts => {
            if view.contacts.is_empty() {
                println!("No contacts found.");
            }
            for hit in &view.contacts {
                println!("- {}\n  {}\n  {}", hit.title, hit.link, hit.snippet);
            }
        }
        Tab::Prep => {
            print_checklist(&Checklist::load(store, &view.company)?);
            let note = SavedCompanyNote::load(store, &view.company)?;
            if !note.notes.is_empty() {
                println!("Notes:\n{}", note.notes);
            }
        }
    }
    println!();
    Ok(())
}

fn print_checklist(list: &Checklist) {
    for item in list.items() {
        let mark = if item.done { "x" } else { " " };
        println!("[{mark}] {:<10} {}", item.id, item.label);
    }
    println!("{}/{} done", list.completed(), list.items().len());
}
