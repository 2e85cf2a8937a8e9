use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use convo_desk::config::ClientConfig;
use convo_desk::error::{ApiError, AuthError, ConfigError};
use convo_desk::net::api::{HttpAuthClient, HttpConversationRepository};
use convo_desk::net::repository::ConversationRepository;
use convo_desk::net::types::{Category, ConversationId, ListFilter, Role, SignupRequest};
use convo_desk::state::conversations::{ConversationViewModel, PagingMode, RemoveOutcome};
use convo_desk::state::session::{FileStorage, SessionStore};
use convo_desk::util::pagination::DEFAULT_PAGE_SIZE;
use convo_desk::view;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("conversation {0} not found")]
    NotFound(ConversationId),
    #[error("page numbers start at 1")]
    InvalidPage,
}

#[derive(Parser, Debug)]
#[command(name = "convo", about = "Browse and curate saved prompt/response conversations")]
struct Cli {
    /// API base URL, e.g. http://localhost:8083/api.
    #[arg(long, global = true, env = "CONVO_BASE_URL")]
    base_url: Option<String>,

    /// Where the signed-in session is stored.
    #[arg(long, global = true, env = "CONVO_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    Signup {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "User")]
        role: Role,
    },
    Logout,
    Whoami,
    List {
        /// `all`, `sorted`, or a category name.
        #[arg(long, default_value = "all")]
        filter: ListFilter,
        /// One-based page number.
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        size: usize,
        /// Let the backend slice pages instead of fetching everything.
        #[arg(long)]
        server_paging: bool,
    },
    Add {
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        response: String,
        #[arg(long, default_value = "General")]
        category: Category,
    },
    Edit {
        id: ConversationId,
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        response: Option<String>,
        #[arg(long)]
        category: Option<Category>,
    },
    Delete {
        id: ConversationId,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if let Some(path) = cli.session_file {
        config.session_file = path;
    }

    let store = SessionStore::new(HttpAuthClient::from_config(&config)?, FileStorage::new(config.session_file.clone()));

    match cli.command {
        Command::Login { username, password } => {
            let session = store.sign_in(&username, &password).await?;
            println!("{}", view::render_header(&session.user));
        }
        Command::Signup { username, password, email, role } => {
            let session = store.sign_up(SignupRequest { username, password, email, role }).await?;
            println!("{}", view::render_header(&session.user));
        }
        Command::Logout => {
            store.sign_out()?;
            println!("Signed out.");
        }
        Command::Whoami => match store.current_session() {
            Some(session) => println!("{} <{}>", view::render_header(&session.user), session.user.email),
            None => println!("Not signed in."),
        },
        command => {
            let session = store.require_session()?;
            let repository = HttpConversationRepository::from_config(&config)?.with_token(session.token);
            println!("{}", view::render_header(&session.user));
            run_conversations(ConversationViewModel::new(repository), command).await?;
        }
    }
    Ok(())
}

async fn run_conversations<R: ConversationRepository>(
    mut vm: ConversationViewModel<R>,
    command: Command,
) -> Result<(), CliError> {
    match command {
        Command::List { filter, page, size, server_paging } => {
            let page = page.checked_sub(1).ok_or(CliError::InvalidPage)?;
            if server_paging {
                vm = vm.with_paging(PagingMode::Server);
            }
            let result = vm.load_list(filter, page, size).await;
            print!("{}", view::render_list(&vm));
            result?;
        }
        Command::Add { prompt, response, category } => {
            vm.form.prompt = prompt;
            vm.form.response = response;
            vm.form.category = category;
            let saved = vm.submit().await?;
            println!("Saved conversation #{}.", saved.id);
        }
        Command::Edit { id, prompt, response, category } => {
            let existing = vm
                .repository()
                .fetch_all()
                .await?
                .into_iter()
                .find(|conversation| conversation.id == id)
                .ok_or(CliError::NotFound(id))?;
            vm.begin_edit(&existing);
            if let Some(prompt) = prompt {
                vm.form.prompt = prompt;
            }
            if let Some(response) = response {
                vm.form.response = response;
            }
            if let Some(category) = category {
                vm.form.category = category;
            }
            let saved = vm.submit().await?;
            println!("Updated conversation #{}.", saved.id);
        }
        Command::Delete { id, yes } => {
            let outcome = vm.remove(id, || yes || confirm(&format!("Delete conversation #{id}?"))).await?;
            match outcome {
                RemoveOutcome::Deleted => println!("Deleted conversation #{id}."),
                RemoveOutcome::Cancelled => println!("Cancelled."),
            }
        }
        Command::Login { .. } | Command::Signup { .. } | Command::Logout | Command::Whoami => {}
    }
    Ok(())
}

/// Ask a y/N question on stdin; anything but `y`/`yes` declines.
fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
