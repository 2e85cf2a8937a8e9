use super::*;
use clap::CommandFactory;

fn env_of(id: &str) -> Option<String> {
    Cli::command()
        .get_arguments()
        .find(|arg| arg.get_id() == id)
        .and_then(|arg| arg.get_env())
        .map(|name| name.to_string_lossy().into_owned())
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[test]
fn global_flags_fall_back_to_environment() {
    assert_eq!(env_of("base_url").as_deref(), Some("CONVO_BASE_URL"));
    assert_eq!(env_of("session_file").as_deref(), Some("CONVO_SESSION_FILE"));
}

#[test]
fn list_defaults_to_first_page_of_all() {
    let cli = Cli::try_parse_from(["convo", "list"]).unwrap();
    match cli.command {
        Command::List { filter, page, size, server_paging } => {
            assert_eq!(filter, ListFilter::All);
            assert_eq!(page, 1);
            assert_eq!(size, DEFAULT_PAGE_SIZE);
            assert!(!server_paging);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn global_flag_accepted_after_subcommand() {
    let cli = Cli::try_parse_from(["convo", "whoami", "--base-url", "http://h/api"]).unwrap();
    assert_eq!(cli.base_url.as_deref(), Some("http://h/api"));
}
