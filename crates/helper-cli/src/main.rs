use std::env;
use std::fs;
use std::io;
use std::io::Read;
use std::path::PathBuf;

use helper_core::config::AppConfig;
use helper_core::extract::extract;
use helper_core::gate::decide;
use helper_core::gate::GateDecision;
use helper_core::gate::Simulation;
use helper_core::persistence::FlatStore;
use helper_core::session::SessionStore;
use helper_core::state::HelperState;
use helper_exec::dispatcher::ShellDispatcher;
use helper_exec::executor::ProcessShellRunner;

mod app;
mod config;
mod logging;
mod ui;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[derive(Debug, Default, PartialEq)]
struct GlobalArgs {
    store: Option<PathBuf>,
    config: Option<PathBuf>,
    rest: Vec<String>,
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_global_args(env::args().skip(1).collect())?;
    let config_path = args.config.clone().or_else(config::default_config_path);
    let app_config = match &config_path {
        Some(path) => config::load(path)?,
        None => AppConfig::default(),
    };
    let store_path = config::resolve_store_path(&app_config, args.store.clone());

    let mut rest = args.rest.into_iter();
    let Some(command) = rest.next() else {
        return run_tui(app_config, store_path);
    };
    let rest: Vec<String> = rest.collect();

    match command.as_str() {
        "--help" | "-h" | "help" => {
            print_help();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("devops-helper {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "extract" => {
            logging::init_stderr(app_config.log_filter.as_deref());
            run_extract(rest)
        }
        "gate" => {
            logging::init_stderr(app_config.log_filter.as_deref());
            run_gate(rest)
        }
        "sessions" => {
            logging::init_stderr(app_config.log_filter.as_deref());
            run_sessions(store_path)
        }
        _ => {
            print_help();
            Err(format!("unknown command: {command}").into())
        }
    }
}

fn parse_global_args(args: Vec<String>) -> Result<GlobalArgs, Box<dyn std::error::Error>> {
    let mut parsed = GlobalArgs::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--store" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--store requires a path".into());
                };
                parsed.store = Some(PathBuf::from(value));
                i += 2;
            }
            "--config" => {
                let Some(value) = args.get(i + 1) else {
                    return Err("--config requires a path".into());
                };
                parsed.config = Some(PathBuf::from(value));
                i += 2;
            }
            _ => {
                parsed.rest = args[i..].to_vec();
                break;
            }
        }
    }
    Ok(parsed)
}

fn run_tui(app_config: AppConfig, store_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let log_path = config::data_dir().join(config::LOG_FILE_NAME);
    logging::init_file(&log_path, app_config.log_filter.as_deref())?;
    tracing::info!(store = %store_path.display(), "starting devops-helper");

    let store = FlatStore::open(&store_path)?;
    let dispatcher = ShellDispatcher::new(ProcessShellRunner::new(app_config.max_output_bytes));
    let mut host = app::Host::new(
        HelperState::new(app_config),
        store,
        dispatcher,
        Box::new(app::SystemClipboard),
    );
    host.restore();
    ui::run(host)
}

fn run_extract(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let text = match args.as_slice() {
        [] => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
        [path] => fs::read_to_string(path)?,
        _ => return Err("extract takes at most one file".into()),
    };
    for suggestion in extract(&text) {
        println!(
            "{}\t{}\t{}",
            suggestion.provenance.label(),
            suggestion.command,
            suggestion.explanation
        );
    }
    Ok(())
}

fn run_gate(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let (allow, words) = match args.split_first() {
        Some((flag, words)) if flag == "--allow" => (true, words),
        _ => (false, args.as_slice()),
    };
    if words.is_empty() {
        return Err("gate requires a command".into());
    }
    let command = words.join(" ");
    let decision = decide(&command, allow);
    println!("{}\t{}", decision.label(), describe_decision(&decision));
    Ok(())
}

fn describe_decision(decision: &GateDecision) -> String {
    match decision {
        GateDecision::Simulate(Simulation::Builtin(builtin)) => format!("builtin {builtin:?}"),
        GateDecision::Simulate(Simulation::Disabled) => "real execution disabled".to_string(),
        GateDecision::Simulate(Simulation::NotFound) => "command not found".to_string(),
        GateDecision::Deny(reason) => reason.clone(),
        GateDecision::PassThrough => "runs on host".to_string(),
    }
}

fn run_sessions(store_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let store = FlatStore::open(&store_path)?;
    let sessions = SessionStore::from_sessions(store.load_sessions());
    if sessions.is_empty() {
        println!("no sessions in {}", store_path.display());
        return Ok(());
    }
    for session in sessions.sorted_for_display() {
        println!(
            "#{}\t{}\t{}\t{}",
            session.serial,
            session.date.format("%Y-%m-%d %H:%M"),
            session.title,
            session.preview()
        );
    }
    Ok(())
}

fn print_help() {
    println!("devops-helper {}", env!("CARGO_PKG_VERSION"));
    println!("Usage:");
    println!("  devops-helper [--store PATH] [--config PATH]");
    println!("  devops-helper extract [FILE]");
    println!("  devops-helper gate [--allow] COMMAND...");
    println!("  devops-helper sessions");
    println!("  devops-helper --help");
    println!("  devops-helper --version");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn global_flags_come_before_the_subcommand() {
        let parsed =
            parse_global_args(strings(&["--store", "s.json", "gate", "--allow", "ls"])).unwrap();
        assert_eq!(
            parsed,
            GlobalArgs {
                store: Some(PathBuf::from("s.json")),
                config: None,
                rest: strings(&["gate", "--allow", "ls"]),
            }
        );
    }

    #[test]
    fn missing_flag_value_is_an_error() {
        assert!(parse_global_args(strings(&["--config"])).is_err());
    }

    #[test]
    fn decisions_are_described_for_scripting() {
        assert_eq!(
            describe_decision(&decide("rm -rf /", true)),
            helper_core::gate::RESTRICTED_MESSAGE
        );
        assert_eq!(
            describe_decision(&decide("docker ps", false)),
            "real execution disabled"
        );
        assert_eq!(describe_decision(&decide("uptime", true)), "runs on host");
    }
}
