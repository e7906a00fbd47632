use clap::Parser;
use ppm_sentinel::cli::commands::config::ConfigCommands;
use ppm_sentinel::cli::{Cli, Commands};
use std::path::PathBuf;

#[test]
fn test_parse_config_show_with_global_flags() {
    let cli = Cli::try_parse_from(["ppm-sentinel", "config", "show", "--json", "-c", "alt.yaml"]).unwrap();

    assert!(cli.json);
    assert_eq!(cli.config, Some(PathBuf::from("alt.yaml")));
    match cli.command {
        Commands::Config(args) => assert!(matches!(args.command, ConfigCommands::Show)),
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_parse_command() {
    let cli = Cli::try_parse_from([
        "ppm-sentinel",
        "parse",
        "--identity",
        "42",
        "--file",
        "reply.txt",
        "--force-individual",
    ])
    .unwrap();

    match cli.command {
        Commands::Parse(args) => {
            assert_eq!(args.identity.as_deref(), Some("42"));
            assert_eq!(args.file, Some(PathBuf::from("reply.txt")));
            assert!(args.title.is_none());
            assert!(args.force_individual);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_simulate_defaults() {
    let cli = Cli::try_parse_from(["ppm-sentinel", "simulate", "--reply", "<@42> 🎁 **0**"]).unwrap();

    match cli.command {
        Commands::Simulate(args) => {
            assert_eq!(args.reply, "<@42> 🎁 **0**");
            assert_eq!(args.identity, "42");
            assert_eq!(args.step_ms, 200);
            assert!(args.verify_reply.is_none());
            assert!(args.helper_role.is_none());
            assert!(!args.verbose);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_simulate_requires_reply() {
    assert!(Cli::try_parse_from(["ppm-sentinel", "simulate"]).is_err());
}

#[test]
fn test_unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["ppm-sentinel", "swarm"]).is_err());
}
