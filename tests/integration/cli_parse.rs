use agentbook::tooling::cli::{Cli, Commands};
use clap::{CommandFactory, Parser};

#[test]
fn parse_valid_command_matrix() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["agentbook", "parse", "lead.book"],
        vec!["agentbook", "parse", "lead.book", "--format", "json"],
        vec!["agentbook", "tokens", "lead.book"],
        vec!["agentbook", "check", "lead.book", "--format", "json"],
        vec!["agentbook", "route", "@alice"],
        vec!["agentbook", "resolve", "TEAM", "{Alice} and {Bob}"],
        vec![
            "agentbook",
            "--workspace",
            "/tmp/ws",
            "--agents-dir",
            "books",
            "--log-output",
            "file",
            "--log-file",
            "/tmp/agentbook.log",
            "route",
            "{Alice}",
        ],
    ];

    for args in cases {
        let parsed = Cli::try_parse_from(args.clone());
        assert!(parsed.is_ok(), "expected valid parse for args: {args:?}");
    }
}

#[test]
fn parse_rejects_missing_arguments() {
    assert!(Cli::try_parse_from(["agentbook", "check"]).is_err());
    assert!(Cli::try_parse_from(["agentbook", "resolve", "TEAM"]).is_err());
    assert!(Cli::try_parse_from(["agentbook", "frobnicate"]).is_err());
}

#[test]
fn route_identifier_is_kept_verbatim() {
    let cli = Cli::try_parse_from(["agentbook", "route", "{Alice Cooper}."]).unwrap();
    match cli.command {
        Commands::Route { identifier, format } => {
            assert_eq!(identifier, "{Alice Cooper}.");
            assert_eq!(format, "text");
        }
        _ => panic!("expected route command"),
    }
}

#[test]
fn help_lists_every_subcommand() {
    let help = Cli::command().render_long_help().to_string();
    for name in ["parse", "tokens", "check", "route", "resolve"] {
        assert!(help.contains(name), "help is missing {name}");
    }
}
