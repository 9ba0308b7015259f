//! Tests for shell completion functionality.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use clap_complete::Shell;
use rsmachine::cli::{Cli, Commands, CompletionsArgs};

#[test]
fn test_completions_command_parsing() -> Result<()> {
    let shells = [
        ("bash", Shell::Bash),
        ("zsh", Shell::Zsh),
        ("fish", Shell::Fish),
        ("powershell", Shell::PowerShell),
        ("elvish", Shell::Elvish),
    ];

    for (shell_str, expected_shell) in shells {
        let args = Cli::parse_from(["rsmachine", "completions", shell_str]);
        match args.command {
            Commands::Completions(opts) => {
                assert_eq!(opts.shell, expected_shell, "Mismatched shell for '{}'", shell_str);
            }
            _ => panic!("Expected Completions command for shell '{}'", shell_str),
        }
    }

    Ok(())
}

#[test]
fn test_completions_generation() -> Result<()> {
    let mut buffer = Vec::new();

    for shell in Shell::value_variants() {
        buffer.clear();
        rsmachine::run_completions(&CompletionsArgs { shell: *shell }, &mut buffer);
        assert!(!buffer.is_empty(), "Generated completion for {:?} was empty", shell);
    }

    Ok(())
}

#[test]
fn test_bash_completion_lists_subcommands() -> Result<()> {
    let mut buffer = Vec::new();
    rsmachine::run_completions(&CompletionsArgs { shell: Shell::Bash }, &mut buffer);
    let script = String::from_utf8(buffer)?;

    assert!(script.contains("rsmachine"));
    assert!(script.contains("provision"));
    assert!(script.contains("validate"));
    assert!(script.contains("--machine"));

    Ok(())
}

#[test]
fn test_invalid_shell_is_rejected() {
    let result = Cli::try_parse_from(["rsmachine", "completions", "tcsh"]);
    assert!(result.is_err());
}
