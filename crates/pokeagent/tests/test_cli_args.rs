//! CLI argument parsing tests

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn pokeagent() -> Command {
    Command::new(env!("CARGO_BIN_EXE_pokeagent"))
}

#[test]
fn test_help_flag() {
    pokeagent()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Answer questions about Pokémon"))
        .stdout(predicate::str::contains("--verbose"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_version_flag() {
    pokeagent()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_args_shows_usage() {
    pokeagent()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_lists_commands() {
    for command in ["init", "setup", "ask", "lookup", "index", "status"] {
        pokeagent()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains(command));
    }
}

#[test]
fn test_ask_help() {
    pokeagent()
        .args(["ask", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ask the agent a question"))
        .stdout(predicate::str::contains("-m, --message"))
        .stdout(predicate::str::contains("-s, --session"))
        .stdout(predicate::str::contains("--no-save"));
}

#[test]
fn test_lookup_requires_name() {
    pokeagent()
        .arg("lookup")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<NAME>"));
}

#[test]
fn test_index_help() {
    pokeagent()
        .args(["index", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-o, --output"))
        .stdout(predicate::str::contains("-u, --url"));
}

#[test]
fn test_unknown_command() {
    pokeagent()
        .arg("battle")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_verbose_is_global() {
    pokeagent()
        .args(["status", "--verbose", "--help"])
        .assert()
        .success();
}
