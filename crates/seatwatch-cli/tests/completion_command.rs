use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

#[allow(deprecated)]
fn get_seatwatch_bin() -> PathBuf {
    assert_cmd::cargo::cargo_bin("seatwatch")
}

fn completion_cmd(shell: &str) -> Command {
    let mut cmd = Command::new(get_seatwatch_bin());
    cmd.arg("completion").arg("--shell").arg(shell);
    cmd
}

#[test]
fn test_completion_help_shows_install_instructions() {
    let mut cmd = Command::new(get_seatwatch_bin());
    cmd.arg("completion").arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("SUPPORTED SHELLS"))
        .stdout(predicate::str::contains(
            "eval \"$(seatwatch completion --shell bash)\"",
        ))
        .stdout(predicate::str::contains("~/.zshrc"))
        .stdout(predicate::str::contains(
            "~/.config/fish/completions/seatwatch.fish",
        ));
}

#[test]
fn test_bash_script_covers_the_check_surface() {
    let mut cmd = completion_cmd("bash");

    // The check subcommand gets its own case arm carrying the form flags.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("_seatwatch()"))
        .stdout(predicate::str::contains("seatwatch__check)"))
        .stdout(predicate::str::contains("--region"))
        .stdout(predicate::str::contains("--course"))
        .stdout(predicate::str::contains("--telegram-token"))
        .stdout(predicate::str::contains("complete -F _seatwatch"));
}

#[test]
fn test_zsh_script_describes_the_subcommands() {
    let mut cmd = completion_cmd("zsh");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("#compdef seatwatch"))
        .stdout(predicate::str::contains(
            "check:Run one check of the configured form",
        ))
        .stdout(predicate::str::contains("chrome:Locate the Chrome binary"))
        .stdout(predicate::str::contains("--pou"));
}

#[test]
fn test_fish_script_registers_flags_per_subcommand() {
    let mut cmd = completion_cmd("fish");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("complete -c seatwatch"))
        .stdout(predicate::str::contains("-a \"check\""))
        .stdout(predicate::str::contains("-l region"))
        .stdout(predicate::str::contains("-l settle-ms"));
}

#[test]
fn test_powershell_script_targets_this_binary() {
    let mut cmd = completion_cmd("powershell");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Register-ArgumentCompleter"))
        .stdout(predicate::str::contains("-CommandName 'seatwatch'"))
        .stdout(predicate::str::contains("'seatwatch;check'"))
        .stdout(predicate::str::contains("--headful"));
}

#[test]
fn test_unknown_shell_is_a_usage_error() {
    let mut cmd = completion_cmd("tcsh");

    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("invalid value 'tcsh'"))
        .stderr(predicate::str::contains("possible values"));
}

#[test]
fn test_shell_flag_is_required() {
    let mut cmd = Command::new(get_seatwatch_bin());
    cmd.arg("completion");

    cmd.assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--shell <SHELL>"));
}
