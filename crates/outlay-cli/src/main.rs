// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod runtime;

use anyhow::{Context, Result, anyhow};
use config::Config;
use outlay_app::ExpenseController;
use runtime::StoreTarget;
use std::path::PathBuf;
use tracing::info;

fn main() {
    let outcome = Config::default_path()
        .and_then(|default_config| Invocation::parse(std::env::args().skip(1), default_config))
        .and_then(execute);
    if let Err(error) = outcome {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

/// What a single run of the binary does. Informational commands win over
/// `--check`, which wins over launching the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Help,
    PrintConfigPath,
    PrintExampleConfig,
    PrintLocation,
    Check,
    Launch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Invocation {
    command: Command,
    config_path: PathBuf,
    demo: bool,
}

impl Invocation {
    fn parse<I, S>(args: I, default_config: PathBuf) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config_path = default_config;
        let mut demo = false;
        let mut requested = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let command = match arg.as_ref() {
                "--config" => {
                    let Some(path) = args.next() else {
                        return Err(anyhow!("--config needs a path argument"));
                    };
                    config_path = PathBuf::from(path.as_ref());
                    continue;
                }
                "--demo" => {
                    demo = true;
                    continue;
                }
                "-h" | "--help" => Command::Help,
                "--print-config-path" => Command::PrintConfigPath,
                "--print-example-config" => Command::PrintExampleConfig,
                "--print-path" => Command::PrintLocation,
                "--check" => Command::Check,
                other => {
                    return Err(anyhow!(
                        "unrecognized option {other:?}; `outlay --help` lists the supported flags"
                    ));
                }
            };
            requested.push(command);
        }

        let command = [
            Command::Help,
            Command::PrintConfigPath,
            Command::PrintExampleConfig,
            Command::PrintLocation,
            Command::Check,
        ]
        .into_iter()
        .find(|candidate| requested.contains(candidate))
        .unwrap_or(Command::Launch);

        Ok(Self {
            command,
            config_path,
            demo,
        })
    }
}

fn execute(invocation: Invocation) -> Result<()> {
    match invocation.command {
        Command::Help => {
            print!("{}", usage());
            return Ok(());
        }
        Command::PrintConfigPath => {
            println!("{}", invocation.config_path.display());
            return Ok(());
        }
        Command::PrintExampleConfig => {
            print!("{}", Config::example_config(&invocation.config_path));
            return Ok(());
        }
        Command::PrintLocation | Command::Check | Command::Launch => {}
    }

    let config = Config::load(&invocation.config_path).with_context(|| {
        format!(
            "read {}; `outlay --print-example-config` prints a v1 template to start from",
            invocation.config_path.display()
        )
    })?;
    let target = StoreTarget::resolve(&config, invocation.demo)?;

    if invocation.command == Command::PrintLocation {
        println!("{}", target.location()?);
        return Ok(());
    }

    let log_path = runtime::init_logging(&config)?;
    info!(
        log = %log_path.display(),
        config = %invocation.config_path.display(),
        command = ?invocation.command,
        "outlay starting"
    );

    let mut controller = ExpenseController::new(target.open()?);
    if invocation.command == Command::Check {
        controller
            .refresh()
            .context("list expenses -- the store is not reachable with this configuration")?;
        println!(
            "ok: {} expenses at {}",
            controller.expenses().len(),
            target.location()?
        );
        return Ok(());
    }

    outlay_tui::run_app(&mut controller)
}

fn usage() -> &'static str {
    "\
outlay: track expenses in the terminal

usage: outlay [--config <path>] [--demo] [command flag]

  --config <path>          read settings from <path> instead of the default
  --demo                   use an in-memory store filled with sample expenses
  --check                  load settings, list the store once and exit
  --print-path             print the database file or collection URL in use
  --print-config-path      print where settings are read from
  --print-example-config   print a commented v1 settings file
  -h, --help               print this message
"
}

#[cfg(test)]
mod tests {
    use super::{Command, Invocation, usage};
    use anyhow::Result;
    use std::path::PathBuf;

    fn fallback_config() -> PathBuf {
        PathBuf::from("/tmp/outlay/config.toml")
    }

    #[test]
    fn no_arguments_launches_with_the_fallback_config() -> Result<()> {
        let invocation = Invocation::parse(Vec::<&str>::new(), fallback_config())?;
        assert_eq!(
            invocation,
            Invocation {
                command: Command::Launch,
                config_path: fallback_config(),
                demo: false,
            }
        );
        Ok(())
    }

    #[test]
    fn config_flag_replaces_the_fallback() -> Result<()> {
        let invocation =
            Invocation::parse(["--demo", "--config", "./outlay.toml"], fallback_config())?;
        assert_eq!(invocation.config_path, PathBuf::from("./outlay.toml"));
        assert!(invocation.demo);
        assert_eq!(invocation.command, Command::Launch);
        Ok(())
    }

    #[test]
    fn config_flag_without_a_value_is_rejected() {
        let error = Invocation::parse(["--config"], fallback_config())
            .expect_err("--config alone should fail");
        assert!(error.to_string().contains("needs a path"));
    }

    #[test]
    fn unrecognized_options_point_at_help() {
        let error = Invocation::parse(["--verbose"], fallback_config())
            .expect_err("unknown flags should fail");
        let message = error.to_string();
        assert!(message.contains("\"--verbose\""));
        assert!(message.contains("outlay --help"));
    }

    #[test]
    fn informational_commands_take_precedence() -> Result<()> {
        let check_and_print = Invocation::parse(["--check", "--print-path"], fallback_config())?;
        assert_eq!(check_and_print.command, Command::PrintLocation);

        let everything = Invocation::parse(
            ["--check", "--print-example-config", "--print-config-path", "-h"],
            fallback_config(),
        )?;
        assert_eq!(everything.command, Command::Help);

        let check = Invocation::parse(["--demo", "--check"], fallback_config())?;
        assert_eq!(check.command, Command::Check);
        Ok(())
    }

    #[test]
    fn usage_lists_every_flag() {
        let text = usage();
        for flag in [
            "--config",
            "--demo",
            "--check",
            "--print-path",
            "--print-config-path",
            "--print-example-config",
            "--help",
        ] {
            assert!(text.contains(flag), "usage is missing {flag}");
        }
    }
}
