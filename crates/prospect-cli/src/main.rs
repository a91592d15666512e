// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod session;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use prospect_app::{
    FieldKind, FormController, MemorySessionStore, Mode, SessionStore, today,
};
use prospect_client::Client;
use session::FileSessionStore;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `prospect --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let client = Client::new(config.service_url()?, config.service_timeout()?).with_context(|| {
        format!(
            "invalid [service] config in {}; fix url/timeout values",
            options.config_path.display()
        )
    })?;
    let form = config.form(today())?;
    let policy = config.policy();
    if options.check_only {
        return Ok(());
    }

    if let Some(id) = options.lookup {
        let mut controller =
            FormController::new(form, policy, Mode::Query, MemorySessionStore::new());
        controller.set_search_input(id);
        if controller.search_with(&client).is_err() {
            let message = controller
                .status()
                .map(|status| status.text.clone())
                .unwrap_or_else(|| "lookup failed".to_owned());
            bail!("{message}");
        }
        println!("{}", render_record(&controller)?);
        return Ok(());
    }

    let session: Box<dyn SessionStore> = match FileSessionStore::default_path() {
        Ok(path) => Box::new(FileSessionStore::new(path)),
        Err(error) => {
            log::warn!("session state will not persist: {error:#}");
            Box::new(MemorySessionStore::new())
        }
    };
    let mut controller = FormController::new(form, policy, config.default_mode(), session);
    prospect_tui::run_app(&mut controller, client)
}

/// Populated values as pretty JSON, attachment controls left out.
fn render_record<S: SessionStore>(controller: &FormController<S>) -> Result<String> {
    let values = controller
        .form()
        .fields()
        .iter()
        .filter(|field| field.kind != FieldKind::File && !field.name.is_empty())
        .map(|field| (field.name.as_str(), field.value.as_str()))
        .collect::<BTreeMap<_, _>>();
    serde_json::to_string_pretty(&values).context("encode record")
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    lookup: Option<String>,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        print_config_path: false,
        print_example: false,
        check_only: false,
        lookup: None,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--lookup" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--lookup requires an identifier"))?;
                let id = value.as_ref().trim();
                if id.is_empty() {
                    bail!("--lookup requires a non-empty identifier");
                }
                options.lookup = Some(id.to_owned());
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("prospect");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and service settings");
    println!("  --lookup <id>            Fetch one record and print it as JSON");
    println!("  --help                   Show this help");
}
