// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for gaspp.

use clap::Parser;
use serde_json::json;

use gaspp::core::error::PpError;
use gaspp::driver;
use gaspp::translator::cli::{validate_cli, Cli, OutputFormat};

fn main() {
    let cli = Cli::parse();
    let config = match validate_cli(&cli) {
        Ok(config) => config,
        Err(err) => {
            report_error(cli.format, &err);
            std::process::exit(1);
        }
    };

    match driver::run(&config) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            report_error(config.format, &err);
            std::process::exit(1);
        }
    }
}

fn report_error(format: OutputFormat, err: &PpError) {
    match format {
        OutputFormat::Text => eprintln!("gaspp: {err}"),
        OutputFormat::Json => {
            let payload = json!({
                "error": err.message(),
                "line": err.line(),
            });
            eprintln!("{payload}");
        }
    }
}
