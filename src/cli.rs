use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use std::io::Read;
use std::path::{Path, PathBuf};

use runlog::ci::CiProvider;
use runlog::config::Config;
use runlog::output::{ColorChoice, LevelWriter, Printer, Severity, ThemeChoice, With};

#[derive(Parser)]
#[command(name = "runlog")]
#[command(author, version, about = "Highlighted step output and CI log groups", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./runlog.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Minimum severity to print
    #[arg(short, long, global = true, env = "RUNLOG_LEVEL")]
    level: Option<Severity>,

    /// When to color output
    #[arg(long, global = true)]
    color: Option<ColorChoice>,

    /// Colors for a light or dark terminal background
    #[arg(long, global = true)]
    theme: Option<ThemeChoice>,

    /// Force CI group markup for a provider
    #[arg(long, global = true)]
    ci: Option<CiProvider>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a shell script
    Script {
        /// Shell the script is written for
        #[arg(short, long, default_value = "sh")]
        shell: String,

        #[command(flatten)]
        group: GroupArgs,

        /// Script file, `-` or nothing for stdin
        file: Option<PathBuf>,
    },
    /// Print builtin parameters
    With {
        #[command(flatten)]
        group: GroupArgs,

        /// KEY=VALUE pairs; `\n` in a value becomes a newline
        #[arg(required = true, value_parser = parse_pair)]
        pairs: Vec<(String, String)>,
    },
}

#[derive(Args)]
struct GroupArgs {
    /// Wrap the output in a CI log group
    #[arg(short, long)]
    group: Option<String>,

    /// Group header shown by the CI log viewer
    #[arg(short, long, default_value = "")]
    description: String,
}

impl GroupArgs {
    fn name(&self) -> &str {
        self.group.as_deref().unwrap_or("")
    }
}

fn parse_pair(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.replace("\\n", "\n")))
}

fn read_script(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display())),
        _ => {
            let mut script = String::new();
            std::io::stdin()
                .read_to_string(&mut script)
                .context("Failed to read script from stdin")?;
            Ok(script)
        }
    }
}

impl Cli {
    fn config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(level) = self.level {
            config.output.level = level;
        }
        if let Some(color) = self.color {
            config.output.color = color;
        }
        if let Some(theme) = self.theme {
            config.output.theme = theme;
        }
        if let Some(provider) = self.ci {
            config.ci.provider = provider;
        }

        Ok(config)
    }

    pub fn execute(&self) -> Result<()> {
        let config = self.config()?;
        info!(
            "Printing at level {} (color: {:?}, theme: {:?}, ci: {:?})",
            config.output.level,
            config.output.color,
            config.output.theme,
            config.ci.provider
        );

        let printer = Printer::from_config(&config);
        let mut sink = LevelWriter::new(std::io::stdout().lock(), config.output.level);

        match &self.command {
            Commands::Script { shell, group, file } => {
                let script = read_script(file.as_deref())?;
                let mut section =
                    printer.print_group(Some(&mut sink), group.name(), &group.description);
                printer.print_script(section.sink(), shell, &script);
                section.close();
            }
            Commands::With { group, pairs } => {
                let with: With<String> = pairs.iter().cloned().collect();
                let mut section =
                    printer.print_group(Some(&mut sink), group.name(), &group.description);
                printer.print_builtin(section.sink(), &with);
                section.close();
            }
        }

        Ok(())
    }
}
