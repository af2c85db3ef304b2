//! Command line interface: render, stage, check and list placeholders

use std::env;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};

use crate::pbs::job::{load_template, SCRIPT_NAME};
use crate::pbs::job_request::{JobRequest, Override};
use crate::pbs::submit::QSUB;
use crate::request::message::Message;
use crate::template::Template;

#[derive(Parser, Debug)]
#[command(author, version, about = "Render PBS job scripts from queue parameter files")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub struct Params {
    /// Queue parameter file (.yaml, .yml or .json), e.g. my_qadapter.yaml
    #[arg(short, long)]
    params: PathBuf,

    /// Template file, takes precedence over _fw_template_file and the bundled PBS template
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Override a parameter, can be repeated
    #[arg(short, long = "set", value_name = "KEY=VALUE")]
    set: Vec<Override>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the rendered job script
    Render {
        #[command(flatten)]
        params: Params,

        /// Write the script here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the job script into its launch directory and optionally submit it
    Stage {
        #[command(flatten)]
        params: Params,

        /// Launch directory, defaults to launch_dir from the parameters or the current directory
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Submit the staged script to the queue
        #[arg(long)]
        submit: bool,

        /// Queue submission command
        #[arg(long, default_value = QSUB)]
        qsub: String,

        /// Render and report only, don't write or submit anything
        #[arg(long)]
        dry_run: bool,
    },
    /// List every placeholder the parameters don't supply
    Check {
        #[command(flatten)]
        params: Params,
    },
    /// List the placeholders a template references
    Placeholders {
        /// Template file, defaults to the bundled PBS template
        #[arg(short, long)]
        template: Option<PathBuf>,
    },
}

/// Run a parsed command, writing its report to `out`
pub fn run(args: Args, out: &mut impl Write) -> Result<()> {
    match args.command {
        Command::Render { params, output } => {
            let (request, template) = prepare(&params)?;
            let script = request.render(&template)?;
            match output {
                Some(path) => {
                    info!("Writing rendered script to {}", path.display());
                    fs::write(&path, script)
                        .with_context(|| format!("Can't write {}", path.display()))?;
                }
                None => write!(out, "{script}")?,
            }
        }
        Command::Stage { params, dir, submit, qsub, dry_run } => {
            let (request, template) = prepare(&params)?;
            let dir = match dir.or_else(|| request.launch_dir().map(PathBuf::from)) {
                Some(dir) => dir,
                None => env::current_dir().context("Can't read current directory")?,
            };

            if dry_run {
                info!("--dry-run set, not writing {}", dir.join(SCRIPT_NAME).display());
                write!(out, "{}", request.render(&template)?)?;
                if submit {
                    warn!("--dry-run set, skipping submission");
                }
                return Ok(());
            }

            let job = request.create(&template, &dir)?;
            writeln!(out, "{}", job.path.display())?;

            if submit {
                let job_id = job.submit(&qsub)?;
                writeln!(out, "{job_id}")?;
            }
        }
        Command::Check { params } => {
            let (request, template) = prepare(&params)?;
            let missing = template.missing(&request.to_context()?);
            if !missing.is_empty() {
                for name in &missing {
                    writeln!(out, "{name}")?;
                }
                bail!("{} placeholder(s) have no value", missing.len());
            }
            info!("All {} placeholders have values", template.placeholders().len());
        }
        Command::Placeholders { template } => {
            let template = load_template(template.as_deref())?;
            for name in template.placeholders() {
                writeln!(out, "{name}")?;
            }
        }
    }

    Ok(())
}

/// Read the parameter file with overrides merged in, then pick the template
///
/// Precedence: `--template`, then `_fw_template_file`, then the bundled PBS template.
fn prepare(params: &Params) -> Result<(JobRequest, Template)> {
    let request = Message::new(&params.params).read_with_overrides(&params.set)?;

    let template_path = params.template.clone().or_else(|| request.template_file());
    let template = load_template(template_path.as_deref())?;
    Ok((request, template))
}
