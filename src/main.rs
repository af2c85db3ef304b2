use std::io;

use anyhow::Result;
use clap::Parser;
use log::info;

use pbs_template::cli::{run, Args};

fn main() -> Result<()> {
    env_logger::init();
    info!("terve! starting up :)");

    let args = Args::parse();
    run(args, &mut io::stdout().lock())
}
