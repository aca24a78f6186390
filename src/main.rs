mod anim;
mod app;
mod canvas;
mod config;
mod input;
mod logging;
mod model;
mod ripple;
mod term;
mod view;
mod wave;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = config::Args::parse();
    logging::init(args.log_file.as_deref())?;
    app::run(args)
}
