use anyhow::Result;
use clap::Parser;

use calltrace::{cli::CalltraceCli, helpers::Logger};

fn main() -> Result<()> {
    let cli = CalltraceCli::parse();
    Logger::init(cli.main_config.level_filter()?)?;

    cli.run()
}
