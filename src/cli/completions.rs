use crate::cli::args::Cli;
use crate::utils::errors::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io;

pub fn handle_completion_command(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "certship", &mut io::stdout());
    Ok(())
}
