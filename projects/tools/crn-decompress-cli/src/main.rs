#![allow(unexpected_cfgs)]
#![cfg(not(tarpaulin_include))]

mod commands;
mod dds;
mod error;
mod util;
use argh::FromArgs;
use core::error::Error;

#[derive(FromArgs, Debug)]
/// Inspection and conversion tool for crunch (.crn) textures
struct TopLevel {
    #[argh(subcommand)]
    command: Commands,
}

#[derive(FromArgs, Debug)]
#[argh(subcommand)]
enum Commands {
    Info(commands::info::InfoCmd),
    Validate(commands::validate::ValidateCmd),
    Unpack(commands::unpack::UnpackCmd),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli: TopLevel = argh::from_env();

    match cli.command {
        Commands::Info(cmd) => {
            commands::info::handle_info_command(cmd)?;
        }
        Commands::Validate(cmd) => {
            commands::validate::handle_validate_command(cmd)?;
        }
        Commands::Unpack(cmd) => {
            commands::unpack::handle_unpack_command(cmd)?;
        }
    }

    Ok(())
}
