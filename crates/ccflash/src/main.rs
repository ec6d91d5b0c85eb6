mod bootstrap_helpers;
mod flash_error;
mod pipeline;
mod tool_host;

use ccflash_cli::Cli;
use clap::Parser;

use crate::bootstrap_helpers::init_tracing;
use crate::pipeline::{run_flash_pipeline, FlashPipelineConfig};
use crate::tool_host::SystemToolHost;

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let config = FlashPipelineConfig::from_cli(&cli);
    let mut host = SystemToolHost::new(cli.command_timeout());

    if let Err(error) = run_flash_pipeline(&config, &mut host) {
        eprintln!("\nERROR: {error}");
        std::process::exit(error.exit_code());
    }
}
