use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::validation::{parse_positive_u64, resolve_under_root};

/// PlatformIO environment flashed when `--env` is not given.
pub const DEFAULT_PIO_ENV: &str = "esp32-s3-dev";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "ccflash",
    about = "Build WebUI + firmware and flash to ESP32 via PlatformIO.",
    version
)]
pub struct Cli {
    #[arg(
        long,
        default_value = DEFAULT_PIO_ENV,
        value_name = "ENV",
        help = "PlatformIO environment to use"
    )]
    pub env: String,

    #[arg(
        long = "skip-npm-install",
        help = "Skip `npm install` in the web UI directory (assumes dependencies already installed)."
    )]
    pub skip_npm_install: bool,

    #[arg(
        long = "project-root",
        default_value = ".",
        value_name = "DIR",
        help = "Firmware project root containing platformio.ini, webui/ and data/"
    )]
    pub project_root: PathBuf,

    #[arg(
        long = "webui-dir",
        default_value = "webui",
        value_name = "DIR",
        help = "Web UI project directory, relative to --project-root unless absolute"
    )]
    pub webui_dir: PathBuf,

    #[arg(
        long = "data-dir",
        default_value = "data",
        value_name = "DIR",
        help = "Filesystem image directory holding user_settings*.json, relative to --project-root unless absolute"
    )]
    pub data_dir: PathBuf,

    #[arg(
        long = "command-timeout-secs",
        value_name = "SECS",
        value_parser = parse_positive_u64,
        help = "Kill any external command that runs longer than this many seconds (default: wait indefinitely)"
    )]
    pub command_timeout_secs: Option<u64>,
}

impl Cli {
    pub fn webui_path(&self) -> PathBuf {
        resolve_under_root(&self.project_root, &self.webui_dir)
    }

    pub fn data_path(&self) -> PathBuf {
        resolve_under_root(&self.project_root, &self.data_dir)
    }

    pub fn project_root_path(&self) -> &Path {
        &self.project_root
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}
