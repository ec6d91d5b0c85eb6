use std::path::PathBuf;

use ccflash_cli::Cli;
use ccflash_settings::{
    bootstrap_settings, merge_secrets_if_present, BootstrapOutcome, RestoreOutcome, SettingsPaths,
};

use crate::flash_error::FlashError;
use crate::tool_host::{ToolHost, ToolInvocation};

#[cfg(windows)]
pub(crate) const PACKAGE_MANAGER: &str = "npm.cmd";
#[cfg(not(windows))]
pub(crate) const PACKAGE_MANAGER: &str = "npm";

pub(crate) const TOOLCHAIN_CANDIDATES: [&str; 2] = ["pio", "platformio"];

const PACKAGE_MANAGER_HINT: &str = "Please install Node.js (which includes npm) and try again.";
const TOOLCHAIN_HINT: &str =
    "Install PlatformIO Core (pip install platformio) and/or add its Scripts directory to PATH.";

/// Ordered stages of one flash run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FlashStep {
    BootstrapSettings,
    BuildFrontend,
    MergeSecrets,
    UploadFilesystem,
    RestoreSettings,
    UploadFirmware,
}

impl FlashStep {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::BootstrapSettings => "bootstrap_settings",
            Self::BuildFrontend => "build_frontend",
            Self::MergeSecrets => "merge_secrets",
            Self::UploadFilesystem => "upload_filesystem",
            Self::RestoreSettings => "restore_settings",
            Self::UploadFirmware => "upload_firmware",
        }
    }
}

fn enter_step(step: FlashStep) {
    tracing::debug!(step = step.as_str(), "entering step");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlashPipelineConfig {
    pub(crate) pio_env: String,
    pub(crate) skip_npm_install: bool,
    pub(crate) project_root: PathBuf,
    pub(crate) webui_dir: PathBuf,
    pub(crate) data_dir: PathBuf,
}

impl FlashPipelineConfig {
    pub(crate) fn from_cli(cli: &Cli) -> Self {
        Self {
            pio_env: cli.env.clone(),
            skip_npm_install: cli.skip_npm_install,
            project_root: cli.project_root_path().to_path_buf(),
            webui_dir: cli.webui_path(),
            data_dir: cli.data_path(),
        }
    }
}

fn run_tool(host: &mut dyn ToolHost, invocation: ToolInvocation) -> Result<(), FlashError> {
    println!(
        "> {} (cwd={})",
        invocation.render(),
        invocation.cwd.display()
    );
    host.run(&invocation)
}

fn pio_target(config: &FlashPipelineConfig, pio: &std::path::Path, target: &str) -> ToolInvocation {
    ToolInvocation::new(
        pio,
        ["run", "-e", config.pio_env.as_str(), "-t", target],
        &config.project_root,
    )
}

/// Bootstraps settings, builds the web UI, then flashes filesystem and firmware.
///
/// Secrets merged into the settings document are restored right after the
/// filesystem upload, whether or not that upload succeeded.
pub(crate) fn run_flash_pipeline(
    config: &FlashPipelineConfig,
    host: &mut dyn ToolHost,
) -> Result<(), FlashError> {
    enter_step(FlashStep::BootstrapSettings);
    let paths = SettingsPaths::from_data_dir(&config.data_dir);
    if bootstrap_settings(&paths)? == BootstrapOutcome::Created {
        println!(
            "Created {} from template (no secrets).",
            paths.settings.display()
        );
    }

    enter_step(FlashStep::BuildFrontend);
    let npm = host
        .locate(&[PACKAGE_MANAGER])
        .ok_or_else(|| FlashError::MissingExecutable {
            summary: format!("`{PACKAGE_MANAGER}` is not on PATH."),
            hint: PACKAGE_MANAGER_HINT,
        })?;
    if !config.skip_npm_install {
        run_tool(host, ToolInvocation::new(&npm, ["install"], &config.webui_dir))?;
    }
    run_tool(
        host,
        ToolInvocation::new(&npm, ["run", "build"], &config.webui_dir),
    )?;

    let pio = host
        .locate(&TOOLCHAIN_CANDIDATES)
        .ok_or_else(|| FlashError::MissingExecutable {
            summary: "Neither `pio` nor `platformio` is on PATH.".to_string(),
            hint: TOOLCHAIN_HINT,
        })?;

    enter_step(FlashStep::MergeSecrets);
    let overlay = merge_secrets_if_present(&paths)?;
    if overlay.is_some() {
        println!(
            "Merged secrets into {} for this build (not committed).",
            paths.settings.display()
        );
    }

    enter_step(FlashStep::UploadFilesystem);
    let filesystem_upload = run_tool(host, pio_target(config, &pio, "uploadfs"));

    if let Some(overlay) = overlay {
        enter_step(FlashStep::RestoreSettings);
        match overlay.restore() {
            Ok(RestoreOutcome::Rewritten) => println!(
                "Restored original {} after filesystem upload.",
                paths.settings.display()
            ),
            Ok(RestoreOutcome::Removed) => println!(
                "Removed merged {} after filesystem upload.",
                paths.settings.display()
            ),
            Ok(RestoreOutcome::Skipped) => {}
            Err(error) if filesystem_upload.is_ok() => return Err(error.into()),
            Err(error) => tracing::warn!("{error:#}"),
        }
    }
    filesystem_upload?;

    enter_step(FlashStep::UploadFirmware);
    run_tool(host, pio_target(config, &pio, "upload"))?;

    println!("\nAll done. Firmware and filesystem have been flashed.");
    Ok(())
}
