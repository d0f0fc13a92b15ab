use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "lvpngui-install")]
#[command(version, about = "Install, verify and remove the LVPNGUI client bundle")]
pub struct Args {
    /// Provider configuration (TOML); defaults to provider.toml beside the executable
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Bundle architecture (64, 32, x86_64, i386, ...); detected when omitted
    #[arg(long, global = true)]
    pub arch: Option<String>,

    /// Base directory replacing the per-user application-data directory
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Asset bundle directory (bin64/, bin32/, schtasks_template.xml)
    #[arg(long, global = true)]
    pub bundle: Option<PathBuf>,

    /// Never prompt: skip the shortcut and do not retry a locked executable
    #[arg(long, global = true)]
    pub no_interaction: bool,

    /// Sub‑commands (ensure if omitted)
    #[command(subcommand)]
    pub sub: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Verify the installation and install if needed (default)
    Ensure,
    /// Verify the installation (Exit 0 = installed, 1 = not installed)
    Status,
    /// Install or upgrade unconditionally
    Install,
    /// Remove the installation directory
    Uninstall,
    /// Enable or disable the logon scheduled task
    StartOnBoot {
        #[arg(action = ArgAction::Set)]
        enabled: bool,
    },
}
