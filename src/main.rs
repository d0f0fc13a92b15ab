mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use lvpngui_installer::install::{Arch, BundleDir, ConsolePrompter, NonInteractive};
use lvpngui_installer::{AppConfig, Installer};

fn main() {
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match real_main() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn real_main() -> Result<i32> {
    let args = cli::Args::parse();
    let installer = build_installer(&args)?;

    match args.sub.unwrap_or(cli::Cmd::Ensure) {
        cli::Cmd::Ensure => {
            if installer.ensure_installed().context("Installation failed")? {
                println!("{} is now installed", installer.config().display_name);
            } else {
                println!("{} is installed", installer.config().display_name);
            }
            Ok(0)
        }
        cli::Cmd::Status => {
            if installer.is_installed() {
                println!("installed at {}", installer.root().display());
                Ok(0)
            } else {
                println!("not installed");
                Ok(1)
            }
        }
        cli::Cmd::Install => {
            installer.install().context("Installation failed")?;
            println!("{} is now installed", installer.config().display_name);
            Ok(0)
        }
        cli::Cmd::Uninstall => {
            let report = installer.uninstall();
            for path in &report.deferred {
                println!("will be removed at next reboot: {}", path.display());
            }
            for path in &report.left_behind {
                println!("could not remove: {}", path.display());
            }
            Ok(if report.left_behind.is_empty() { 0 } else { 1 })
        }
        cli::Cmd::StartOnBoot { enabled } => {
            let ok = installer
                .set_start_on_boot(enabled)
                .context("Failed to update start-on-boot task")?;
            Ok(if ok { 0 } else { 1 })
        }
    }
}

fn build_installer(args: &cli::Args) -> Result<Installer> {
    let exe = std::env::current_exe().context("Failed to locate running executable")?;
    let exe_dir = exe.parent();

    let config = AppConfig::load(args.config.as_deref(), exe_dir)
        .context("Failed to load provider configuration")?;

    let mut builder = Installer::builder(config.clone()).current_exe(&exe);

    if let Some(arch) = &args.arch {
        builder = builder.arch(arch.parse::<Arch>()?);
    }
    if let Some(base) = &args.base_dir {
        builder = builder.base_dir(base);
    }

    let bundle = args
        .bundle
        .clone()
        .unwrap_or_else(|| config.resolve_bundle_dir(exe_dir));
    let assets = BundleDir::new(bundle);
    info!("Using asset bundle at {}", assets.root().display());
    builder = builder.assets(assets);

    builder = if args.no_interaction {
        builder.prompter(NonInteractive)
    } else {
        builder.prompter(ConsolePrompter)
    };

    builder.build().context("Failed to initialise installer")
}
