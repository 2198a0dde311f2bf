//! Command implementations for the usbmatch binary.

use std::process::ExitCode;

use anyhow::{Context, Result, bail};

use crate::bus::{self, SystemBus};
use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::legacy;
use crate::matcher::{Backend, DeviceMatcher, LegacyMatcher, MatchOutcome, ObjectTreeMatcher};
use crate::output::Output;
use crate::property;
use crate::tree::{ObjectTreeSource, Udisks2Tree};
use crate::volume;

/// Exit status when nothing matched.
pub const NO_MATCH: u8 = 1;

pub fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.resolve_config()?;
    tracing::debug!(backend = %config.backend, device = ?config.device, "Configuration resolved");

    match &cli.command {
        Commands::Check => check(&config),
        Commands::List => list(&config),
        Commands::Get { device, property } => get(device, property),
        Commands::Volume => show_volume(&config),
    }
}

/// Run `f` against a fresh system bus connection.
fn with_bus<R>(f: impl FnOnce(&SystemBus) -> Result<R>) -> Result<R> {
    let bus = bus::connect()?;
    let result = f(&bus);
    bus::disconnect(bus);
    result
}

fn check(config: &Config) -> Result<ExitCode> {
    let constraints = config.device.constraints(config.backend);
    if constraints.required().next().is_none() {
        bail!(
            "No device properties to match\n\n\
             Set vendor, model or serial in the config file, \
             or pass --vendor/--model/--serial"
        );
    }

    let outcome = match config.backend {
        Backend::Udisks1 => {
            with_bus(|bus| Ok(LegacyMatcher::new(bus).match_device(&constraints)?))?
        }
        Backend::Udisks2 => ObjectTreeMatcher::new(Udisks2Tree).match_device(&constraints)?,
    };

    match outcome {
        MatchOutcome::Device(udi) => {
            Output::success(format!("Device matched: {udi}"));
            Ok(ExitCode::SUCCESS)
        }
        MatchOutcome::Present => {
            Output::success("Device present");
            Ok(ExitCode::SUCCESS)
        }
        MatchOutcome::NoMatch => {
            Output::warning(format!("No device matches {constraints}"));
            Ok(ExitCode::from(NO_MATCH))
        }
    }
}

fn list(config: &Config) -> Result<ExitCode> {
    let paths = match config.backend {
        Backend::Udisks1 => with_bus(|bus| {
            Ok(legacy::find_all_items(bus)?
                .map(|devices| devices.into_vec())
                .unwrap_or_default())
        })?,
        Backend::Udisks2 => Udisks2Tree
            .snapshot()?
            .into_iter()
            .map(|object| object.path)
            .collect(),
    };

    if paths.is_empty() {
        Output::warning("No devices reported");
        return Ok(ExitCode::from(NO_MATCH));
    }
    for path in &paths {
        Output::list_item(path);
    }
    Ok(ExitCode::SUCCESS)
}

fn get(device: &str, name: &str) -> Result<ExitCode> {
    let value = with_bus(|bus| {
        property::get_string_property(bus, device, name)
            .with_context(|| format!("Failed to read {name} of {device}"))
    })?;

    match value {
        Some(value) => {
            println!("{value}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            Output::warning(format!("{device} has no string property {name}"));
            Ok(ExitCode::from(NO_MATCH))
        }
    }
}

fn show_volume(config: &Config) -> Result<ExitCode> {
    let Some(uuid) = config.device.volume_uuid.as_deref().filter(|u| !u.is_empty()) else {
        bail!(
            "No volume UUID configured\n\n\
             Set device.volume_uuid in the config file, or pass --uuid"
        );
    };

    match with_bus(|bus| Ok(volume::probe_volume(bus, uuid)?))? {
        Some(volume) => {
            Output::success(format!("Volume {uuid}"));
            Output::kv("Device", &volume.udi);
            Output::kv("Mounted", if volume.is_mounted { "yes" } else { "no" });
            match volume.mount_point() {
                Some(path) => Output::kv("Mount point", path),
                None => Output::hint("Mount the volume to use it for one-time pads"),
            }
            Ok(ExitCode::SUCCESS)
        }
        None => {
            Output::warning(format!("No volume with UUID {uuid}"));
            Ok(ExitCode::from(NO_MATCH))
        }
    }
}
