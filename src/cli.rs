//! CLI argument definitions for usbmatch.
//!
//! Kept apart from `main.rs` so the configuration merge can be tested from
//! the library.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::device::DeviceDefinition;
use crate::matcher::Backend;

#[derive(Debug, Parser)]
#[command(name = "usbmatch")]
#[command(about = "Match attached storage devices against identifying properties")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(long, short = 'c', global = true, env = "USBMATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Daemon generation to query
    ///
    /// - udisks1: flat EnumerateDevices interface, reports the device path
    /// - udisks2: object manager tree, reports presence only
    #[arg(long, value_enum, global = true)]
    pub backend: Option<Backend>,

    /// Drive vendor to match
    #[arg(long, global = true)]
    pub vendor: Option<String>,

    /// Drive model to match
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Drive serial number to match
    #[arg(long, global = true)]
    pub serial: Option<String>,

    /// Volume filesystem UUID
    #[arg(long, global = true)]
    pub uuid: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check whether a device with the configured properties is attached
    ///
    /// Exits 0 on a match, 1 when no device matches, 2 on error.
    Check,

    /// List the object paths the daemon knows about
    List,

    /// Read one string property of a UDisks1 device
    Get {
        /// Device object path
        device: String,

        /// Property name (e.g. DriveSerial)
        property: String,
    },

    /// Show the UDisks1 volume with the configured UUID and its mount state
    Volume,
}

impl Cli {
    /// Configuration from the file (if any) with command-line overrides.
    pub fn resolve_config(&self) -> Result<Config> {
        let mut config = Config::load_or_default(self.config.as_deref())?;
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        config.device = config.device.merged_with(DeviceDefinition {
            vendor: self.vendor.clone(),
            model: self.model.clone(),
            serial: self.serial.clone(),
            volume_uuid: self.uuid.clone(),
        });
        Ok(config)
    }
}
