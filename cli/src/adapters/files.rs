use std::fs;
use std::path::Path;

use anyhow::{Context, bail};
use serde::de::DeserializeOwned;

use bmcfleet_common::credential::{Credential, CredentialList};
use bmcfleet_common::fleet::FleetMember;

use super::lab::LabFixture;

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read {what} file '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a valid {what} file", path.display()))
}

/// A JSON array of `{username, password, rank}` objects.
pub fn load_credentials(path: &Path) -> anyhow::Result<CredentialList> {
    let credentials: Vec<Credential> = read_json(path, "credentials")?;
    if credentials.is_empty() {
        bail!("credentials file '{}' lists no credentials", path.display());
    }
    Ok(CredentialList::new(credentials))
}

/// A JSON array of fleet members.
pub fn load_inventory(path: &Path) -> anyhow::Result<Vec<FleetMember>> {
    read_json(path, "inventory")
}

pub fn load_lab(path: &Path) -> anyhow::Result<LabFixture> {
    read_json(path, "lab fixture")
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
