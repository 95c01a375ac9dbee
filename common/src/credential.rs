//! # Credentials
//!
//! A [`CredentialList`] is the ranked, immutable set of username/password pairs a
//! discovery run tries against every reachable controller. Lower rank is tried first.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub rank: u32,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>, rank: u32) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            rank,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("rank", &self.rank)
            .finish()
    }
}

/// Credentials ordered by rank. Ties keep their input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialList {
    ranked: Vec<Credential>,
}

impl CredentialList {
    pub fn new(mut credentials: Vec<Credential>) -> Self {
        credentials.sort_by_key(|credential| credential.rank);
        Self {
            ranked: credentials,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Credential> {
        self.ranked.iter()
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }
}

impl FromIterator<Credential> for CredentialList {
    fn from_iter<T: IntoIterator<Item = Credential>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a CredentialList {
    type Item = &'a Credential;
    type IntoIter = std::slice::Iter<'a, Credential>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
