//! Address list and blacklist loading.

use crate::domain::Address;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid address list: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct AddressListFile {
    #[serde(default)]
    data: AddressListData,
}

#[derive(Debug, Default, Deserialize)]
struct AddressListData {
    #[serde(default)]
    trades: Vec<AddressListEntry>,
}

#[derive(Debug, Deserialize)]
struct AddressListEntry {
    address: Option<String>,
}

/// Parse `{"data":{"trades":[{"address":"0x.."}]}}`, keeping input order.
///
/// Entries without a valid address are skipped with a warning.
pub fn parse_address_list(content: &str) -> Result<Vec<Address>, WatchlistError> {
    let file: AddressListFile = serde_json::from_str(content)?;
    let mut addresses = Vec::with_capacity(file.data.trades.len());

    for (idx, entry) in file.data.trades.into_iter().enumerate() {
        match entry.address.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(raw) => match Address::from_str(raw) {
                Ok(addr) => addresses.push(addr),
                Err(e) => warn!(index = idx, error = %e, "Skipping invalid address"),
            },
            None => warn!(index = idx, "Skipping entry without address"),
        }
    }

    Ok(addresses)
}

pub fn load_address_list(path: impl AsRef<Path>) -> Result<Vec<Address>, WatchlistError> {
    parse_address_list(&read(path.as_ref())?)
}

/// Addresses excluded from screening.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    entries: HashSet<String>,
}

impl Blacklist {
    pub fn empty() -> Self {
        Self::default()
    }

    /// One address per line; blank lines ignored; matching is case-insensitive.
    pub fn parse(content: &str) -> Self {
        Self {
            entries: content
                .lines()
                .map(|line| line.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WatchlistError> {
        Ok(Self::parse(&read(path.as_ref())?))
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.entries.contains(&address.as_str().to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read(path: &Path) -> Result<String, WatchlistError> {
    std::fs::read_to_string(path).map_err(|source| WatchlistError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const A1: &str = "0x0000000000000000000000000000000000000001";
    const A2: &str = "0x0000000000000000000000000000000000000002";

    #[test]
    fn test_parse_address_list_skips_missing_and_invalid() {
        let content = format!(
            r#"{{"data":{{"trades":[{{"address":"{}"}},{{"volume":1}},{{"address":"nope"}},{{"address":"{}"}}]}}}}"#,
            A1, A2
        );
        let addresses = parse_address_list(&content).unwrap();
        assert_eq!(addresses, vec![Address::new(A1.to_string()), Address::new(A2.to_string())]);
    }

    #[test]
    fn test_parse_address_list_missing_data_is_empty() {
        assert!(parse_address_list("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_address_list_invalid_json() {
        assert!(matches!(
            parse_address_list("not json"),
            Err(WatchlistError::Parse(_))
        ));
    }

    #[test]
    fn test_blacklist_case_insensitive() {
        let blacklist = Blacklist::parse("\n  0xABCDEF0000000000000000000000000000000001  \n\n");
        assert_eq!(blacklist.len(), 1);
        assert!(blacklist.contains(&Address::new(
            "0xabcdef0000000000000000000000000000000001".to_string()
        )));
        assert!(!blacklist.contains(&Address::new(A2.to_string())));
    }

    #[test]
    fn test_load_from_files() {
        let mut list = tempfile::NamedTempFile::new().unwrap();
        write!(list, r#"{{"data":{{"trades":[{{"address":"{}"}}]}}}}"#, A1).unwrap();
        let mut black = tempfile::NamedTempFile::new().unwrap();
        writeln!(black, "{}", A1).unwrap();

        let addresses = load_address_list(list.path()).unwrap();
        let blacklist = Blacklist::load(black.path()).unwrap();
        assert_eq!(addresses.len(), 1);
        assert!(blacklist.contains(&addresses[0]));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Blacklist::load("/nonexistent/blacklist.txt").unwrap_err();
        assert!(matches!(err, WatchlistError::Io { .. }));
    }
}
