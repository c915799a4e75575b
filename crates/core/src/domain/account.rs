use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Accounts monitored when `TRACKED_ACCOUNTS` is not set, in check order.
pub const DEFAULT_ACCOUNTS: [(&str, &str); 12] = [
    ("justsaurabh1103", "Saurabh Tiwari"),
    ("TheDustyBC", "DustyBC Crypto"),
    ("Trader_Jibon", "Trader_J"),
    ("cryptocevo", "Cevo"),
    ("WhalePanda", "WhalePanda"),
    ("loomdart", "Loomdart"),
    ("KoroushAK", "Koroush AK"),
    ("Tradermayne", "Mayne"),
    ("AltcoinGordon", "Gordon"),
    ("Trader_XO", "XO"),
    ("CryptoWizardd", "WIZZ"),
    ("MartiniGuyYT", "That Martini Guy ₿"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAccount {
    pub handle: String,
    pub display_name: String,
}

impl TrackedAccount {
    pub fn new(handle: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            display_name: display_name.into(),
        }
    }
}

/// Parses `handle:Display Name` pairs separated by commas.
///
/// A pair without a display name uses the handle for both. Handles must be
/// unique; the input order is kept.
pub fn parse_accounts(raw: &str) -> anyhow::Result<Vec<TrackedAccount>> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();

    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (handle, name) = match part.split_once(':') {
            Some((h, n)) => (h.trim(), n.trim()),
            None => (part, part),
        };
        let handle = handle.trim_start_matches('@');
        ensure!(!handle.is_empty(), "account handle must be non-empty in {part:?}");
        let name = if name.is_empty() { handle } else { name };

        ensure!(
            seen.insert(handle.to_ascii_lowercase()),
            "duplicate account handle: {handle}"
        );
        out.push(TrackedAccount::new(handle, name));
    }

    ensure!(!out.is_empty(), "at least one account is required");
    Ok(out)
}

/// Keeps only the accounts whose handle appears in `handles` (case-insensitive).
pub fn restrict_to(accounts: &[TrackedAccount], handles: &[String]) -> anyhow::Result<Vec<TrackedAccount>> {
    if handles.is_empty() {
        return Ok(accounts.to_vec());
    }

    let mut out = Vec::with_capacity(handles.len());
    for wanted in handles {
        let wanted = wanted.trim_start_matches('@');
        let account = accounts
            .iter()
            .find(|a| a.handle.eq_ignore_ascii_case(wanted))
            .with_context(|| format!("account @{wanted} is not tracked"))?;
        out.push(account.clone());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_in_order() {
        let accounts = parse_accounts("alice:Alice A, @bob:Bob ,carol").unwrap();
        assert_eq!(
            accounts,
            vec![
                TrackedAccount::new("alice", "Alice A"),
                TrackedAccount::new("bob", "Bob"),
                TrackedAccount::new("carol", "carol"),
            ]
        );
    }

    #[test]
    fn rejects_duplicate_handles() {
        assert!(parse_accounts("alice:A,ALICE:B").is_err());
    }

    #[test]
    fn rejects_empty_list() {
        assert!(parse_accounts(" , ").is_err());
    }

    #[test]
    fn default_handles_are_unique() {
        let joined = DEFAULT_ACCOUNTS
            .iter()
            .map(|(h, n)| format!("{h}:{n}"))
            .collect::<Vec<_>>()
            .join(",");
        assert_eq!(parse_accounts(&joined).unwrap().len(), DEFAULT_ACCOUNTS.len());
    }

    #[test]
    fn restrict_keeps_requested_order() {
        let all = parse_accounts("alice:A,bob:B,carol:C").unwrap();
        let picked = restrict_to(&all, &["Carol".to_string(), "@alice".to_string()]).unwrap();
        assert_eq!(picked[0].handle, "carol");
        assert_eq!(picked[1].handle, "alice");
        assert!(restrict_to(&all, &["dave".to_string()]).is_err());
    }
}
