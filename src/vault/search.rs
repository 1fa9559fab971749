//! Client-side filtering and summary counts over a snapshot

use crate::api::types::Credential;
use crate::password::is_strong_password;

/// Filter applied to the credential list before display.
#[derive(Debug, Clone, Default)]
pub struct CredentialFilter {
    /// Case-insensitive substring matched against site and username
    pub query: Option<String>,
    /// Keep only credentials whose password fails the strength rule
    pub weak_only: bool,
}

impl CredentialFilter {
    /// Whether `cred` passes this filter.
    pub fn matches(&self, cred: &Credential) -> bool {
        if self.weak_only && !is_weak(cred) {
            return false;
        }
        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let q = q.to_lowercase();
                cred.site.to_lowercase().contains(&q) || cred.username.to_lowercase().contains(&q)
            }
        }
    }

    /// Applies the filter, preserving order.
    pub fn apply<'a>(&self, list: &'a [Credential]) -> Vec<&'a Credential> {
        list.iter().filter(|c| self.matches(c)).collect()
    }
}

/// A credential is weak when it has a password that fails the strength rule.
fn is_weak(cred: &Credential) -> bool {
    cred.password
        .as_deref()
        .is_some_and(|p| !is_strong_password(p))
}

/// Summary counts for the list header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaultStats {
    pub total: usize,
    pub strong: usize,
    pub weak: usize,
}

impl VaultStats {
    /// Counts strong and weak passwords. Entries without a password count
    /// toward the total only.
    pub fn of(list: &[Credential]) -> Self {
        list.iter().fold(Self::default(), |mut stats, cred| {
            stats.total += 1;
            match cred.password.as_deref() {
                Some(p) if is_strong_password(p) => stats.strong += 1,
                Some(_) => stats.weak += 1,
                None => {}
            }
            stats
        })
    }
}
