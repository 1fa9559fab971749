//! Detection of credentials that repeat the same site and username

use std::collections::HashSet;

use crate::api::types::Credential;

/// Normalized identity used to detect duplicates.
fn identity(cred: &Credential) -> (String, String) {
    (
        cred.site.trim().to_lowercase(),
        cred.username.trim().to_lowercase(),
    )
}

/// Returns every credential whose (site, username) pair already appeared
/// earlier in `list`. The first occurrence of each pair is kept and never
/// reported.
///
/// # Examples
///
/// ```
/// use securepass::api::Credential;
/// use securepass::vault::duplicates::find_duplicates;
///
/// let list = vec![
///     Credential::new("github.com", "alice", None),
///     Credential::new(" GitHub.com ", "Alice", None),
///     Credential::new("gitlab.com", "alice", None),
/// ];
/// let dupes = find_duplicates(&list);
/// assert_eq!(dupes.len(), 1);
/// assert_eq!(dupes[0].site, " GitHub.com ");
/// ```
pub fn find_duplicates(list: &[Credential]) -> Vec<&Credential> {
    let mut seen = HashSet::with_capacity(list.len());
    list.iter().filter(|c| !seen.insert(identity(c))).collect()
}

/// Outcome of a duplicate sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupeReport {
    /// Ids that were deleted
    pub removed: Vec<i64>,
    /// Ids whose deletion failed, with the error message
    pub failed: Vec<(i64, String)>,
}

impl DedupeReport {
    /// Human-readable one-line summary.
    pub fn summary(&self) -> String {
        match (self.removed.len(), self.failed.len()) {
            (0, 0) => "No duplicates found".to_string(),
            (n, 0) => format!("Removed {} duplicate{}", n, if n == 1 { "" } else { "s" }),
            (n, f) => format!("Removed {} duplicates; {} could not be removed", n, f),
        }
    }
}
