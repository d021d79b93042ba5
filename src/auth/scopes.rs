//! Scope strings for the Transfer API.
//!
//! Data access to a collection has to be requested up front as a dependent scope of
//! the transfer scope. The identity provider hands out one token bundling every
//! requested grant, and a transfer touching a collection whose `data_access` scope was
//! not requested is later refused with a consent-required error.

/// Scope granting access to the Transfer API.
pub const TRANSFER_ALL: &str = "urn:globus:auth:scope:transfer.api.globus.org:all";

/// Prefix of collection-specific scopes.
pub const AUTH_SCOPES_BASE: &str = "https://auth.globus.org/scopes";

/// Builds the transfer scope with a `data_access` clause for one collection.
pub fn data_access_scope(collection_id: &str) -> String {
    format!(
        "{}[*{}/{}/data_access]",
        TRANSFER_ALL, AUTH_SCOPES_BASE, collection_id
    )
}

/// Composes the scopes needed to transfer between the given collections.
///
/// Emits one scope per non-empty id, in input order; empty ids are skipped and
/// duplicates are kept. With no usable id the bare [`TRANSFER_ALL`] scope is returned,
/// which is enough for listing and monitoring.
///
/// ```
/// use integrations_globus_transfer::auth::scopes::compose_transfer_scopes;
///
/// let scopes = compose_transfer_scopes(["abc", "", "def"]);
/// assert_eq!(scopes.len(), 2);
/// assert!(scopes[0].ends_with("[*https://auth.globus.org/scopes/abc/data_access]"));
/// ```
pub fn compose_transfer_scopes<I, S>(collection_ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let scopes: Vec<String> = collection_ids
        .into_iter()
        .filter(|id| !id.as_ref().is_empty())
        .map(|id| data_access_scope(id.as_ref()))
        .collect();

    if scopes.is_empty() {
        vec![TRANSFER_ALL.to_string()]
    } else {
        scopes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_clause_per_collection_in_order() {
        let scopes = compose_transfer_scopes(["src-id", "dst-id"]);
        assert_eq!(
            scopes,
            vec![
                "urn:globus:auth:scope:transfer.api.globus.org:all[*https://auth.globus.org/scopes/src-id/data_access]",
                "urn:globus:auth:scope:transfer.api.globus.org:all[*https://auth.globus.org/scopes/dst-id/data_access]",
            ]
        );
    }

    #[test]
    fn test_empty_ids_skipped() {
        let scopes = compose_transfer_scopes(["", "src-id", ""]);
        assert_eq!(scopes, vec![data_access_scope("src-id")]);
    }

    #[test]
    fn test_duplicates_kept() {
        let scopes = compose_transfer_scopes(vec!["same".to_string(), "same".to_string()]);
        assert_eq!(scopes.len(), 2);
        assert_eq!(scopes[0], scopes[1]);
    }

    #[test]
    fn test_idempotent() {
        let ids = ["a", "", "b"];
        assert_eq!(compose_transfer_scopes(ids), compose_transfer_scopes(ids));
    }

    #[test]
    fn test_no_usable_ids_falls_back_to_transfer_scope() {
        assert_eq!(compose_transfer_scopes(["", ""]), vec![TRANSFER_ALL.to_string()]);
        assert_eq!(
            compose_transfer_scopes(Vec::<String>::new()),
            vec![TRANSFER_ALL.to_string()]
        );
    }
}
