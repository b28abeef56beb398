//! Default User-Agent for tile requests.
//!
//! Public tile servers (OpenStreetMap in particular) require a User-Agent that
//! identifies the application; operators should add contact details with
//! `--user-agent`.

/// Product comment sent with the default User-Agent.
const UA_COMMENT: &str = "bulk-tile-fetcher";

/// Default User-Agent for tile requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_tile_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("tile-downloader/{version} ({UA_COMMENT})")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_carries_version_and_comment() {
        let ua = default_tile_user_agent();
        assert!(ua.contains(UA_COMMENT), "UA must contain comment: {ua}");
        assert_eq!(
            env!("CARGO_PKG_VERSION"),
            ua.strip_prefix("tile-downloader/")
                .and_then(|s| s.split(' ').next())
                .expect("UA has version"),
        );
    }
}
