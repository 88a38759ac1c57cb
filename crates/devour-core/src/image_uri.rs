//! Image URI resolution for token artwork

use crate::token::DEFAULT_TOKEN_ICON;

pub const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";
pub const ARWEAVE_GATEWAY: &str = "https://arweave.net/";

/// Length of a CIDv0 hash (`Qm...`)
const IPFS_V0_HASH_LEN: usize = 46;

/// Rewrite an image URI into something a renderer can fetch directly.
///
/// Rules are checked in order: empty input, inline `data:` URIs, `ipfs://`,
/// existing IPFS gateway URLs, `ar://`, bare CIDv0 hashes. Anything else is
/// returned unchanged. The function is idempotent.
pub fn resolve_image_uri(uri: &str) -> String {
    if uri.is_empty() {
        return DEFAULT_TOKEN_ICON.to_string();
    }

    if uri.starts_with("data:") {
        return uri.to_string();
    }

    if let Some(hash) = uri.strip_prefix("ipfs://") {
        return format!("{IPFS_GATEWAY}{hash}");
    }

    if uri.contains("ipfs.io/ipfs/") {
        return uri.to_string();
    }

    if let Some(hash) = uri.strip_prefix("ar://") {
        return format!("{ARWEAVE_GATEWAY}{hash}");
    }

    if uri.starts_with("Qm") && uri.len() == IPFS_V0_HASH_LEN {
        return format!("{IPFS_GATEWAY}{uri}");
    }

    uri.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    #[test]
    fn test_empty_uses_default_icon() {
        assert_eq!(resolve_image_uri(""), DEFAULT_TOKEN_ICON);
    }

    #[test]
    fn test_data_uri_passthrough() {
        let uri = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(resolve_image_uri(uri), uri);
    }

    #[test]
    fn test_ipfs_scheme() {
        assert_eq!(
            resolve_image_uri("ipfs://bafybeigdyrzt/image.png"),
            "https://ipfs.io/ipfs/bafybeigdyrzt/image.png"
        );
    }

    #[test]
    fn test_arweave_scheme() {
        assert_eq!(
            resolve_image_uri("ar://Qx7Kd9-abc"),
            "https://arweave.net/Qx7Kd9-abc"
        );
    }

    #[test]
    fn test_bare_cid_v0() {
        assert_eq!(CID.len(), 46);
        assert_eq!(resolve_image_uri(CID), format!("https://ipfs.io/ipfs/{CID}"));
    }

    #[test]
    fn test_qm_prefix_with_wrong_length_is_untouched() {
        assert_eq!(resolve_image_uri("QmShort"), "QmShort");
    }

    #[test]
    fn test_gateway_url_idempotent() {
        let url = format!("https://ipfs.io/ipfs/{CID}");
        assert_eq!(resolve_image_uri(&url), url);
        let once = resolve_image_uri(&format!("ipfs://{CID}"));
        assert_eq!(resolve_image_uri(&once), once);
    }

    #[test]
    fn test_http_passthrough() {
        let url = "https://cdn.example.com/token.png";
        assert_eq!(resolve_image_uri(url), url);
    }

    proptest! {
        #[test]
        fn prop_resolution_is_idempotent(uri in "(ipfs://|ar://|https://|data:|Qm)?[A-Za-z0-9/._-]{0,60}") {
            let once = resolve_image_uri(&uri);
            prop_assert_eq!(resolve_image_uri(&once), once);
        }
    }
}
