//! PKCE (RFC 7636) challenge derivation and verification.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Derive the `S256` code challenge for a given verifier:
/// `BASE64URL(SHA256(verifier))`, no padding.
pub fn derive_s256_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Verify `verifier` against a previously stored `challenge`/`method` pair.
/// `plain` is accepted only because some older clients still send it; RFC
/// 7636 recommends servers support it as a fallback, not as a preference.
pub fn verify(verifier: &str, challenge: &str, method: &str) -> bool {
    match method {
        "S256" => {
            let derived = derive_s256_challenge(verifier);
            subtle::ConstantTimeEq::ct_eq(derived.as_bytes(), challenge.as_bytes()).into()
        }
        "plain" => subtle::ConstantTimeEq::ct_eq(verifier.as_bytes(), challenge.as_bytes()).into(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s256_matches_known_vector() {
        // RFC 7636 appendix B vector.
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
        assert_eq!(derive_s256_challenge(verifier), challenge);
        assert!(verify(verifier, challenge, "S256"));
    }

    #[test]
    fn mismatched_verifier_fails() {
        assert!(!verify("wrong-verifier", "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM", "S256"));
    }

    #[test]
    fn unknown_method_always_fails() {
        assert!(!verify("v", "v", "unknown"));
    }
}
