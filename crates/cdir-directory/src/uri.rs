//! Extraction of the DFSP identity from a routing record's replacement URI.
//!
//! A record's `regexp.replace` looks like `mm:001.002@mojaloop.org`: the
//! credential part of the URI is `<scheme_identifier>.<dfsp_scheme_identifier>`.

/// Scheme and DFSP identifiers carried in a replacement URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DfspCredential {
    pub scheme_identifier: String,
    pub dfsp_scheme_identifier: String,
}

/// Parse the credential out of `uri`.
///
/// Returns `None` when the URI has no scheme, no credential part, or a
/// credential that is not exactly two non-empty dot-separated parts.
pub fn parse_dfsp_credential(uri: &str) -> Option<DfspCredential> {
    let (scheme, rest) = uri.split_once(':')?;
    if !is_valid_scheme(scheme) {
        return None;
    }

    let rest = rest.strip_prefix("//").unwrap_or(rest);
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    let (credential, _host) = authority.rsplit_once('@')?;

    let (scheme_identifier, dfsp_scheme_identifier) = credential.split_once('.')?;
    if scheme_identifier.is_empty()
        || dfsp_scheme_identifier.is_empty()
        || dfsp_scheme_identifier.contains('.')
    {
        return None;
    }

    Some(DfspCredential {
        scheme_identifier: scheme_identifier.to_string(),
        dfsp_scheme_identifier: dfsp_scheme_identifier.to_string(),
    })
}

fn is_valid_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
