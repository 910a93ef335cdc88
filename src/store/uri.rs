use crate::error::{PluginError, PluginResult};

pub const MONGODB_SCHEME: &str = "mongodb";
pub const MONGODB_SRV_SCHEME: &str = "mongodb+srv";

/// Turn the configured server address into a MongoDB connection URI.
///
/// Addresses that already use the MongoDB scheme pass through unchanged apart
/// from a lowercased scheme. Bare addresses (`host`, `host:port`,
/// `user:pass@host:port`, host lists) get the `mongodb://` prefix. Any other
/// scheme is rejected.
pub fn normalize_server_uri(address: &str) -> PluginResult<String> {
    let address = address.trim();

    if address.is_empty() {
        return Err(PluginError::InvalidAddress(String::from("empty address")));
    }

    match address.split_once("://") {
        Some((scheme, rest))
            if scheme.eq_ignore_ascii_case(MONGODB_SCHEME)
                || scheme.eq_ignore_ascii_case(MONGODB_SRV_SCHEME) =>
        {
            Ok(format!("{}://{rest}", scheme.to_ascii_lowercase()))
        }
        Some((scheme, _)) => Err(PluginError::InvalidAddress(format!(
            "unsupported scheme `{scheme}` in {}",
            redact_credentials(address)
        ))),
        None => Ok(format!("{MONGODB_SCHEME}://{address}")),
    }
}

/// Replace the `user:password@` part of an address with `***@`.
///
/// Used wherever an address ends up in logs or error messages.
pub fn redact_credentials(address: &str) -> String {
    let (scheme, rest) = match address.split_once("://") {
        Some((scheme, rest)) => (Some(scheme), rest),
        None => (None, address),
    };

    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    let rest = match authority.rsplit_once('@') {
        Some((_, hosts)) => format!("***@{hosts}{tail}"),
        None => rest.to_string(),
    };

    match scheme {
        Some(scheme) => format!("{scheme}://{rest}"),
        None => rest,
    }
}
