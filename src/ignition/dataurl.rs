//! RFC 2397 `data:` URLs for inline file contents

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataUrlError {
    #[error("not a data URL")]
    Scheme,

    #[error("data URL has no ',' separator")]
    MissingSeparator,

    #[error("invalid percent escape at byte {0}")]
    Escape(usize),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

fn is_unescaped(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"-_.~!$&'()*+,;=:@/".contains(&b)
}

fn percent_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len());
    for &b in data {
        if is_unescaped(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    out
}

fn percent_decode(data: &str) -> Result<Vec<u8>, DataUrlError> {
    let bytes = data.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = data.get(i + 1..i + 3).ok_or(DataUrlError::Escape(i))?;
            let value = u8::from_str_radix(hex, 16).map_err(|_| DataUrlError::Escape(i))?;
            out.push(value);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Encode `data`, picking whichever of percent-encoding and base64 is shorter
pub fn encode(data: &[u8]) -> String {
    let escaped = format!("data:,{}", percent_encode(data));
    let base64 = format!("data:;base64,{}", BASE64_STANDARD.encode(data));
    if base64.len() < escaped.len() {
        base64
    } else {
        escaped
    }
}

/// Decode a `data:` URL produced by [`encode`] or any other RFC 2397 writer
pub fn decode(url: &str) -> Result<Vec<u8>, DataUrlError> {
    let rest = url.strip_prefix("data:").ok_or(DataUrlError::Scheme)?;
    let (media, payload) = rest.split_once(',').ok_or(DataUrlError::MissingSeparator)?;
    if media.ends_with(";base64") {
        Ok(BASE64_STANDARD.decode(payload)?)
    } else {
        percent_decode(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prefers_percent_encoding() {
        assert_eq!(encode(b"bar\n"), "data:,bar%0A");
    }

    #[test]
    fn test_binary_prefers_base64() {
        let data = [0u8, 1, 2, 250, 251, 252, 253, 254, 255];
        let url = encode(&data);
        assert!(url.starts_with("data:;base64,"), "{}", url);
        assert_eq!(decode(&url).unwrap(), data);
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(encode(b""), "data:,");
        assert_eq!(decode("data:,").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_script_survives_encoding() {
        let script = "#!/bin/bash\nset -e\nkubeadm init --config /etc/kubeadm.yml\n";
        let url = encode(script.as_bytes());
        assert_eq!(decode(&url).unwrap(), script.as_bytes());
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert_eq!(decode("http://x"), Err(DataUrlError::Scheme));
        assert_eq!(decode("data:abc"), Err(DataUrlError::MissingSeparator));
        assert_eq!(decode("data:,%4"), Err(DataUrlError::Escape(0)));
    }
}
