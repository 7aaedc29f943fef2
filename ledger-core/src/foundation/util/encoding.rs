use crate::foundation::LedgerError;

pub fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

pub fn decode_hex(s: &str) -> Result<Vec<u8>, LedgerError> {
    hex::decode(strip_hex_prefix(s.trim())).map_err(Into::into)
}

pub fn parse_hex_fixed<const N: usize>(s: &str) -> Result<[u8; N], LedgerError> {
    let bytes = decode_hex(s)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| LedgerError::EncodingError(format!("expected {N} bytes of hex, got {len}")))
}
