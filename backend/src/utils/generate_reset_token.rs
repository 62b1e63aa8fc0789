use rand::RngCore;
use rand::rngs::OsRng;

/// Generates an unguessable password-reset token.
///
/// Draws 32 bytes (256 bits) from the operating system's CSPRNG and renders
/// them as a fixed-length 64-character lowercase hex string. The token is
/// opaque to callers and only ever compared by exact string equality.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
