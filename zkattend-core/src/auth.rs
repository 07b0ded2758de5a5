//! Commkey password transform
//!
//! When a device answers `Connect` with `Unauthorized`, the client proves it
//! knows the device password by sending a 4-byte key derived from the
//! password and the connection id the device just assigned. The transform is
//! a fixed obfuscation, not cryptography.

use bytes::Bytes;

use crate::constants::COMMKEY_TICKS;

/// Create the authentication key from password and connection id
///
/// # Algorithm
///
/// 1. Reverse the 32 bits of the password
/// 2. Add the connection id (wrapping)
/// 3. XOR the little-endian bytes with 'Z', 'K', 'S', 'O'
/// 4. Swap the two 16-bit halves
/// 5. XOR bytes 0, 1, 3 with `ticks`, and set byte 2 to `ticks`
///
/// # Examples
///
/// ```
/// use zkattend_core::auth;
///
/// let key = auth::make_commkey(0, 0, 50);
/// assert_eq!(key.as_ref(), &[0x61, 0x7D, 0x32, 0x79]);
/// ```
pub fn make_commkey(password: u32, connection_id: u16, ticks: u8) -> Bytes {
    let k = password.reverse_bits().wrapping_add(connection_id as u32);

    let bytes = k.to_le_bytes();
    let xored = [
        bytes[0] ^ b'Z',
        bytes[1] ^ b'K',
        bytes[2] ^ b'S',
        bytes[3] ^ b'O',
    ];

    // Swap the two 16-bit halves
    let low = u16::from_le_bytes([xored[0], xored[1]]);
    let high = u16::from_le_bytes([xored[2], xored[3]]);

    let mut result = [0u8; 4];
    result[0..2].copy_from_slice(&high.to_le_bytes());
    result[2..4].copy_from_slice(&low.to_le_bytes());

    result[0] ^= ticks;
    result[1] ^= ticks;
    result[2] = ticks;
    result[3] ^= ticks;

    Bytes::copy_from_slice(&result)
}

/// Key for `password` under `connection_id` with the protocol's fixed ticks
pub fn commkey(password: u32, connection_id: u16) -> Bytes {
    make_commkey(password, connection_id, COMMKEY_TICKS)
}
