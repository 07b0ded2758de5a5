//! Packet checksum
//!
//! The device checksum is a 16-bit one's-complement sum:
//! 1. Build buffer: [Command, 0x0000, ConnectionID, ReplyID, Payload]
//! 2. Sum as unsigned 16-bit little-endian words
//! 3. When the sum exceeds 0xFFFF, subtract 0xFFFF
//! 4. Take the ones-complement: ~sum

use tracing::trace;

/// Fold one more 16-bit word into a running one's-complement sum.
fn fold(sum: u32, word: u32) -> u32 {
    let mut sum = sum + word;
    while sum > 0xFFFF {
        sum -= 0xFFFF;
    }
    sum
}

/// Sum a byte slice as little-endian 16-bit words.
///
/// A trailing odd byte counts as the low byte of a zero-padded word. The
/// padding only exists for the sum; callers never see it on the wire.
fn sum_words(sum: u32, bytes: &[u8]) -> u32 {
    bytes.chunks(2).fold(sum, |acc, chunk| {
        let word = match chunk {
            [lo, hi] => u16::from_le_bytes([*lo, *hi]) as u32,
            [lo] => *lo as u32,
            _ => 0,
        };
        fold(acc, word)
    })
}

/// Calculate the packet checksum
///
/// # Algorithm
///
/// ```text
/// 1. Words: [command, 0, connection_id, reply_id, ...payload]
/// 2. Sum all 16-bit words (little-endian)
/// 3. While sum > 0xFFFF: sum -= 0xFFFF
/// 4. Return ~sum as u16
/// ```
///
/// # Examples
///
/// ```
/// use zkattend_core::checksum;
///
/// // CMD_CONNECT with an empty payload
/// assert_eq!(checksum::calculate(1000, 0, 0, &[]), 0xFC17);
/// ```
pub fn calculate(command: u16, connection_id: u16, reply_id: u16, payload: &[u8]) -> u16 {
    let sum = [command, connection_id, reply_id]
        .into_iter()
        .fold(0u32, |acc, word| fold(acc, word as u32));
    let sum = sum_words(sum, payload);

    let checksum = !(sum as u16);

    trace!(
        command = command,
        connection_id = connection_id,
        reply_id = reply_id,
        payload_len = payload.len(),
        checksum = format!("0x{:04X}", checksum),
        "Calculated checksum"
    );

    checksum
}

/// Verify a checksum against the header fields and payload.
///
/// Received packets are never rejected on this basis (devices are not
/// consistent about it); this is for diagnostics and tests.
pub fn verify(
    command: u16,
    connection_id: u16,
    reply_id: u16,
    payload: &[u8],
    expected: u16,
) -> bool {
    calculate(command, connection_id, reply_id, payload) == expected
}

/// Recompute the checksum of an already encoded packet (header + payload),
/// ignoring whatever sits in the checksum slot.
pub fn of_encoded(packet: &[u8]) -> Option<u16> {
    if packet.len() < 8 {
        return None;
    }

    let word = |i: usize| u16::from_le_bytes([packet[i], packet[i + 1]]);
    Some(calculate(word(0), word(4), word(6), &packet[8..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_checksum_empty_payload() {
        // CMD_CONNECT (1000), connection=0, reply=0, no payload
        assert_eq!(calculate(1000, 0, 0, &[]), 0xFFFF - 1000);
    }

    #[test]
    fn test_checksum_with_payload() {
        // 1000 + 100 + 200 + 0x0201 + 0x0403
        let expected = !((1000u32 + 100 + 200 + 0x0201 + 0x0403) as u16);
        assert_eq!(calculate(1000, 100, 200, &[1, 2, 3, 4]), expected);
    }

    #[test]
    fn test_checksum_verify() {
        let payload = vec![0xAB, 0xCD];
        let checksum = calculate(1000, 50, 100, &payload);

        assert!(verify(1000, 50, 100, &payload, checksum));
        assert!(!verify(1000, 50, 100, &payload, checksum.wrapping_add(1)));
    }

    #[test]
    fn test_checksum_odd_payload_pads_with_zero() {
        assert_eq!(
            calculate(1000, 0, 0, &[1, 2, 3]),
            calculate(1000, 0, 0, &[1, 2, 3, 0])
        );
    }

    #[test]
    fn test_checksum_folds_overflow() {
        // 0xFFFF + 0x0002 overflows once: 0x10001 - 0xFFFF = 2
        assert_eq!(calculate(0xFFFF, 2, 0, &[]), !2u16);
    }

    #[test]
    fn test_of_encoded_too_short() {
        assert_eq!(of_encoded(&[0; 7]), None);
    }

    proptest! {
        #[test]
        fn prop_resum_reproduces_checksum(
            command in any::<u16>(),
            connection_id in any::<u16>(),
            reply_id in any::<u16>(),
            payload in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let checksum = calculate(command, connection_id, reply_id, &payload);

            // End-around-carry sum: congruent mod 0xFFFF, zero only for all-zero input.
            let mut padded = payload.clone();
            if padded.len() % 2 == 1 {
                padded.push(0);
            }
            let total: u64 = [command, connection_id, reply_id]
                .iter()
                .map(|w| *w as u64)
                .chain(padded.chunks(2).map(|c| u16::from_le_bytes([c[0], c[1]]) as u64))
                .sum();
            let folded = match total {
                0 => 0,
                t if t % 0xFFFF == 0 => 0xFFFF,
                t => t % 0xFFFF,
            };

            prop_assert_eq!(!(folded as u16), checksum);
        }
    }
}
