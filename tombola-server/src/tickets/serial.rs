//! Human-readable card serials
//!
//! Format: `TB-<EVENT PREFIX>-<BASE36 SEQ>-<SUFFIX>`, e.g.
//! `TB-FRIDAY-0000B-K3QZ`. The sequence number is the per-event counter
//! advanced by the issuance coordinator; the suffix is purely visual.

use rand::Rng;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const PREFIX_MAX_LEN: usize = 12;
const SEQ_WIDTH: usize = 5;
const SUFFIX_LEN: usize = 4;

/// Event prefix: alphanumeric characters only, uppercased, truncated
fn event_prefix(event_id: &str) -> String {
    event_id
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .take(PREFIX_MAX_LEN)
        .collect()
}

/// Base-36 encoding, zero-padded to `SEQ_WIDTH`
///
/// Values past 36^5 simply widen; the pad never truncates.
fn base36(mut value: u64) -> String {
    let mut digits = Vec::new();
    loop {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
        if value == 0 {
            break;
        }
    }
    while digits.len() < SEQ_WIDTH {
        digits.push(b'0');
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ascii")
}

/// Build the serial printed on one card
pub fn make_serial<R: Rng + ?Sized>(event_id: &str, seq: u64, rng: &mut R) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("TB-{}-{}-{}", event_prefix(event_id), base36(seq), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_event_prefix_sanitized_and_truncated() {
        assert_eq!(event_prefix("friday-night!"), "FRIDAYNIGHT");
        assert_eq!(event_prefix("la gran tómbola 2026"), "LAGRANTMBOLA");
        assert_eq!(event_prefix("E1"), "E1");
    }

    #[test]
    fn test_base36_padding() {
        assert_eq!(base36(0), "00000");
        assert_eq!(base36(11), "0000B");
        assert_eq!(base36(36), "00010");
        assert_eq!(base36(36u64.pow(5)), "100000");
    }

    #[test]
    fn test_serial_shape() {
        let mut rng = StdRng::seed_from_u64(9);
        let serial = make_serial("FRIDAY", 11, &mut rng);
        let parts: Vec<&str> = serial.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "TB");
        assert_eq!(parts[1], "FRIDAY");
        assert_eq!(parts[2], "0000B");
        assert_eq!(parts[3].len(), 4);
        assert!(parts[3].chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
