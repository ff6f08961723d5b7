//! CRC-16/CCITT-FALSE: poly 0x1021, init 0xFFFF, no reflection, no final xor.

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

/// Compute the frame checksum over `bytes`.
pub fn crc16(bytes: &[u8]) -> u16 {
    let mut crc = INIT;
    for &b in bytes {
        crc ^= (b as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_value() {
        assert_eq!(crc16(b"123456789"), 0x29B1);
    }

    #[test]
    fn empty_input_is_init() {
        assert_eq!(crc16(&[]), 0xFFFF);
    }

    #[test]
    fn frame_prefixes() {
        // header of an empty command frame
        assert_eq!(crc16(&[0xFE, 0xCA, 0x04, 0x00]), 0x9425);
        // header + query tag
        assert_eq!(crc16(&[0xFE, 0xCA, 0x04, 0x00, b'O', b'B', b'O', b'T']), 0xAF64);
        // header + eight zero bytes
        let mut zeros = vec![0xFE, 0xCA, 0x04, 0x08];
        zeros.extend_from_slice(&[0u8; 8]);
        assert_eq!(crc16(&zeros), 0xF1F6);
    }

    #[test]
    fn single_bit_flip_changes_crc() {
        let a = crc16(b"status");
        let b = crc16(b"statut");
        assert_ne!(a, b);
    }
}
