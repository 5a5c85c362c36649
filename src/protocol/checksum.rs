//! Frame checksums used by the supported units

/// 8-bit additive checksum (sum of all bytes modulo 256)
pub fn sum8(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// 16-bit additive checksum
pub fn sum16(bytes: &[u8]) -> u16 {
    bytes
        .iter()
        .fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)))
}

/// CRC-16/MODBUS: reflected polynomial 0xA001, initial value 0xFFFF
pub fn crc16_modbus(bytes: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &b in bytes {
        crc ^= u16::from(b);
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xA001;
            } else {
                crc >>= 1;
            }
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum8_wraps() {
        assert_eq!(sum8(&[]), 0);
        assert_eq!(sum8(&[0x2F, 0x01]), 0x30);
        assert_eq!(sum8(&[0xFF, 0x02]), 0x01);
    }

    #[test]
    fn test_sum16() {
        assert_eq!(sum16(&[0xFF, 0xFF, 0x02]), 0x0200);
    }

    #[test]
    fn test_crc16_modbus_check_value() {
        // Standard check value for the ASCII string "123456789"
        assert_eq!(crc16_modbus(b"123456789"), 0x4B37);
        // Classic Modbus RTU request: 01 03 00 00 00 01 -> CRC 84 0A
        assert_eq!(crc16_modbus(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01]), 0x0A84);
    }
}
