//! Intel HEX encoding of a flat byte stream (§6, §1's "low-level ... Intel-HEX writing layer").
//!
//! No teacher counterpart exists for this (the teacher crate writes a raw binary ROM image), and
//! no crate in the retrieved corpus wraps Intel HEX either, so this is a direct, literal
//! transcription of the well-known record format, kept deliberately small.

const BYTES_PER_RECORD: usize = 16;
const RECORD_TYPE_DATA: u8 = 0x00;
const RECORD_TYPE_EOF: u8 = 0x01;

/// Render `bytes`, loaded starting at `origin`, as Intel HEX text (one record per line, CRLF-free
/// `\n` line endings, terminated by the standard `:00000001FF` end-of-file record).
pub fn encode(bytes: &[u8], origin: u32) -> String {
    let mut out = String::new();
    for (line_index, chunk) in bytes.chunks(BYTES_PER_RECORD).enumerate() {
        let address = origin.wrapping_add((line_index * BYTES_PER_RECORD) as u32) & 0xFFFF;
        out.push_str(&encode_record(address as u16, RECORD_TYPE_DATA, chunk));
        out.push('\n');
    }
    out.push_str(&encode_record(0, RECORD_TYPE_EOF, &[]));
    out.push('\n');
    out
}

fn encode_record(address: u16, record_type: u8, data: &[u8]) -> String {
    let mut checksum: u8 = data.len() as u8;
    checksum = checksum.wrapping_add((address >> 8) as u8);
    checksum = checksum.wrapping_add((address & 0xFF) as u8);
    checksum = checksum.wrapping_add(record_type);
    for &b in data {
        checksum = checksum.wrapping_add(b);
    }
    checksum = (!checksum).wrapping_add(1);

    let mut line = format!(":{:02X}{:04X}{:02X}", data.len(), address, record_type);
    for &b in data {
        line.push_str(&format!("{b:02X}"));
    }
    line.push_str(&format!("{checksum:02X}"));
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_is_just_the_eof_record() {
        assert_eq!(encode(&[], 0x8000), ":00000001FF\n");
    }

    #[test]
    fn single_byte_record_checksums_correctly() {
        let text = encode(&[0xFB], 0x8000);
        let mut lines = text.lines();
        // count=01, address=8000, type=00, data=FB, checksum computed below.
        assert_eq!(lines.next().unwrap(), ":0180000000FB84");
        assert_eq!(lines.next().unwrap(), ":00000001FF");
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn chunks_at_sixteen_bytes_per_line() {
        let bytes = vec![0xAAu8; 20];
        let text = encode(&bytes, 0x8000);
        let lines: Vec<&str> = text.lines().collect();
        // 16 + 4 data bytes + EOF = 3 lines.
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with(":10800000")); // 0x10 = 16 data bytes
        assert!(lines[1].starts_with(":04801000")); // 0x04 = 4 data bytes, address 0x8010
    }
}
