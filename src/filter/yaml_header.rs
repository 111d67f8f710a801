//! Streaming scanner for the `YamlHeader` filter (spec §4.1): the
//! body must start with `---\n`, and a subsequent `\n---\n` line must
//! appear before EOF. The scan uses a fixed carry buffer so the
//! terminator is found even when it straddles the boundary between
//! two reads of the underlying file.

use std::io::Read;

const BUF_SIZE: usize = 8192;
const TERMINATOR: &[u8] = b"\n---\n";
const CARRY_LEN: usize = TERMINATOR.len() - 1;

/// Returns the byte offset just past the closing `---\n` line (i.e.
/// the length of the header block, for reuse by the document
/// parser), or `None` if the content does not start with `---\n` or
/// no terminator is found before EOF.
pub fn scan<R: Read>(reader: &mut R) -> std::io::Result<Option<usize>> {
    let mut start = [0u8; 4];
    if reader.read_exact(&mut start).is_err() {
        return Ok(None);
    }
    if &start != b"---\n" {
        return Ok(None);
    }

    let mut offset = start.len();
    let mut carry: Vec<u8> = Vec::new();
    let mut buf = vec![0u8; BUF_SIZE];

    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            return Ok(None);
        }

        let mut window = carry.clone();
        window.extend_from_slice(&buf[..read]);

        if let Some(pos) = find(&window, TERMINATOR) {
            let window_start = offset - carry.len();
            return Ok(Some(window_start + pos + TERMINATOR.len()));
        }

        offset += read;
        let carry_len = CARRY_LEN.min(window.len());
        carry = window[window.len() - carry_len..].to_vec();
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn finds_simple_header() {
        let content = b"---\ntitle: hi\n---\nbody text";
        let offset = scan(&mut Cursor::new(content)).unwrap().unwrap();
        assert_eq!(&content[offset..], b"body text");
    }

    #[test]
    fn rejects_missing_header() {
        let content = b"# just a heading\n";
        assert!(scan(&mut Cursor::new(content)).unwrap().is_none());
    }

    #[test]
    fn rejects_unterminated_header() {
        let content = b"---\ntitle: hi\nno terminator here";
        assert!(scan(&mut Cursor::new(content)).unwrap().is_none());
    }

    #[test]
    fn finds_terminator_straddling_buffer_boundary() {
        // Pad the body so the terminator lands across a BUF_SIZE read
        // boundary, then verify the scan still finds it.
        let padding = "x".repeat(BUF_SIZE - 2);
        let content = format!("---\n{}\n---\nbody", padding);
        let offset = scan(&mut Cursor::new(content.as_bytes())).unwrap().unwrap();
        assert_eq!(&content.as_bytes()[offset..], b"body");
    }
}
