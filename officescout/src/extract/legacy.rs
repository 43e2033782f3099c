//! Text extraction for Word 97-2003 binary documents.
//!
//! A `.doc` file is an OLE compound file. The `WordDocument` stream starts
//! with the File Information Block (FIB), which names the table stream
//! (`0Table` or `1Table`) and the location of the piece table (CLX) inside
//! it. The piece table maps character positions to byte runs in
//! `WordDocument`, each either 8-bit Windows-1252 ("compressed") or UTF-16LE.
//!
//! Only the main document story is returned. Field instructions such as
//! `HYPERLINK "http://..."` are stored as ordinary characters between field
//! marks, so they survive extraction; [`looks_like_markup`](crate::search::looks_like_markup)
//! exists to filter match windows that land in them.

use encoding_rs::{UTF_16LE, WINDOWS_1252};
use std::io::{Cursor, Read};

const WORD_IDENT: u16 = 0xA5EC;
/// nFib of Word 97; anything older uses a different FIB layout
const NFIB_WORD97: u16 = 0x00C1;
const FLAG_ENCRYPTED: u16 = 0x0100;
const FLAG_WHICH_TABLE: u16 = 0x0200;

const OFFSET_NFIB: usize = 0x0002;
const OFFSET_FLAGS: usize = 0x000A;
const OFFSET_CCP_TEXT: usize = 0x004C;
const OFFSET_FC_CLX: usize = 0x01A2;
const OFFSET_LCB_CLX: usize = 0x01A6;
const FIB_MIN_LEN: usize = OFFSET_LCB_CLX + 4;

const CLX_PRC: u8 = 0x01;
const CLX_PCDT: u8 = 0x02;
const PCD_SIZE: usize = 8;
const FC_COMPRESSED: u32 = 0x4000_0000;
const FC_MASK: u32 = 0x3FFF_FFFF;

/// One entry of the piece table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    cp_start: u32,
    cp_end: u32,
    fc: u32,
    compressed: bool,
}

/// The FIB fields needed to find the text
#[derive(Debug, Clone, Copy)]
struct Fib {
    table_one: bool,
    ccp_text: u32,
    fc_clx: u32,
    lcb_clx: u32,
}

fn u16_at(buf: &[u8], at: usize) -> Result<u16, String> {
    buf.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| format!("truncated structure at offset {:#x}", at))
}

fn u32_at(buf: &[u8], at: usize) -> Result<u32, String> {
    buf.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| format!("truncated structure at offset {:#x}", at))
}

impl Fib {
    fn parse(word: &[u8]) -> Result<Self, String> {
        if u16_at(word, 0)? != WORD_IDENT {
            return Err("WordDocument stream has no Word signature".to_string());
        }
        let n_fib = u16_at(word, OFFSET_NFIB)?;
        if n_fib < NFIB_WORD97 {
            return Err(format!(
                "file format version {:#06x} predates Word 97 and is not supported",
                n_fib
            ));
        }
        if word.len() < FIB_MIN_LEN {
            return Err("file information block is truncated".to_string());
        }

        let flags = u16_at(word, OFFSET_FLAGS)?;
        if flags & FLAG_ENCRYPTED != 0 {
            return Err("document is password protected".to_string());
        }

        Ok(Self {
            table_one: flags & FLAG_WHICH_TABLE != 0,
            ccp_text: u32_at(word, OFFSET_CCP_TEXT)?,
            fc_clx: u32_at(word, OFFSET_FC_CLX)?,
            lcb_clx: u32_at(word, OFFSET_LCB_CLX)?,
        })
    }
}

fn read_stream<F: Read + std::io::Seek>(
    file: &mut cfb::CompoundFile<F>,
    name: &str,
) -> Result<Vec<u8>, String> {
    let mut stream = file
        .open_stream(name)
        .map_err(|e| format!("missing {} stream: {}", name, e))?;
    let mut data = Vec::new();
    stream
        .read_to_end(&mut data)
        .map_err(|e| format!("failed to read {} stream: {}", name, e))?;
    Ok(data)
}

/// Locates the piece table descriptor in a CLX, skipping property runs
fn parse_clx(clx: &[u8]) -> Result<Vec<Piece>, String> {
    let mut pos = 0;
    while pos < clx.len() {
        match clx[pos] {
            CLX_PRC => {
                let cb = u16_at(clx, pos + 1)? as usize;
                pos += 3 + cb;
            }
            CLX_PCDT => {
                let lcb = u32_at(clx, pos + 1)? as usize;
                let plc = clx
                    .get(pos + 5..pos + 5 + lcb)
                    .ok_or("piece table extends past its stream")?;
                return parse_plc_pcd(plc);
            }
            other => return Err(format!("unexpected CLX entry type {:#04x}", other)),
        }
    }
    Err("document has no piece table".to_string())
}

fn parse_plc_pcd(plc: &[u8]) -> Result<Vec<Piece>, String> {
    if plc.len() < 4 || (plc.len() - 4) % (4 + PCD_SIZE) != 0 {
        return Err("piece table has an invalid size".to_string());
    }
    let count = (plc.len() - 4) / (4 + PCD_SIZE);
    let descriptors = 4 * (count + 1);

    (0..count)
        .map(|i| {
            let fc_raw = u32_at(plc, descriptors + i * PCD_SIZE + 2)?;
            Ok(Piece {
                cp_start: u32_at(plc, i * 4)?,
                cp_end: u32_at(plc, (i + 1) * 4)?,
                fc: fc_raw & FC_MASK,
                compressed: fc_raw & FC_COMPRESSED != 0,
            })
        })
        .collect()
}

/// Decodes the characters of one piece, clamped to `limit` characters
fn decode_piece(word: &[u8], piece: &Piece, limit: u32) -> Result<String, String> {
    let end = piece.cp_end.min(limit);
    if end <= piece.cp_start {
        return Ok(String::new());
    }
    let chars = (end - piece.cp_start) as usize;

    let (start, len, encoding) = if piece.compressed {
        ((piece.fc / 2) as usize, chars, WINDOWS_1252)
    } else {
        (piece.fc as usize, chars * 2, UTF_16LE)
    };
    let bytes = word
        .get(start..start + len)
        .ok_or("piece points past the end of the WordDocument stream")?;
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    Ok(text.into_owned())
}

/// Maps Word's in-band control characters to plain text
fn normalize(raw: &str) -> String {
    raw.chars()
        .filter_map(|c| match c {
            // paragraph mark, line break, page/section break
            '\r' | '\u{000B}' | '\u{000C}' => Some('\n'),
            // end of table cell / row
            '\u{0007}' => Some('\t'),
            '\t' | '\n' => Some(c),
            // field begin/separator/end, anchors for objects and pictures
            c if c.is_control() => None,
            c => Some(c),
        })
        .collect()
}

/// Extracts the main-document text of a Word 97-2003 `.doc` file.
///
/// Errors are human-readable descriptions of why the file could not be read.
pub fn extract_doc_text(bytes: &[u8]) -> Result<String, String> {
    let mut file = cfb::CompoundFile::open(Cursor::new(bytes))
        .map_err(|e| format!("not an OLE compound document: {}", e))?;

    let word = read_stream(&mut file, "/WordDocument")?;
    let fib = Fib::parse(&word)?;
    let table_name = if fib.table_one { "/1Table" } else { "/0Table" };
    let table = read_stream(&mut file, table_name)?;

    let clx_start = fib.fc_clx as usize;
    let clx = table
        .get(clx_start..clx_start + fib.lcb_clx as usize)
        .ok_or("piece table location is outside the table stream")?;

    let mut raw = String::new();
    for piece in parse_clx(clx)? {
        if piece.cp_start >= fib.ccp_text {
            break;
        }
        raw.push_str(&decode_piece(&word, &piece, fib.ccp_text)?);
    }

    Ok(normalize(&raw))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    const TEXT_OFFSET: usize = 0x0800;

    /// Builds a minimal Word 97 document whose main story is `text`,
    /// stored as one compressed piece
    pub(crate) fn build_doc(text: &str) -> Vec<u8> {
        let (encoded, _, _) = WINDOWS_1252.encode(text);
        let ccp = encoded.len() as u32;

        let mut word = vec![0u8; TEXT_OFFSET];
        word[0..2].copy_from_slice(&WORD_IDENT.to_le_bytes());
        word[OFFSET_NFIB..OFFSET_NFIB + 2].copy_from_slice(&NFIB_WORD97.to_le_bytes());
        word[OFFSET_FLAGS..OFFSET_FLAGS + 2].copy_from_slice(&FLAG_WHICH_TABLE.to_le_bytes());
        word[OFFSET_CCP_TEXT..OFFSET_CCP_TEXT + 4].copy_from_slice(&ccp.to_le_bytes());
        word.extend_from_slice(&encoded);

        // CLX: one Pcdt holding a single compressed piece
        let mut plc = Vec::new();
        plc.extend_from_slice(&0u32.to_le_bytes());
        plc.extend_from_slice(&ccp.to_le_bytes());
        plc.extend_from_slice(&0u16.to_le_bytes());
        plc.extend_from_slice(&(((TEXT_OFFSET as u32) * 2) | FC_COMPRESSED).to_le_bytes());
        plc.extend_from_slice(&0u16.to_le_bytes());

        let mut table = vec![CLX_PRC, 2, 0, 0xAA, 0xBB, CLX_PCDT];
        table.extend_from_slice(&(plc.len() as u32).to_le_bytes());
        table.extend_from_slice(&plc);

        word[OFFSET_FC_CLX..OFFSET_FC_CLX + 4].copy_from_slice(&0u32.to_le_bytes());
        word[OFFSET_LCB_CLX..OFFSET_LCB_CLX + 4]
            .copy_from_slice(&(table.len() as u32).to_le_bytes());

        let mut comp = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        for (name, data) in [("/WordDocument", &word), ("/1Table", &table)] {
            let mut stream = comp.create_stream(name).unwrap();
            stream.write_all(data).unwrap();
            stream.flush().unwrap();
        }
        comp.flush().unwrap();
        comp.into_inner().into_inner()
    }

    #[test]
    fn test_extracts_compressed_text() {
        let doc = build_doc("Quarterly report\rcaf\u{e9} au lait\r");
        let text = extract_doc_text(&doc).unwrap();
        assert_eq!(text, "Quarterly report\ncafé au lait\n");
    }

    #[test]
    fn test_field_marks_are_dropped() {
        let doc = build_doc("see \u{13} HYPERLINK \"http://x.test\" \u{14}here\u{15}.");
        let text = extract_doc_text(&doc).unwrap();
        assert_eq!(text, "see  HYPERLINK \"http://x.test\" here.");
    }

    #[test]
    fn test_rejects_non_ole_input() {
        let err = extract_doc_text(b"{\\rtf1 plain rtf}").unwrap_err();
        assert!(err.contains("OLE"));
    }

    #[test]
    fn test_rejects_pre_word97() {
        let mut word = vec![0u8; FIB_MIN_LEN];
        word[0..2].copy_from_slice(&WORD_IDENT.to_le_bytes());
        word[OFFSET_NFIB..OFFSET_NFIB + 2].copy_from_slice(&0x0065u16.to_le_bytes());
        let err = Fib::parse(&word).unwrap_err();
        assert!(err.contains("predates Word 97"));
    }

    #[test]
    fn test_rejects_encrypted() {
        let mut word = vec![0u8; FIB_MIN_LEN];
        word[0..2].copy_from_slice(&WORD_IDENT.to_le_bytes());
        word[OFFSET_NFIB..OFFSET_NFIB + 2].copy_from_slice(&NFIB_WORD97.to_le_bytes());
        word[OFFSET_FLAGS..OFFSET_FLAGS + 2].copy_from_slice(&FLAG_ENCRYPTED.to_le_bytes());
        assert!(Fib::parse(&word).unwrap_err().contains("password"));
    }

    #[test]
    fn test_uncompressed_piece() {
        let mut word = vec![0u8; 16];
        for unit in "héllo".encode_utf16() {
            word.extend_from_slice(&unit.to_le_bytes());
        }
        let piece = Piece {
            cp_start: 0,
            cp_end: 5,
            fc: 16,
            compressed: false,
        };
        assert_eq!(decode_piece(&word, &piece, 100).unwrap(), "héllo");
        assert_eq!(decode_piece(&word, &piece, 2).unwrap(), "hé");
    }

    #[test]
    fn test_normalize_controls() {
        assert_eq!(normalize("a\u{7}b\u{7}\u{7}\rc\u{1}d"), "a\tb\t\t\ncd");
    }
}
