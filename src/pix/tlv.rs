//! Text TLV records as used by EMV / BR Code payloads.
//!
//! Each record is `<2-digit tag><2-digit length><value>`, where the length
//! counts characters. Records are concatenated without delimiters.

const HEADER_LEN: usize = 4;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TlvError {
    #[error("Record at {position} is truncated: needs {needed} characters, {available} left")]
    Truncated {
        position: usize,
        needed: usize,
        available: usize,
    },
    #[error("Record at {position} has a non-numeric length field: {field:?}")]
    InvalidLength { position: usize, field: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub tag: String,
    pub value: String,
}

/// Reads one record starting at `position`, returning it together with the
/// position right after its value.
pub fn read_record(chars: &[char], position: usize) -> Result<(Record, usize), TlvError> {
    let available = chars.len().saturating_sub(position);
    if available < HEADER_LEN {
        return Err(TlvError::Truncated {
            position,
            needed: HEADER_LEN,
            available,
        });
    }

    let tag: String = chars[position..position + 2].iter().collect();
    let length_field = &chars[position + 2..position + HEADER_LEN];
    if !length_field.iter().all(|c| c.is_ascii_digit()) {
        return Err(TlvError::InvalidLength {
            position,
            field: length_field.iter().collect(),
        });
    }
    let length = length_field
        .iter()
        .fold(0usize, |acc, c| acc * 10 + (*c as usize - '0' as usize));

    let needed = HEADER_LEN + length;
    if available < needed {
        return Err(TlvError::Truncated {
            position,
            needed,
            available,
        });
    }

    let value = chars[position + HEADER_LEN..position + needed].iter().collect();
    Ok((Record { tag, value }, position + needed))
}

/// Walks a complete nested sequence and returns the value of the first
/// record tagged `tag`.
pub fn find_field(sequence: &str, tag: &str) -> Result<Option<String>, TlvError> {
    let chars: Vec<char> = sequence.chars().collect();
    let mut position = 0;

    while position < chars.len() {
        let (record, next) = read_record(&chars, position)?;
        if record.tag == tag {
            return Ok(Some(record.value));
        }
        position = next;
    }

    Ok(None)
}
