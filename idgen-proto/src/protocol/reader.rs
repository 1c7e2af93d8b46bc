use std::io::BufRead;

use thiserror::Error;

/// A fully parsed request: an ordered list of opaque argument byte strings.
/// The dispatcher, not this module, interprets them (command name first).
pub type Request = Vec<Vec<u8>>;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid request format")]
    Format,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads one `*N\r\n$L\r\n<L bytes>\r\n{N}` frame from `reader`.
///
/// Does not allocate beyond the arguments it returns, and does not enforce a
/// maximum argument count or length — the caller imposes limits via
/// connection quotas and timeouts.
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Request, ProtocolError> {
    let count = read_count(reader, b'*')?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        args.push(read_argument(reader)?);
    }
    Ok(args)
}

fn read_argument<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let length = read_count(reader, b'$')?;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;

    let mut crlf = [0u8; 2];
    reader.read_exact(&mut crlf)?;
    if &crlf != b"\r\n" {
        return Err(ProtocolError::Format);
    }
    Ok(body)
}

fn read_count<R: BufRead>(reader: &mut R, prefix: u8) -> Result<usize, ProtocolError> {
    let body = read_prefixed_line(reader, prefix)?;
    let text = std::str::from_utf8(&body).map_err(|_| ProtocolError::Format)?;
    let n: i64 = text.parse().map_err(|_| ProtocolError::Format)?;
    if n < 0 {
        return Err(ProtocolError::Format);
    }
    Ok(n as usize)
}

/// Reads `<prefix><body>\r\n`, returning `body`. Rejects a missing prefix, an
/// empty body, and a `\r` not immediately followed by `\n`.
fn read_prefixed_line<R: BufRead>(reader: &mut R, prefix: u8) -> Result<Vec<u8>, ProtocolError> {
    let mut marker = [0u8; 1];
    reader.read_exact(&mut marker)?;
    if marker[0] != prefix {
        return Err(ProtocolError::Format);
    }

    let mut content = Vec::new();
    reader.read_until(b'\r', &mut content)?;
    if content.pop() != Some(b'\r') {
        return Err(ProtocolError::Format);
    }
    if content.is_empty() {
        return Err(ProtocolError::Format);
    }

    let mut lf = [0u8; 1];
    reader.read_exact(&mut lf)?;
    if lf[0] != b'\n' {
        return Err(ProtocolError::Format);
    }

    Ok(content)
}
