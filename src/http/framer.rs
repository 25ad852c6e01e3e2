use super::HttpMessage;
use crate::common::{error::ProxyError, logging};
use log::trace;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};

/// Header block is capped at 32 000 bytes, matching `MAX_HTTP_HEADER_SIZE`
/// in the reference implementation.
pub const MAX_HEADER_SIZE: usize = 32_000;

/// Body is capped at 128 000 bytes, matching `MAX_HTTP_BODY_SIZE`.
pub const MAX_BODY_SIZE: usize = 128_000;

const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, PartialEq, Eq)]
enum BodyMode {
    Empty,
    Sized(usize),
    Chunked,
}

/// Reads one complete HTTP/1.x message (header block + body) from `reader`,
/// bounded by `message_timeout` end to end. `reader` must be a
/// [`BufReader`] wrapping the connection's socket so the header scan can use
/// `fill_buf`/`consume` instead of the raw `MSG_PEEK` trick the reference
/// implementation relies on — `fill_buf` plays the same role (look at bytes
/// without losing them if the terminator isn't there yet) without needing a
/// real peek operation, which Rust's generic `AsyncRead` doesn't expose.
pub async fn read_message<S>(reader: &mut BufReader<S>, message_timeout: Duration) -> Result<HttpMessage, ProxyError>
where
    S: AsyncRead + Unpin,
{
    tokio::time::timeout(message_timeout, read_message_inner(reader)).await.map_err(|_| ProxyError::Timeout)?
}

async fn read_message_inner<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<HttpMessage, ProxyError> {
    let header = read_header(reader).await?;
    let mode = determine_body_mode(&header)?;
    let body = read_body(reader, mode).await?;

    let mut message = header;
    message.extend(body);
    Ok(HttpMessage::from(message))
}

async fn read_header<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProxyError> {
    let mut header = Vec::new();

    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Err(ProxyError::ConnectionTerminated);
        }

        // Carry the last <=3 already-consumed bytes so the terminator is
        // never missed when it straddles two reads.
        let carry_start = header.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        let carry_len = header.len() - carry_start;
        let mut haystack = Vec::with_capacity(carry_len + available.len());
        haystack.extend_from_slice(&header[carry_start..]);
        haystack.extend_from_slice(available);

        if let Some(pos) = find_subsequence(&haystack, HEADER_TERMINATOR) {
            let sentinel_end = pos + HEADER_TERMINATOR.len();
            let take_from_available = sentinel_end.saturating_sub(carry_len);
            header.extend_from_slice(&available[..take_from_available]);
            reader.consume(take_from_available);

            if header.len() > MAX_HEADER_SIZE {
                return Err(ProxyError::ExceededMaxBufferSize);
            }
            return Ok(header);
        }

        let consumed = available.len();
        header.extend_from_slice(available);
        reader.consume(consumed);

        if header.len() > MAX_HEADER_SIZE {
            return Err(ProxyError::ExceededMaxBufferSize);
        }
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

fn header_lines(header: &[u8]) -> impl Iterator<Item = &[u8]> {
    header.split(|&b| b == b'\n').map(|line| line.strip_suffix(b"\r").unwrap_or(line))
}

fn trim_ascii_whitespace(mut s: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = s {
        s = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = s {
        s = rest;
    }
    s
}

fn find_header_value<'a>(header: &'a [u8], name: &str) -> Option<&'a [u8]> {
    let name = name.as_bytes();
    header_lines(header).find_map(|line| {
        if line.len() > name.len() && line[..name.len()].eq_ignore_ascii_case(name) && line[name.len()] == b':' {
            Some(trim_ascii_whitespace(&line[name.len() + 1..]))
        } else {
            None
        }
    })
}

fn determine_body_mode(header: &[u8]) -> Result<BodyMode, ProxyError> {
    // Transfer-Encoding: chunked wins unconditionally over Content-Length
    // when both are present — Content-Length is never even inspected in
    // that case, matching `socks_read_http_header`'s early return.
    if let Some(transfer_encoding) = find_header_value(header, "Transfer-Encoding") {
        let chunked = transfer_encoding.split(|&b| b == b',').any(|token| trim_ascii_whitespace(token).eq_ignore_ascii_case(b"chunked"));
        if chunked {
            if find_header_value(header, "Content-Length").is_some() {
                logging::log_chunked_over_content_length!();
            }
            return Ok(BodyMode::Chunked);
        }
    }

    match find_header_value(header, "Content-Length") {
        Some(value) if !value.is_empty() && value.iter().all(u8::is_ascii_digit) => {
            let text = std::str::from_utf8(value).expect("validated ASCII digits");
            let len: usize = text.parse().map_err(|_| ProxyError::InvalidHttpSyntax("Content-Length overflow".to_string()))?;
            Ok(BodyMode::Sized(len))
        }
        Some(_) => Err(ProxyError::InvalidHttpSyntax("malformed Content-Length".to_string())),
        None => Ok(BodyMode::Empty),
    }
}

async fn read_body<R: AsyncBufRead + Unpin>(reader: &mut R, mode: BodyMode) -> Result<Vec<u8>, ProxyError> {
    match mode {
        BodyMode::Empty => Ok(Vec::new()),
        BodyMode::Sized(len) => read_sized_body(reader, len).await,
        BodyMode::Chunked => read_chunked_body(reader).await,
    }
}

async fn read_sized_body<R: AsyncBufRead + Unpin>(reader: &mut R, len: usize) -> Result<Vec<u8>, ProxyError> {
    if len > MAX_BODY_SIZE {
        return Err(ProxyError::ExceededMaxBufferSize);
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(body)
}

/// Reads a chunk-size line (hex digits terminated by `\r`) one byte at a
/// time, checking the cumulative body cap on every byte rather than after
/// the fact — a peer that never sends `\r` is cut off by
/// `ExceededMaxBufferSize` instead of being allowed to force unbounded
/// buffering, matching how `socks5.c` bounds its own digit-by-digit chunk
/// size read against the cumulative cap.
async fn read_chunk_size_line<R: AsyncBufRead + Unpin>(reader: &mut R, body_so_far: usize) -> Result<Vec<u8>, ProxyError> {
    let mut size_line = Vec::new();
    loop {
        if body_so_far + size_line.len() > MAX_BODY_SIZE {
            return Err(ProxyError::ExceededMaxBufferSize);
        }
        let byte = reader.read_u8().await?;
        size_line.push(byte);
        if byte == b'\r' {
            return Ok(size_line);
        }
    }
}

/// Reads a chunked body verbatim — chunk-size lines, hex casing, and CRLFs
/// are all preserved in the returned bytes, since the proxy relays the
/// original wire bytes rather than re-encoding. Only the parsed chunk size
/// controls how many bytes to read next and when to stop.
async fn read_chunked_body<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProxyError> {
    let mut body = Vec::new();

    loop {
        let size_line = read_chunk_size_line(reader, body.len()).await?;
        let digits = &size_line[..size_line.len() - 1];
        if digits.is_empty() || !digits.iter().all(u8::is_ascii_hexdigit) {
            return Err(ProxyError::InvalidHttpSyntax("chunk size is not valid hex".to_string()));
        }
        let chunk_size = usize::from_str_radix(std::str::from_utf8(digits).expect("validated hex digits"), 16)
            .map_err(|_| ProxyError::InvalidHttpSyntax("chunk size overflow".to_string()))?;

        body.extend_from_slice(&size_line);
        if body.len() > MAX_BODY_SIZE {
            return Err(ProxyError::ExceededMaxBufferSize);
        }

        let lf = reader.read_u8().await?;
        body.push(lf);
        if lf != b'\n' {
            return Err(ProxyError::InvalidHttpSyntax("chunk size line missing LF".to_string()));
        }

        if chunk_size == 0 {
            let mut trailer = [0u8; 2];
            reader.read_exact(&mut trailer).await?;
            body.extend_from_slice(&trailer);
            if body.len() > MAX_BODY_SIZE {
                return Err(ProxyError::ExceededMaxBufferSize);
            }
            return Ok(body);
        }

        if body.len() + chunk_size + 2 > MAX_BODY_SIZE {
            return Err(ProxyError::ExceededMaxBufferSize);
        }

        let mut chunk = vec![0u8; chunk_size + 2];
        reader.read_exact(&mut chunk).await?;
        if &chunk[chunk_size..] != b"\r\n" {
            return Err(ProxyError::InvalidHttpSyntax("chunk data missing trailing CRLF".to_string()));
        }
        body.extend_from_slice(&chunk);
    }
}
