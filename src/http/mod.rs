pub mod framer;

/// A single HTTP/1.x message (request or response) as a flat byte buffer:
/// the header block (terminated by `\r\n\r\n`) followed immediately by the
/// body, exactly as received. The proxy never parses method lines, status
/// lines, or individual header values beyond what's needed to find the
/// message boundary — it relays bytes, it doesn't speak HTTP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpMessage(Vec<u8>);

impl HttpMessage {
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for HttpMessage {
    fn from(bytes: Vec<u8>) -> Self {
        HttpMessage(bytes)
    }
}
