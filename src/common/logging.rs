// Session lifecycle

macro_rules! log_session_opened {
    ($peer:expr, $dest:expr) => {
        info!("session OPENED: client [{}] <-> destination [{}]", $peer, $dest);
    };
}

macro_rules! log_session_closed {
    ($peer:expr, $dest:expr, $c2d:expr, $d2c:expr) => {
        info!(
            "session CLOSED: client [{}] <-> destination [{}], transmitted: client->dest {}, dest->client {}",
            $peer,
            $dest,
            human_bytes($c2d as f64),
            human_bytes($d2c as f64)
        );
    };
}

macro_rules! log_session_closed_with_error {
    ($peer:expr, $dest:expr, $err:expr) => {
        error!("session CLOSED with ERROR: client [{}] <-> destination [{}], reason: '{}'", $peer, $dest, $err);
    };
}

pub(crate) use log_session_closed;
pub(crate) use log_session_closed_with_error;
pub(crate) use log_session_opened;

// Handshake / accept phase

macro_rules! log_handshake_failed {
    ($peer:expr, $err:expr) => {
        warn!("handshake with [{}] FAILED: '{}'", $peer, $err);
    };
}

macro_rules! log_accept_error {
    ($err:expr) => {
        warn!("TCP accept FAILED: '{}'", $err);
    };
}

pub(crate) use log_accept_error;
pub(crate) use log_handshake_failed;

// HTTP framing

macro_rules! log_invalid_message {
    ($peer:expr, $err:expr) => {
        warn!("invalid HTTP message from [{}]: '{}'", $peer, $err);
    };
}

macro_rules! log_chunked_over_content_length {
    () => {
        trace!("message carries both Transfer-Encoding: chunked and Content-Length; honoring chunked");
    };
}

pub(crate) use log_chunked_over_content_length;
pub(crate) use log_invalid_message;

// Editor collaborator

macro_rules! log_editor_failed {
    ($err:expr) => {
        error!("editor collaborator round trip FAILED: '{}'", $err);
    };
}

pub(crate) use log_editor_failed;
