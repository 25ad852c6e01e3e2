use crate::{common::error::ProxyError, http::HttpMessage};
use anyhow::{ensure, Context, Result};
use std::path::PathBuf;
use tokio::{io::AsyncWriteExt, process::Command};

/// Hands an [`HttpMessage`] to an external editor process and reads back
/// whatever it left on disk. The gateway never interprets HTTP — it is a
/// byte-in/byte-out filter around a synchronous subprocess call, the async
/// equivalent of the reference design's "write to a temp file, exec the
/// collaborator, read the temp file back."
pub struct EditorGateway {
    program: PathBuf,
    args: Vec<String>,
}

impl EditorGateway {
    pub fn new(program: PathBuf, args: Vec<String>) -> EditorGateway {
        EditorGateway { program, args }
    }

    /// Writes `message` to a fresh temp file, closes the file handle, then
    /// spawns the editor against that path and waits for it to exit. The
    /// handle is dropped (via [`tempfile::NamedTempFile::into_temp_path`])
    /// before the process is spawned specifically so there's no window
    /// where both this task and the child process hold the file open for
    /// writing at once.
    pub async fn edit(&self, message: HttpMessage) -> Result<HttpMessage> {
        let mut file = tempfile::NamedTempFile::new().context("creating temp file for editor round trip")?;
        std::io::Write::write_all(&mut file, message.as_slice()).context("writing message to temp file")?;
        let path = file.into_temp_path();

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .status()
            .await
            .with_context(|| format!("spawning editor collaborator '{}'", self.program.display()))?;

        ensure!(status.success(), ProxyError::EditorFailed(format!("editor exited with {status}")));

        let edited = tokio::fs::read(&path).await.context("reading edited message back from temp file")?;
        Ok(HttpMessage::from(edited))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn passthrough_editor_returns_identical_bytes() {
        // `sh -c true <path>` leaves the temp file untouched and exits 0.
        let gateway = EditorGateway::new(PathBuf::from("/bin/sh"), vec!["-c".to_string(), "true".to_string()]);
        let original = HttpMessage::from(b"GET / HTTP/1.1\r\n\r\n".to_vec());

        let edited = gateway.edit(original.clone()).await.expect("editor should succeed");
        assert_eq!(original, edited);
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_as_editor_failed() {
        let gateway = EditorGateway::new(PathBuf::from("/bin/false"), vec![]);
        let message = HttpMessage::from(b"irrelevant".to_vec());

        let err = gateway.edit(message).await.expect_err("non-zero exit should fail");
        assert!(err.downcast_ref::<ProxyError>().is_some());
    }
}
