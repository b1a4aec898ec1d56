use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::types::{OcrConfig, OcrEngine};
use super::ExtractionError;

/// How often the child process is polled while waiting for it to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Tesseract OCR via the system `tesseract` binary.
///
/// The image is written to a temporary file and recognized with
/// `tesseract <file> stdout -l <lang> --oem <n> --psm <n>`. The child is
/// killed once `timeout` elapses.
pub struct TesseractCli {
    binary: PathBuf,
    timeout: Duration,
}

impl TesseractCli {
    pub fn new(timeout: Duration) -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            timeout,
        }
    }

    /// Use a specific binary instead of resolving `tesseract` from PATH.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    fn build_command(&self, image_path: &std::path::Path, config: &OcrConfig) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image_path)
            .arg("stdout")
            .args(["-l", config.lang])
            .args(["--oem", &config.engine_mode.to_string()])
            .args(["--psm", &config.page_seg_mode.to_string()])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    /// Wait for the child, killing it when the deadline passes.
    fn wait_with_deadline(&self, child: &mut Child) -> Result<std::process::ExitStatus, ExtractionError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                if let Err(e) = child.kill() {
                    tracing::warn!(error = %e, "Failed to kill timed-out tesseract process");
                }
                let _ = child.wait();
                return Err(ExtractionError::Timeout(self.timeout));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&self, image_bytes: &[u8], config: &OcrConfig) -> Result<String, ExtractionError> {
        if image_bytes.is_empty() {
            return Err(ExtractionError::EmptyImage);
        }

        let _span = tracing::debug_span!(
            "tesseract_recognize",
            image_size = image_bytes.len(),
            lang = config.lang,
        )
        .entered();
        let start = Instant::now();

        let mut input = tempfile::NamedTempFile::new()?;
        input.write_all(image_bytes)?;
        input.flush()?;

        let mut child = self.build_command(input.path(), config).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ExtractionError::EngineNotAvailable
            } else {
                ExtractionError::Io(e)
            }
        })?;

        // Drain pipes on separate threads so a chatty child never blocks on a full pipe.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait_with_deadline(&mut child)?;
        let text = join_drain(stdout);
        let diagnostics = join_drain(stderr);

        if !status.success() {
            return Err(ExtractionError::OcrProcessing(format!(
                "tesseract exited with {status}: {}",
                diagnostics.trim()
            )));
        }

        tracing::debug!(
            elapsed_ms = %start.elapsed().as_millis(),
            text_len = text.len(),
            "Tesseract recognition complete"
        );

        Ok(text)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut reader| {
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = reader.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    })
}

fn join_drain(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// Mock OCR engine for unit testing without Tesseract.
pub struct MockOcrEngine {
    text: String,
    calls: AtomicUsize,
}

impl MockOcrEngine {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl OcrEngine for MockOcrEngine {
    fn recognize(&self, _image_bytes: &[u8], _config: &OcrConfig) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// OCR engine that always fails, for exercising the degrade path.
pub struct FailingOcrEngine {
    calls: AtomicUsize,
}

impl FailingOcrEngine {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for FailingOcrEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl OcrEngine for FailingOcrEngine {
    fn recognize(&self, _image_bytes: &[u8], _config: &OcrConfig) -> Result<String, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ExtractionError::OcrProcessing("unreadable image".into()))
    }
}
