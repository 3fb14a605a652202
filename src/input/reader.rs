//! Input reader: dedicated thread for blocking TTY reads.
//!
//! The reader performs the blocking 1-byte reads of the controlling
//! terminal and forwards them over a bounded channel; the main loop
//! consumes with timeouts, which keeps escape disambiguation and redraw
//! batching on a single thread.

use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::FromRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Where keyboard bytes come from.
pub enum InputSource {
    /// Standard input (the usual case).
    Stdin,
    /// The stderr TTY (used when stdin carries the initial buffer).
    StderrTty,
}

/// Handle to the reader thread.
pub struct InputReader {
    handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl InputReader {
    /// Spawn the reader; returns the handle and the byte channel.
    pub fn spawn(source: InputSource) -> (Self, Receiver<u8>) {
        let (tx, rx) = bounded::<u8>(256);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let handle = thread::Builder::new()
            .name("bim-input".to_string())
            .spawn(move || {
                Self::run_loop(source, tx, shutdown_clone);
            })
            .expect("failed to spawn input thread");

        (
            Self {
                handle: Some(handle),
                shutdown,
            },
            rx,
        )
    }

    fn run_loop(source: InputSource, tx: Sender<u8>, shutdown: Arc<AtomicBool>) {
        let mut reader: Box<dyn Read> = match source {
            InputSource::Stdin => Box::new(io::stdin()),
            InputSource::StderrTty => {
                // Keyboard input arrives on the stderr TTY while stdin is a
                // pipe; read a duplicate of that descriptor.
                #[allow(unsafe_code)]
                let file = unsafe {
                    let fd = libc::dup(libc::STDERR_FILENO);
                    File::from_raw_fd(fd)
                };
                Box::new(file)
            }
        };
        let mut byte = [0u8; 1];
        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            match reader.read(&mut byte) {
                Ok(0) => break,
                Ok(_) => {
                    if tx.send(byte[0]).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
    }

    /// Ask the reader to stop after its current read.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for InputReader {
    fn drop(&mut self) {
        self.shutdown();
        // The thread may be parked in a blocking read; do not join it.
        drop(self.handle.take());
    }
}
