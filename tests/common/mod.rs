//! Shared test utilities for ttyport tests.
//!
//! Provides a pseudo-terminal pair so the port can be exercised against a
//! real TTY without hardware. The master end plays the remote device.

#![allow(dead_code)]

use rustix::pty::OpenptFlags;
use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// A PTY master plus the path of its slave device node.
pub struct PtyPair {
    pub master: File,
    pub slave_path: PathBuf,
}

/// Open a PTY pair, or `None` when the environment has no PTY support.
pub fn open_pty_pair() -> Option<PtyPair> {
    let master = match rustix::pty::openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY) {
        Ok(master) => master,
        Err(err) => {
            eprintln!("skipping PTY test: openpt failed ({err})");
            return None;
        }
    };
    rustix::pty::grantpt(&master).ok()?;
    rustix::pty::unlockpt(&master).ok()?;

    let slave_name: CString = rustix::pty::ptsname(&master, Vec::with_capacity(64)).ok()?;
    let slave_path = PathBuf::from(slave_name.to_string_lossy().into_owned());

    Some(PtyPair {
        master: File::from(master),
        slave_path,
    })
}

impl PtyPair {
    /// Open the slave a second time, independently of any `SerialPort`.
    pub fn observer(&self) -> File {
        OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&self.slave_path)
            .expect("open PTY slave")
    }

    /// Write `payload` from the master end every `interval` until the
    /// returned guard is dropped. Reads flush pending input first, so a
    /// single early write could be discarded.
    pub fn feed(&self, payload: &[u8], interval: Duration) -> Feeder {
        let mut master = self.master.try_clone().expect("clone PTY master");
        let payload = payload.to_vec();
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::Acquire) {
                thread::sleep(interval);
                if master.write_all(&payload).is_err() {
                    break;
                }
                let _ = master.flush();
            }
        });
        Feeder {
            stop,
            handle: Some(handle),
        }
    }
}

/// Background writer started by [`PtyPair::feed`]. Stops when dropped.
pub struct Feeder {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Drop for Feeder {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Input speed of the terminal behind `file`, read straight from the kernel.
pub fn kernel_speed(file: &File) -> u32 {
    rustix::termios::tcgetattr(file)
        .expect("tcgetattr")
        .input_speed()
}
