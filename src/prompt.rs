//! Echo-free password entry.
//!
//! [`read_password`] asks twice, compares the two entries and hands back the
//! first one. Terminal attributes are changed through an [`EchoGuard`] that
//! covers both reads, so they are restored on every way out of the prompt.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::ops::{Deref, DerefMut};

use log::{debug, warn};
use subtle::ConstantTimeEq;

use crate::error::{Error, Result};
use crate::secret::SecretBuffer;

const TTY_PATH: &str = "/dev/tty";
const LINE_CAPACITY: usize = 128;

/// The device the operator types on.
pub trait Console {
    /// Terminal attributes as they were before [`Console::silence`].
    type Saved;

    /// Save the current attributes, then turn off echo and signal characters.
    fn silence(&mut self) -> io::Result<Self::Saved>;

    fn restore(&mut self, saved: &Self::Saved) -> io::Result<()>;

    fn write_prompt(&mut self, text: &str) -> io::Result<()>;

    /// `Ok(None)` at end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Holds the terminal silenced for as long as it lives.
pub struct EchoGuard<'a, C: Console> {
    console: &'a mut C,
    saved: Option<C::Saved>,
}

impl<'a, C: Console> EchoGuard<'a, C> {
    pub fn acquire(console: &'a mut C) -> EchoGuard<'a, C> {
        let saved = match console.silence() {
            Ok(saved) => Some(saved),
            Err(e) => {
                warn!("Cannot disable terminal echo ({e}); the password will be visible");
                None
            }
        };
        EchoGuard { console, saved }
    }

    pub fn is_silenced(&self) -> bool {
        self.saved.is_some()
    }
}

impl<C: Console> Deref for EchoGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.console
    }
}

impl<C: Console> DerefMut for EchoGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.console
    }
}

impl<C: Console> Drop for EchoGuard<'_, C> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            if let Err(e) = self.console.restore(&saved) {
                warn!("Failed to restore terminal settings: {e}");
            }
        }
    }
}

/// Prompt for a password and its confirmation.
pub fn read_password<C: Console>(console: &mut C) -> Result<SecretBuffer> {
    let (first, second) = {
        let mut guard = EchoGuard::acquire(console);
        let first = read_entry(&mut *guard, "Enter password: ")?;
        let second = read_entry(&mut *guard, "Reenter password: ");
        (first, second)
    };
    let second = second?;

    let matched: bool = first.as_bytes().ct_eq(second.as_bytes()).into();
    second.destroy();
    if !matched {
        first.destroy();
        return Err(Error::Mismatch);
    }
    if first.is_empty() {
        first.destroy();
        return Err(Error::input("empty password"));
    }
    Ok(first)
}

fn read_entry<C: Console>(console: &mut C, prompt: &str) -> Result<SecretBuffer> {
    console
        .write_prompt(prompt)
        .map_err(|e| Error::input_io("cannot write prompt", e))?;
    let line = read_line(console);
    // The operator's newline was not echoed.
    console
        .write_prompt("\n")
        .map_err(|e| Error::input_io("cannot write prompt", e))?;
    line
}

/// One line without its trailing newline. Nothing else is stripped.
fn read_line<C: Console>(console: &mut C) -> Result<SecretBuffer> {
    let mut line = SecretBuffer::with_capacity(LINE_CAPACITY)?;
    let mut got_data = false;
    loop {
        match console.read_byte() {
            Ok(Some(b'\n')) => return Ok(line),
            Ok(Some(byte)) => {
                got_data = true;
                line.push(byte)?;
            }
            Ok(None) if got_data => return Ok(line),
            Ok(None) => return Err(Error::input("no data")),
            Err(e) => return Err(Error::input_io("read failed", e)),
        }
    }
}

enum Channel {
    Tty(File),
    /// A private duplicate of fd 0; std's `Stdin` buffers ahead of us.
    Stdio(File),
}

impl Channel {
    fn input(&self) -> &File {
        match self {
            Channel::Tty(tty) => tty,
            Channel::Stdio(stdin) => stdin,
        }
    }
}

/// The controlling terminal, or stdin and stderr when there is none.
pub struct TtyConsole {
    channel: Channel,
}

impl TtyConsole {
    pub fn open() -> io::Result<TtyConsole> {
        match OpenOptions::new().read(true).write(true).open(TTY_PATH) {
            Ok(tty) => Ok(TtyConsole {
                channel: Channel::Tty(tty),
            }),
            Err(e) => {
                debug!("No controlling terminal ({e}), prompting on stdin/stderr");
                TtyConsole::stdio()
            }
        }
    }

    /// Read from stdin, prompt on stderr.
    pub fn stdio() -> io::Result<TtyConsole> {
        Ok(TtyConsole {
            channel: Channel::Stdio(unbuffered_stdin()?),
        })
    }
}

#[cfg(unix)]
fn unbuffered_stdin() -> io::Result<File> {
    use std::os::fd::AsFd;

    Ok(File::from(io::stdin().as_fd().try_clone_to_owned()?))
}

#[cfg(windows)]
fn unbuffered_stdin() -> io::Result<File> {
    use std::os::windows::io::AsHandle;

    Ok(File::from(io::stdin().as_handle().try_clone_to_owned()?))
}

#[cfg(unix)]
mod termios {
    use std::io;

    use nix::sys::termios::{tcgetattr, tcsetattr, LocalFlags, SetArg, Termios};

    use super::TtyConsole;

    impl TtyConsole {
        pub(super) fn silence_fd(&self) -> io::Result<Termios> {
            let saved = tcgetattr(self.channel.input())?;
            let mut silent = saved.clone();
            silent.local_flags.remove(LocalFlags::ECHO | LocalFlags::ISIG);
            self.set(&silent)?;
            Ok(saved)
        }

        pub(super) fn set(&self, attrs: &Termios) -> io::Result<()> {
            tcsetattr(self.channel.input(), SetArg::TCSAFLUSH, attrs)?;
            Ok(())
        }
    }
}

#[cfg(unix)]
impl Console for TtyConsole {
    type Saved = nix::sys::termios::Termios;

    fn silence(&mut self) -> io::Result<Self::Saved> {
        self.silence_fd()
    }

    fn restore(&mut self, saved: &Self::Saved) -> io::Result<()> {
        self.set(saved)
    }

    fn write_prompt(&mut self, text: &str) -> io::Result<()> {
        write_to(&mut self.channel, text)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        read_from(&mut self.channel)
    }
}

#[cfg(not(unix))]
impl Console for TtyConsole {
    type Saved = ();

    fn silence(&mut self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "echo control is not available on this platform",
        ))
    }

    fn restore(&mut self, _saved: &()) -> io::Result<()> {
        Ok(())
    }

    fn write_prompt(&mut self, text: &str) -> io::Result<()> {
        write_to(&mut self.channel, text)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        read_from(&mut self.channel)
    }
}

fn write_to(channel: &mut Channel, text: &str) -> io::Result<()> {
    match channel {
        Channel::Tty(tty) => {
            tty.write_all(text.as_bytes())?;
            tty.flush()
        }
        Channel::Stdio(_) => {
            let mut stderr = io::stderr().lock();
            stderr.write_all(text.as_bytes())?;
            stderr.flush()
        }
    }
}

// Single unbuffered bytes: nothing past the newline leaves the kernel, and
// no reader keeps a copy of the line.
fn read_from(channel: &mut Channel) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    let mut input = channel.input();
    let n = input.read(&mut byte)?;
    Ok((n == 1).then_some(byte[0]))
}
