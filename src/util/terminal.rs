//! Ctrl-C handling for interactive prompts.
//!
//! A secret prompt disables echo while it waits for input and only restores
//! it when the read returns. Exiting from the signal handler skips that, so
//! the terminal attributes captured at startup are re-applied first.

use tracing::debug;

#[cfg(unix)]
type Snapshot = nix::sys::termios::Termios;
#[cfg(not(unix))]
type Snapshot = ();

/// Install a handler that treats Ctrl-C as a cancellation: restore the
/// terminal, then exit with status 0.
pub fn install_cancel_handler() {
    let saved = snapshot_stdin();
    let installed = ctrlc::set_handler(move || {
        if let Some(saved) = saved.as_ref() {
            restore_stdin(saved);
        }
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(0);
    });
    if let Err(e) = installed {
        debug!(error = %e, "ctrl-c handler not installed");
    }
}

#[cfg(unix)]
fn snapshot_stdin() -> Option<Snapshot> {
    snapshot(std::io::stdin())
}

#[cfg(unix)]
fn restore_stdin(saved: &Snapshot) {
    restore(std::io::stdin(), saved);
}

#[cfg(not(unix))]
fn snapshot_stdin() -> Option<Snapshot> {
    None
}

#[cfg(not(unix))]
fn restore_stdin(_saved: &Snapshot) {}

/// Terminal attributes of `fd`, or `None` when it is not a terminal.
#[cfg(unix)]
fn snapshot<Fd: std::os::fd::AsFd>(fd: Fd) -> Option<Snapshot> {
    nix::sys::termios::tcgetattr(fd).ok()
}

#[cfg(unix)]
fn restore<Fd: std::os::fd::AsFd>(fd: Fd, saved: &Snapshot) {
    use nix::sys::termios::{tcsetattr, SetArg};
    if let Err(e) = tcsetattr(fd, SetArg::TCSANOW, saved) {
        debug!(error = %e, "terminal attributes not restored");
    }
}
