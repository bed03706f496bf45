//! Keyboard control of the capture loop.
//!
use std::{
    io::BufRead,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// Watch stdin on a background thread and raise the returned flag once `key` is entered.
///
/// Closing stdin does not quit, so the loop can also run detached from a terminal.
pub fn spawn_quit_listener(key: String) -> Arc<AtomicBool> {
    let quit = Arc::new(AtomicBool::new(false));

    let quit_ = Arc::clone(&quit);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) if is_quit(&line, &key) => {
                    log::info!("Quit requested");
                    quit_.store(true, Ordering::Relaxed);
                    break;
                }
                Ok(_) => (),
                Err(e) => {
                    log::warn!("Stopped reading keyboard input: {}", e);
                    break;
                }
            }
        }
    });

    quit
}

fn is_quit(line: &str, key: &str) -> bool {
    line.trim() == key
}
