use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};

use console::style;

static QUIET: AtomicBool = AtomicBool::new(false);

pub fn configure(quiet: bool, color: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
    if !color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }
}

pub fn info(message: &str) {
    if QUIET.load(Ordering::Relaxed) {
        return;
    }
    let _ = writeln!(io::stderr(), "{}", message);
}

pub fn warn(message: &str) {
    let _ = writeln!(io::stderr(), "{}", style(message).yellow());
}

pub fn error(message: &str) {
    let _ = writeln!(io::stderr(), "{}", style(message).red());
}

pub fn artifact(label: &str, path: &std::path::Path) {
    if QUIET.load(Ordering::Relaxed) {
        return;
    }
    let _ = writeln!(io::stderr(), "{} {}", style(label).cyan(), path.display());
}
