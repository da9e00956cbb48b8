use lazy_static::lazy_static;
use spin::Mutex;
use std::io::Write as IoWrite;

/// Diagnostic sink. All simulator diagnostics go to standard error so
/// command results on standard output stay clean.
pub struct Logger {
    out: std::io::Stderr,
}

impl Logger {
    fn new() -> Logger {
        Logger { out: std::io::stderr() }
    }
}

impl core::fmt::Write for Logger {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        self.out.write_all(s.as_bytes()).map_err(|_| core::fmt::Error)
    }
}

lazy_static! {
    pub static ref SINK: Mutex<Logger> = Mutex::new(Logger::new());
}

#[doc(hidden)]
pub fn _print(args: core::fmt::Arguments) {
    use core::fmt::Write;
    let _ = SINK.lock().write_fmt(args);
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::_print(format_args!($($arg)*));
        $crate::logger::_print(format_args!("\n"));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        $crate::logger::_print(format_args!("[WARN] "));
        $crate::logger::_print(format_args!($($arg)*));
        $crate::logger::_print(format_args!("\n"));
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::_print(format_args!("[ERROR] "));
        $crate::logger::_print(format_args!($($arg)*));
        $crate::logger::_print(format_args!("\n"));
    };
}
