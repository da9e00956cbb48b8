pub mod commands;

use std::io::{BufRead, Write};
use std::path::Path;

use crate::kernel::Kernel;
use crate::{log_error, log_info};

/// Line-oriented REPL over every subsystem. Prompts and diagnostics go
/// to standard error; command results go to standard output.
pub struct Shell {
    kernel: Kernel,
    running: bool,
}

impl Shell {
    pub fn new(kernel: Kernel) -> Shell {
        Shell { kernel, running: true }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Read commands from standard input until `exit` or EOF.
    pub fn run(&mut self) {
        eprintln!("Tinix OS Shell. Type 'help' for commands.");

        let stdin = std::io::stdin();
        let mut line = String::new();
        while self.running {
            eprint!("tinix> ");
            let _ = std::io::stderr().flush();

            line.clear();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            self.execute_line(&line);
        }
    }

    /// Run every command in a batch script file. `#` lines comment.
    pub fn execute_script(&mut self, path: &Path) {
        let source = match std::fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                log_error!("Could not open script file '{}': {}", path.display(), e);
                return;
            }
        };

        log_info!("Executing script: {}", path.display());
        for line in source.lines() {
            if !self.running {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            log_info!(">>> {}", trimmed);
            self.execute_line(trimmed);
        }
        log_info!("Script execution completed.");
    }

    /// Tokenize one input line and dispatch it.
    pub fn execute_line(&mut self, line: &str) {
        let args: Vec<&str> = line.split_whitespace().collect();
        if args.is_empty() {
            return;
        }

        let kernel = &mut self.kernel;
        let cmd = args[0];
        let args = &args[1..];

        match cmd {
            "help" => commands::help::run(kernel, args),
            "ps" => commands::ps::run(kernel, args),
            "create" | "cr" => commands::create::run(kernel, args),
            "kill" => commands::kill::run(kernel, args),
            "tick" | "tk" => commands::tick::run(kernel, args),
            "run" => commands::run::run(kernel, args),
            "block" => commands::block::run(kernel, args),
            "wakeup" => commands::wakeup::run(kernel, args),
            "pagetable" | "pt" => commands::pagetable::run(kernel, args),
            "mem" => commands::mem::run(kernel, args),
            "memstats" | "ms" => commands::memstats::run(kernel, args),
            "script" | "sc" => {
                if let Some(file) = args.first() {
                    self.execute_script(Path::new(file));
                } else {
                    eprintln!("Usage: script <filename>");
                }
            }
            "format" => commands::format::run(kernel, args),
            "mount" => commands::mount::run(kernel, args),
            "touch" => commands::touch::run(kernel, args),
            "mkdir" => commands::mkdir::run(kernel, args),
            "ls" => commands::ls::run(kernel, args),
            "cd" => commands::cd::run(kernel, args),
            "pwd" => commands::pwd::run(kernel, args),
            "rm" => commands::rm::run(kernel, args),
            "cat" => commands::cat::run(kernel, args),
            "echo" => commands::echo::run(kernel, args),
            "fsinfo" => commands::fsinfo::run(kernel, args),
            "exit" => self.running = false,
            _ => eprintln!("Unknown command: {}", cmd),
        }
    }
}
