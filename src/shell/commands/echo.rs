use crate::kernel::Kernel;

/// echo <text> [> <file>] — print text, or append a newline and write
/// it at the start of an existing file.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    if args.is_empty() {
        eprintln!("Usage: echo <text> [> filename]");
        return;
    }

    let redirect = args.iter().position(|&a| a == ">");
    let text = match redirect {
        Some(pos) => args[..pos].join(" "),
        None => args.join(" "),
    };

    let file = match redirect {
        Some(pos) => match args.get(pos + 1) {
            Some(file) => *file,
            None => {
                eprintln!("Usage: echo <text> [> filename]");
                return;
            }
        },
        None => {
            println!("{}", text);
            return;
        }
    };

    let mut fs = kernel.fs.lock();
    let fd = match fs.open_file(file) {
        Ok(fd) => fd,
        Err(_) => {
            eprintln!("Failed to open file: {}", file);
            return;
        }
    };
    let payload = format!("{}\n", text);
    if let Err(e) = fs.write_file(fd, payload.as_bytes()) {
        eprintln!("echo: write failed: {}", e);
    }
    let _ = fs.close_file(fd);
}
