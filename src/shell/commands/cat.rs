use std::io::Write;

use crate::kernel::Kernel;

/// cat <file> — copy file contents to standard output.
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    let path = match args.first() {
        Some(path) => path,
        None => {
            eprintln!("Usage: cat <filename>");
            return;
        }
    };

    let mut fs = kernel.fs.lock();
    let fd = match fs.open_file(path) {
        Ok(fd) => fd,
        Err(_) => return,
    };

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut buf = [0u8; 4096];
    loop {
        match fs.read_file(fd, &mut buf) {
            Ok(0) => break,
            Ok(n) => {
                let _ = out.write_all(&buf[..n]);
            }
            Err(e) => {
                eprintln!("cat: read failed: {}", e);
                break;
            }
        }
    }
    let _ = out.flush();
    let _ = fs.close_file(fd);
}
