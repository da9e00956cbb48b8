use crate::kernel::Kernel;

/// cd [path] — change the working directory (default: root).
pub fn run(kernel: &mut Kernel, args: &[&str]) {
    let path = args.first().copied().unwrap_or("/");
    let _ = kernel.fs.lock().change_directory(path);
}
