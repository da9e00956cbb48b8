use crate::kernel::Kernel;

/// pwd — print the working directory.
pub fn run(kernel: &mut Kernel, _args: &[&str]) {
    println!("{}", kernel.fs.lock().current_dir());
}
