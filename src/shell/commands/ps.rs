use crate::kernel::Kernel;

/// ps — list all simulated processes.
pub fn run(kernel: &mut Kernel, _args: &[&str]) {
    kernel.processes.dump_processes();
}
