pub mod manager;
pub mod process;
pub mod program;

pub use manager::ProcessManager;
pub use process::{BlockReason, Pcb, Pid, ProcessState};
pub use program::{Instruction, Program, ProgramError};
