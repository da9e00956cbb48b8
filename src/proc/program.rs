use core::fmt;
use std::path::Path;

use crate::{log_info, log_warn};

// ──────────────────────────────────────────────────────────────
//  Instructions
// ──────────────────────────────────────────────────────────────

/// One pseudo-instruction. The executor is a single dispatch over this
/// tag (§ executor in proc::manager).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Compute,
    MemRead { addr: u64 },
    MemWrite { addr: u64 },
    /// `fd` is the script's logical descriptor choice; None means
    /// auto-assign.
    FileOpen { fd: Option<i32>, name: String },
    FileClose { fd: i32 },
    FileRead { fd: i32, size: u64 },
    FileWrite { fd: i32, size: u64 },
    DevRequest { dev: u32 },
    DevRelease { dev: u32 },
    Sleep { ticks: u64 },
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::Compute => write!(f, "Compute"),
            Instruction::MemRead { addr } => write!(f, "MemRead addr={:#x}", addr),
            Instruction::MemWrite { addr } => write!(f, "MemWrite addr={:#x}", addr),
            Instruction::FileOpen { fd: Some(fd), name } => {
                write!(f, "FileOpen fd={} file={}", fd, name)
            }
            Instruction::FileOpen { fd: None, name } => write!(f, "FileOpen file={}", name),
            Instruction::FileClose { fd } => write!(f, "FileClose fd={}", fd),
            Instruction::FileRead { fd, size } => write!(f, "FileRead fd={} size={}", fd, size),
            Instruction::FileWrite { fd, size } => write!(f, "FileWrite fd={} size={}", fd, size),
            Instruction::DevRequest { dev } => write!(f, "DevRequest dev={}", dev),
            Instruction::DevRelease { dev } => write!(f, "DevRelease dev={}", dev),
            Instruction::Sleep { ticks } => write!(f, "Sleep {}", ticks),
        }
    }
}

// ──────────────────────────────────────────────────────────────
//  Errors
// ──────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum ProgramError {
    Io(std::io::Error),
    EmptyProgram,
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ProgramError::Io(e) => write!(f, "cannot read program: {}", e),
            ProgramError::EmptyProgram => write!(f, "program contains no instructions"),
        }
    }
}

impl From<std::io::Error> for ProgramError {
    fn from(e: std::io::Error) -> Self {
        ProgramError::Io(e)
    }
}

impl std::error::Error for ProgramError {}

// ──────────────────────────────────────────────────────────────
//  Program
// ──────────────────────────────────────────────────────────────

/// An immutable instruction sequence shared by the PCB that runs it.
pub struct Program {
    instructions: Vec<Instruction>,
}

impl Program {
    /// Load a `.pc` script. Fails on I/O errors and on scripts that
    /// yield no instructions at all.
    pub fn load_from_file(path: &Path) -> Result<Program, ProgramError> {
        let source = std::fs::read_to_string(path)?;
        let program = Program::from_source(&source)?;
        log_info!("Loaded {} instructions from {}", program.len(), path.display());
        Ok(program)
    }

    /// Parse script text directly. Fails on scripts that yield no
    /// instructions.
    pub fn from_source(source: &str) -> Result<Program, ProgramError> {
        let instructions = parse_source(source);
        if instructions.is_empty() {
            return Err(ProgramError::EmptyProgram);
        }
        Ok(Program { instructions })
    }

    /// Synthesize a compute-only program of the given length.
    pub fn compute_only(length: usize) -> Program {
        Program { instructions: vec![Instruction::Compute; length] }
    }

    pub fn get(&self, pc: usize) -> Option<&Instruction> {
        self.instructions.get(pc)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

// ──────────────────────────────────────────────────────────────
//  Script parsing
// ──────────────────────────────────────────────────────────────

/// Accept decimal or 0x-prefixed hex.
fn parse_int(token: &str) -> Option<u64> {
    if let Some(hex) = token.strip_prefix("0x").or_else(|| token.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()
    } else {
        token.parse().ok()
    }
}

/// Parse script text into instructions. Blank lines and `#` comments
/// are skipped; malformed or unknown lines are skipped with a warning.
pub fn parse_source(source: &str) -> Vec<Instruction> {
    let mut instructions = Vec::new();

    for (lineno, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        let op = tokens[0];
        let args = &tokens[1..];

        let parsed = match op {
            "C" | "COMPUTE" => Some(Instruction::Compute),
            "R" | "MEMREAD" => one_int(args).map(|addr| Instruction::MemRead { addr }),
            "W" | "MEMWRITE" => one_int(args).map(|addr| Instruction::MemWrite { addr }),
            "FO" | "FILEOPEN" => match args {
                [name] => Some(Instruction::FileOpen { fd: None, name: name.to_string() }),
                [fd, name] => parse_int(fd).map(|fd| Instruction::FileOpen {
                    fd: Some(fd as i32),
                    name: name.to_string(),
                }),
                _ => None,
            },
            "FC" | "FILECLOSE" => one_int(args).map(|fd| Instruction::FileClose { fd: fd as i32 }),
            "FR" | "FILEREAD" => {
                two_ints(args).map(|(fd, size)| Instruction::FileRead { fd: fd as i32, size })
            }
            "FW" | "FILEWRITE" => {
                two_ints(args).map(|(fd, size)| Instruction::FileWrite { fd: fd as i32, size })
            }
            "DR" | "DEVREQUEST" => one_int(args).map(|dev| Instruction::DevRequest { dev: dev as u32 }),
            "DD" | "DEVRELEASE" => one_int(args).map(|dev| Instruction::DevRelease { dev: dev as u32 }),
            "S" | "SLEEP" => one_int(args).map(|ticks| Instruction::Sleep { ticks }),
            _ => {
                log_warn!("line {}: unknown opcode '{}', skipping", lineno + 1, op);
                continue;
            }
        };

        match parsed {
            Some(inst) => instructions.push(inst),
            None => {
                log_warn!("line {}: malformed '{}' instruction, skipping", lineno + 1, op);
            }
        }
    }

    instructions
}

fn one_int(args: &[&str]) -> Option<u64> {
    match args {
        [a] => parse_int(a),
        _ => None,
    }
}

fn two_ints(args: &[&str]) -> Option<(u64, u64)> {
    match args {
        [a, b] => Some((parse_int(a)?, parse_int(b)?)),
        _ => None,
    }
}
