use crate::proc::process::Pid;

/// Label of an allocated frame: which page of which process lives there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLabel {
    pub pid: Pid,
    pub vpage: usize,
}

/// The shared pool of physical page frames.
///
/// Each frame is either free or labelled with its owning `(pid, vpage)`.
/// The pool never touches page tables; keeping labels and table entries
/// consistent is the MemoryManager's job.
pub struct PhysicalFrames {
    frames: Vec<Option<FrameLabel>>,
}

impl PhysicalFrames {
    pub fn new(num_frames: usize) -> PhysicalFrames {
        PhysicalFrames { frames: vec![None; num_frames] }
    }

    /// Claim the lowest-indexed free frame for `(pid, vpage)`.
    pub fn allocate(&mut self, pid: Pid, vpage: usize) -> Option<usize> {
        for (i, frame) in self.frames.iter_mut().enumerate() {
            if frame.is_none() {
                *frame = Some(FrameLabel { pid, vpage });
                return Some(i);
            }
        }
        None
    }

    /// Return a frame to the free pool.
    pub fn free(&mut self, frame_number: usize) {
        self.frames[frame_number] = None;
    }

    /// Overwrite a frame's label. Used by the replacement path after the
    /// victim entry has already been cleared.
    pub fn assign(&mut self, frame_number: usize, pid: Pid, vpage: usize) {
        self.frames[frame_number] = Some(FrameLabel { pid, vpage });
    }

    pub fn get(&self, frame_number: usize) -> Option<FrameLabel> {
        self.frames[frame_number]
    }

    pub fn total_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn free_frames(&self) -> usize {
        self.frames.iter().filter(|f| f.is_none()).count()
    }

    pub fn used_frames(&self) -> usize {
        self.total_frames() - self.free_frames()
    }

    /// Print the frame table. Command output, so standard out.
    pub fn dump(&self) {
        println!("=== Physical Memory ===");
        println!("Total: {} frames", self.total_frames());
        println!("Free: {}", self.free_frames());
        println!("Used: {}", self.used_frames());
        println!();
        println!("Frame | Status | PID | VPage");
        println!("------|--------|-----|------");
        for (i, frame) in self.frames.iter().enumerate() {
            match frame {
                Some(label) => {
                    println!("{:5} |  Used  | {:3} | {:5}", i, label.pid.0, label.vpage)
                }
                None => println!("{:5} |  Free  |  -  |   -", i),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_lowest_free_frame() {
        let mut frames = PhysicalFrames::new(4);
        assert_eq!(frames.allocate(Pid(1), 0), Some(0));
        assert_eq!(frames.allocate(Pid(1), 1), Some(1));

        frames.free(0);
        assert_eq!(frames.allocate(Pid(2), 9), Some(0));
        assert_eq!(frames.get(0), Some(FrameLabel { pid: Pid(2), vpage: 9 }));
    }

    #[test]
    fn exhaustion_returns_none() {
        let mut frames = PhysicalFrames::new(2);
        assert!(frames.allocate(Pid(1), 0).is_some());
        assert!(frames.allocate(Pid(1), 1).is_some());
        assert_eq!(frames.allocate(Pid(1), 2), None);
        assert_eq!(frames.free_frames(), 0);
    }

    #[test]
    fn assign_overwrites_label() {
        let mut frames = PhysicalFrames::new(2);
        frames.allocate(Pid(1), 3);
        frames.assign(0, Pid(2), 7);
        assert_eq!(frames.get(0), Some(FrameLabel { pid: Pid(2), vpage: 7 }));
        assert_eq!(frames.used_frames(), 1);
    }
}
