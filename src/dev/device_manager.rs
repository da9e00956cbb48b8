use std::collections::{BTreeMap, VecDeque};

use crate::log_info;
use crate::proc::process::Pid;

/// One simulated device: at most one holder, FIFO queue of waiters.
struct DeviceState {
    holder: Option<Pid>,
    waiters: VecDeque<Pid>,
}

impl DeviceState {
    fn new() -> DeviceState {
        DeviceState { holder: None, waiters: VecDeque::new() }
    }
}

/// Per-device single-holder locks with FIFO waiter queues.
///
/// Devices come into existence on first request; there is no fixed
/// device table.
pub struct DeviceManager {
    devices: BTreeMap<u32, DeviceState>,
}

impl DeviceManager {
    pub fn new() -> DeviceManager {
        DeviceManager { devices: BTreeMap::new() }
    }

    /// Try to acquire `dev` for `pid`. Returns true if the device is now
    /// held by `pid`; otherwise `pid` is appended to the waiter queue
    /// (never twice) and false is returned.
    pub fn request(&mut self, pid: Pid, dev: u32) -> bool {
        let state = self.devices.entry(dev).or_insert_with(DeviceState::new);

        match state.holder {
            None => {
                state.holder = Some(pid);
                log_info!("[Dev] Device {} acquired by PID {}", dev, pid);
                true
            }
            Some(holder) if holder == pid => true,
            Some(_) => {
                if !state.waiters.contains(&pid) {
                    state.waiters.push_back(pid);
                }
                log_info!("[Dev] Device {} busy, PID {} queued", dev, pid);
                false
            }
        }
    }

    /// Release `dev` if `pid` holds it, handing it to the head waiter.
    /// Returns the new holder's pid, if any. If `pid` does not hold the
    /// device it is merely dropped from the waiter queue.
    pub fn release(&mut self, pid: Pid, dev: u32) -> Option<Pid> {
        let state = self.devices.get_mut(&dev)?;

        if state.holder != Some(pid) {
            state.waiters.retain(|&w| w != pid);
            return None;
        }

        state.holder = state.waiters.pop_front();
        match state.holder {
            Some(next) => {
                log_info!("[Dev] Device {} handed from PID {} to PID {}", dev, pid, next);
            }
            None => {
                log_info!("[Dev] Device {} released by PID {}", dev, pid);
            }
        }
        state.holder
    }

    /// Release every device `pid` holds or waits on. Returns one
    /// `(device, new_holder)` pair per device the pid held.
    pub fn release_all(&mut self, pid: Pid) -> Vec<(u32, Option<Pid>)> {
        let devs: Vec<u32> = self
            .devices
            .iter()
            .filter(|(_, s)| s.holder == Some(pid) || s.waiters.contains(&pid))
            .map(|(&d, _)| d)
            .collect();

        let mut released = Vec::new();
        for dev in devs {
            let held = self.devices[&dev].holder == Some(pid);
            let next = self.release(pid, dev);
            if held {
                released.push((dev, next));
            }
        }
        released
    }

    /// Drop `pid` from every waiter queue.
    pub fn cancel_wait(&mut self, pid: Pid) {
        for state in self.devices.values_mut() {
            state.waiters.retain(|&w| w != pid);
        }
    }

    /// Current holder of `dev`, if the device exists and is held.
    pub fn holder(&self, dev: u32) -> Option<Pid> {
        self.devices.get(&dev).and_then(|s| s.holder)
    }

    /// True if `pid` is queued on `dev`.
    pub fn is_waiting(&self, pid: Pid, dev: u32) -> bool {
        self.devices.get(&dev).map_or(false, |s| s.waiters.contains(&pid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_acquires() {
        let mut dm = DeviceManager::new();
        assert!(dm.request(Pid(1), 0));
        assert_eq!(dm.holder(0), Some(Pid(1)));
    }

    #[test]
    fn request_is_idempotent_for_holder_and_waiters() {
        let mut dm = DeviceManager::new();
        assert!(dm.request(Pid(1), 0));
        assert!(dm.request(Pid(1), 0));

        assert!(!dm.request(Pid(2), 0));
        assert!(!dm.request(Pid(2), 0));

        // One release must reach PID 2 directly — it was queued once.
        assert_eq!(dm.release(Pid(1), 0), Some(Pid(2)));
        assert_eq!(dm.release(Pid(2), 0), None);
    }

    #[test]
    fn waiters_are_woken_fifo() {
        let mut dm = DeviceManager::new();
        assert!(dm.request(Pid(1), 7));
        assert!(!dm.request(Pid(2), 7));
        assert!(!dm.request(Pid(3), 7));

        assert_eq!(dm.release(Pid(1), 7), Some(Pid(2)));
        assert_eq!(dm.release(Pid(2), 7), Some(Pid(3)));
        assert_eq!(dm.release(Pid(3), 7), None);
    }

    #[test]
    fn release_by_non_holder_just_dequeues() {
        let mut dm = DeviceManager::new();
        assert!(dm.request(Pid(1), 0));
        assert!(!dm.request(Pid(2), 0));

        assert_eq!(dm.release(Pid(2), 0), None);
        assert!(!dm.is_waiting(Pid(2), 0));
        assert_eq!(dm.holder(0), Some(Pid(1)));
    }

    #[test]
    fn release_all_covers_held_and_waited_devices() {
        let mut dm = DeviceManager::new();
        assert!(dm.request(Pid(1), 0));
        assert!(dm.request(Pid(1), 1));
        assert!(dm.request(Pid(2), 2));
        assert!(!dm.request(Pid(1), 2));
        assert!(!dm.request(Pid(3), 0));

        let released = dm.release_all(Pid(1));
        assert_eq!(released, vec![(0, Some(Pid(3))), (1, None)]);
        assert!(!dm.is_waiting(Pid(1), 2));
        assert_eq!(dm.holder(2), Some(Pid(2)));
    }

    #[test]
    fn cancel_wait_removes_from_every_queue() {
        let mut dm = DeviceManager::new();
        assert!(dm.request(Pid(1), 0));
        assert!(dm.request(Pid(2), 1));
        assert!(!dm.request(Pid(3), 0));
        assert!(!dm.request(Pid(3), 1));

        dm.cancel_wait(Pid(3));
        assert!(!dm.is_waiting(Pid(3), 0));
        assert!(!dm.is_waiting(Pid(3), 1));

        assert_eq!(dm.release(Pid(1), 0), None);
    }
}
