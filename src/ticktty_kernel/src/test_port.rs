//! A single-threaded port implementation for unit tests. Every operation
//! that would block on a real port panics instead.
use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};
use ticktty_core::{
    device::DeviceClass,
    error::{DeviceError, MboxError, SpawnError, UnblockError},
    port::{
        BlockReason, MboxId, Pid, PortDevice, PortMailbox, PortSyscall, PortThreading,
        SyscallHandler, TaskEntry,
    },
    syscall::{SyscallNum, Sysargs, NUM_SYSCALLS},
};

struct TestMbox {
    slots: usize,
    slot_size: usize,
    queue: VecDeque<Vec<u8>>,
}

#[derive(Default)]
struct State {
    current_pid: Pid,
    next_mbox: MboxId,
    mboxes: HashMap<MboxId, TestMbox>,
    blocked: Vec<(Pid, BlockReason)>,
    unblocked: Vec<Pid>,
    sporked: Vec<String>,
    outputs: Vec<(DeviceClass, usize, u32)>,
    fail_output_after: Option<usize>,
    interrupts: VecDeque<(DeviceClass, usize, u32)>,
    syscalls: Vec<Option<SyscallHandler>>,
}

pub(crate) struct TestPort {
    st: Mutex<State>,
}

impl TestPort {
    pub(crate) fn new() -> Arc<Self> {
        let _ = env_logger::try_init();
        Arc::new(Self {
            st: Mutex::new(State {
                current_pid: 1,
                syscalls: vec![None; NUM_SYSCALLS],
                ..State::default()
            }),
        })
    }

    pub(crate) fn set_current_pid(&self, pid: Pid) {
        self.st.lock().unwrap().current_pid = pid;
    }

    pub(crate) fn pending_messages(&self, mbox: MboxId) -> usize {
        self.st.lock().unwrap().mboxes[&mbox].queue.len()
    }

    pub(crate) fn blocked(&self) -> Vec<(Pid, BlockReason)> {
        self.st.lock().unwrap().blocked.clone()
    }

    pub(crate) fn unblocked(&self) -> Vec<Pid> {
        self.st.lock().unwrap().unblocked.clone()
    }

    pub(crate) fn sporked(&self) -> Vec<String> {
        self.st.lock().unwrap().sporked.clone()
    }

    pub(crate) fn outputs(&self) -> Vec<(DeviceClass, usize, u32)> {
        self.st.lock().unwrap().outputs.clone()
    }

    pub(crate) fn fail_output_after(&self, count: usize) {
        self.st.lock().unwrap().fail_output_after = Some(count);
    }

    /// Queue an interrupt to be returned by `wait_device`. `wait_device`
    /// reports shutdown once the queue is exhausted.
    pub(crate) fn push_interrupt(&self, class: DeviceClass, unit: usize, status: u32) {
        (self.st.lock().unwrap().interrupts).push_back((class, unit, status));
    }

    pub(crate) fn syscall(&self, args: &mut Sysargs<'_>) {
        let handler = self.st.lock().unwrap().syscalls[args.number().index()].clone();
        (handler.expect("no handler installed"))(args);
    }
}

impl PortThreading for TestPort {
    fn current_pid(&self) -> Pid {
        self.st.lock().unwrap().current_pid
    }

    fn block_me(&self, reason: BlockReason) {
        let mut st = self.st.lock().unwrap();
        let pid = st.current_pid;
        st.blocked.push((pid, reason));
    }

    fn unblock_proc(&self, pid: Pid) -> Result<(), UnblockError> {
        if pid <= 0 {
            return Err(UnblockError::BadPid);
        }
        self.st.lock().unwrap().unblocked.push(pid);
        Ok(())
    }

    fn spork(&self, name: &str, _entry: TaskEntry) -> Result<Pid, SpawnError> {
        let mut st = self.st.lock().unwrap();
        st.sporked.push(name.to_owned());
        Ok(100 + st.sporked.len() as Pid)
    }
}

impl PortMailbox for TestPort {
    fn mbox_create(&self, slots: usize, slot_size: usize) -> Result<MboxId, MboxError> {
        let mut st = self.st.lock().unwrap();
        let id = st.next_mbox;
        st.next_mbox += 1;
        st.mboxes.insert(
            id,
            TestMbox {
                slots,
                slot_size,
                queue: VecDeque::new(),
            },
        );
        Ok(id)
    }

    fn mbox_send(&self, mbox: MboxId, msg: &[u8]) -> Result<(), MboxError> {
        match self.mbox_cond_send(mbox, msg) {
            Err(MboxError::WouldBlock) => panic!("mailbox {} would block on send", mbox),
            x => x,
        }
    }

    fn mbox_recv(&self, mbox: MboxId, buf: &mut [u8]) -> Result<usize, MboxError> {
        match self.mbox_cond_recv(mbox, buf) {
            Err(MboxError::WouldBlock) => panic!("mailbox {} would block on receive", mbox),
            x => x,
        }
    }

    fn mbox_cond_send(&self, mbox: MboxId, msg: &[u8]) -> Result<(), MboxError> {
        let mut st = self.st.lock().unwrap();
        let mb = st.mboxes.get_mut(&mbox).ok_or(MboxError::BadId)?;
        if msg.len() > mb.slot_size {
            return Err(MboxError::MessageTooLarge);
        }
        if mb.queue.len() >= mb.slots {
            return Err(MboxError::WouldBlock);
        }
        mb.queue.push_back(msg.to_vec());
        Ok(())
    }

    fn mbox_cond_recv(&self, mbox: MboxId, buf: &mut [u8]) -> Result<usize, MboxError> {
        let mut st = self.st.lock().unwrap();
        let mb = st.mboxes.get_mut(&mbox).ok_or(MboxError::BadId)?;
        let msg = mb.queue.front().ok_or(MboxError::WouldBlock)?;
        if msg.len() > buf.len() {
            return Err(MboxError::BufferTooSmall);
        }
        let msg = mb.queue.pop_front().unwrap();
        buf[..msg.len()].copy_from_slice(&msg);
        Ok(msg.len())
    }

    fn mbox_release(&self, mbox: MboxId) -> Result<(), MboxError> {
        let mut st = self.st.lock().unwrap();
        st.mboxes.remove(&mbox).map(|_| ()).ok_or(MboxError::BadId)
    }
}

impl PortDevice for TestPort {
    fn wait_device(&self, class: DeviceClass, unit: usize) -> Result<u32, DeviceError> {
        let mut st = self.st.lock().unwrap();
        match st.interrupts.front() {
            Some(&(c, u, status)) if (c, u) == (class, unit) => {
                st.interrupts.pop_front();
                Ok(status)
            }
            Some(_) => panic!("{:?} {} would block", class, unit),
            None => Err(DeviceError::Shutdown),
        }
    }

    fn device_output(
        &self,
        class: DeviceClass,
        unit: usize,
        control: u32,
    ) -> Result<(), DeviceError> {
        let mut st = self.st.lock().unwrap();
        if let Some(n) = st.fail_output_after {
            if n == 0 {
                return Err(DeviceError::Rejected);
            }
            st.fail_output_after = Some(n - 1);
        }
        st.outputs.push((class, unit, control));
        Ok(())
    }
}

impl PortSyscall for TestPort {
    fn install_syscall(&self, num: SyscallNum, handler: SyscallHandler) {
        self.st.lock().unwrap().syscalls[num.index()] = Some(handler);
    }
}
