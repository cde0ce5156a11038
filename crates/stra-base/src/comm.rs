use std::sync::Barrier;

use crate::StraPar;

/// Communicator tree mirroring the parallel levels of the blocked loop nest.
///
/// Thread ids are laid out as `((jc_id * pc_nt + pc_id) * ic_nt + ic_id) * jr_nt + jr_id`.
/// Each level below the root owns one barrier per sibling group:
/// - `pc_barriers[jc_id]`: threads sharing a column panel (they share the packed B)
/// - `ic_barriers[(jc_id * pc_nt + pc_id) * ic_nt + ic_id]`: threads sharing a row panel (they share the packed A)
pub struct ThreadComm {
    par: StraPar,
    pc_barriers: Vec<Barrier>,
    ic_barriers: Vec<Barrier>,
}

impl ThreadComm {
    pub fn new(par: StraPar) -> Self {
        let mut pc_barriers = vec![];
        for _ in 0..par.jc_nt {
            pc_barriers.push(Barrier::new(par.pc_nt * par.ic_nt * par.jr_nt));
        }
        let mut ic_barriers = vec![];
        for _ in 0..par.jc_nt * par.pc_nt * par.ic_nt {
            ic_barriers.push(Barrier::new(par.jr_nt));
        }
        Self { par, pc_barriers, ic_barriers }
    }

    #[inline]
    pub fn num_threads(&self) -> usize {
        self.par.num_threads()
    }

    pub fn worker(&self, t_id: usize) -> Worker<'_> {
        Worker::new(self, t_id)
    }

    /// Runs `f` once per thread of the team inside one scoped fork-join region.
    /// Thread 0 is the calling thread.
    pub fn run<F>(&self, f: F)
    where
        F: Fn(&Worker) + Sync,
    {
        let num_threads = self.num_threads();
        if num_threads == 1 {
            f(&self.worker(0));
            return;
        }
        std::thread::scope(|s| {
            for t_id in 1..num_threads {
                let f = &f;
                s.spawn(move || f(&self.worker(t_id)));
            }
            f(&self.worker(0));
        });
    }
}

/// Coordinates of one thread inside a [`ThreadComm`].
pub struct Worker<'a> {
    pub t_id: usize,
    pub jc_id: usize,
    pub pc_id: usize,
    pub ic_id: usize,
    pub jr_id: usize,
    /// rank inside the column panel group, used to split the B packing
    pub ic_jr: usize,
    pub jc_nt: usize,
    pub pc_nt: usize,
    pub ic_nt: usize,
    pub jr_nt: usize,
    comm: &'a ThreadComm,
}

impl<'a> Worker<'a> {
    fn new(comm: &'a ThreadComm, t_id: usize) -> Self {
        let par = comm.par;
        assert!(t_id < par.num_threads(), "t_id: {}, num_threads: {}", t_id, par.num_threads());
        let jr_id = t_id % par.jr_nt;
        let ic_id = (t_id / par.jr_nt) % par.ic_nt;
        let pc_id = (t_id / (par.jr_nt * par.ic_nt)) % par.pc_nt;
        let jc_id = t_id / (par.jr_nt * par.ic_nt * par.pc_nt);
        let ic_jr = (pc_id * par.ic_nt + ic_id) * par.jr_nt + jr_id;
        Self {
            t_id,
            jc_id,
            pc_id,
            ic_id,
            jr_id,
            ic_jr,
            jc_nt: par.jc_nt,
            pc_nt: par.pc_nt,
            ic_nt: par.ic_nt,
            jr_nt: par.jr_nt,
            comm,
        }
    }

    /// number of threads sharing this thread's column panel
    #[inline]
    pub fn pc_comm_nt(&self) -> usize {
        self.pc_nt * self.ic_nt * self.jr_nt
    }

    /// number of threads sharing this thread's row panel
    #[inline]
    pub fn ic_comm_nt(&self) -> usize {
        self.jr_nt
    }

    #[inline]
    pub fn pc_barrier(&self) {
        if self.pc_comm_nt() > 1 {
            self.comm.pc_barriers[self.jc_id].wait();
        }
    }

    #[inline]
    pub fn ic_barrier(&self) {
        if self.ic_comm_nt() > 1 {
            let idx = (self.jc_id * self.pc_nt + self.pc_id) * self.ic_nt + self.ic_id;
            self.comm.ic_barriers[idx].wait();
        }
    }
}

/// Round-robin iteration over `beg..end` in steps of `inc`, the `id`-th of `nt` siblings.
#[inline]
pub fn get_range(beg: usize, end: usize, inc: usize, id: usize, nt: usize) -> std::iter::StepBy<std::ops::Range<usize>> {
    debug_assert!(inc > 0 && id < nt);
    (beg + id * inc..end).step_by(inc * nt)
}
