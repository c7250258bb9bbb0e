use std::cell::Cell;
use std::thread;
use std::time::Duration;

/// xorshift64*, seeded from the std hasher's per-process random keys.
#[derive(Copy, Clone, Debug)]
pub struct Rng(u64);

impl Rng {
    pub fn new() -> Self {
        use std::collections::hash_map::RandomState;
        use std::hash::{BuildHasher, Hasher};
        Self(RandomState::new().build_hasher().finish() | 1)
    }

    pub fn gen(&mut self) -> u64 {
        let x = self.0 ^ (self.0 >> 12);
        let x = x ^ (x << 25);
        self.0 = x ^ (x >> 27);
        self.0.wrapping_mul(0x2545F4914F6CDD1D)
    }
}

impl Default for Rng {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static RNG: Cell<Rng> = Cell::new(Rng::new());
}

/// Give the scheduler a chance to run something else right here. Which kind
/// of perturbation happens is random per call.
pub fn perturb() {
    let val = RNG.with(|cell| {
        let mut rng = cell.get();
        let v = rng.gen();
        cell.set(rng);
        v
    });
    schedule_point((val >> 24) as u8);
}

fn schedule_point(r: u8) {
    match r {
        0..=10 => thread::sleep(Duration::from_nanos(0)),
        11..=15 => thread::sleep(Duration::from_micros(50)),
        16..=75 => thread::yield_now(),
        76..=125 => {
            for _ in 0..50usize {
                core::hint::spin_loop();
            }
        }
        225..=255 => {
            for _ in 0..=5 {
                thread::yield_now()
            }
        }
        n => {
            for i in 0..(n as usize) {
                let mut g = 0;
                // volatile so the busy loop survives optimization
                unsafe {
                    core::ptr::write_volatile(&mut g, i);
                    let _ = core::ptr::read_volatile(&g);
                }
            }
        }
    }
}
