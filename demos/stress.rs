//! A demo program that uses the provided allocator as the global allocator,
//! creates and destroys a large number of objects, and checks validity along
//! the way.

use table_allocator::LockedAllocator;

use rand::distributions::{Distribution, Uniform};
use rand::{Rng, RngCore, SeedableRng};

// This is the magic line that installs the arena globally.
#[global_allocator]
static ALLOCATOR: LockedAllocator<{ 1024 * 1024 }, 2048> = LockedAllocator::new();

// Minimum number of live objects before we start destroying
const MIN_OBJECTS: usize = 128;
// Cap on live objects so the random walk stays inside the arena
const MAX_OBJECTS: usize = 512;
// Total number of create / destroy steps
const STEPS: usize = 16 * 1024;

#[derive(Default)]
struct RandomObjects {
    allocated: Vec<Vec<u64>>,
}

impl RandomObjects {
    fn create<R: Rng>(&mut self, rng: &mut R) {
        let range = Uniform::new_inclusive(8usize, 20);
        let new_size = (range.sample(rng) * range.sample(rng)) as u64;
        let obj: Vec<u64> = (0..new_size).collect();
        self.allocated.push(obj);
    }

    fn destroy<R: Rng>(&mut self, rng: &mut R) {
        if self.allocated.is_empty() {
            return;
        }
        let ix = Uniform::new(0, self.allocated.len()).sample(rng);
        let obj = self.allocated.swap_remove(ix);

        drop(obj);
    }
}

fn main() {
    let seed = rand::thread_rng().next_u64();
    println!("Using seed {}", seed);
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

    let mut objects = RandomObjects::default();
    for step in 0..STEPS {
        let count = objects.allocated.len();
        if count < MIN_OBJECTS || (count < MAX_OBJECTS && rng.gen_bool(0.5)) {
            objects.create(&mut rng);
        } else {
            objects.destroy(&mut rng);
        }

        if step % 1024 == 0 {
            let (validity, stats) = ALLOCATOR.stats();
            assert!(validity.is_valid());
            println!("{}: {:?}", step, stats);
        }
    }

    println!("OK");
}
