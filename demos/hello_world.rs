//! Installs the locked arena as the global allocator and prints a greeting
//! allocated from it.

use table_allocator::LockedAllocator;

// 4 MiB of cells and 2048 descriptor slots, all reserved up front.
#[global_allocator]
static ALLOCATOR: LockedAllocator<{ 1024 * 1024 }, 2048> = LockedAllocator::new();

fn main() {
    let greeting = String::from("Hello, World!");
    println!("{}", greeting);

    let (validity, stats) = ALLOCATOR.stats();
    println!("validity: {:?}", validity);
    println!("stats: {:?}", stats);
}
