extern crate avl_collections;
#[macro_use]
extern crate log;
extern crate rand;
extern crate simplelog;

use avl_collections::avl_tree::AvlMap;
use log::LevelFilter;
use rand::Rng;
use simplelog::{Config, SimpleLogger};
use std::cmp;
use std::convert::TryFrom;
use std::env;
use std::process;

const DEFAULT_OPERATIONS: usize = 100_000;
const MAX_PREALLOCATED: usize = 1 << 20;

// Keys are drawn from half the operation count so that removes regularly hit.
fn key_space(operations: usize) -> u32 {
    u32::try_from(operations / 2).unwrap_or(u32::max_value()).max(1)
}

fn initial_capacity(operations: usize) -> usize {
    cmp::min(operations, MAX_PREALLOCATED)
}

// Runs a random mix of inserts and removes and reports the final shape of the tree.
// Usage: avl-collections [operations], with the log level taken from AVL_LOG.
fn main() {
    let level = env::var("AVL_LOG")
        .ok()
        .and_then(|level| level.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    if SimpleLogger::init(level, Config::default()).is_err() {
        eprintln!("Error: could not install logger.");
    }

    let operations = env::args()
        .nth(1)
        .and_then(|arg| arg.parse::<usize>().ok())
        .unwrap_or(DEFAULT_OPERATIONS);
    let upper = key_space(operations);

    let mut rng: rand::XorShiftRng = rand::SeedableRng::from_seed([1, 1, 1, 1]);
    let mut map = AvlMap::with_capacity(initial_capacity(operations));
    let mut removed = 0;

    for _ in 0..operations {
        let key = rng.gen_range(0, upper);
        if rng.gen::<bool>() {
            map.insert(key, rng.gen::<u32>());
        } else if map.remove(&key).is_some() {
            removed += 1;
        }
    }

    info!(
        "{} operations: {} entries, {} removed, height {}",
        operations,
        map.len(),
        removed,
        map.height(),
    );

    if !map.is_balanced() {
        error!("tree is not balanced after {} operations", operations);
        process::exit(1);
    }
}
