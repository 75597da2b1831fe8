// Structure:
//  - tree: the two engines (B-tree, B+-tree), shared node types and
//    invariant checking. Knows nothing about the driver.
//  - driver: command loop, random keys, timing, rendering, reports.
//  - config: driver settings loaded from the environment.
//
// Control flow: driver -> engine insert/search/traverse -> node mutations.

pub mod config;
pub mod driver;
pub mod tree;
