//! Interactive comparison session over a B-tree and a B+-tree.
//!
//! The session owns one tree of each kind, built with the same degree and
//! fed the same keys, plus the set of keys inserted so far. Duplicate keys
//! are refused before either tree is touched, so both trees always hold
//! exactly the keys in that set.

use std::collections::BTreeSet;
use std::io::{BufRead, Write};
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use crate::config::DriverConfig;
use crate::driver::DriverError;
use crate::driver::command::{Command, HELP};
use crate::driver::render::{BPlusTreeView, BTreeView, Comparison, LeafSequence};
use crate::tree::{BPlusTree, BTree, Degree, Key, SearchTree};

/// Range random keys are drawn from by `random`.
pub const RANDOM_KEY_RANGE: RangeInclusive<Key> = 1..=1000;

/// Range benchmark keys are drawn from by `bench`.
pub const BENCH_KEY_RANGE: RangeInclusive<Key> = 10_000..=20_000;

/// Whether the command loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Timings for one bulk benchmark run.
#[derive(Debug, Clone, Copy)]
pub struct BenchReport {
    pub keys: usize,
    pub btree_insert: Duration,
    pub bplus_insert: Duration,
    pub btree_search: Duration,
    pub bplus_search: Duration,
}

/// A driver session.
pub struct Session {
    config: DriverConfig,
    btree: BTree,
    bplus: BPlusTree,
    keys: BTreeSet<Key>,
    rng: StdRng,
}

impl Session {
    /// Create a session with empty trees.
    #[must_use]
    pub fn new(config: DriverConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        Self {
            btree: BTree::new(config.degree),
            bplus: BPlusTree::new(config.degree),
            keys: BTreeSet::new(),
            rng,
            config,
        }
    }

    /// The current minimum degree of both trees.
    #[must_use]
    pub const fn degree(&self) -> Degree {
        self.config.degree
    }

    /// The B-tree.
    #[must_use]
    pub const fn btree(&self) -> &BTree {
        &self.btree
    }

    /// The B+-tree.
    #[must_use]
    pub const fn bplus(&self) -> &BPlusTree {
        &self.bplus
    }

    /// Keys inserted so far, ascending.
    #[must_use]
    pub const fn keys(&self) -> &BTreeSet<Key> {
        &self.keys
    }

    /// Read commands line by line until `quit` or end of input.
    ///
    /// Command and tree errors are reported on `out` and the loop carries
    /// on; only I/O errors end it early.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<(), DriverError> {
        writeln!(
            out,
            "B-tree / B+-tree comparison (degree {})",
            self.degree()
        )?;
        writeln!(out, "type 'help' for the command list")?;

        for line in input.lines() {
            let line = line?;
            match self.execute_line(&line, out) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(DriverError::Io(e)) => return Err(DriverError::Io(e)),
                Err(e) => {
                    warn!("command '{line}' failed: {e}");
                    writeln!(out, "error: {e}")?;
                }
            }
        }

        writeln!(out, "goodbye")?;
        Ok(())
    }

    /// Parse and execute one input line. Blank lines do nothing.
    pub fn execute_line<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow, DriverError> {
        match Command::parse(line)? {
            Some(command) => self.execute(command, out),
            None => Ok(Flow::Continue),
        }
    }

    /// Execute one command, writing its report to `out`.
    pub fn execute<W: Write>(
        &mut self,
        command: Command,
        out: &mut W,
    ) -> Result<Flow, DriverError> {
        debug!("executing {command:?}");

        match command {
            Command::Insert(key) => self.insert_key(key, out)?,
            Command::Search(key) => self.search_key(key, out)?,
            Command::Show => self.show(out)?,
            Command::Random(count) => self.insert_random(count, out)?,
            Command::Compare => self.compare(out)?,
            Command::Bench => {
                let report = self.bench()?;
                write_bench_report(&report, out)?;
            }
            Command::Degree(t) => self.change_degree(t, out)?,
            Command::Clear => {
                self.clear();
                writeln!(out, "trees cleared")?;
            }
            Command::Leaves => writeln!(out, "{}", LeafSequence(&self.bplus))?,
            Command::Check => self.check(out)?,
            Command::Save(path) => {
                self.save(&path)?;
                writeln!(out, "report written to {}", path.display())?;
            }
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn insert_key<W: Write>(&mut self, key: Key, out: &mut W) -> Result<(), DriverError> {
        if self.keys.contains(&key) {
            writeln!(out, "key {key} already exists")?;
            return Ok(());
        }

        let btree_time = timed(|| self.btree.insert(key))?;
        let bplus_time = timed(|| self.bplus.insert(key))?;
        self.keys.insert(key);

        writeln!(out, "key {key} inserted")?;
        writeln!(
            out,
            "insert time - {}: {}ns, {}: {}ns",
            self.btree.name(),
            btree_time.as_nanos(),
            self.bplus.name(),
            bplus_time.as_nanos()
        )?;
        Ok(())
    }

    fn search_key<W: Write>(&self, key: Key, out: &mut W) -> Result<(), DriverError> {
        let start = Instant::now();
        let in_btree = self.btree.search(key).is_some();
        let btree_time = start.elapsed();

        let start = Instant::now();
        let in_bplus = self.bplus.search(key).is_some();
        let bplus_time = start.elapsed();

        writeln!(out, "search results for key {key}:")?;
        for (name, found, time) in [
            (self.btree.name(), in_btree, btree_time),
            (self.bplus.name(), in_bplus, bplus_time),
        ] {
            let verdict = if found { "FOUND" } else { "NOT FOUND" };
            writeln!(out, "{name}: {verdict} (time: {}ns)", time.as_nanos())?;
        }
        Ok(())
    }

    fn show<W: Write>(&self, out: &mut W) -> Result<(), DriverError> {
        write!(out, "{}", self.report())?;
        Ok(())
    }

    /// Rendering of both trees followed by the comparison table.
    #[must_use]
    pub fn report(&self) -> String {
        format!(
            "{}\n{}\n{}",
            BTreeView(&self.btree),
            BPlusTreeView(&self.bplus),
            Comparison::of(&self.btree, &self.bplus)
        )
    }

    /// Draw `count` distinct keys from `range` that are not yet inserted.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::KeySpaceExhausted` if the range does not have
    /// `count` unused keys left.
    pub fn unique_random_keys(
        &mut self,
        count: usize,
        range: RangeInclusive<Key>,
    ) -> Result<Vec<Key>, DriverError> {
        let available = if range.is_empty() {
            0
        } else {
            let span = usize::try_from(range.end().abs_diff(*range.start()))
                .map_or(usize::MAX, |span| span.saturating_add(1));
            span - self.keys.range(range.clone()).count()
        };
        if count > available {
            return Err(DriverError::KeySpaceExhausted {
                requested: count,
                available,
            });
        }

        let mut drawn = BTreeSet::new();
        let mut keys = Vec::with_capacity(count);
        while keys.len() < count {
            let key = self.rng.random_range(range.clone());
            if !self.keys.contains(&key) && drawn.insert(key) {
                keys.push(key);
            }
        }
        Ok(keys)
    }

    fn insert_random<W: Write>(&mut self, count: usize, out: &mut W) -> Result<(), DriverError> {
        let keys = self.unique_random_keys(count, RANDOM_KEY_RANGE)?;

        write!(out, "inserting keys:")?;
        for &key in &keys {
            write!(out, " {key}")?;
            self.btree.insert(key)?;
            self.bplus.insert(key)?;
            self.keys.insert(key);
        }
        writeln!(out)?;
        writeln!(out, "inserted {count} keys")?;
        Ok(())
    }

    fn compare<W: Write>(&self, out: &mut W) -> Result<(), DriverError> {
        writeln!(out, "{}", Comparison::of(&self.btree, &self.bplus))?;
        writeln!(out, "main differences:")?;
        writeln!(out, "* B-tree: keys in every node, searches may stop early")?;
        writeln!(out, "* B+-tree: keys only in leaves, internal keys route")?;
        writeln!(out, "* B+-tree: leaves are chained for sequential access")?;
        Ok(())
    }

    /// Insert then search `bench_size` fresh keys on each tree, timing each phase.
    ///
    /// The keys stay in the trees afterwards.
    ///
    /// # Errors
    ///
    /// Returns `DriverError::KeySpaceExhausted` if the benchmark range has too
    /// few unused keys left.
    pub fn bench(&mut self) -> Result<BenchReport, DriverError> {
        let keys = self.unique_random_keys(self.config.bench_size, BENCH_KEY_RANGE)?;
        info!(
            "benchmarking {} keys at degree {}",
            keys.len(),
            self.degree()
        );

        let btree_insert = timed(|| keys.iter().try_for_each(|&key| self.btree.insert(key)))?;
        let bplus_insert = timed(|| keys.iter().try_for_each(|&key| self.bplus.insert(key)))?;

        let start = Instant::now();
        let btree_hits = keys.iter()
            .filter(|&&key| self.btree.search(key).is_some())
            .count();
        let btree_search = start.elapsed();

        let start = Instant::now();
        let bplus_hits = keys.iter()
            .filter(|&&key| self.bplus.search(key).is_some())
            .count();
        let bplus_search = start.elapsed();

        debug_assert_eq!(btree_hits, keys.len());
        debug_assert_eq!(bplus_hits, keys.len());

        self.keys.extend(keys.iter().copied());

        Ok(BenchReport {
            keys: keys.len(),
            btree_insert,
            bplus_insert,
            btree_search,
            bplus_search,
        })
    }

    fn change_degree<W: Write>(&mut self, t: usize, out: &mut W) -> Result<(), DriverError> {
        let degree = match Degree::new(t) {
            Ok(degree) => degree,
            Err(e) => {
                writeln!(out, "error: {e}; keeping degree {}", self.degree())?;
                return Ok(());
            }
        };

        self.rebuild(degree)?;
        writeln!(out, "degree changed to {degree}, trees rebuilt")?;
        Ok(())
    }

    /// Rebuild both trees at `degree`, reinserting every key in ascending order.
    pub fn rebuild(&mut self, degree: Degree) -> Result<(), DriverError> {
        info!("rebuilding trees: degree {} -> {degree}", self.degree());
        self.config.degree = degree;
        self.btree = BTree::new(degree);
        self.bplus = BPlusTree::new(degree);

        for &key in &self.keys {
            self.btree.insert(key)?;
            self.bplus.insert(key)?;
        }
        Ok(())
    }

    /// Drop every key, keeping the current degree.
    pub fn clear(&mut self) {
        self.btree = BTree::new(self.config.degree);
        self.bplus = BPlusTree::new(self.config.degree);
        self.keys.clear();
    }

    fn check<W: Write>(&self, out: &mut W) -> Result<(), DriverError> {
        let trees: [&dyn SearchTree; 2] = [&self.btree, &self.bplus];
        for tree in trees {
            match tree.check_invariants() {
                Ok(()) => writeln!(out, "{}: ok", tree.name())?,
                Err(e) => {
                    warn!("{} invariant violated: {e}", tree.name());
                    writeln!(out, "{}: VIOLATION: {e}", tree.name())?;
                }
            }
        }
        Ok(())
    }

    /// Write the current report to `path`.
    pub fn save(&self, path: &Path) -> Result<(), DriverError> {
        std::fs::write(path, self.report()).map_err(|source| DriverError::Save {
            path: path.to_path_buf(),
            source,
        })?;
        info!("report written to {}", path.display());
        Ok(())
    }
}

fn timed<T, E>(f: impl FnOnce() -> Result<T, E>) -> Result<Duration, E> {
    let start = Instant::now();
    f()?;
    Ok(start.elapsed())
}

fn write_bench_report<W: Write>(report: &BenchReport, out: &mut W) -> Result<(), DriverError> {
    writeln!(out, "benchmark results:")?;
    writeln!(out, "{}", "-".repeat(50))?;
    writeln!(out, "insert {} keys:", report.keys)?;
    writeln!(out, "  B-tree:  {}us", report.btree_insert.as_micros())?;
    writeln!(out, "  B+-tree: {}us", report.bplus_insert.as_micros())?;
    writeln!(out, "search {} keys:", report.keys)?;
    writeln!(out, "  B-tree:  {}us", report.btree_search.as_micros())?;
    writeln!(out, "  B+-tree: {}us", report.bplus_search.as_micros())?;
    Ok(())
}
