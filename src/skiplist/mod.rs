// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Probabilistic ordered key-value index.
//!
//! Nodes live in a per-list arena and link to each other through slot
//! indices, so no owning-pointer aliasing is involved in the multi-level
//! chains. A single mutex serializes every public operation; all
//! operations are linearizable with respect to each other.

mod autosave;
mod snapshot;

pub use autosave::AutoSaveActor;
pub use snapshot::{load_snapshot, LoadOutcome, SnapshotError, Snapshotter};

use rand::rngs::{SmallRng, StdRng};
use rand::{Rng, SeedableRng};
use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use crate::{log_info, log_warn};

/// Separator between key and value in the plain-text dump format.
pub const DUMP_DELIMITER: char = ':';

/// Arena index of the header sentinel.
const HEAD: usize = 0;

/// Outcome of an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The key was new and the pair was spliced in.
    Inserted,
    /// The key was already present; nothing changed.
    Existed,
}

impl InsertOutcome {
    pub fn is_inserted(self) -> bool {
        self == InsertOutcome::Inserted
    }
}

struct Node<K, V> {
    key: K,
    value: V,
    /// Highest level this node participates in; the node is linked into
    /// every chain `0..=level`.
    level: usize,
    /// `forward[i]` is the next node at level `i`.
    forward: Box<[Option<usize>]>,
}

struct Core<K, V> {
    max_level: usize,
    /// Highest level currently in use (0 when empty).
    level: usize,
    /// Slot 0 is the header sentinel; freed slots are recycled.
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    len: u64,
    rng: SmallRng,
}

/// Draw a seed from the process-wide entropy source. A mutex serializes
/// access so concurrent list construction stays well-defined.
fn next_seed() -> u64 {
    static SOURCE: Mutex<Option<StdRng>> = Mutex::new(None);
    let mut source = SOURCE.lock().unwrap();
    source.get_or_insert_with(StdRng::from_entropy).gen()
}

impl<K: Ord + Default, V: Default> Core<K, V> {
    fn new(max_level: usize, seed: u64) -> Self {
        let header = Node {
            key: K::default(),
            value: V::default(),
            level: max_level,
            forward: vec![None; max_level + 1].into_boxed_slice(),
        };
        Self {
            max_level,
            level: 0,
            slots: vec![Some(header)],
            free: Vec::new(),
            len: 0,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn node(&self, id: usize) -> &Node<K, V> {
        self.slots[id].as_ref().expect("arena slot occupied")
    }

    fn node_mut(&mut self, id: usize) -> &mut Node<K, V> {
        self.slots[id].as_mut().expect("arena slot occupied")
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.slots[id] = Some(node);
                id
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        }
    }

    fn release(&mut self, id: usize) {
        self.slots[id] = None;
        self.free.push(id);
    }

    /// Number of consecutive successful coin flips, capped at `max_level`.
    fn random_level(&mut self) -> usize {
        let mut level = 0;
        while level < self.max_level && self.rng.gen::<bool>() {
            level += 1;
        }
        level
    }

    /// Walk top-down recording, per level, the last node whose key is
    /// strictly below `key`.
    fn find_update(&self, key: &K) -> Vec<usize> {
        let mut update = vec![HEAD; self.max_level + 1];
        let mut current = HEAD;
        for i in (0..=self.level).rev() {
            while let Some(next) = self.node(current).forward[i] {
                if self.node(next).key < *key {
                    current = next;
                } else {
                    break;
                }
            }
            update[i] = current;
        }
        update
    }

    /// Locate the node holding `key`, if any.
    fn find(&self, key: &K) -> Option<usize> {
        let mut current = HEAD;
        for i in (0..=self.level).rev() {
            while let Some(next) = self.node(current).forward[i] {
                if self.node(next).key < *key {
                    current = next;
                } else {
                    break;
                }
            }
        }
        match self.node(current).forward[0] {
            Some(id) if self.node(id).key == *key => Some(id),
            _ => None,
        }
    }

    fn insert(&mut self, key: K, value: V) -> InsertOutcome {
        let update = self.find_update(&key);

        if let Some(id) = self.node(update[0]).forward[0] {
            if self.node(id).key == key {
                return InsertOutcome::Existed;
            }
        }

        let level = self.random_level();
        // Slots above the old level already point at the header.
        if level > self.level {
            self.level = level;
        }

        let id = self.alloc(Node {
            key,
            value,
            level,
            forward: vec![None; level + 1].into_boxed_slice(),
        });
        for i in 0..=level {
            let next = self.node(update[i]).forward[i];
            self.node_mut(id).forward[i] = next;
            self.node_mut(update[i]).forward[i] = Some(id);
        }

        self.len += 1;
        InsertOutcome::Inserted
    }

    fn remove(&mut self, key: &K) -> bool {
        let update = self.find_update(key);
        let target = match self.node(update[0]).forward[0] {
            Some(id) if self.node(id).key == *key => id,
            _ => return false,
        };

        for i in (0..=self.node(target).level).rev() {
            let next = self.node(target).forward[i];
            self.node_mut(update[i]).forward[i] = next;
        }
        self.release(target);
        self.len -= 1;

        // Strip levels left empty by the unlink.
        while self.level > 0 && self.node(HEAD).forward[self.level].is_none() {
            self.level -= 1;
        }
        true
    }

    fn clear(&mut self) {
        self.slots.truncate(1);
        self.free.clear();
        for slot in self.node_mut(HEAD).forward.iter_mut() {
            *slot = None;
        }
        self.level = 0;
        self.len = 0;
    }

    /// Bottom-level walk in key order.
    fn bottom_ids(&self) -> Vec<usize> {
        let mut ids = Vec::with_capacity(self.len as usize);
        let mut current = self.node(HEAD).forward[0];
        while let Some(id) = current {
            ids.push(id);
            current = self.node(id).forward[0];
        }
        ids
    }
}

/// Thread-safe skip list. See the module docs for the locking model.
pub struct SkipList<K, V> {
    core: Mutex<Core<K, V>>,
}

impl<K: Ord + Default, V: Default> SkipList<K, V> {
    /// Create an empty list that may grow up to `max_level` link levels.
    ///
    /// # Panics
    /// Panics if `max_level` is zero.
    pub fn new(max_level: usize) -> Self {
        Self::with_seed(max_level, next_seed())
    }

    /// Create a list with a caller-chosen RNG seed. Level assignment (and
    /// therefore the internal shape) becomes deterministic; the visible
    /// key order never depends on the seed.
    pub fn with_seed(max_level: usize, seed: u64) -> Self {
        assert!(max_level >= 1, "max_level must be at least 1");
        Self {
            core: Mutex::new(Core::new(max_level, seed)),
        }
    }

    pub fn max_level(&self) -> usize {
        self.core.lock().unwrap().max_level
    }

    /// Highest link level currently in use.
    pub fn current_level(&self) -> usize {
        self.core.lock().unwrap().level
    }

    /// Insert a pair; an existing key is left untouched.
    pub fn insert(&self, key: K, value: V) -> InsertOutcome {
        self.core.lock().unwrap().insert(key, value)
    }

    /// Replace the value under `key`. Returns false when the key is absent.
    pub fn update(&self, key: &K, new_value: V) -> bool {
        let mut core = self.core.lock().unwrap();
        match core.find(key) {
            Some(id) => {
                core.node_mut(id).value = new_value;
                true
            }
            None => false,
        }
    }

    /// Replace the value under `key`, handing back the previous value.
    pub fn update_and_return_old(&self, key: &K, new_value: V) -> Option<V> {
        let mut core = self.core.lock().unwrap();
        core.find(key)
            .map(|id| std::mem::replace(&mut core.node_mut(id).value, new_value))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.core.lock().unwrap().find(key).is_some()
    }

    /// Remove `key` if present; silently succeeds otherwise.
    pub fn delete(&self, key: &K) {
        self.core.lock().unwrap().remove(key);
    }

    /// Number of stored pairs.
    pub fn size(&self) -> u64 {
        self.core.lock().unwrap().len
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Drop every pair and reset to a single empty level.
    pub fn clear(&self) {
        self.core.lock().unwrap().clear();
    }
}

impl<K: Ord + Default, V: Default + Clone> SkipList<K, V> {
    /// Look up `key`, returning a copy of the stored value.
    pub fn search(&self, key: &K) -> Option<V> {
        let core = self.core.lock().unwrap();
        core.find(key).map(|id| core.node(id).value.clone())
    }
}

impl<K: Ord + Default + Clone, V: Default + Clone> SkipList<K, V> {
    /// All pairs in ascending key order.
    pub fn entries(&self) -> Vec<(K, V)> {
        let core = self.core.lock().unwrap();
        core.bottom_ids()
            .into_iter()
            .map(|id| {
                let node = core.node(id);
                (node.key.clone(), node.value.clone())
            })
            .collect()
    }
}

impl<K: Ord + Default, V: Default + PartialEq> SkipList<K, V> {
    /// Structural equality of the bottom-level chains: same length, same
    /// keys, same values, pairwise.
    pub fn equal_bottom_level(&self, other: &SkipList<K, V>) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        // Address-ordered locking so two concurrent comparisons of the
        // same pair of lists cannot deadlock.
        let swapped = (self as *const Self) > (other as *const Self);
        let (first, second) = if swapped { (other, self) } else { (self, other) };
        let first_core = first.core.lock().unwrap();
        let second_core = second.core.lock().unwrap();
        let (mine, theirs) = if swapped {
            (&second_core, &first_core)
        } else {
            (&first_core, &second_core)
        };

        let mut a = mine.node(HEAD).forward[0];
        let mut b = theirs.node(HEAD).forward[0];
        loop {
            match (a, b) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    let left = mine.node(x);
                    let right = theirs.node(y);
                    if left.key != right.key || left.value != right.value {
                        return false;
                    }
                    a = left.forward[0];
                    b = right.forward[0];
                }
                _ => return false,
            }
        }
    }
}

impl<K: Ord + Default + Display, V: Default + Display> SkipList<K, V> {
    /// Pretty-print the structure, one line per level from the top down.
    pub fn display(&self, writer: &mut impl Write) -> io::Result<()> {
        let core = self.core.lock().unwrap();

        let mut lines = Vec::with_capacity(core.level + 1);
        for level in (0..=core.level).rev() {
            let mut line = format!("Level {}: ", level);
            let mut current = core.node(HEAD).forward[level];
            while let Some(id) = current {
                let node = core.node(id);
                line.push_str(&format!("|{}:{} ", node.key, node.value));
                current = node.forward[level];
            }
            line.push('|');
            lines.push(line);
        }

        let title = "***** Skip List *****";
        let max_length = lines
            .iter()
            .map(|l| l.len())
            .max()
            .unwrap_or(0)
            .max(title.len());
        let padding = (max_length - title.len()) / 2;
        let mut full_title = format!("{}{}", " ".repeat(padding), title);
        while full_title.len() < max_length {
            full_title.push(' ');
        }

        writeln!(writer, "{}", full_title)?;
        for line in &lines {
            writeln!(writer, "{}", line)?;
        }
        Ok(())
    }

    /// Write the bottom level as `key:value` lines.
    pub fn dump_to(&self, writer: &mut impl Write) -> io::Result<()> {
        let core = self.core.lock().unwrap();
        for id in core.bottom_ids() {
            let node = core.node(id);
            writeln!(writer, "{}{}{}", node.key, DUMP_DELIMITER, node.value)?;
        }
        Ok(())
    }

    /// Persist the bottom level to a plain-text file.
    pub fn dump_file(&self, path: &Path) -> io::Result<()> {
        log_info!("dumping list to ", path.display().to_string());
        let mut writer = BufWriter::new(File::create(path)?);
        self.dump_to(&mut writer)?;
        writer.flush()
    }
}

impl<K, V> SkipList<K, V>
where
    K: Ord + Default + FromStr,
    V: Default + FromStr,
{
    /// Read `key:value` lines, inserting each valid pair. Lines without
    /// the delimiter or with unparsable fields are skipped. Returns the
    /// number of pairs inserted.
    pub fn load_from(&self, reader: impl BufRead) -> io::Result<u64> {
        let mut loaded = 0;
        for line in reader.lines() {
            let line = line?;
            let Some((key, value)) = line.split_once(DUMP_DELIMITER) else {
                continue;
            };
            if key.is_empty() || value.is_empty() {
                continue;
            }
            let (Ok(key), Ok(value)) = (key.parse::<K>(), value.parse::<V>()) else {
                log_warn!("skipping unparsable dump line: ", line.as_str());
                continue;
            };
            if self.insert(key, value).is_inserted() {
                loaded += 1;
            }
        }
        Ok(loaded)
    }

    /// Load a plain-text dump produced by [`dump_file`](Self::dump_file).
    pub fn load_file(&self, path: &Path) -> io::Result<u64> {
        log_info!("loading list from ", path.display().to_string());
        self.load_from(BufReader::new(File::open(path)?))
    }
}

#[cfg(test)]
impl<K: Ord + Default, V: Default> SkipList<K, V> {
    /// Validate the structural invariants: strictly sorted chains, higher
    /// levels subsets of lower ones, accurate element count and level
    /// ceiling.
    fn assert_invariants(&self) {
        let core = self.core.lock().unwrap();

        // Sorted chains at every level in use
        for level in 0..=core.level {
            let mut current = core.node(HEAD).forward[level];
            let mut previous: Option<&K> = None;
            while let Some(id) = current {
                let node = core.node(id);
                if let Some(prev_key) = previous {
                    assert!(prev_key < &node.key, "chain not sorted at level {}", level);
                }
                previous = Some(&node.key);
                current = node.forward[level];
            }
        }

        // Every node at level i > 0 must appear at level i - 1
        for level in 1..=core.level {
            let mut lower = Vec::new();
            let mut current = core.node(HEAD).forward[level - 1];
            while let Some(id) = current {
                lower.push(id);
                current = core.node(id).forward[level - 1];
            }
            let mut current = core.node(HEAD).forward[level];
            while let Some(id) = current {
                assert!(
                    lower.contains(&id),
                    "node at level {} missing from level {}",
                    level,
                    level - 1
                );
                current = core.node(id).forward[level];
            }
        }

        // Count and level ceiling
        assert_eq!(core.bottom_ids().len() as u64, core.len);
        let max_node_level = core
            .bottom_ids()
            .iter()
            .map(|&id| core.node(id).level)
            .max()
            .unwrap_or(0);
        assert_eq!(core.level, max_node_level);
        assert!(core.level <= core.max_level);
    }
}
