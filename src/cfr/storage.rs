//! Tabular strategy profile shared by concurrent traversals.
//!
//! [`PolicyTable`] maps `(player, infoset key)` to a [`Record`]. Each player's
//! keys are spread over a fixed number of shards, each behind its own
//! `RwLock`, so lookups of existing records only take a shared lock and two
//! traversals contend only when they hit the same shard while it grows.
//!
//! The table also owns the iteration counter and the discount parameters and
//! implements the snapshot format used to checkpoint training:
//!
//! ```text
//! u64 iteration, u32 num_players
//! per player:  u32 player_index, u64 num_records
//! per record:  u32 key_len, key bytes, u32 n_actions,
//!              f32[n_actions] regret_sum, f32[n_actions] strategy_sum
//! ```
//!
//! All integers and floats are little-endian.

use std::hash::{Hash, Hasher};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, trace, warn};
use rustc_hash::{FxHashMap, FxHasher};

use crate::cfr::discount::DiscountParams;
use crate::cfr::error::{CfrError, Result};
use crate::cfr::game::{GameTreeNode, InfoSet};
use crate::cfr::policy::{read_floats, uniform, write_floats, NodePolicy, Record, StrategyProfile};

/// Number of shards per player.
const NUM_SHARDS: usize = 64;

/// Longest infoset key accepted when loading a snapshot.
const MAX_KEY_LEN: usize = 1 << 20;

/// Largest action count accepted when loading a snapshot.
const MAX_ACTIONS: usize = 1 << 16;

type Shard = RwLock<FxHashMap<Box<[u8]>, Arc<Record>>>;

/// Thread-safe table of regret/strategy records for every player.
#[derive(Debug)]
pub struct PolicyTable {
    /// `players[p][s]` holds the records of player `p` whose key hashes to `s`.
    players: Vec<Vec<Shard>>,

    /// Discounting applied at every [`StrategyProfile::update`].
    discount: DiscountParams,

    /// Current iteration, starting at 1.
    iteration: AtomicU64,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new(2, DiscountParams::default())
    }
}

impl PolicyTable {
    /// Create an empty table.
    ///
    /// # Arguments
    /// * `num_players` - Number of players that own records
    /// * `discount` - Discount flags applied at each update
    pub fn new(num_players: usize, discount: DiscountParams) -> Self {
        let players = (0..num_players)
            .map(|_| (0..NUM_SHARDS).map(|_| RwLock::new(FxHashMap::default())).collect())
            .collect();

        Self {
            players,
            discount,
            iteration: AtomicU64::new(1),
        }
    }

    /// Discount flags of this table.
    pub fn discount(&self) -> &DiscountParams {
        &self.discount
    }

    /// Number of players.
    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    fn shard(&self, player: usize, key: &[u8]) -> &Shard {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        &self.players[player][hasher.finish() as usize % NUM_SHARDS]
    }

    /// Record of `player` at `key`, created with `num_actions` actions on
    /// first visit.
    ///
    /// Panics if the record exists with a different number of actions.
    pub fn policy_for(&self, player: usize, key: &[u8], num_actions: usize) -> Arc<Record> {
        let shard = self.shard(player, key);

        if let Some(record) = shard.read().unwrap().get(key) {
            check_actions(record, key, num_actions);
            return Arc::clone(record);
        }

        let mut map = shard.write().unwrap();
        let record = map.entry(Box::from(key)).or_insert_with(|| {
            trace!(
                "new record for player {} at {:?} with {} actions",
                player,
                String::from_utf8_lossy(key),
                num_actions
            );
            Arc::new(Record::new(num_actions))
        });
        check_actions(record, key, num_actions);
        Arc::clone(record)
    }

    /// Existing record of `player` at `key`, without creating one.
    pub fn get_record(&self, player: usize, key: &[u8]) -> Option<Arc<Record>> {
        self.shard(player, key).read().unwrap().get(key).cloned()
    }

    /// Whether a record exists for `player` at `key`.
    pub fn contains(&self, player: usize, key: &[u8]) -> bool {
        self.shard(player, key).read().unwrap().contains_key(key)
    }

    /// Average strategy of `player` at `key`.
    ///
    /// # Returns
    /// The normalized strategy sum, or uniform over `num_actions` if the
    /// infoset was never visited.
    pub fn average_strategy_for(&self, player: usize, key: &[u8], num_actions: usize) -> Vec<f32> {
        match self.get_record(player, key) {
            Some(record) => record.get_average_strategy(),
            None => uniform_vec(num_actions),
        }
    }

    /// Current (regret-matched) strategy of `player` at `key`.
    pub fn current_strategy_for(&self, player: usize, key: &[u8], num_actions: usize) -> Vec<f32> {
        match self.get_record(player, key) {
            Some(record) => record.get_strategy(),
            None => uniform_vec(num_actions),
        }
    }

    /// Average strategy of the acting player at `node`. Does not create
    /// records.
    pub fn average_strategy<N: GameTreeNode>(&self, node: &N) -> Vec<f32> {
        let player = node.player();
        let info = node.info_set(player);
        self.average_strategy_for(player, info.key(), node.num_children())
    }

    /// Current strategy of the acting player at `node`. Does not create
    /// records.
    pub fn current_strategy<N: GameTreeNode>(&self, node: &N) -> Vec<f32> {
        let player = node.player();
        let info = node.info_set(player);
        self.current_strategy_for(player, info.key(), node.num_children())
    }

    /// Total number of records over all players.
    pub fn num_records(&self) -> usize {
        (0..self.num_players()).map(|p| self.num_records_for(p)).sum()
    }

    /// Number of records owned by `player`.
    pub fn num_records_for(&self, player: usize) -> usize {
        self.players[player]
            .iter()
            .map(|shard| shard.read().unwrap().len())
            .sum()
    }

    /// Approximate memory held by keys and record arrays, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.players
            .iter()
            .flatten()
            .map(|shard| {
                shard
                    .read()
                    .unwrap()
                    .iter()
                    .map(|(key, record)| key.len() + Record::encoded_len(record.num_actions()))
                    .sum::<usize>()
            })
            .sum()
    }

    /// Records of `player` sorted by key.
    pub fn records(&self, player: usize) -> Vec<(Box<[u8]>, Arc<Record>)> {
        let mut records: Vec<_> = self.players[player]
            .iter()
            .flat_map(|shard| {
                shard
                    .read()
                    .unwrap()
                    .iter()
                    .map(|(k, r)| (k.clone(), Arc::clone(r)))
                    .collect::<Vec<_>>()
            })
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0));
        records
    }

    /// Remove every record and reset the iteration counter.
    pub fn clear(&self) {
        for shard in self.players.iter().flatten() {
            shard.write().unwrap().clear();
        }
        self.iteration.store(1, Ordering::Release);
    }

    /// Write a snapshot of the table.
    ///
    /// Only `regret_sum` and `strategy_sum` are persisted. Records are
    /// written in key order so equal tables produce equal bytes.
    pub fn save<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.iter())?;
        writer.write_u32::<LittleEndian>(self.num_players() as u32)?;

        for player in 0..self.num_players() {
            let records = self.records(player);
            writer.write_u32::<LittleEndian>(player as u32)?;
            writer.write_u64::<LittleEndian>(records.len() as u64)?;

            for (key, record) in records {
                writer.write_u32::<LittleEndian>(key.len() as u32)?;
                writer.write_all(&key)?;
                writer.write_u32::<LittleEndian>(record.num_actions() as u32)?;
                write_floats(writer, &record.regret_sum())?;
                write_floats(writer, &record.strategy_sum())?;
            }
        }

        Ok(())
    }

    /// Replace the contents of the table with a snapshot.
    ///
    /// Current strategies are recomputed from the loaded regret sums. The
    /// table is left untouched if the snapshot fails to decode.
    pub fn load<R: Read>(&self, reader: &mut R) -> Result<()> {
        let iteration = reader.read_u64::<LittleEndian>()?;
        let num_players = reader.read_u32::<LittleEndian>()? as usize;
        if iteration == 0 {
            return Err(CfrError::MalformedSnapshot("iteration 0".to_string()));
        }
        if num_players != self.num_players() {
            warn!(
                "snapshot has {} players, table has {}; extra players are ignored",
                num_players,
                self.num_players()
            );
        }

        let mut loaded = Vec::new();
        for _ in 0..num_players {
            let player = reader.read_u32::<LittleEndian>()? as usize;
            let num_records = reader.read_u64::<LittleEndian>()?;

            for _ in 0..num_records {
                let (key, record) = read_entry(reader)?;
                if player < self.num_players() {
                    loaded.push((player, key, record));
                }
            }
        }

        for shard in self.players.iter().flatten() {
            shard.write().unwrap().clear();
        }
        for (player, key, record) in loaded {
            self.shard(player, &key)
                .write()
                .unwrap()
                .insert(key, Arc::new(record));
        }
        self.iteration.store(iteration, Ordering::Release);

        debug!(
            "loaded {} records at iteration {}",
            self.num_records(),
            iteration
        );
        Ok(())
    }
}

fn read_entry<R: Read>(reader: &mut R) -> Result<(Box<[u8]>, Record)> {
    let key_len = reader.read_u32::<LittleEndian>()? as usize;
    if key_len > MAX_KEY_LEN {
        return Err(CfrError::MalformedSnapshot(format!("key length {}", key_len)));
    }

    let mut key = vec![0u8; key_len];
    reader.read_exact(&mut key).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => {
            CfrError::MalformedSnapshot(format!("truncated key of {} bytes", key_len))
        }
        _ => CfrError::Io(e),
    })?;

    let num_actions = reader.read_u32::<LittleEndian>()? as usize;
    if num_actions == 0 {
        return Err(CfrError::MalformedSnapshot(format!(
            "record {:?} has no actions",
            String::from_utf8_lossy(&key)
        )));
    }
    if num_actions > MAX_ACTIONS {
        return Err(CfrError::MalformedSnapshot(format!(
            "record {:?} has {} actions",
            String::from_utf8_lossy(&key),
            num_actions
        )));
    }

    let regret_sum = read_floats(reader, num_actions)?;
    let strategy_sum = read_floats(reader, num_actions)?;
    Ok((key.into_boxed_slice(), Record::from_sums(regret_sum, strategy_sum)))
}

fn check_actions(record: &Record, key: &[u8], num_actions: usize) {
    assert_eq!(
        record.num_actions(),
        num_actions,
        "action count mismatch for info set {:?}",
        String::from_utf8_lossy(key)
    );
}

fn uniform_vec(num_actions: usize) -> Vec<f32> {
    let mut out = vec![0.0; num_actions];
    uniform(&mut out);
    out
}

impl StrategyProfile for PolicyTable {
    type Policy = Record;

    fn get_policy<N: GameTreeNode>(&self, node: &N) -> Arc<Record> {
        let player = node.player();
        let info = node.info_set(player);
        self.policy_for(player, info.key(), node.num_children())
    }

    fn update(&self) {
        let iteration = self.iter();
        let (pos, neg, sum) = self.discount.discount_factors(iteration);

        let mut advanced = 0usize;
        for shard in self.players.iter().flatten() {
            for record in shard.read().unwrap().values() {
                if record.take_touched() {
                    record.next_strategy(pos, neg, sum);
                    advanced += 1;
                }
            }
        }

        debug!(
            "iteration {}: discounts ({}, {}, {}), advanced {} records",
            iteration, pos, neg, sum, advanced
        );
        self.iteration.fetch_add(1, Ordering::AcqRel);
    }

    fn iter(&self) -> u64 {
        self.iteration.load(Ordering::Acquire)
    }
}
