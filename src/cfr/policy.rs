//! Per-infoset regret/strategy records and the policy contracts.
//!
//! A [`Record`] accumulates regret and strategy mass for one information set
//! and derives the current strategy by regret matching. Engines talk to
//! records through [`NodePolicy`] and obtain them from a [`StrategyProfile`],
//! so tabular, disk-backed or learned policies can share the same engines.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::cfr::error::{CfrError, Result};
use crate::cfr::game::GameTreeNode;

/// Tolerance for a strategy to count as a probability distribution.
pub const STRATEGY_TOLERANCE: f32 = 1e-3;

/// Regret and strategy state that engines read and update for one infoset.
///
/// Implementations must tolerate concurrent calls from parallel traversals.
pub trait NodePolicy: Send + Sync {
    /// Number of actions at this infoset. Fixed at creation.
    fn num_actions(&self) -> usize;

    /// Copy the current strategy into `out` (length `num_actions`).
    fn strategy_into(&self, out: &mut [f32]);

    /// Current strategy as an owned vector.
    fn get_strategy(&self) -> Vec<f32> {
        let mut out = vec![0.0; self.num_actions()];
        self.strategy_into(&mut out);
        out
    }

    /// `regret_sum += weight * instantaneous_regrets`.
    fn add_regret(&self, weight: f32, instantaneous_regrets: &[f32]);

    /// Add reach mass that will be credited to the current strategy.
    fn add_strategy_weight(&self, weight: f32);

    /// Copy the accumulated strategy sum into `out` and return its total.
    fn strategy_sum_into(&self, out: &mut [f32]) -> f32;

    /// Normalized strategy sum; uniform if nothing was accumulated.
    fn get_average_strategy(&self) -> Vec<f32>;

    /// Fold pending weight, discount and recompute the current strategy.
    fn next_strategy(&self, discount_pos: f32, discount_neg: f32, discount_sum: f32);

    /// Copy the control-variate baseline into `out`.
    fn baseline_into(&self, out: &mut [f32]);

    /// Replace the baseline.
    fn set_baseline(&self, baseline: &[f32]);

    /// Move the baseline of `action` toward `value` by `decay`.
    fn update_baseline(&self, decay: f32, action: usize, value: f32);
}

/// A keyed collection of node policies plus the iteration counter.
pub trait StrategyProfile: Send + Sync {
    /// Policy type handed to the engines.
    type Policy: NodePolicy;

    /// Policy of the acting player at `node`, created on first visit.
    fn get_policy<N: GameTreeNode>(&self, node: &N) -> Arc<Self::Policy>;

    /// Current strategy at `node`.
    fn get_strategy<N: GameTreeNode>(&self, node: &N) -> Vec<f32> {
        self.get_policy(node).get_strategy()
    }

    /// Advance to the next iteration.
    fn update(&self);

    /// Current iteration. The traversing player of sampling variants is
    /// `iter() % 2`.
    fn iter(&self) -> u64;
}

/// Regret matching: strategy proportional to positive regret, uniform if
/// no regret is positive.
pub fn regret_matching(regret_sum: &[f32], out: &mut [f32]) {
    debug_assert_eq!(regret_sum.len(), out.len());

    let mut total = 0.0f32;
    for (o, &r) in out.iter_mut().zip(regret_sum) {
        *o = r.max(0.0);
        total += *o;
    }

    if total > 0.0 {
        for o in out.iter_mut() {
            *o /= total;
        }
    } else {
        uniform(out);
    }
}

/// Fill `out` with the uniform distribution.
pub fn uniform(out: &mut [f32]) {
    let p = 1.0 / out.len() as f32;
    out.iter_mut().for_each(|o| *o = p);
}

/// Panic unless `strategy` sums to 1 within [`STRATEGY_TOLERANCE`].
///
/// A malformed strategy means the policy is broken, so there is nothing
/// to recover.
pub fn check_strategy(strategy: &[f32]) {
    let total: f32 = strategy.iter().sum();
    assert!(
        (total - 1.0).abs() <= STRATEGY_TOLERANCE,
        "strategy {:?} sums to {} instead of 1",
        strategy,
        total
    );
}

#[derive(Debug, Clone, PartialEq)]
struct RecordData {
    current_strategy_weight: f32,
    current_strategy: Vec<f32>,
    regret_sum: Vec<f32>,
    strategy_sum: Vec<f32>,
    baseline: Vec<f32>,
}

/// Tabular regret/strategy record for one information set.
///
/// State lives behind a per-record lock so that concurrent traversals only
/// contend when they hit the same infoset.
#[derive(Debug)]
pub struct Record {
    num_actions: usize,
    data: Mutex<RecordData>,
    touched: AtomicBool,
}

impl Record {
    /// A fresh record with a uniform current strategy.
    pub fn new(num_actions: usize) -> Self {
        assert!(num_actions > 0, "record needs at least one action");
        let mut current_strategy = vec![0.0; num_actions];
        uniform(&mut current_strategy);

        Self {
            num_actions,
            data: Mutex::new(RecordData {
                current_strategy_weight: 0.0,
                current_strategy,
                regret_sum: vec![0.0; num_actions],
                strategy_sum: vec![0.0; num_actions],
                baseline: vec![0.0; num_actions],
            }),
            touched: AtomicBool::new(false),
        }
    }

    /// Rebuild a record from persisted sums. The current strategy is
    /// recomputed from `regret_sum`.
    pub fn from_sums(regret_sum: Vec<f32>, strategy_sum: Vec<f32>) -> Self {
        assert_eq!(regret_sum.len(), strategy_sum.len());
        let record = Self::new(regret_sum.len());
        {
            let mut data = record.data.lock().unwrap();
            regret_matching(&regret_sum, &mut data.current_strategy);
            data.regret_sum = regret_sum;
            data.strategy_sum = strategy_sum;
        }
        record
    }

    /// Accumulated regret per action.
    pub fn regret_sum(&self) -> Vec<f32> {
        self.data.lock().unwrap().regret_sum.clone()
    }

    /// Accumulated strategy mass per action.
    pub fn strategy_sum(&self) -> Vec<f32> {
        self.data.lock().unwrap().strategy_sum.clone()
    }

    /// Pending reach mass not yet folded into the strategy sum.
    pub fn current_strategy_weight(&self) -> f32 {
        self.data.lock().unwrap().current_strategy_weight
    }

    /// Control-variate baseline per action.
    pub fn get_baseline(&self) -> Vec<f32> {
        self.data.lock().unwrap().baseline.clone()
    }

    /// Clear the touched flag, returning whether it was set.
    pub(crate) fn take_touched(&self) -> bool {
        self.touched.swap(false, Ordering::AcqRel)
    }

    /// Size in bytes of the block produced by [`Record::encode`].
    pub fn encoded_len(num_actions: usize) -> usize {
        4 * (1 + 4 * num_actions)
    }

    /// Encode as a little-endian block: `current_strategy_weight`, then
    /// `current_strategy`, `regret_sum`, `strategy_sum`, `baseline`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(Self::encoded_len(self.num_actions));
        self.write_to(&mut buf)
            .expect("writing to a Vec cannot fail");
        buf
    }

    /// Write the block of [`Record::encode`] to `writer`.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let data = self.data.lock().unwrap();
        writer.write_f32::<LittleEndian>(data.current_strategy_weight)?;
        for values in [
            &data.current_strategy,
            &data.regret_sum,
            &data.strategy_sum,
            &data.baseline,
        ] {
            write_floats(writer, values)?;
        }
        Ok(())
    }

    /// Decode a block, inferring the number of actions from its length.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            return Err(CfrError::MalformedRecord { len: bytes.len() });
        }
        let n_floats = bytes.len() / 4;
        if n_floats < 5 || (n_floats - 1) % 4 != 0 {
            return Err(CfrError::MalformedRecord { len: bytes.len() });
        }
        Self::read_from(&mut &bytes[..], (n_floats - 1) / 4)
    }

    /// Read a block for a record with a known number of actions.
    pub fn read_from<R: Read>(reader: &mut R, num_actions: usize) -> Result<Self> {
        let current_strategy_weight = reader.read_f32::<LittleEndian>()?;
        let current_strategy = read_floats(reader, num_actions)?;
        let regret_sum = read_floats(reader, num_actions)?;
        let strategy_sum = read_floats(reader, num_actions)?;
        let baseline = read_floats(reader, num_actions)?;

        Ok(Self {
            num_actions,
            data: Mutex::new(RecordData {
                current_strategy_weight,
                current_strategy,
                regret_sum,
                strategy_sum,
                baseline,
            }),
            touched: AtomicBool::new(false),
        })
    }
}

pub(crate) fn write_floats<W: Write>(writer: &mut W, values: &[f32]) -> Result<()> {
    for &v in values {
        writer.write_f32::<LittleEndian>(v)?;
    }
    Ok(())
}

pub(crate) fn read_floats<R: Read>(reader: &mut R, n: usize) -> Result<Vec<f32>> {
    let mut values = vec![0.0; n];
    reader.read_f32_into::<LittleEndian>(&mut values)?;
    Ok(values)
}

impl NodePolicy for Record {
    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn strategy_into(&self, out: &mut [f32]) {
        let data = self.data.lock().unwrap();
        out.copy_from_slice(&data.current_strategy);
    }

    fn add_regret(&self, weight: f32, instantaneous_regrets: &[f32]) {
        debug_assert_eq!(instantaneous_regrets.len(), self.num_actions);
        let mut data = self.data.lock().unwrap();
        for (r, &delta) in data.regret_sum.iter_mut().zip(instantaneous_regrets) {
            *r += weight * delta;
        }
        self.touched.store(true, Ordering::Release);
    }

    fn add_strategy_weight(&self, weight: f32) {
        self.data.lock().unwrap().current_strategy_weight += weight;
        self.touched.store(true, Ordering::Release);
    }

    fn strategy_sum_into(&self, out: &mut [f32]) -> f32 {
        let data = self.data.lock().unwrap();
        out.copy_from_slice(&data.strategy_sum);
        data.strategy_sum.iter().sum()
    }

    fn get_average_strategy(&self) -> Vec<f32> {
        let data = self.data.lock().unwrap();
        let total: f32 = data.strategy_sum.iter().sum();
        let mut avg = vec![0.0; self.num_actions];
        if total == 0.0 {
            uniform(&mut avg);
        } else {
            for (a, &s) in avg.iter_mut().zip(&data.strategy_sum) {
                *a = s / total;
            }
        }
        avg
    }

    fn next_strategy(&self, discount_pos: f32, discount_neg: f32, discount_sum: f32) {
        let mut data = self.data.lock().unwrap();
        let RecordData {
            current_strategy_weight,
            current_strategy,
            regret_sum,
            strategy_sum,
            ..
        } = &mut *data;

        if discount_sum != 1.0 {
            strategy_sum.iter_mut().for_each(|s| *s *= discount_sum);
        }

        if *current_strategy_weight != 0.0 {
            for (s, &p) in strategy_sum.iter_mut().zip(current_strategy.iter()) {
                *s += *current_strategy_weight * p;
            }
        }

        if discount_pos != 1.0 || discount_neg != 1.0 {
            for r in regret_sum.iter_mut() {
                if *r > 0.0 {
                    *r *= discount_pos;
                } else {
                    *r *= discount_neg;
                }
            }
        }

        regret_matching(regret_sum, current_strategy);
        *current_strategy_weight = 0.0;
    }

    fn baseline_into(&self, out: &mut [f32]) {
        out.copy_from_slice(&self.data.lock().unwrap().baseline);
    }

    fn set_baseline(&self, baseline: &[f32]) {
        self.data.lock().unwrap().baseline.copy_from_slice(baseline);
    }

    fn update_baseline(&self, decay: f32, action: usize, value: f32) {
        let mut data = self.data.lock().unwrap();
        let b = &mut data.baseline[action];
        *b = (1.0 - decay) * *b + decay * value;
    }
}

impl Clone for Record {
    fn clone(&self) -> Self {
        Self {
            num_actions: self.num_actions,
            data: Mutex::new(self.data.lock().unwrap().clone()),
            touched: AtomicBool::new(self.touched.load(Ordering::Acquire)),
        }
    }
}
