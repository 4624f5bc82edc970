use super::Strategy;
use crate::base::{Error, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use tokio::sync::Mutex;

/// An item a [`Rotator`] can hand out.
///
/// `weight` feeds the `Weighted` strategy; items without a meaningful weight
/// rotate uniformly.
pub trait RotatorItem: Clone + Send {
    fn weight(&self) -> f64 {
        1.0
    }
}

impl RotatorItem for String {}

/// A thread-safe and task-safe rotating container.
///
/// Every read and mutation goes through one internal lock: the blocking
/// methods (`next`, `add`, ...) acquire it on the calling thread, the `a`-
/// prefixed methods suspend the calling task instead. The blocking methods
/// must not be called from inside an async runtime.
///
/// The strategy is fixed per instance; the item list is not. After any
/// membership change the cursor and weighted sampler are rebuilt, so a
/// round-robin sequence restarts from the first item.
pub struct Rotator<T> {
    strategy: Strategy,
    state: Mutex<State<T>>,
}

struct State<T> {
    items: Vec<T>,
    cursor: usize,
    sampler: Option<WeightedIndex<f64>>,
}

impl<T: RotatorItem> Rotator<T> {
    pub fn new(items: Vec<T>, strategy: Strategy) -> Self {
        let mut state = State {
            items,
            cursor: 0,
            sampler: None,
        };
        rebuild(&mut state, strategy);
        Self {
            strategy,
            state: Mutex::new(state),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Select the next item. Fails on an empty rotator.
    pub fn next(&self) -> Result<T> {
        let mut state = self.state.blocking_lock();
        pick(&mut state, self.strategy)
    }

    /// Select the next item, suspending the task while the lock is held
    /// elsewhere. Fails on an empty rotator.
    pub async fn anext(&self) -> Result<T> {
        let mut state = self.state.lock().await;
        pick(&mut state, self.strategy)
    }

    pub fn add(&self, item: T) {
        self.mutate(true, |items| items.push(item));
    }

    pub async fn aadd(&self, item: T) {
        self.amutate(true, |items| items.push(item)).await;
    }

    pub fn remove(&self, item: &T)
    where
        T: PartialEq,
    {
        self.mutate(true, |items| items.retain(|i| i != item));
    }

    pub async fn aremove(&self, item: &T)
    where
        T: PartialEq,
    {
        self.amutate(true, |items| items.retain(|i| i != item)).await;
    }

    pub fn len(&self) -> usize {
        self.state.blocking_lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the current items, in insertion order.
    pub fn items(&self) -> Vec<T> {
        self.state.blocking_lock().items.clone()
    }

    pub async fn aitems(&self) -> Vec<T> {
        self.state.lock().await.items.clone()
    }

    /// Run a closure over the item list under the lock, optionally rebuilding
    /// the cursor/sampler afterwards. The rebuild is skipped for stat-only
    /// updates under non-weighted strategies, which must not disturb a
    /// round-robin sequence in progress.
    pub(crate) fn mutate<R>(&self, rebuild_iter: bool, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut state = self.state.blocking_lock();
        let result = f(&mut state.items);
        if rebuild_iter {
            rebuild(&mut state, self.strategy);
        }
        result
    }

    pub(crate) async fn amutate<R>(
        &self,
        rebuild_iter: bool,
        f: impl FnOnce(&mut Vec<T>) -> R,
    ) -> R {
        let mut state = self.state.lock().await;
        let result = f(&mut state.items);
        if rebuild_iter {
            rebuild(&mut state, self.strategy);
        }
        result
    }
}

fn pick<T: RotatorItem>(state: &mut State<T>, strategy: Strategy) -> Result<T> {
    if state.items.is_empty() {
        return Err(Error::EmptyRotator);
    }
    let index = match strategy {
        Strategy::RoundRobin => {
            let index = state.cursor % state.items.len();
            state.cursor = state.cursor.wrapping_add(1);
            index
        }
        Strategy::Random => rand::thread_rng().gen_range(0..state.items.len()),
        Strategy::Weighted => match &state.sampler {
            Some(sampler) => sampler.sample(&mut rand::thread_rng()),
            None => rand::thread_rng().gen_range(0..state.items.len()),
        },
    };
    Ok(state.items[index].clone())
}

fn rebuild<T: RotatorItem>(state: &mut State<T>, strategy: Strategy) {
    state.cursor = 0;
    state.sampler = if strategy == Strategy::Weighted && !state.items.is_empty() {
        // A zero or negative weight would poison the sampler; clamp to a
        // vanishing probability instead.
        WeightedIndex::new(
            state
                .items
                .iter()
                .map(|item| item.weight().max(f64::MIN_POSITIVE)),
        )
        .ok()
    } else {
        None
    };
}
