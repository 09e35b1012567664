use ndarray::Array1;
use rand::seq::index;
use rand::Rng;

use crate::error::{DqnError, Result};

/// One environment interaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_state: Array1<f32>,
    pub done: bool,
}

impl Transition {
    pub fn new(
        state: Array1<f32>,
        action: usize,
        reward: f32,
        next_state: Array1<f32>,
        done: bool,
    ) -> Self {
        Transition {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}

/// Fixed-capacity ring of transitions.
///
/// Slots are allocated once up front. Until the buffer fills, pushes land in
/// slot `len`; afterwards the write cursor walks over the oldest entry.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    slots: Vec<Option<Transition>>,
    cursor: usize,
    len: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DqnError::invalid_hyperparameter(
                "replay_buffer_capacity",
                "must be positive",
            ));
        }
        Ok(ReplayBuffer {
            slots: vec![None; capacity],
            cursor: 0,
            len: 0,
        })
    }

    pub fn push(&mut self, transition: Transition) {
        let capacity = self.slots.len();
        self.slots[self.cursor] = Some(transition);
        self.cursor = (self.cursor + 1) % capacity;
        if self.len < capacity {
            self.len += 1;
        }
    }

    /// Draw `batch_size` distinct transitions uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Vec<&Transition>> {
        if batch_size > self.len {
            return Err(DqnError::InsufficientData {
                requested: batch_size,
                available: self.len,
            });
        }

        // Occupied slots are always 0..len, full or not.
        index::sample(rng, self.len, batch_size)
            .into_iter()
            .map(|i| {
                self.slots[i].as_ref().ok_or_else(|| {
                    DqnError::NumericalError(format!("replay slot {} is empty", i))
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// Alias of [`ReplayBuffer::len`].
    pub fn size(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    pub fn can_sample(&self, batch_size: usize) -> bool {
        batch_size <= self.len
    }

    /// Stored transitions, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> + '_ {
        let start = if self.is_full() { self.cursor } else { 0 };
        let capacity = self.slots.len();
        (0..self.len).filter_map(move |offset| self.slots[(start + offset) % capacity].as_ref())
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.cursor = 0;
        self.len = 0;
    }
}
