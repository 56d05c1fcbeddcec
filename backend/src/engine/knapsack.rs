//! 0/1 knapsack selection of orders under a carrying capacity.
//!
//! The value table follows the classic recurrence
//!
//! ```text
//! K[i][w] = max(K[i-1][w], value[i-1] + K[i-1][w - weight[i-1]])   if weight[i-1] <= w
//! K[i][w] = K[i-1][w]                                               otherwise
//! ```
//!
//! but only one row of values is kept alive. For every cell the solver records
//! a single choice bit (`K[i][w] != K[i-1][w]`), which is exactly the test the
//! backward walk from `K[n][capacity]` needs. The walk therefore takes item `k`
//! only when including it strictly improves on the best subset of the first
//! `k - 1` items, and the result is identical to a reconstruction over the
//! full table.

use super::availability::non_negative;
use super::error::{DispatchError, DispatchResult};
use crate::models::{Centiunits, Order, OrderId};

/// One selectable item: an identifier and an integer weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnapsackItem<Id> {
    pub id: Id,
    pub weight: Centiunits,
}

impl<Id> KnapsackItem<Id> {
    pub fn new(id: Id, weight: Centiunits) -> Self {
        Self { id, weight }
    }
}

/// Outcome of a knapsack run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnapsackSolution<Id> {
    /// Selected identifiers, sorted ascending.
    pub selected: Vec<Id>,
    pub total_value: u64,
    pub total_weight: Centiunits,
}

/// Row-major bitset holding one choice bit per `(item, weight)` cell.
struct ChoiceBits {
    width: usize,
    words: Vec<u64>,
}

impl ChoiceBits {
    fn new(rows: usize, width: usize) -> Self {
        let cells = rows * width;
        Self {
            width,
            words: vec![0; cells.div_ceil(64)],
        }
    }

    fn set(&mut self, row: usize, col: usize) {
        let cell = row * self.width + col;
        self.words[cell / 64] |= 1u64 << (cell % 64);
    }

    fn get(&self, row: usize, col: usize) -> bool {
        let cell = row * self.width + col;
        self.words[cell / 64] & (1u64 << (cell % 64)) != 0
    }
}

/// Capacity-constrained selection maximizing total value.
///
/// Every item has value 1 unless values are supplied, which makes the
/// objective "deliver as many orders as possible".
#[derive(Debug, Clone)]
pub struct KnapsackResolver<Id> {
    items: Vec<KnapsackItem<Id>>,
    values: Vec<u64>,
    capacity: Centiunits,
}

impl<Id: Copy + Ord> KnapsackResolver<Id> {
    pub fn new(items: Vec<KnapsackItem<Id>>, capacity: Centiunits) -> Self {
        let values = vec![1; items.len()];
        Self {
            items,
            values,
            capacity,
        }
    }

    /// Replace the unit values with explicit ones, one per item.
    pub fn with_values(mut self, values: Vec<u64>) -> DispatchResult<Self> {
        if values.len() != self.items.len() {
            return Err(DispatchError::InvalidConstraint(format!(
                "{} values supplied for {} items",
                values.len(),
                self.items.len()
            )));
        }
        self.values = values;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn weight_of(&self, index: usize) -> usize {
        non_negative(self.items[index].weight) as usize
    }

    /// Compute the optimal subset.
    pub fn solve(&self) -> KnapsackSolution<Id> {
        let n = self.items.len();
        let limit = non_negative(self.capacity) as usize;
        // Any capacity beyond the combined weight of fitting items admits the
        // same subsets.
        let fitting_weight = (0..n)
            .map(|i| self.weight_of(i))
            .filter(|&weight| weight <= limit)
            .fold(0usize, |acc, weight| acc.saturating_add(weight));
        let capacity = limit.min(fitting_weight);

        let mut best = vec![0u64; capacity + 1];
        let mut choices = ChoiceBits::new(n, capacity + 1);

        for i in 0..n {
            let weight = self.weight_of(i);
            if weight > capacity {
                continue;
            }
            let value = self.values[i];
            for w in (weight..=capacity).rev() {
                let with_item = best[w - weight].saturating_add(value);
                if with_item > best[w] {
                    best[w] = with_item;
                    choices.set(i, w);
                }
            }
        }

        let mut selected = Vec::new();
        let mut selected_weight: Centiunits = 0;
        let mut remaining = capacity;
        for i in (0..n).rev() {
            if choices.get(i, remaining) {
                let weight = self.weight_of(i);
                selected.push(self.items[i].id);
                selected_weight += weight as Centiunits;
                remaining -= weight;
            }
        }
        selected.sort_unstable();

        KnapsackSolution {
            selected,
            total_value: best[capacity],
            total_weight: selected_weight,
        }
    }

    /// Identifiers of the optimal subset, sorted ascending.
    pub fn select(&self) -> Vec<Id> {
        self.solve().selected
    }
}

impl KnapsackResolver<OrderId> {
    /// Unit-valued resolver over candidate orders.
    pub fn from_orders(orders: &[&Order], capacity: Centiunits) -> Self {
        let items = orders
            .iter()
            .map(|order| KnapsackItem::new(order.id, order.weight))
            .collect();
        Self::new(items, capacity)
    }
}

/// One-shot selection: `values` defaults to 1 per item.
pub fn select<Id: Copy + Ord>(
    items: &[KnapsackItem<Id>],
    capacity: Centiunits,
    values: Option<&[u64]>,
) -> DispatchResult<Vec<Id>> {
    let resolver = KnapsackResolver::new(items.to_vec(), capacity);
    let resolver = match values {
        Some(values) => resolver.with_values(values.to_vec())?,
        None => resolver,
    };
    Ok(resolver.select())
}
