use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use tidal_error::Result;

use super::RANDOM_STATE;
use super::group_key::GroupKey;
use crate::arrays::array::Array;
use crate::arrays::batch::Batch;
use crate::arrays::datatype::DataType;
use crate::arrays::scalar::ScalarValue;
use crate::expr::physical::{PhysicalAggregateExpression, PhysicalScalarExpression};
use crate::functions::aggregate::Accumulator;

/// Maps distinct group keys to their accumulators.
///
/// Memory is proportional to the number of distinct groups times the number
/// of aggregates, independent of the number of input rows.
#[derive(Debug)]
pub struct GroupTable {
    groups: HashMap<GroupKey, usize, ahash::RandomState>,
    /// Keys in insertion order, indexed by group id.
    keys: Vec<GroupKey>,
    /// Accumulators per group id, one per aggregate.
    states: Vec<Vec<Box<dyn Accumulator>>>,
}

impl Default for GroupTable {
    fn default() -> Self {
        Self::new()
    }
}

impl GroupTable {
    pub fn new() -> Self {
        GroupTable {
            groups: HashMap::with_hasher(RANDOM_STATE),
            keys: Vec::new(),
            states: Vec::new(),
        }
    }

    pub fn num_groups(&self) -> usize {
        self.keys.len()
    }

    /// Evaluate group and aggregate inputs for a batch and fold every row
    /// into its group.
    pub fn insert_batch(
        &mut self,
        batch: &Batch,
        group_exprs: &[PhysicalScalarExpression],
        aggregates: &[PhysicalAggregateExpression],
    ) -> Result<()> {
        let group_arrays = group_exprs
            .iter()
            .map(|expr| expr.eval(batch))
            .collect::<Result<Vec<_>>>()?;
        let agg_arrays = aggregates
            .iter()
            .map(|agg| agg.input.eval(batch))
            .collect::<Result<Vec<_>>>()?;

        for row in 0..batch.num_rows() {
            let key = GroupKey::new(
                group_arrays
                    .iter()
                    .map(|arr| arr.logical_value(row).map(ScalarValue::into_owned))
                    .collect::<Result<Vec<_>>>()?,
            );

            let group_id = self.group_id(key, aggregates)?;
            let states = &mut self.states[group_id];
            for (state, arr) in states.iter_mut().zip(&agg_arrays) {
                state.accumulate(&arr.logical_value(row)?)?;
            }
        }

        Ok(())
    }

    fn group_id(
        &mut self,
        key: GroupKey,
        aggregates: &[PhysicalAggregateExpression],
    ) -> Result<usize> {
        match self.groups.entry(key) {
            Entry::Occupied(ent) => Ok(*ent.get()),
            Entry::Vacant(ent) => {
                let group_id = self.keys.len();
                let states = aggregates
                    .iter()
                    .map(|agg| agg.create_accumulator())
                    .collect::<Result<Vec<_>>>()?;

                self.keys.push(ent.key().clone());
                self.states.push(states);
                ent.insert(group_id);

                Ok(group_id)
            }
        }
    }

    /// Produce the output columns, group columns first.
    pub fn into_arrays(
        self,
        group_types: &[DataType],
        aggregates: &[PhysicalAggregateExpression],
    ) -> Result<Vec<Array>> {
        let mut arrays = Vec::with_capacity(group_types.len() + aggregates.len());

        for (col, &datatype) in group_types.iter().enumerate() {
            let values = self.keys.iter().map(|key| key.values()[col].clone());
            arrays.push(Array::try_from_scalars(datatype, values)?);
        }

        for (agg_idx, agg) in aggregates.iter().enumerate() {
            let values = self
                .states
                .iter()
                .map(|states| states[agg_idx].final_value())
                .collect::<Result<Vec<_>>>()?;
            arrays.push(Array::try_from_scalars(agg.output_type, values)?);
        }

        Ok(arrays)
    }
}
