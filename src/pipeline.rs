//! Filter/validate/process stages and their ordered composition.

use crate::error::Error;
use crate::record::Record;

/// Decides whether a record continues through the pipeline at all. Cannot
/// fail: a filter either keeps or drops, it never errors.
pub trait RecordFilter<T>: Send + Sync {
    /// Returns `false` to drop the record without further processing.
    fn filter(&self, record: &Record<T>) -> bool;
}

/// Checks a record against a precondition without transforming it.
pub trait RecordValidator<T>: Send + Sync {
    /// Returns `Err` to short-circuit the pipeline with a processing error.
    fn validate(&self, record: &Record<T>) -> Result<(), Error>;
}

/// Transforms a record, optionally dropping it.
pub trait RecordProcessor<T>: Send + Sync {
    /// `Ok(None)` drops the record (equivalent to a filter rejecting it);
    /// `Err` short-circuits the pipeline with a processing error.
    fn process(&self, record: Record<T>) -> Result<Option<Record<T>>, Error>;
}

/// A processor that hands its input back unchanged.
///
/// Useful as a placeholder stage and in tests that only care about
/// filter/validator behavior.
pub struct PassThroughProcessor;

impl<T: Send + Sync> RecordProcessor<T> for PassThroughProcessor {
    fn process(&self, record: Record<T>) -> Result<Option<Record<T>>, Error> {
        Ok(Some(record))
    }
}

pub(crate) enum Stage<T> {
    Filter(Box<dyn RecordFilter<T>>),
    Validator(Box<dyn RecordValidator<T>>),
    Processor(Box<dyn RecordProcessor<T>>),
}

/// The single outcome of driving one record through a [`Pipeline`]: exactly
/// one of these, never a mix.
pub enum PipelineOutcome<T> {
    /// The record survived every stage; this is the value to hand to the
    /// batch accumulator.
    Output(Record<T>),
    /// A filter rejected the record, or a processor returned `Ok(None)`.
    Filtered,
    /// A validator or processor failed.
    Error(Error),
}

/// An ordered sequence of filter/validator/processor stages, applied in the
/// order they were registered on the builder.
pub struct Pipeline<T> {
    stages: Vec<Stage<T>>,
}

impl<T> Pipeline<T> {
    pub(crate) fn new(stages: Vec<Stage<T>>) -> Self {
        Self { stages }
    }

    /// Runs `record` through every stage until it is dropped, errors, or
    /// survives all of them.
    pub fn apply(&self, record: Record<T>) -> PipelineOutcome<T> {
        let mut current = record;
        for stage in &self.stages {
            match stage {
                Stage::Filter(filter) => {
                    if !filter.filter(&current) {
                        return PipelineOutcome::Filtered;
                    }
                }
                Stage::Validator(validator) => {
                    if let Err(e) = validator.validate(&current) {
                        return PipelineOutcome::Error(e);
                    }
                }
                Stage::Processor(processor) => match processor.process(current) {
                    Ok(Some(next)) => current = next,
                    Ok(None) => return PipelineOutcome::Filtered,
                    Err(e) => return PipelineOutcome::Error(e),
                },
            }
        }
        PipelineOutcome::Output(current)
    }

    /// Number of stages registered, mostly useful for diagnostics and tests.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the pipeline has no stages at all (a pass-through pipe).
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}
