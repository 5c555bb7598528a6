//! Multi-machine pipelines.
//!
//! Wires several machine instances output-to-input, entirely through the
//! public suspend/resume contract. Two topologies:
//!
//! - **series**: each stage runs to completion and its last output becomes
//!   the next stage's input signal
//! - **feedback**: all stages run concurrently (round-robin), the final
//!   stage's outputs loop back into the first, and the result is the final
//!   stage's last output once every stage has halted

use thiserror::Error;

use crate::vm::{Vm, VmError};

/// Run one program through a chain of stages.
///
/// Every stage executes a fresh copy of `image` with two queued inputs:
/// its seed value and the signal from the previous stage (`initial` for
/// the first). The chain's result is the last stage's last output.
pub fn run_series(image: &[i64], seeds: &[i64], initial: i64) -> Result<i64, PipelineError> {
    let mut signal = initial;

    for (stage, &seed) in seeds.iter().enumerate() {
        let mut vm = Vm::with_program(image);
        vm.add_input(seed);
        vm.add_input(signal);
        vm.run()?;

        signal = vm
            .outputs()
            .last()
            .copied()
            .ok_or(PipelineError::NoOutput { stage })?;
    }

    Ok(signal)
}

/// Run one program through a feedback loop of stages.
///
/// Every stage executes a fresh copy of `image`, seeded with its seed
/// value; `initial` is queued into the first stage. Stages run round-robin
/// until blocked, drained outputs feed the next stage, and the final
/// stage's outputs wrap around to the first. Finishes when every stage has
/// halted.
pub fn run_feedback(image: &[i64], seeds: &[i64], initial: i64) -> Result<i64, PipelineError> {
    if seeds.is_empty() {
        return Ok(initial);
    }

    let mut stages: Vec<Vm> = seeds
        .iter()
        .map(|&seed| {
            let mut vm = Vm::with_program(image);
            vm.add_input(seed);
            vm
        })
        .collect();
    stages[0].add_input(initial);

    let last = stages.len() - 1;
    let mut result = None;

    while stages.iter().any(|vm| !vm.is_halted()) {
        let before: u64 = stages.iter().map(|vm| vm.cycles).sum();

        for i in 0..stages.len() {
            if stages[i].is_halted() {
                continue;
            }
            stages[i].run_until_blocked()?;

            let drained = stages[i].take_new_outputs();
            if drained.is_empty() {
                continue;
            }
            if i == last {
                result = drained.last().copied();
            }
            let next = (i + 1) % stages.len();
            for value in &drained {
                stages[next].add_input(*value);
            }
        }

        let after: u64 = stages.iter().map(|vm| vm.cycles).sum();
        if after == before {
            return Err(PipelineError::Stalled);
        }
    }

    result.ok_or(PipelineError::NoOutput { stage: last })
}

/// Errors that can occur while driving a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Vm(#[from] VmError),

    #[error("stage {stage} halted without producing output")]
    NoOutput { stage: usize },

    #[error("pipeline stalled: every running stage is starved for input")]
    Stalled,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::Program;

    fn image(text: &str) -> Vec<i64> {
        let program: Program = text.parse().unwrap();
        program.values().to_vec()
    }

    #[test]
    fn test_series_five_stages() {
        let image = image("3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0");
        assert_eq!(run_series(&image, &[4, 3, 2, 1, 0], 0).unwrap(), 43210);
    }

    #[test]
    fn test_series_reuses_signal_through_chain() {
        let image = image("3,23,3,24,1002,24,10,24,1002,23,-1,23,101,5,23,23,1,24,23,23,4,23,99,0,0");
        assert_eq!(run_series(&image, &[0, 1, 2, 3, 4], 0).unwrap(), 54321);
    }

    #[test]
    fn test_series_longer_program() {
        let image = image(
            "3,31,3,32,1002,32,10,32,1001,31,-2,31,1007,31,0,33,\
             1002,33,7,33,1,33,31,31,1,32,31,31,4,31,99,0,0,0",
        );
        assert_eq!(run_series(&image, &[1, 0, 4, 3, 2], 0).unwrap(), 65210);
    }

    #[test]
    fn test_series_no_stages_passes_signal_through() {
        assert_eq!(run_series(&[99], &[], 7).unwrap(), 7);
    }

    #[test]
    fn test_series_silent_stage_is_an_error() {
        // Reads both inputs and halts without an OUT
        let image = image("3,0,3,0,99");
        assert_eq!(
            run_series(&image, &[1], 0),
            Err(PipelineError::NoOutput { stage: 0 })
        );
    }

    #[test]
    fn test_feedback_loop() {
        let image = image(
            "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,\
             27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5",
        );
        assert_eq!(run_feedback(&image, &[9, 8, 7, 6, 5], 0).unwrap(), 139629729);
    }

    #[test]
    fn test_feedback_loop_longer_program() {
        let image = image(
            "3,52,1001,52,-5,52,3,53,1,52,56,54,1007,54,5,55,1005,55,26,1001,54,\
             -5,54,1105,1,12,1,53,54,53,1008,54,0,55,1001,55,1,55,2,53,55,53,4,\
             53,1001,56,-1,56,1005,56,6,99,0,0,0,0,10",
        );
        assert_eq!(run_feedback(&image, &[9, 7, 8, 5, 6], 0).unwrap(), 18216);
    }

    #[test]
    fn test_feedback_detects_stall() {
        // Wants three inputs but a single stage only ever receives two
        let image = image("3,0,3,0,3,0,4,0,99");
        assert_eq!(run_feedback(&image, &[1], 0), Err(PipelineError::Stalled));
    }
}
