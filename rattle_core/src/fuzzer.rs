use crate::executor::CommandExecutor;
use crate::generator::GenerationPolicy;
use crate::report::{FuzzReport, RunRecord};
use rand::Rng;

/// The driver loop: N sequential iterations of {generate, execute}.
///
/// Harness errors (`GenerationError`, `ExecutionError`) are logged together
/// with the offending input and the loop moves on; an intermittent spawn or
/// staging failure must not forfeit the remaining iterations. Target failures
/// are recorded, not raised. There is no retry, no backoff, and no early
/// termination: a crashing target is the signal being hunted, not a reason to
/// stop.
pub struct Fuzzer<R: Rng> {
    policy: GenerationPolicy,
    executor: CommandExecutor,
    rng: R,
}

impl<R: Rng> Fuzzer<R> {
    pub fn new(policy: GenerationPolicy, executor: CommandExecutor, rng: R) -> Self {
        Self {
            policy,
            executor,
            rng,
        }
    }

    /// Runs the configured number of iterations and returns the accumulated
    /// report. Iteration i+1 never starts before iteration i's target has
    /// exited and its transient file has been handled.
    pub fn run(&mut self, iterations: u64) -> FuzzReport {
        let mut results = Vec::new();

        for iteration in 0..iterations {
            let case = match self.policy.generate(&mut self.rng) {
                Ok(case) => case,
                Err(e) => {
                    log::error!("iteration {iteration}: input generation failed: {e}");
                    continue;
                }
            };

            match self.executor.execute(&case) {
                Ok(result) => {
                    if result.is_failure() {
                        log::warn!(
                            "iteration {iteration}: target failure on input {:?}: {:?}",
                            case.as_str(),
                            result.status
                        );
                    }
                    results.push(RunRecord::new(case, &result));
                }
                Err(e) => {
                    log::error!(
                        "iteration {iteration}: execution failed on input {:?}: {e}",
                        case.as_str()
                    );
                }
            }
        }

        FuzzReport::new(results)
    }
}
