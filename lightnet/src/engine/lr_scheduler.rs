use super::{StateDict, Stateful};
use crate::common::*;

/// Learning rate schedule as written in configuration files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LrSchedule {
    Constant { lr: R64 },
    /// Pairs of `(step, lr)`. The first step must be zero.
    StepWise { steps: Vec<(usize, R64)> },
}

/// Yields the learning rate of each optimization step.
#[derive(Debug, Clone)]
pub struct LrScheduler {
    schedule: LrSchedule,
    step: usize,
    index: usize,
}

impl LrScheduler {
    pub fn new(schedule: &LrSchedule, init_step: impl Into<Option<usize>>) -> Result<Self> {
        match schedule {
            LrSchedule::Constant { lr } => {
                ensure!(lr.raw() >= 0.0, "the lr must be positive");
            }
            LrSchedule::StepWise { steps } => {
                ensure!(
                    !steps.is_empty() && steps[0].0 == 0,
                    "the steps must start from zero"
                );
                ensure!(
                    steps
                        .iter()
                        .tuple_windows()
                        .all(|((prev, _), (curr, _))| curr > prev),
                    "the steps must be monotonic"
                );
                ensure!(
                    steps.iter().all(|(_, lr)| lr.raw() > 0.0),
                    "lr must be positive"
                );
            }
        }

        let mut scheduler = Self {
            schedule: schedule.clone(),
            step: 0,
            index: 0,
        };
        if let Some(init_step) = init_step.into() {
            scheduler.set_step(init_step);
        }

        Ok(scheduler)
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn set_step(&mut self, new_step: usize) {
        self.step = new_step;

        if let LrSchedule::StepWise { steps } = &self.schedule {
            self.index = match steps.binary_search_by_key(&new_step, |(thresh, _)| *thresh) {
                Ok(index) => index,
                Err(index) => index.saturating_sub(1),
            };
        }
    }

    /// The learning rate of the current step.
    pub fn lr(&self) -> f64 {
        match &self.schedule {
            LrSchedule::Constant { lr } => lr.raw(),
            LrSchedule::StepWise { steps } => steps[self.index].1.raw(),
        }
    }

    /// Returns the learning rate of the current step and advances one step.
    pub fn next(&mut self) -> f64 {
        let lr = self.lr();
        self.step += 1;

        if let LrSchedule::StepWise { steps } = &self.schedule {
            let next_index = self.index + 1;
            if next_index < steps.len() && self.step == steps[next_index].0 {
                self.index = next_index;
            }
        }

        lr
    }
}

impl Stateful for LrScheduler {
    fn state_dict(&self) -> Result<StateDict> {
        let mut state = StateDict::new();
        state
            .values
            .insert("step".into(), serde_json::to_value(self.step)?);
        Ok(state)
    }

    fn load_state_dict(&mut self, state: StateDict) -> Result<()> {
        let step: usize = state.value("step")?;
        self.set_step(step);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_wise_schedule() -> Result<()> {
        let schedule = LrSchedule::StepWise {
            steps: vec![(0, r64(0.1)), (3, r64(0.01)), (5, r64(0.001))],
        };
        let mut scheduler = LrScheduler::new(&schedule, None)?;
        let lrs: Vec<_> = (0..6).map(|_| scheduler.next()).collect();
        assert_eq!(lrs, [0.1, 0.1, 0.1, 0.01, 0.01, 0.001]);

        let scheduler = LrScheduler::new(&schedule, 4)?;
        assert_eq!(scheduler.lr(), 0.01);
        Ok(())
    }

    #[test]
    fn reject_invalid_steps() {
        let unordered = LrSchedule::StepWise {
            steps: vec![(0, r64(0.1)), (5, r64(0.01)), (3, r64(0.001))],
        };
        assert!(LrScheduler::new(&unordered, None).is_err());

        let late_start = LrSchedule::StepWise {
            steps: vec![(1, r64(0.1))],
        };
        assert!(LrScheduler::new(&late_start, None).is_err());
    }

    #[test]
    fn restore_step_from_state() -> Result<()> {
        let schedule = LrSchedule::StepWise {
            steps: vec![(0, r64(0.1)), (2, r64(0.01))],
        };
        let mut scheduler = LrScheduler::new(&schedule, None)?;
        scheduler.next();
        scheduler.next();
        let state = scheduler.state_dict()?;

        let mut restored = LrScheduler::new(&schedule, None)?;
        restored.load_state_dict(state)?;
        assert_eq!(restored.step(), 2);
        assert_eq!(restored.lr(), 0.01);
        Ok(())
    }

    #[test]
    fn parse_schedule() -> Result<()> {
        let schedule: LrSchedule = json5::from_str("{ type: 'Constant', lr: 0.001 }")?;
        assert_eq!(schedule, LrSchedule::Constant { lr: r64(0.001) });
        Ok(())
    }
}
