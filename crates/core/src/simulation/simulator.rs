//! Cooperative run loop draining the event schedule.

use super::entity::World;
use crate::core_types::EPSILON_T;
use tracing::trace;

/// Single-threaded driver that activates entities in schedule order
#[derive(Debug, Default, Clone)]
pub struct Simulator {
    /// Total activations since creation
    processed: u64,
    /// Target time of the last completed `go_to`
    reached: f64,
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates events until the earliest pending one lies beyond `end_time`.
    ///
    /// Events within [`EPSILON_T`] of `end_time` still run. Each popped event runs
    /// `input` (if flagged), `update`, `time_advance`, `output` (if flagged), then is
    /// requeued at the entity's next update time. An empty schedule ends the loop
    /// without error.
    ///
    /// # Errors
    /// Stops at the first handler error and returns it. The failing event is not
    /// requeued.
    pub fn go_to<W: World>(&mut self, world: &mut W, end_time: f64) -> Result<(), W::Error> {
        let mut activations = 0_u64;
        while world.schedule().time() <= end_time + EPSILON_T {
            let Some(mut event) = world.schedule_mut().pop_upcoming() else {
                break;
            };
            activations += 1;
            if event.input {
                world.input(event.entity)?;
            }
            world.update(event.entity)?;
            world.time_advance(event.entity)?;
            if event.output {
                world.output(event.entity)?;
            }
            event.time = world.next_update_time(event.entity);
            world.schedule_mut().insert(event);
        }
        self.processed += activations;
        self.reached = end_time;
        trace!(
            "Reached t={:.3} after {} activations ({} pending)",
            end_time,
            activations,
            world.schedule().len()
        );
        Ok(())
    }

    pub fn processed(&self) -> u64 {
        self.processed
    }

    pub fn reached(&self) -> f64 {
        self.reached
    }
}
