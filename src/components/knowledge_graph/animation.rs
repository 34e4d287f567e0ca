//! Frame scheduling policy for the simulate+render loop.
//!
//! The driver never touches the browser itself. The host asks
//! [`AnimationDriver::claim_frame`] whether a frame must be requested, and
//! hands the returned epoch back to [`AnimationDriver::begin_frame`] when
//! the frame fires. Replacing the dataset bumps the epoch, so any frame
//! requested against the previous node set is refused.

use log::debug;

pub const DEFAULT_MAX_FRAMES: u32 = 900;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePlan {
	/// Run a simulation step before drawing.
	pub simulate: bool,
}

#[derive(Clone, Debug)]
pub struct AnimationDriver {
	epoch: u64,
	simulating: bool,
	redraw: bool,
	scheduled: bool,
	frames_in_run: u32,
	max_frames: u32,
}

impl Default for AnimationDriver {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_FRAMES)
	}
}

impl AnimationDriver {
	pub fn new(max_frames: u32) -> Self {
		Self {
			epoch: 0,
			simulating: false,
			redraw: false,
			scheduled: false,
			frames_in_run: 0,
			max_frames: max_frames.max(1),
		}
	}

	#[cfg(test)]
	pub fn is_simulating(&self) -> bool {
		self.simulating
	}

	/// A new node set arrived. Pending frames become stale; the host must
	/// cancel its outstanding request before claiming a new one.
	pub fn restart(&mut self) -> u64 {
		self.epoch += 1;
		self.scheduled = false;
		self.redraw = true;
		self.resume();
		self.epoch
	}

	/// Keep simulating until the layout settles again.
	pub fn resume(&mut self) {
		self.simulating = true;
		self.frames_in_run = 0;
	}

	/// Stop stepping the simulation without waiting for it to settle.
	pub fn pause(&mut self) {
		self.simulating = false;
	}

	/// Draw one more frame without stepping.
	pub fn request_redraw(&mut self) {
		self.redraw = true;
	}

	/// Epoch to attach to a new frame request, or `None` when nothing is
	/// pending or a frame is already on its way.
	pub fn claim_frame(&mut self) -> Option<u64> {
		if self.scheduled || !(self.simulating || self.redraw) {
			return None;
		}
		self.scheduled = true;
		Some(self.epoch)
	}

	/// Called when a requested frame fires. `None` means the frame belongs
	/// to a replaced node set and must not run.
	pub fn begin_frame(&mut self, epoch: u64) -> Option<FramePlan> {
		if epoch != self.epoch {
			debug!("dropping stale frame from epoch {epoch}");
			return None;
		}
		self.scheduled = false;
		self.redraw = false;
		Some(FramePlan {
			simulate: self.simulating,
		})
	}

	pub fn finish_frame(&mut self, simulated: bool, settled: bool) {
		if !simulated {
			return;
		}
		self.frames_in_run += 1;
		if settled {
			debug!("layout settled after {} frames", self.frames_in_run);
			self.simulating = false;
		} else if self.frames_in_run >= self.max_frames {
			debug!("frame budget of {} exhausted", self.max_frames);
			self.simulating = false;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_idle_driver_claims_nothing() {
		let mut driver = AnimationDriver::default();
		assert_eq!(driver.claim_frame(), None);
	}

	#[test]
	fn test_runs_until_settled() {
		let mut driver = AnimationDriver::default();
		let epoch = driver.restart();

		assert_eq!(driver.claim_frame(), Some(epoch));
		assert_eq!(driver.claim_frame(), None, "one frame in flight at a time");
		assert_eq!(driver.begin_frame(epoch), Some(FramePlan { simulate: true }));
		driver.finish_frame(true, false);
		assert_eq!(driver.claim_frame(), Some(epoch));

		assert_eq!(driver.begin_frame(epoch), Some(FramePlan { simulate: true }));
		driver.finish_frame(true, true);
		assert!(!driver.is_simulating());
		assert_eq!(driver.claim_frame(), None);
	}

	#[test]
	fn test_stale_epoch_is_refused() {
		let mut driver = AnimationDriver::default();
		let old = driver.restart();
		assert_eq!(driver.claim_frame(), Some(old));

		let new = driver.restart();
		assert_ne!(old, new);
		assert_eq!(driver.begin_frame(old), None);
		assert_eq!(driver.claim_frame(), Some(new));
		assert!(driver.begin_frame(new).is_some());
	}

	#[test]
	fn test_redraw_does_not_simulate() {
		let mut driver = AnimationDriver::default();
		driver.request_redraw();
		let epoch = driver.claim_frame().unwrap();
		assert_eq!(driver.begin_frame(epoch), Some(FramePlan { simulate: false }));
		driver.finish_frame(false, false);
		assert_eq!(driver.claim_frame(), None);
	}

	#[test]
	fn test_pause_and_resume() {
		let mut driver = AnimationDriver::default();
		driver.restart();
		let epoch = driver.claim_frame().unwrap();
		driver.begin_frame(epoch);
		driver.pause();
		driver.finish_frame(false, false);
		assert_eq!(driver.claim_frame(), None);

		driver.resume();
		assert!(driver.is_simulating());
		assert_eq!(driver.claim_frame(), Some(epoch));
	}

	#[test]
	fn test_frame_budget_stops_run() {
		let mut driver = AnimationDriver::new(3);
		let epoch = driver.restart();
		for _ in 0..3 {
			let claimed = driver.claim_frame().unwrap();
			assert_eq!(claimed, epoch);
			driver.begin_frame(claimed);
			driver.finish_frame(true, false);
		}
		assert!(!driver.is_simulating());
		assert_eq!(driver.claim_frame(), None);
	}
}
