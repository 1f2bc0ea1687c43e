//! Dialog lifecycle.
//!
//! A dialog moves `Closed -> Open -> Closing -> Closed` on explicit events.
//! Every `open` starts from fresh state and bumps a generation number; a
//! `finish_close` carrying an older generation is ignored, so a close that
//! completes after the dialog was reopened cannot wipe the new state.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Closed,
    Open,
    Closing,
}

#[derive(Debug)]
pub struct Dialog<S> {
    phase: DialogPhase,
    state: Option<S>,
    generation: u64,
}

impl<S> Default for Dialog<S> {
    fn default() -> Self {
        Self {
            phase: DialogPhase::Closed,
            state: None,
            generation: 0,
        }
    }
}

impl<S> Dialog<S> {
    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase == DialogPhase::Open
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Open with fresh state, from any phase.
    pub fn open(&mut self, state: S) -> u64 {
        self.generation += 1;
        self.phase = DialogPhase::Open;
        self.state = Some(state);
        self.generation
    }

    /// Start closing. State stays readable until [`Self::finish_close`].
    pub fn begin_close(&mut self) -> Option<u64> {
        if self.phase != DialogPhase::Open {
            return None;
        }
        self.phase = DialogPhase::Closing;
        Some(self.generation)
    }

    /// Finish a close started for `generation`. Returns `false` if the
    /// dialog was reopened in the meantime.
    pub fn finish_close(&mut self, generation: u64) -> bool {
        if self.phase != DialogPhase::Closing || self.generation != generation {
            return false;
        }
        self.phase = DialogPhase::Closed;
        self.state = None;
        true
    }

    /// Close immediately.
    pub fn close(&mut self) {
        if let Some(generation) = self.begin_close() {
            self.finish_close(generation);
        }
    }

    /// State of an open dialog.
    pub fn state(&self) -> Option<&S> {
        if self.is_open() {
            self.state.as_ref()
        } else {
            None
        }
    }

    pub fn state_mut(&mut self) -> Option<&mut S> {
        if self.is_open() {
            self.state.as_mut()
        } else {
            None
        }
    }
}
