// current() is the number of dispatches already blended into the image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccumulationState {
    sample: u32,
}

impl AccumulationState {
    #[must_use]
    pub fn new() -> Self {
        Self { sample: 0 }
    }

    #[inline]
    pub fn reset(&mut self) {
        self.sample = 0;
    }

    #[inline]
    pub fn advance(&mut self) {
        self.sample = self.sample.saturating_add(1);
    }

    #[inline]
    #[must_use]
    pub fn current(&self) -> u32 {
        self.sample
    }
}
