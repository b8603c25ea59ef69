use std::cell::Cell;
use std::rc::Rc;

/// Injectable stop condition for the frame loop.
///
/// Clones share one flag. Single-threaded, like the loop it stops.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Rc<Cell<bool>>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.set(true);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = StopToken::new();
        let other = token.clone();
        assert!(!token.is_stopped());
        other.stop();
        assert!(token.is_stopped());
    }
}
