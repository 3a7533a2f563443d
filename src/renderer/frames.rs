/// Round-robin frame slots and whether each one has a submission that will
/// signal its fence.
///
/// A slot only counts as in flight after its commands are submitted, so a
/// frame abandoned between the fence wait and the submit never leaves the
/// next frame waiting on a fence nothing will signal.
#[derive(Debug)]
pub struct FrameSlots {
    in_flight: Vec<bool>,
    frame: usize,
}

impl FrameSlots {
    pub fn new(count: usize) -> Self {
        assert_ne!(count, 0);
        FrameSlots {
            in_flight: vec![false; count],
            frame: 0,
        }
    }

    pub fn current(&self) -> usize {
        self.frame % self.in_flight.len()
    }

    /// The current slot's fence must be waited on before its command buffer
    /// and framebuffer are reused.
    pub fn must_wait(&self) -> bool {
        self.in_flight[self.current()]
    }

    /// The current slot's previous submission has completed.
    pub fn retired(&mut self) {
        let slot = self.current();
        self.in_flight[slot] = false;
    }

    /// Commands for the current slot were submitted; moves to the next slot.
    pub fn submitted(&mut self) {
        let slot = self.current();
        self.in_flight[slot] = true;
        self.frame += 1;
    }

    pub fn frames(&self) -> usize {
        self.frame
    }
}

/// Creates `count` objects, releasing the ones already made if a later
/// creation fails.
pub fn create_all<T, E>(
    count: usize,
    mut create: impl FnMut() -> Result<T, E>,
    mut release: impl FnMut(T),
) -> Result<Vec<T>, E> {
    let mut created = Vec::with_capacity(count);
    for _ in 0..count {
        match create() {
            Ok(object) => created.push(object),
            Err(err) => {
                created.into_iter().for_each(&mut release);
                return Err(err);
            }
        }
    }
    Ok(created)
}
