/// Epoch counter deciding whether an arriving result is still wanted.
///
/// Registering a request or withdrawing interest advances the epoch. A result is applied only
/// when the ticket issued with its request still equals the current epoch, so anything that
/// arrives after a reset, close or newer request is dropped.
#[derive(Debug, Default)]
pub struct Interest {
    epoch: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// What happened to the result of an orchestrated request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The result (success or failure) was applied to the state machine
    Applied,
    /// Interest was withdrawn or superseded before the result arrived
    Discarded,
    /// The request was refused without being issued
    Rejected,
}

impl Interest {
    pub fn register(&mut self) -> Ticket {
        self.epoch += 1;
        Ticket(self.epoch)
    }

    pub fn withdraw(&mut self) {
        self.epoch += 1;
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.epoch
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

impl Ticket {
    pub fn epoch(&self) -> u64 {
        self.0
    }
}
