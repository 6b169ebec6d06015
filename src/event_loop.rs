use crossbeam_channel::Receiver;

pub enum ControlFlow {
    Continue,
    Quit,
}

/// The message pump an actor thread runs on.
///
/// Owns the receiving end of a mailbox and hands each message, in arrival
/// order, to a handler that runs to completion before the next one is
/// taken. The loop ends when the handler returns [`ControlFlow::Quit`] or
/// every sender is gone. An actor that keeps a sender to its own mailbox
/// only ever stops through `Quit`.
pub struct EventLoop<M> {
    inbox: Receiver<M>,
}

impl<M> EventLoop<M> {
    pub fn new(inbox: Receiver<M>) -> Self {
        Self { inbox }
    }

    /// Runs the loop, taking control of the current thread.
    pub fn run<F>(&mut self, mut handler: F)
    where
        F: FnMut(M) -> ControlFlow,
    {
        while let Ok(message) = self.inbox.recv() {
            if let ControlFlow::Quit = handler(message) {
                break;
            }
        }
    }

    /// Hands every message already queued to `handler` without blocking.
    pub fn drain<F>(&mut self, mut handler: F) -> usize
    where
        F: FnMut(M),
    {
        let mut handled = 0;
        while let Ok(message) = self.inbox.try_recv() {
            handler(message);
            handled += 1;
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn handles_messages_in_order_until_quit() {
        let (tx, rx) = unbounded();
        for n in 1..=5 {
            tx.send(n).unwrap();
        }
        let mut seen = Vec::new();
        let mut event_loop = EventLoop::new(rx);
        event_loop.run(|n| {
            seen.push(n);
            if n == 3 {
                ControlFlow::Quit
            } else {
                ControlFlow::Continue
            }
        });
        assert_eq!(seen, vec![1, 2, 3]);

        let mut rest = Vec::new();
        assert_eq!(event_loop.drain(|n| rest.push(n)), 2);
        assert_eq!(rest, vec![4, 5]);
    }

    #[test]
    fn stops_when_senders_are_gone() {
        let (tx, rx) = unbounded::<u8>();
        drop(tx);
        let mut calls = 0;
        EventLoop::new(rx).run(|_| {
            calls += 1;
            ControlFlow::Continue
        });
        assert_eq!(calls, 0);
    }
}
