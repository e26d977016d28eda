use std::collections::HashMap;
use std::fmt;

use knitlink_control::{ControlError, Envelope, MessageId};

/// Callback invoked for each envelope with a matching id.
pub type ControlHandler = Box<dyn FnMut(&Envelope) + Send>;

/// Explicit id -> handler map for the control channel.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<u32, ControlHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `id`, returning the handler it replaced.
    pub fn register<F>(&mut self, id: u32, handler: F) -> Option<ControlHandler>
    where
        F: FnMut(&Envelope) + Send + 'static,
    {
        self.handlers.insert(id, Box::new(handler))
    }

    /// Register a handler for the reply to `message`.
    ///
    /// Returns `false` for messages the controller never replies to.
    pub fn register_reply<F>(&mut self, message: MessageId, handler: F) -> bool
    where
        F: FnMut(&Envelope) + Send + 'static,
    {
        match message.reply_id() {
            Some(id) => {
                self.register(id, handler);
                true
            }
            None => false,
        }
    }

    /// Remove the handler for `id`. Returns whether one was registered.
    pub fn unregister(&mut self, id: u32) -> bool {
        self.handlers.remove(&id).is_some()
    }

    pub fn contains(&self, id: u32) -> bool {
        self.handlers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.handlers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Invoke the handler registered for the envelope's id.
    pub fn dispatch(&mut self, envelope: &Envelope) -> Result<(), ControlError> {
        let handler = self
            .handlers
            .get_mut(&envelope.id)
            .ok_or(ControlError::UnroutedId { id: envelope.id })?;
        handler(envelope);
        Ok(())
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}
