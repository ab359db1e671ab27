use parking_lot::Mutex;
use resona_ports::midi::Receiver;
use std::sync::Arc;

pub(crate) type Slot = Arc<Mutex<Option<Box<dyn Receiver>>>>;

/// Receiver slots of every open transmitter on one input port.
#[derive(Clone, Default)]
pub(crate) struct Fanout {
    slots: Arc<Mutex<Vec<Slot>>>,
}

impl Fanout {
    pub(crate) fn add_slot(&self) -> Slot {
        let slot: Slot = Arc::new(Mutex::new(None));
        self.slots.lock().push(slot.clone());
        slot
    }

    pub(crate) fn remove_slot(&self, slot: &Slot) {
        self.slots.lock().retain(|candidate| !Arc::ptr_eq(candidate, slot));
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Forwards `message` to every connected receiver. Receiver errors are
    /// logged and do not stop delivery to the others.
    pub(crate) fn dispatch(&self, message: &[u8], timestamp_us: Option<i64>) {
        for slot in self.slots.lock().iter() {
            if let Some(receiver) = slot.lock().as_mut() {
                if let Err(err) = receiver.send(message, timestamp_us) {
                    log::debug!(target: "resona::midir", "dropped message: {}", err);
                }
            }
        }
    }
}
