//! Change notification for tileset observers
//!
//! A tileset is observable. Every mutation notifies the registered
//! observers synchronously, before the mutating call returns, with a
//! payload indicating what has just changed.

use image::RgbaImage;

use crate::tile::{Tile, TileIndex};

/// What a tileset mutation just did.
///
/// Payloads borrow from the tileset, so observers can render from them
/// but cannot keep them past the callback.
#[derive(Clone, Copy)]
pub enum TilesetEvent<'a> {
    /// Selection or pending-area change with no dedicated payload
    Changed,
    /// A tile was created at the end of the index sequence
    TileCreated(&'a Tile),
    /// The tile at this index was removed
    TileRemoved(TileIndex),
    /// The tileset image was (re)loaded; `None` means the load failed
    /// and observers should show a placeholder
    ImageChanged(Option<&'a RgbaImage>),
}

/// Token identifying a registered observer, used to unsubscribe it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Callback = Box<dyn FnMut(TilesetEvent<'_>)>;

/// The observer list of a tileset.
///
/// Delivery is synchronous and in registration order; observers must
/// not mutate the tileset from inside their own callback (through an
/// `Rc<RefCell<_>>` or similar), which would panic or produce
/// undefined notification ordering.
#[derive(Default)]
pub(crate) struct Observers {
    next_id: u64,
    entries: Vec<(ObserverId, Callback)>,
}

impl Observers {
    pub(crate) fn subscribe(
        &mut self,
        callback: impl FnMut(TilesetEvent<'_>) + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Remove an observer by its token. Returns false if it was
    /// already removed.
    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        if let Some(pos) = self.entries.iter().position(|(entry_id, _)| *entry_id == id) {
            self.entries.remove(pos);
            true
        } else {
            false
        }
    }

    pub(crate) fn emit(&mut self, event: TilesetEvent<'_>) {
        for (_, callback) in &mut self.entries {
            callback(event);
        }
    }
}
