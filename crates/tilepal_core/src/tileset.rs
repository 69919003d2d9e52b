//! The tileset: an observable palette of tile definitions
//!
//! A tileset owns a sparse mapping from index to tile, the transient
//! state of the user's interaction with it (selection, the rectangle
//! of a tile being defined, overlap detection) and the tileset image.
//! Only the name, the tile map and the index counter are persisted;
//! everything else is rebuilt after a load.

use std::collections::BTreeMap;
use std::fmt;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TilesetError;
use crate::event::{Observers, ObserverId, TilesetEvent};
use crate::tile::{Obstacle, Rect, Tile, TileIndex, TileLayer};

/// What the user currently has selected in the tileset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// No tile is selected
    #[default]
    None,
    /// An existing tile is selected
    Existing(TileIndex),
    /// A new tile is selected, ready to be added
    Pending,
}

impl Selection {
    /// Integer form of the selection: 0 for none, the index for an
    /// existing tile, -1 while defining a new tile.
    ///
    /// One historical comparison in [`Tileset::set_selection`] is
    /// defined on this encoding, so it is kept alongside the enum.
    pub fn raw(self) -> i64 {
        match self {
            Selection::None => 0,
            Selection::Existing(index) => i64::from(index),
            Selection::Pending => -1,
        }
    }
}

/// An observable tileset.
///
/// Tiles are keyed by their index; the first index is 1 and indexes
/// are never reused, so removals leave gaps. Iteration is always in
/// ascending index order.
#[derive(Serialize, Deserialize)]
pub struct Tileset {
    /// Name of the tileset, for example "house"
    name: String,
    /// The tiles, keyed by index
    tiles: BTreeMap<TileIndex, Tile>,
    /// Highest index ever assigned in this tileset
    max_index: TileIndex,
    #[serde(skip)]
    selection: Selection,
    /// Rectangle of the tile the user is defining, if any
    #[serde(skip)]
    pending_area: Option<Rect>,
    /// True if the pending area overlaps an existing tile, in which
    /// case the tile cannot be created
    #[serde(skip)]
    pending_overlaps: bool,
    /// True if the tileset has unsaved structural changes
    #[serde(skip)]
    dirty: bool,
    #[serde(skip)]
    image: Option<RgbaImage>,
    /// The tileset image scaled by 2, for magnified editing views
    #[serde(skip)]
    double_image: Option<RgbaImage>,
    #[serde(skip)]
    observers: Observers,
}

impl Tileset {
    /// Create a new, empty tileset.
    ///
    /// A new tileset starts dirty: it has never been saved. It also
    /// starts without an image; callers that know the asset root load
    /// one afterwards.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tiles: BTreeMap::new(),
            max_index: 0,
            selection: Selection::None,
            pending_area: None,
            pending_overlaps: false,
            dirty: true,
            image: None,
            double_image: None,
            observers: Observers::default(),
        }
    }

    /// Name of the tileset
    pub fn name(&self) -> &str {
        &self.name
    }

    // Observers

    /// Register an observer. It is called synchronously, inside the
    /// mutating call, for every change to the tileset.
    ///
    /// Observers must not mutate the tileset from inside their own
    /// callback.
    pub fn subscribe(&mut self, observer: impl FnMut(TilesetEvent<'_>) + 'static) -> ObserverId {
        self.observers.subscribe(observer)
    }

    /// Remove a previously registered observer
    pub fn unsubscribe(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    // The tile map

    /// Number of tiles in the tileset
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// The present tile indexes, in ascending order
    pub fn indexes(&self) -> impl Iterator<Item = TileIndex> + '_ {
        self.tiles.keys().copied()
    }

    /// The tiles with their indexes, in ascending index order
    pub fn tiles(&self) -> impl Iterator<Item = (TileIndex, &Tile)> {
        self.tiles.iter().map(|(index, tile)| (*index, tile))
    }

    /// Get the tile with this index
    pub fn tile(&self, index: TileIndex) -> Result<&Tile, TilesetError> {
        self.tiles
            .get(&index)
            .ok_or(TilesetError::NoSuchTile { index })
    }

    /// Index of the tile at a point of the tileset image, or `None`
    /// if there is no tile there.
    ///
    /// If tiles overlap, the one with the lowest index wins.
    pub fn tile_at(&self, x: i32, y: i32) -> Option<TileIndex> {
        self.tiles
            .iter()
            .find(|(_, tile)| tile.rect.contains(x, y))
            .map(|(index, _)| *index)
    }

    /// Rank of a tile, knowing its index.
    ///
    /// The rank is the position of the tile when all tiles are
    /// enumerated in ascending index order. It differs from the index
    /// because the index sequence may have gaps.
    pub fn rank_of_index(&self, index: TileIndex) -> Result<usize, TilesetError> {
        self.tiles
            .keys()
            .position(|&present| present == index)
            .ok_or(TilesetError::NoSuchTile { index })
    }

    /// Index of a tile, knowing its rank (in `[0, tile_count() - 1]`)
    pub fn index_of_rank(&self, rank: usize) -> Result<TileIndex, TilesetError> {
        self.indexes()
            .nth(rank)
            .ok_or(TilesetError::NoSuchRank { rank })
    }

    // Selection

    /// The current selection
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Change the selection and notify the observers.
    ///
    /// Does nothing if the selection is unchanged. A selected index
    /// must exist in the tileset.
    ///
    /// The pending rectangle is cleared unless the integer form of
    /// the new selection equals the current tile count. This is
    /// long-standing behavior the interactive workflow depends on
    /// (adding a tile to a gap-free tileset selects an index equal to
    /// the new count, keeping the rectangle on screen).
    pub fn set_selection(&mut self, selection: Selection) {
        if selection == self.selection {
            return;
        }
        if let Selection::Existing(index) = selection {
            debug_assert!(self.tiles.contains_key(&index));
        }

        self.selection = selection;
        if selection.raw() != self.tile_count() as i64 {
            self.pending_area = None;
        }

        self.observers.emit(TilesetEvent::Changed);
    }

    /// Unselect the current tile. Equivalent to
    /// `set_selection(Selection::None)`.
    pub fn deselect(&mut self) {
        self.set_selection(Selection::None);
    }

    /// Start defining a new tile. Equivalent to
    /// `set_selection(Selection::Pending)`.
    pub fn begin_new_tile(&mut self) {
        self.set_selection(Selection::Pending);
    }

    /// Index of the selected tile, if an existing tile is selected
    pub fn selected_index(&self) -> Option<TileIndex> {
        match self.selection {
            Selection::Existing(index) => Some(index),
            _ => None,
        }
    }

    /// The selected tile, if an existing tile is selected
    pub fn selected_tile(&self) -> Option<&Tile> {
        self.selected_index().and_then(|index| self.tiles.get(&index))
    }

    /// Whether the user is defining a new tile
    pub fn is_defining_new_tile(&self) -> bool {
        self.selection == Selection::Pending
    }

    // Pending area

    /// Rectangle of the tile the user is defining, if any
    pub fn pending_area(&self) -> Option<Rect> {
        self.pending_area
    }

    /// Change the rectangle of the tile being defined and notify the
    /// observers.
    ///
    /// Does nothing if the rectangle is unchanged. Otherwise the
    /// overlap flag is recomputed against every tile in the map.
    pub fn set_pending_area(&mut self, area: Option<Rect>) {
        if area == self.pending_area {
            return;
        }

        self.pending_overlaps = match &area {
            Some(rect) => self.tiles.values().any(|tile| tile.rect.intersects(rect)),
            None => false,
        };
        self.pending_area = area;

        self.observers.emit(TilesetEvent::Changed);
    }

    /// Whether the pending rectangle overlaps an existing tile.
    /// While true, the tile cannot be created.
    pub fn is_pending_overlapping(&self) -> bool {
        self.pending_overlaps
    }

    // Creation and removal

    /// Create the tile described by the pending rectangle and add it
    /// to the tileset, on the `Below` layer.
    ///
    /// Does nothing unless a new tile is being defined, its rectangle
    /// is set, and it overlaps no existing tile. On success the new
    /// tile becomes the selection, the tileset is marked dirty, and
    /// the observers are notified with the created tile.
    ///
    /// Returns the index of the new tile.
    pub fn add_tile(&mut self, obstacle: Obstacle) -> Option<TileIndex> {
        if !self.is_defining_new_tile() || self.pending_overlaps {
            return None;
        }
        let rect = self.pending_area?;

        let tile = Tile::new(rect, TileLayer::Below, obstacle);
        self.max_index += 1;
        let index = self.max_index;
        self.tiles.insert(index, tile);

        self.set_selection(Selection::Existing(index));
        self.dirty = true;
        debug!(index, ?rect, "tile created");

        let created = &self.tiles[&index];
        self.observers.emit(TilesetEvent::TileCreated(created));
        Some(index)
    }

    /// Remove the selected tile.
    ///
    /// Does nothing unless an existing tile is selected. On success
    /// the selection is cleared, the tileset is marked dirty, and the
    /// observers are notified with the removed index.
    ///
    /// Returns the removed tile.
    pub fn remove_tile(&mut self) -> Option<Tile> {
        let Selection::Existing(index) = self.selection else {
            return None;
        };
        let removed = self.tiles.remove(&index)?;

        self.set_selection(Selection::None);
        self.dirty = true;
        debug!(index, "tile removed");

        self.observers.emit(TilesetEvent::TileRemoved(index));
        Some(removed)
    }

    // Saved state

    /// Whether the tileset has unsaved structural changes
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Clear the dirty flag after a successful save or load
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    // Image

    /// Replace the tileset image and notify the observers.
    ///
    /// `None` clears both the image and its 2x copy; observers
    /// receive the empty handle so they can show a placeholder.
    /// `Some` also derives a 2x nearest-neighbor scaled copy for
    /// magnified editing views, so the two never diverge.
    pub fn set_image(&mut self, image: Option<RgbaImage>) {
        self.double_image = image.as_ref().map(|base| {
            imageops::resize(base, base.width() * 2, base.height() * 2, FilterType::Nearest)
        });
        self.image = image;

        let handle = self.image.as_ref();
        self.observers.emit(TilesetEvent::ImageChanged(handle));
    }

    /// The tileset image, if it is loaded
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }

    /// The 200% scaled version of the tileset image, if it is loaded
    pub fn double_image(&self) -> Option<&RgbaImage> {
        self.double_image.as_ref()
    }
}

impl fmt::Debug for Tileset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tileset")
            .field("name", &self.name)
            .field("tiles", &self.tiles)
            .field("max_index", &self.max_index)
            .field("selection", &self.selection)
            .field("pending_area", &self.pending_area)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Simplified event record for assertions
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Seen {
        Changed,
        Created(Rect),
        Removed(TileIndex),
        Image(bool),
    }

    fn record_events(tileset: &mut Tileset) -> Rc<RefCell<Vec<Seen>>> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        tileset.subscribe(move |event| {
            sink.borrow_mut().push(match event {
                TilesetEvent::Changed => Seen::Changed,
                TilesetEvent::TileCreated(tile) => Seen::Created(tile.rect),
                TilesetEvent::TileRemoved(index) => Seen::Removed(index),
                TilesetEvent::ImageChanged(image) => Seen::Image(image.is_some()),
            });
        });
        log
    }

    /// Drive the interactive workflow to add a tile at `rect`
    fn add_tile_at(tileset: &mut Tileset, rect: Rect) -> TileIndex {
        tileset.begin_new_tile();
        tileset.set_pending_area(Some(rect));
        tileset.add_tile(Obstacle::None).expect("tile should be added")
    }

    #[test]
    fn test_add_tile_workflow() {
        let mut tileset = Tileset::new("house");

        tileset.begin_new_tile();
        tileset.set_pending_area(Some(Rect::new(0, 0, 16, 16)));
        let index = tileset.add_tile(Obstacle::None);

        assert_eq!(index, Some(1));
        assert_eq!(tileset.tile_count(), 1);
        assert_eq!(tileset.selection(), Selection::Existing(1));
        assert_eq!(tileset.tile(1).unwrap().rect, Rect::new(0, 0, 16, 16));
        assert_eq!(tileset.tile(1).unwrap().layer, TileLayer::Below);
        assert!(tileset.is_dirty());
    }

    #[test]
    fn test_add_tile_emits_selection_then_creation() {
        let mut tileset = Tileset::new("house");
        tileset.begin_new_tile();
        tileset.set_pending_area(Some(Rect::new(0, 0, 16, 16)));

        let log = record_events(&mut tileset);
        tileset.add_tile(Obstacle::Solid);

        assert_eq!(
            *log.borrow(),
            vec![Seen::Changed, Seen::Created(Rect::new(0, 0, 16, 16))]
        );
    }

    #[test]
    fn test_add_tile_noop_without_pending_selection() {
        let mut tileset = Tileset::new("house");
        let log = record_events(&mut tileset);

        assert_eq!(tileset.add_tile(Obstacle::None), None);
        assert_eq!(tileset.tile_count(), 0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_add_tile_noop_without_pending_area() {
        let mut tileset = Tileset::new("house");
        tileset.begin_new_tile();

        let log = record_events(&mut tileset);
        assert_eq!(tileset.add_tile(Obstacle::None), None);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_add_tile_rejected_when_overlapping() {
        let mut tileset = Tileset::new("house");
        add_tile_at(&mut tileset, Rect::new(0, 0, 16, 16));

        tileset.begin_new_tile();
        tileset.set_pending_area(Some(Rect::new(8, 8, 16, 16)));
        assert!(tileset.is_pending_overlapping());

        let log = record_events(&mut tileset);
        assert_eq!(tileset.add_tile(Obstacle::None), None);
        assert_eq!(tileset.tile_count(), 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_overlap_recomputed_on_area_change() {
        let mut tileset = Tileset::new("house");
        add_tile_at(&mut tileset, Rect::new(0, 0, 16, 16));

        tileset.begin_new_tile();
        tileset.set_pending_area(Some(Rect::new(8, 8, 16, 16)));
        assert!(tileset.is_pending_overlapping());

        // Sliding the rectangle away clears the flag
        tileset.set_pending_area(Some(Rect::new(16, 0, 16, 16)));
        assert!(!tileset.is_pending_overlapping());

        assert_eq!(tileset.add_tile(Obstacle::None), Some(2));
    }

    #[test]
    fn test_duplicate_pending_area_emits_once() {
        let mut tileset = Tileset::new("house");
        tileset.begin_new_tile();

        let log = record_events(&mut tileset);
        tileset.set_pending_area(Some(Rect::new(0, 0, 16, 16)));
        tileset.set_pending_area(Some(Rect::new(0, 0, 16, 16)));

        assert_eq!(*log.borrow(), vec![Seen::Changed]);
    }

    #[test]
    fn test_selection_change_notifies_once() {
        let mut tileset = Tileset::new("house");
        let log = record_events(&mut tileset);

        tileset.begin_new_tile();
        tileset.begin_new_tile();
        tileset.deselect();

        assert_eq!(*log.borrow(), vec![Seen::Changed, Seen::Changed]);
    }

    #[test]
    fn test_selection_change_clears_pending_area() {
        let mut tileset = Tileset::new("house");
        add_tile_at(&mut tileset, Rect::new(0, 0, 16, 16));
        add_tile_at(&mut tileset, Rect::new(16, 0, 16, 16));

        tileset.begin_new_tile();
        tileset.set_pending_area(Some(Rect::new(32, 0, 16, 16)));

        // Selecting tile 1 (count is 2) clears the rectangle
        tileset.set_selection(Selection::Existing(1));
        assert_eq!(tileset.pending_area(), None);
    }

    #[test]
    fn test_pending_area_survives_selecting_index_equal_to_count() {
        // Historical quirk: the rectangle is kept when the selected
        // index happens to equal the tile count.
        let mut tileset = Tileset::new("house");
        add_tile_at(&mut tileset, Rect::new(0, 0, 16, 16));
        add_tile_at(&mut tileset, Rect::new(16, 0, 16, 16));

        tileset.begin_new_tile();
        tileset.set_pending_area(Some(Rect::new(32, 0, 16, 16)));

        tileset.set_selection(Selection::Existing(2));
        assert_eq!(tileset.pending_area(), Some(Rect::new(32, 0, 16, 16)));
    }

    #[test]
    fn test_remove_tile_resets_selection() {
        let mut tileset = Tileset::new("house");
        add_tile_at(&mut tileset, Rect::new(0, 0, 16, 16));

        let log = record_events(&mut tileset);
        let removed = tileset.remove_tile();

        assert_eq!(removed.map(|t| t.rect), Some(Rect::new(0, 0, 16, 16)));
        assert_eq!(tileset.selection(), Selection::None);
        assert_eq!(tileset.tile_count(), 0);
        assert!(tileset.tile(1).is_err());
        assert_eq!(*log.borrow(), vec![Seen::Changed, Seen::Removed(1)]);
    }

    #[test]
    fn test_remove_tile_noop_without_selection() {
        let mut tileset = Tileset::new("house");
        add_tile_at(&mut tileset, Rect::new(0, 0, 16, 16));
        tileset.deselect();

        let log = record_events(&mut tileset);
        assert_eq!(tileset.remove_tile(), None);
        assert_eq!(tileset.tile_count(), 1);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_indexes_are_never_reused() {
        let mut tileset = Tileset::new("house");
        for i in 0..3 {
            add_tile_at(&mut tileset, Rect::new(i * 16, 0, 16, 16));
        }

        // Remove tile 2, leaving a gap
        tileset.set_selection(Selection::Existing(2));
        tileset.remove_tile();

        add_tile_at(&mut tileset, Rect::new(48, 0, 16, 16));
        assert_eq!(tileset.indexes().collect::<Vec<_>>(), vec![1, 3, 4]);
    }

    #[test]
    fn test_rank_conversions_with_gaps() {
        let mut tileset = Tileset::new("house");
        for i in 0..4 {
            add_tile_at(&mut tileset, Rect::new(i * 16, 0, 16, 16));
        }
        tileset.set_selection(Selection::Existing(2));
        tileset.remove_tile();

        // Indexes are now {1, 3, 4}
        assert_eq!(tileset.rank_of_index(3), Ok(1));
        assert_eq!(tileset.index_of_rank(2), Ok(4));
        assert_eq!(
            tileset.rank_of_index(2),
            Err(TilesetError::NoSuchTile { index: 2 })
        );
        assert_eq!(
            tileset.index_of_rank(3),
            Err(TilesetError::NoSuchRank { rank: 3 })
        );

        // Round-trip law over every present tile
        for rank in 0..tileset.tile_count() {
            let index = tileset.index_of_rank(rank).unwrap();
            assert_eq!(tileset.rank_of_index(index), Ok(rank));
        }
        for index in tileset.indexes().collect::<Vec<_>>() {
            let rank = tileset.rank_of_index(index).unwrap();
            assert_eq!(tileset.index_of_rank(rank), Ok(index));
        }
    }

    #[test]
    fn test_tile_at_prefers_lowest_index() {
        let mut tileset = Tileset::new("house");
        add_tile_at(&mut tileset, Rect::new(0, 0, 16, 16));
        add_tile_at(&mut tileset, Rect::new(32, 32, 16, 16));

        assert_eq!(tileset.tile_at(8, 8), Some(1));
        assert_eq!(tileset.tile_at(40, 40), Some(2));
        assert_eq!(tileset.tile_at(100, 100), None);
    }

    #[test]
    fn test_selected_tile() {
        let mut tileset = Tileset::new("house");
        let index = add_tile_at(&mut tileset, Rect::new(0, 0, 16, 16));

        assert_eq!(tileset.selected_index(), Some(index));
        assert_eq!(
            tileset.selected_tile().map(|t| t.rect),
            Some(Rect::new(0, 0, 16, 16))
        );

        tileset.begin_new_tile();
        assert!(tileset.is_defining_new_tile());
        assert_eq!(tileset.selected_tile(), None);

        tileset.deselect();
        assert_eq!(tileset.selection(), Selection::None);
    }

    #[test]
    fn test_set_image_derives_double() {
        let mut tileset = Tileset::new("house");
        let log = record_events(&mut tileset);

        tileset.set_image(Some(RgbaImage::new(8, 4)));
        let double = tileset.double_image().expect("double image");
        assert_eq!((double.width(), double.height()), (16, 8));
        assert_eq!(*log.borrow(), vec![Seen::Image(true)]);

        tileset.set_image(None);
        assert!(tileset.image().is_none());
        assert!(tileset.double_image().is_none());
        assert_eq!(*log.borrow(), vec![Seen::Image(true), Seen::Image(false)]);
    }

    #[test]
    fn test_keys_stay_within_max_index() {
        let mut tileset = Tileset::new("house");
        for i in 0..6 {
            add_tile_at(&mut tileset, Rect::new(i * 16, 0, 16, 16));
            if i % 2 == 0 {
                tileset.remove_tile();
            }
        }

        let indexes: Vec<_> = tileset.indexes().collect();
        assert!(indexes.iter().all(|&i| i >= 1 && i <= 6));
        let mut sorted = indexes.clone();
        sorted.dedup();
        assert_eq!(sorted, indexes);
    }

    #[test]
    fn test_unsubscribed_observer_is_silent() {
        let mut tileset = Tileset::new("house");
        let log = record_events(&mut tileset);

        let counter = Rc::new(RefCell::new(0u32));
        let sink = Rc::clone(&counter);
        let id = tileset.subscribe(move |_| *sink.borrow_mut() += 1);
        tileset.begin_new_tile();
        assert!(tileset.unsubscribe(id));

        tileset.deselect();
        assert_eq!(*counter.borrow(), 1);
        assert_eq!(log.borrow().len(), 2);
    }
}
