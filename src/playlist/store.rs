use crate::library::Track;

/// Ordered tracks; insertion order is playback order.
///
/// `selected`, when set, always indexes a live element. At most one track
/// carries the current flag.
#[derive(Debug, Default, Clone)]
pub struct Playlist {
    tracks: Vec<Track>,
    selected: Option<usize>,
}

impl Playlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Track> {
        self.tracks.get_mut(index)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Track> {
        self.tracks.iter_mut()
    }

    /// Append and return the new index. A track never arrives as current.
    pub fn append(&mut self, mut track: Track) -> usize {
        track.set_current(false);
        self.tracks.push(track);
        self.tracks.len() - 1
    }

    pub fn extend(&mut self, tracks: impl IntoIterator<Item = Track>) {
        for t in tracks {
            self.append(t);
        }
    }

    /// Swap in a whole new list (playlist load). Selects the first track.
    pub fn replace_all(&mut self, tracks: Vec<Track>) {
        self.tracks.clear();
        self.extend(tracks);
        self.selected = if self.tracks.is_empty() { None } else { Some(0) };
    }

    pub fn remove(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }
        let removed = self.tracks.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        if self.tracks.is_empty() {
            self.selected = None;
        }
        Some(removed)
    }

    /// Move the track at `from` so it ends up at `to`. The selection
    /// follows the track it pointed at.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let n = self.tracks.len();
        if from >= n || to >= n {
            return false;
        }
        if from == to {
            return true;
        }
        let t = self.tracks.remove(from);
        self.tracks.insert(to, t);
        self.selected = self.selected.map(|s| {
            if s == from {
                to
            } else if from < s && s <= to {
                s - 1
            } else if to <= s && s < from {
                s + 1
            } else {
                s
            }
        });
        true
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
        self.selected = None;
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Select `index`; out-of-range clears the selection.
    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|i| *i < self.tracks.len());
    }

    pub fn current_index(&self) -> Option<usize> {
        self.tracks.iter().position(|t| t.is_current())
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.iter().find(|t| t.is_current())
    }

    pub fn current_mut(&mut self) -> Option<&mut Track> {
        self.tracks.iter_mut().find(|t| t.is_current())
    }

    /// Mark the first track with `uri` as current and clear every other
    /// flag. `None` clears all. Returns the index marked.
    pub fn set_current(&mut self, uri: Option<&str>) -> Option<usize> {
        let mut marked = None;
        for (i, t) in self.tracks.iter_mut().enumerate() {
            let hit = marked.is_none() && uri.is_some_and(|u| t.uri() == u);
            t.set_current(hit);
            if hit {
                marked = Some(i);
            }
        }
        marked
    }
}
