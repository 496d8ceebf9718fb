//! Frozen CKey/EKey lookup index.
//!
//! Built additively while the encoding table and `.idx`/`.index` files
//! are walked during open, then treated as read-only: a slab of entries
//! plus two lookup maps, rather than a lock-free concurrent map, since
//! nothing mutates it once storage open completes.

use std::collections::HashMap;

use crate::types::ArchiveLocation;

/// One content key's full record: the content hash, the encoding key(s)
/// it maps to (in span order for files split across several archive
/// fragments), and where each span's encoded bytes live on disk.
#[derive(Debug, Clone)]
pub struct CKeyEntry {
    pub ckey: [u8; 16],
    pub ekeys: Vec<[u8; 16]>,
    /// Parallel to `ekeys`: each span's archive location, filled in once
    /// the matching `.idx`/`.index` entry has been seen.
    pub spans: Vec<Option<ArchiveLocation>>,
    pub content_size: Option<u64>,
    pub encoded_size: Option<u64>,
    pub span_count: u32,
}

impl CKeyEntry {
    fn bare(ekey: [u8; 16]) -> Self {
        Self {
            ckey: [0u8; 16],
            ekeys: vec![ekey],
            spans: vec![None],
            content_size: None,
            encoded_size: None,
            span_count: 1,
        }
    }

    /// The first span's archive location, for single-span files.
    pub fn storage_offset(&self) -> Option<ArchiveLocation> {
        self.spans.first().copied().flatten()
    }
}

/// EKeys are compared and indexed by their first 9 bytes, matching the
/// truncated form stored in `.idx` files.
pub type EKeyPrefix = [u8; 9];

fn prefix(ekey: &[u8; 16]) -> EKeyPrefix {
    let mut p = [0u8; 9];
    p.copy_from_slice(&ekey[..9]);
    p
}

/// Frozen CKey/EKey index: a slab of [`CKeyEntry`] plus two lookup maps.
/// `by_ekey` resolves to the owning entry and the position of that EKey
/// within the entry's span list.
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: Vec<CKeyEntry>,
    by_ckey: HashMap<[u8; 16], usize>,
    by_ekey: HashMap<EKeyPrefix, (usize, usize)>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an encoding-table entry: a CKey mapping to one or more
    /// EKeys in span order, with content/encoded sizes. Creates a new
    /// slab entry, or fills in a placeholder previously created by
    /// [`Self::insert_location`], carrying over any span locations
    /// already known for those EKeys.
    pub fn insert_encoding(
        &mut self,
        ckey: [u8; 16],
        ekeys: Vec<[u8; 16]>,
        content_size: Option<u64>,
        encoded_size: Option<u64>,
    ) {
        let span_count = ekeys.len() as u32;

        if let Some(&idx) = self.by_ckey.get(&ckey) {
            let spans = self.carry_over_spans(idx, &ekeys);
            let entry = &mut self.entries[idx];
            entry.ekeys = ekeys.clone();
            entry.spans = spans;
            entry.content_size = content_size.or(entry.content_size);
            entry.encoded_size = encoded_size.or(entry.encoded_size);
            entry.span_count = span_count;
            for (i, ekey) in ekeys.iter().enumerate() {
                self.by_ekey.insert(prefix(ekey), (idx, i));
            }
            return;
        }

        // A placeholder may already exist for one of this CKey's EKeys
        // if an `.idx` file was loaded first.
        if let Some(&(idx, _)) = ekeys.iter().find_map(|e| self.by_ekey.get(&prefix(e))) {
            let spans = self.carry_over_spans(idx, &ekeys);
            let entry = &mut self.entries[idx];
            entry.ckey = ckey;
            entry.ekeys = ekeys.clone();
            entry.spans = spans;
            entry.content_size = content_size;
            entry.encoded_size = encoded_size.or(entry.encoded_size);
            entry.span_count = span_count;
            self.by_ckey.insert(ckey, idx);
            for (i, ekey) in ekeys.iter().enumerate() {
                self.by_ekey.insert(prefix(ekey), (idx, i));
            }
            return;
        }

        let idx = self.entries.len();
        for (i, ekey) in ekeys.iter().enumerate() {
            self.by_ekey.insert(prefix(ekey), (idx, i));
        }
        let spans = vec![None; ekeys.len()];
        self.entries.push(CKeyEntry {
            ckey,
            ekeys,
            spans,
            content_size,
            encoded_size,
            span_count,
        });
        self.by_ckey.insert(ckey, idx);
    }

    /// Look up any span location already known under `idx` for the given
    /// (possibly reordered) EKey list, by matching EKey prefixes.
    fn carry_over_spans(&self, idx: usize, ekeys: &[[u8; 16]]) -> Vec<Option<ArchiveLocation>> {
        let existing = &self.entries[idx];
        ekeys
            .iter()
            .map(|ekey| {
                existing
                    .ekeys
                    .iter()
                    .position(|e| e == ekey)
                    .and_then(|pos| existing.spans.get(pos).copied().flatten())
            })
            .collect()
    }

    /// Record an `.idx`/`.index` entry: one span's archive location. If
    /// no encoding-table entry has registered this EKey yet, creates a
    /// bare single-span placeholder entry that is *not* reachable by
    /// CKey until [`Self::insert_encoding`] later fills it in.
    pub fn insert_location(&mut self, ekey: [u8; 16], location: ArchiveLocation) {
        let key = prefix(&ekey);
        if let Some(&(idx, span_idx)) = self.by_ekey.get(&key) {
            let entry = &mut self.entries[idx];
            entry.spans[span_idx] = Some(location);
            if entry.span_count <= 1 && entry.encoded_size.is_none() {
                entry.encoded_size = Some(u64::from(location.size));
            }
            return;
        }

        let idx = self.entries.len();
        let mut entry = CKeyEntry::bare(ekey);
        entry.encoded_size = Some(u64::from(location.size));
        entry.spans[0] = Some(location);
        self.entries.push(entry);
        self.by_ekey.insert(key, (idx, 0));
    }

    pub fn by_ckey(&self, ckey: &[u8; 16]) -> Option<&CKeyEntry> {
        self.by_ckey.get(ckey).map(|&idx| &self.entries[idx])
    }

    pub fn by_ekey_prefix(&self, prefix: &EKeyPrefix) -> Option<&CKeyEntry> {
        self.by_ekey.get(prefix).map(|&(idx, _)| &self.entries[idx])
    }

    pub fn by_ekey(&self, ekey: &[u8; 16]) -> Option<&CKeyEntry> {
        self.by_ekey_prefix(&prefix(ekey))
    }

    /// The archive location for a specific EKey, whichever span of
    /// whichever entry it belongs to.
    pub fn location_for_ekey(&self, ekey: &[u8; 16]) -> Option<ArchiveLocation> {
        let &(idx, span_idx) = self.by_ekey.get(&prefix(ekey))?;
        self.entries[idx].spans[span_idx]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CKeyEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ckey(b: u8) -> [u8; 16] {
        [b; 16]
    }

    fn ekey(b: u8) -> [u8; 16] {
        [b; 16]
    }

    fn loc(archive_id: u16, offset: u64, size: u32) -> ArchiveLocation {
        ArchiveLocation {
            archive_id,
            offset,
            size,
        }
    }

    #[test]
    fn encoding_then_location() {
        let mut index = KeyIndex::new();
        index.insert_encoding(ckey(1), vec![ekey(1)], Some(100), Some(80));
        index.insert_location(ekey(1), loc(0, 0, 80));

        let entry = index.by_ckey(&ckey(1)).expect("ckey lookup");
        assert_eq!(entry.content_size, Some(100));
        assert!(entry.storage_offset().is_some());

        let via_ekey = index.by_ekey(&ekey(1)).expect("ekey lookup");
        assert_eq!(via_ekey.ckey, ckey(1));
    }

    #[test]
    fn location_before_encoding() {
        let mut index = KeyIndex::new();
        index.insert_location(ekey(2), loc(1, 1000, 256));
        assert!(index.by_ckey(&ckey(2)).is_none());

        index.insert_encoding(ckey(2), vec![ekey(2)], Some(500), None);

        let entry = index.by_ckey(&ckey(2)).expect("ckey lookup after fill-in");
        assert_eq!(entry.encoded_size, Some(256));
        assert_eq!(entry.storage_offset().unwrap().archive_id, 1);
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn multi_span_entry_keeps_distinct_locations() {
        let mut index = KeyIndex::new();
        index.insert_encoding(ckey(3), vec![ekey(10), ekey(20)], Some(2_000_000), None);
        index.insert_location(ekey(10), loc(3, 0, 1_000_000));
        index.insert_location(ekey(20), loc(4, 0, 1_000_000));

        assert_eq!(index.len(), 1);
        let entry = index.by_ckey(&ckey(3)).expect("ckey lookup");
        assert_eq!(entry.span_count, 2);
        assert_eq!(entry.spans[0].unwrap().archive_id, 3);
        assert_eq!(entry.spans[1].unwrap().archive_id, 4);

        assert_eq!(index.location_for_ekey(&ekey(10)).unwrap().archive_id, 3);
        assert_eq!(index.location_for_ekey(&ekey(20)).unwrap().archive_id, 4);
    }

    #[test]
    fn distinct_entries_stay_distinct() {
        let mut index = KeyIndex::new();
        index.insert_encoding(ckey(1), vec![ekey(1)], Some(10), Some(10));
        index.insert_encoding(ckey(2), vec![ekey(2)], Some(20), Some(20));
        index.insert_location(ekey(1), loc(0, 0, 10));
        index.insert_location(ekey(2), loc(0, 10, 20));

        assert_eq!(index.len(), 2);
        assert_eq!(index.by_ckey(&ckey(1)).unwrap().content_size, Some(10));
        assert_eq!(index.by_ckey(&ckey(2)).unwrap().content_size, Some(20));
    }
}
