//! Sequential allocation state for one partition draw

/// A partial or complete assignment of items to cluster labels
///
/// Labels are slot indices into `members`; a slot whose member list is
/// empty is free. Labels are not canonical until passed through
/// [`Clustering::relabel_into_slice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clustering {
    labels: Vec<Option<usize>>,
    members: Vec<Vec<usize>>,
    n_clusters: usize,
}

impl Clustering {
    /// Every item unallocated
    pub fn unallocated(n_items: usize) -> Self {
        Self {
            labels: vec![None; n_items],
            members: Vec::new(),
            n_clusters: 0,
        }
    }

    pub fn n_items(&self) -> usize {
        self.labels.len()
    }

    pub fn n_clusters(&self) -> usize {
        self.n_clusters
    }

    pub fn label_of(&self, item: usize) -> Option<usize> {
        self.labels[item]
    }

    pub fn size_of(&self, label: usize) -> usize {
        self.members.get(label).map_or(0, Vec::len)
    }

    pub fn items_of(&self, label: usize) -> &[usize] {
        self.members.get(label).map_or(&[], Vec::as_slice)
    }

    /// The label a brand-new cluster would receive
    pub fn new_label(&self) -> usize {
        self.members
            .iter()
            .position(Vec::is_empty)
            .unwrap_or(self.members.len())
    }

    /// Labels of occupied clusters in ascending order, followed by [`Self::new_label`]
    pub fn available_labels(&self) -> Vec<usize> {
        let mut labels: Vec<usize> = self
            .members
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_empty())
            .map(|(label, _)| label)
            .collect();
        labels.push(self.new_label());
        labels
    }

    /// Assign an unallocated item to `label`
    ///
    /// # Panics
    ///
    /// Panics if the item is already allocated or `label` skips past the
    /// next free slot; both are engine bugs.
    pub fn allocate(&mut self, item: usize, label: usize) {
        assert!(self.labels[item].is_none(), "item {item} allocated twice");
        assert!(label <= self.members.len(), "label {label} skips a slot");
        if label == self.members.len() {
            self.members.push(Vec::new());
        }
        if self.members[label].is_empty() {
            self.n_clusters += 1;
        }
        self.members[label].push(item);
        self.labels[item] = Some(label);
    }

    pub fn is_complete(&self) -> bool {
        self.labels.iter().all(Option::is_some)
    }

    /// Write labels renumbered `base, base + 1, ...` in order of first
    /// appearance when scanning items `0..n_items`
    ///
    /// Unallocated items are written as `base - 1`.
    pub fn relabel_into_slice(&self, base: i32, dest: &mut [i32]) {
        debug_assert_eq!(dest.len(), self.n_items());
        let mut map: Vec<Option<i32>> = vec![None; self.members.len()];
        let mut next = base;
        for (slot, label) in dest.iter_mut().zip(&self.labels) {
            *slot = match label {
                Some(label) => *map[*label].get_or_insert_with(|| {
                    next += 1;
                    next - 1
                }),
                None => base - 1,
            };
        }
    }

    /// Canonical zero-based labels
    pub fn labels(&self) -> Vec<i32> {
        let mut out = vec![0; self.n_items()];
        self.relabel_into_slice(0, &mut out);
        out
    }
}
