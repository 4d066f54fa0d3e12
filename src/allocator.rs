use crate::chain::ChainEntry;
use crate::error::AllocationError;
use crate::region::mbr::{DiskHeader, Fit, PartitionRecord};
use crate::region::{HEADER_SIZE, NODE_SIZE};

/// Half open byte range `[start, start + size)`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Extent {
    pub start: i64,
    pub size: i64,
}

impl Extent {
    pub fn new(start: i64, size: i64) -> Self {
        Self { start, size }
    }

    pub fn end(&self) -> i64 {
        self.start + self.size
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Complement of the union of `obstacles` within `bound`
pub fn free_extents(obstacles: &[Extent], bound: Extent) -> Vec<Extent> {
    let mut obstacles: Vec<Extent> = obstacles.iter().copied().filter(|o| o.size > 0).collect();
    obstacles.sort_by_key(|o| o.start);
    let mut extents = Vec::new();
    let mut cursor = bound.start;
    for obstacle in obstacles.iter() {
        let start = obstacle.start.clamp(bound.start, bound.end());
        if start > cursor {
            extents.push(Extent::new(cursor, start - cursor));
        }
        cursor = cursor.max(obstacle.end().min(bound.end()));
    }
    if cursor < bound.end() {
        extents.push(Extent::new(cursor, bound.end() - cursor));
    }
    extents
}

/// Pick a gap of at least `size` bytes, ties always go to the lower start
pub fn select(fit: Fit, extents: &[Extent], size: i64) -> Option<Extent> {
    let mut candidates = extents.iter().copied().filter(|extent| extent.size >= size);
    match fit {
        Fit::First => candidates.next(),
        Fit::Best => candidates.fold(None, |best: Option<Extent>, extent| match best {
            Some(best) if best.size <= extent.size => Some(best),
            _ => Some(extent),
        }),
        Fit::Worst => candidates.fold(None, |worst: Option<Extent>, extent| match worst {
            Some(worst) if worst.size >= extent.size => Some(worst),
            _ => Some(extent),
        }),
    }
}

pub fn place(
    fit: Fit,
    obstacles: &[Extent],
    bound: Extent,
    size: i64,
) -> Result<i64, AllocationError> {
    let extents = free_extents(obstacles, bound);
    trace!("Free extents {:?} within {:?}", extents, bound);
    match select(fit, &extents, size) {
        Some(extent) => Ok(extent.start),
        None => Err(AllocationError::NoSpace { size, fit }),
    }
}

/// Obstacle set and bound for either the whole disk or one extended partition
#[derive(Clone, Debug)]
pub struct Allocator {
    bound: Extent,
    obstacles: Vec<Extent>,
}

impl Allocator {
    pub fn whole_disk(header: &DiskHeader) -> Self {
        let mut obstacles = vec![Extent::new(0, HEADER_SIZE as i64)];
        obstacles.extend(header.active().map(|(_, p)| p.extent()));
        Self { bound: Extent::new(0, header.size), obstacles }
    }

    /// Each logical partition occupies its node plus its payload
    pub fn within_extended(extended: &PartitionRecord, chain: &[ChainEntry]) -> Self {
        let mut obstacles = vec![Extent::new(extended.start, NODE_SIZE as i64)];
        let nodes =
            chain.iter().map(|e| Extent::new(e.offset as i64, NODE_SIZE as i64 + e.node.size));
        obstacles.extend(nodes);
        Self { bound: extended.extent(), obstacles }
    }

    pub fn obstacles(&self) -> &[Extent] {
        &self.obstacles
    }

    pub fn free_extents(&self) -> Vec<Extent> {
        free_extents(&self.obstacles, self.bound)
    }

    pub fn free_space(&self) -> i64 {
        self.free_extents().iter().map(|extent| extent.size).sum()
    }

    pub fn place(&self, fit: Fit, size: i64) -> Result<i64, AllocationError> {
        place(fit, &self.obstacles, self.bound, size)
    }
}

#[cfg(test)]
mod test {
    use super::{Allocator, Extent, free_extents, place, select};
    use crate::chain::ChainEntry;
    use crate::error::AllocationError;
    use crate::region::ebr::ChainNode;
    use crate::region::mbr::{DiskHeader, Fit, Kind, PartitionRecord};

    // Gaps of 10, 50 and 30 bytes at 10, 30 and 90
    fn obstacles() -> Vec<Extent> {
        vec![Extent::new(80, 10), Extent::new(0, 10), Extent::new(20, 10), Extent::new(120, 80)]
    }

    #[test]
    fn test_free_extents() {
        let extents = free_extents(&obstacles(), Extent::new(0, 200));
        let expected = vec![Extent::new(10, 10), Extent::new(30, 50), Extent::new(90, 30)];
        assert_eq!(extents, expected);
    }

    #[test]
    fn test_overlapping_obstacles() {
        let obstacles = [Extent::new(10, 30), Extent::new(20, 5), Extent::new(35, 10)];
        let extents = free_extents(&obstacles, Extent::new(0, 100));
        assert_eq!(extents, vec![Extent::new(0, 10), Extent::new(45, 55)]);
    }

    #[test]
    fn test_bounded() {
        let obstacles = [Extent::new(0, 150), Extent::new(160, 10), Extent::new(300, 10)];
        let extents = free_extents(&obstacles, Extent::new(100, 100));
        assert_eq!(extents, vec![Extent::new(150, 10), Extent::new(170, 30)]);
        assert_eq!(free_extents(&[], Extent::new(5, 10)), vec![Extent::new(5, 10)]);
    }

    #[test]
    fn test_fit_selection() {
        let bound = Extent::new(0, 200);
        assert_eq!(place(Fit::First, &obstacles(), bound, 10), Ok(10));
        assert_eq!(place(Fit::Best, &obstacles(), bound, 10), Ok(10));
        assert_eq!(place(Fit::Worst, &obstacles(), bound, 10), Ok(30));

        assert_eq!(place(Fit::First, &obstacles(), bound, 20), Ok(30));
        assert_eq!(place(Fit::Best, &obstacles(), bound, 20), Ok(90));
        assert_eq!(place(Fit::Worst, &obstacles(), bound, 20), Ok(30));

        let expected = AllocationError::NoSpace { size: 51, fit: Fit::Worst };
        assert_eq!(place(Fit::Worst, &obstacles(), bound, 51), Err(expected));
    }

    #[test]
    fn test_ties() {
        let extents =
            [Extent::new(0, 30), Extent::new(40, 20), Extent::new(70, 30), Extent::new(110, 20)];
        assert_eq!(select(Fit::Best, &extents, 20), Some(Extent::new(40, 20)));
        assert_eq!(select(Fit::Worst, &extents, 20), Some(Extent::new(0, 30)));
        assert_eq!(select(Fit::First, &extents, 25), Some(Extent::new(0, 30)));
    }

    #[test]
    fn test_placement_never_overlaps() {
        let obstacles = obstacles();
        let bound = Extent::new(0, 200);
        for fit in [Fit::First, Fit::Best, Fit::Worst] {
            for size in 1..=60 {
                let start = match place(fit, &obstacles, bound, size) {
                    Ok(start) => start,
                    Err(_) => continue,
                };
                let placed = Extent::new(start, size);
                assert!(placed.start >= bound.start && placed.end() <= bound.end());
                assert!(obstacles.iter().all(|o| !o.overlaps(&placed)), "{:?} {}", fit, size);
            }
        }
    }

    #[test]
    fn test_whole_disk() {
        let mut header = DiskHeader::new(10000, Fit::First);
        header.partitions[1] = PartitionRecord::new(Kind::Primary, Fit::First, 1000, 1000, "P1");
        header.partitions[3] = PartitionRecord::new(Kind::Primary, Fit::First, 5000, 500, "P2");
        let allocator = Allocator::whole_disk(&header);
        let extents = allocator.free_extents();
        let expected =
            vec![Extent::new(213, 787), Extent::new(2000, 3000), Extent::new(5500, 4500)];
        assert_eq!(extents, expected);
        assert_eq!(allocator.free_space(), 787 + 3000 + 4500);
        assert_eq!(allocator.place(Fit::Best, 700), Ok(213));
        assert_eq!(allocator.place(Fit::Worst, 700), Ok(5500));
    }

    #[test]
    fn test_within_extended() {
        let extended = PartitionRecord::new(Kind::Extended, Fit::First, 1000, 1000, "Ext");
        let node = ChainNode::new(Fit::First, 1242, 100, "L1", -1);
        let chain = [ChainEntry { offset: 1200, node }];
        let allocator = Allocator::within_extended(&extended, &chain);
        let extents = allocator.free_extents();
        assert_eq!(extents, vec![Extent::new(1042, 158), Extent::new(1342, 658)]);
    }
}
