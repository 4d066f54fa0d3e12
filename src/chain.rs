use crate::allocator::Extent;
use crate::error::{Error, IntegrityError};
use crate::io::{self, Wrap};
use crate::region::ebr::ChainNode;
use crate::region::{END, NODE_SIZE};

/// Loop and corruption guard, not a limit on logical partitions
pub const MAX_CHAIN_NODES: usize = 100;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChainEntry {
    /// Byte offset of the node itself, payload starts [`NODE_SIZE`] later
    pub offset: u64,
    pub node: ChainNode,
}

pub fn read_node<IO: io::IO>(io: &mut IO, offset: u64) -> Result<ChainNode, Error<IO::Error>> {
    let bytes = io.wrap().read(offset, NODE_SIZE)?;
    Ok(ChainNode::decode(offset, &bytes)?)
}

pub fn write_node<IO: io::IO>(
    io: &mut IO,
    offset: u64,
    node: &ChainNode,
) -> Result<(), Error<IO::Error>> {
    let mut io = io.wrap();
    io.write(offset, &node.encode())?;
    io.flush()
}

// Node plus payload must be representable, payload size never negative
fn check_node(offset: u64, node: &ChainNode) -> Result<(), IntegrityError> {
    let end = i64::try_from(offset).ok().and_then(|o| o.checked_add(NODE_SIZE as i64));
    match end.and_then(|end| end.checked_add(node.size)) {
        Some(_) if node.size >= 0 => Ok(()),
        _ => Err(IntegrityError::InvalidNode { offset }),
    }
}

// Links only ever point forward, anything else is how a loop starts
fn next_offset(offset: u64, next: i64) -> Result<u64, IntegrityError> {
    match u64::try_from(next) {
        Ok(next_offset) if next_offset > offset => Ok(next_offset),
        _ => Err(IntegrityError::ChainLink { offset: offset as i64, next }),
    }
}

/// Visit nodes from `head`, empty ones included, until `f` returns true.
/// Returns the entry `f` stopped at, or the last node of the chain.
pub fn walk<IO, F>(io: &mut IO, head: u64, mut f: F) -> Result<ChainEntry, Error<IO::Error>>
where
    IO: io::IO,
    F: FnMut(&ChainEntry) -> bool,
{
    let mut entry = ChainEntry { offset: head, node: read_node(io, head)? };
    check_node(head, &entry.node)?;
    let mut visited = 1;
    while !f(&entry) && entry.node.has_next() {
        if visited >= MAX_CHAIN_NODES {
            warn!("Chain from {} exceeds {} nodes", head, MAX_CHAIN_NODES);
            return Err(IntegrityError::ChainBound(MAX_CHAIN_NODES).into());
        }
        let offset = next_offset(entry.offset, entry.node.next)?;
        trace!("Chain node {} -> {}", entry.offset, offset);
        entry = ChainEntry { offset, node: read_node(io, offset)? };
        check_node(offset, &entry.node)?;
        visited += 1;
    }
    Ok(entry)
}

/// Occupied nodes in chain order, which is ascending start order
pub fn read_chain<IO: io::IO>(io: &mut IO, head: u64) -> Result<Vec<ChainEntry>, Error<IO::Error>> {
    let mut entries = Vec::new();
    walk(io, head, |entry| {
        if !entry.node.is_empty() {
            entries.push(*entry);
        }
        false
    })?;
    Ok(entries)
}

/// Same as [`read_chain`], every node must also end within `extended`
pub fn read_extended<IO: io::IO>(
    io: &mut IO,
    extended: Extent,
) -> Result<Vec<ChainEntry>, Error<IO::Error>> {
    let entries = read_chain(io, extended.start as u64)?;
    let end = extended.end();
    let outside = entries.iter().find(|e| e.offset as i64 + NODE_SIZE as i64 + e.node.size > end);
    if let Some(entry) = outside {
        warn!("Chain node at {} exceeds extended partition {:?}", entry.offset, extended);
        return Err(IntegrityError::InvalidNode { offset: entry.offset }.into());
    }
    Ok(entries)
}

pub fn find_node<IO: io::IO>(
    io: &mut IO,
    head: u64,
    name: &str,
) -> Result<Option<ChainEntry>, Error<IO::Error>> {
    let matches = |entry: &ChainEntry| !entry.node.is_empty() && entry.node.name().as_str() == name;
    let entry = walk(io, head, matches)?;
    Ok(Some(entry).filter(matches))
}

/// Link a node written at `offset` after the last node preceding it
pub fn splice<IO: io::IO>(
    io: &mut IO,
    head: u64,
    offset: u64,
    mut node: ChainNode,
) -> Result<ChainEntry, Error<IO::Error>> {
    let follows = |entry: &ChainEntry| !entry.node.has_next() || entry.node.next > offset as i64;
    let mut previous = walk(io, head, follows)?;
    node.next = previous.node.next;
    write_node(io, offset, &node)?;
    previous.node.next = offset as i64;
    write_node(io, previous.offset, &previous.node)?;
    debug!("Spliced node {} after {}, next {}", offset, previous.offset, node.next);
    Ok(ChainEntry { offset, node })
}

/// Detach the node at `offset` and leave an empty node in its place,
/// payload bytes are left as they are
pub fn unlink<IO: io::IO>(io: &mut IO, head: u64, offset: u64) -> Result<bool, Error<IO::Error>> {
    if offset == head {
        return Ok(false);
    }
    let mut previous = walk(io, head, |entry| entry.node.next == offset as i64)?;
    if previous.node.next != offset as i64 {
        return Ok(false);
    }
    let node = read_node(io, offset)?;
    previous.node.next = node.next;
    write_node(io, previous.offset, &previous.node)?;
    write_node(io, offset, &ChainNode { next: END, ..Default::default() })?;
    debug!("Unlinked node {} from {}", offset, previous.offset);
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::{MAX_CHAIN_NODES, find_node, read_chain, read_extended, read_node, splice, unlink};
    use super::write_node;
    use crate::allocator::Extent;
    use crate::error::{Error, IntegrityError};
    use crate::io::memory::MemoryIO;
    use crate::region::NODE_SIZE;
    use crate::region::ebr::ChainNode;
    use crate::region::mbr::Fit;

    const HEAD: u64 = 1000;

    fn logical(offset: u64, size: i64, name: &str) -> ChainNode {
        ChainNode::new(Fit::First, (offset as usize + NODE_SIZE) as i64, size, name, -1)
    }

    fn chain() -> MemoryIO {
        let mut io = MemoryIO::new(8192);
        write_node(&mut io, HEAD, &ChainNode::default()).unwrap();
        io
    }

    #[test]
    fn test_single_head() {
        let mut io = chain();
        assert!(read_chain(&mut io, HEAD).unwrap().is_empty());
        assert_eq!(read_node(&mut io, HEAD).unwrap(), ChainNode::default());
    }

    #[test]
    fn test_splice_in_order() {
        let mut io = chain();
        splice(&mut io, HEAD, 3000, logical(3000, 100, "C")).unwrap();
        splice(&mut io, HEAD, 1100, logical(1100, 100, "A")).unwrap();
        splice(&mut io, HEAD, 2000, logical(2000, 100, "B")).unwrap();

        let entries = read_chain(&mut io, HEAD).unwrap();
        let offsets: Vec<u64> = entries.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![1100, 2000, 3000]);
        let names: Vec<String> = entries.iter().map(|e| e.node.name().as_str().into()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert_eq!(entries[0].node.next, 2000);
        assert_eq!(entries[2].node.next, -1);
        assert_eq!(read_node(&mut io, HEAD).unwrap().next, 1100);
    }

    #[test]
    fn test_find() {
        let mut io = chain();
        splice(&mut io, HEAD, 1100, logical(1100, 100, "A")).unwrap();
        splice(&mut io, HEAD, 2000, logical(2000, 100, "B")).unwrap();
        let entry = find_node(&mut io, HEAD, "B").unwrap().unwrap();
        assert_eq!(entry.offset, 2000);
        assert!(find_node(&mut io, HEAD, "Z").unwrap().is_none());
        assert!(find_node(&mut io, HEAD, "").unwrap().is_none());
    }

    #[test]
    fn test_unlink() {
        let mut io = chain();
        splice(&mut io, HEAD, 1100, logical(1100, 100, "A")).unwrap();
        splice(&mut io, HEAD, 2000, logical(2000, 100, "B")).unwrap();
        splice(&mut io, HEAD, 3000, logical(3000, 100, "C")).unwrap();

        assert!(unlink(&mut io, HEAD, 2000).unwrap());
        let entries = read_chain(&mut io, HEAD).unwrap();
        assert_eq!(entries.iter().map(|e| e.offset).collect::<Vec<_>>(), vec![1100, 3000]);
        assert_eq!(entries[0].node.next, 3000);
        assert!(read_node(&mut io, 2000).unwrap().is_empty());

        assert!(!unlink(&mut io, HEAD, 2000).unwrap());
        assert!(!unlink(&mut io, HEAD, HEAD).unwrap());
    }

    #[test]
    fn test_skip_empty() {
        let mut io = chain();
        splice(&mut io, HEAD, 1100, logical(1100, 0, "Gone")).unwrap();
        splice(&mut io, HEAD, 2000, logical(2000, 100, "B")).unwrap();
        let entries = read_chain(&mut io, HEAD).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].offset, 2000);
    }

    #[test]
    fn test_backward_link() {
        let mut io = chain();
        let mut node = logical(2000, 100, "A");
        node.next = HEAD as i64;
        write_node(&mut io, 2000, &node).unwrap();
        write_node(&mut io, HEAD, &ChainNode { next: 2000, ..Default::default() }).unwrap();
        match read_chain(&mut io, HEAD) {
            Err(Error::Integrity(IntegrityError::ChainLink { offset: 2000, next: 1000 })) => (),
            result => panic!("Unexpected {:?}", result),
        }
    }

    #[test]
    fn test_bound() {
        let mut io = MemoryIO::new(HEAD as usize + (MAX_CHAIN_NODES + 2) * NODE_SIZE);
        for i in 0..=MAX_CHAIN_NODES as u64 {
            let offset = HEAD + i * NODE_SIZE as u64;
            let node = ChainNode { next: (offset + NODE_SIZE as u64) as i64, ..Default::default() };
            write_node(&mut io, offset, &node).unwrap();
        }
        match read_chain(&mut io, HEAD) {
            Err(Error::Integrity(IntegrityError::ChainBound(MAX_CHAIN_NODES))) => (),
            result => panic!("Unexpected {:?}", result),
        }
    }

    #[test]
    fn test_invalid_node_size() {
        for size in [i64::MAX, i64::MAX - NODE_SIZE as i64, -1] {
            let mut io = chain();
            write_node(&mut io, HEAD, &ChainNode { next: 2000, ..Default::default() }).unwrap();
            write_node(&mut io, 2000, &logical(2000, size, "A")).unwrap();
            match read_chain(&mut io, HEAD) {
                Err(Error::Integrity(IntegrityError::InvalidNode { offset: 2000 })) => (),
                result => panic!("Unexpected {:?} for size {}", result, size),
            }
            assert!(find_node(&mut io, HEAD, "A").is_err());
        }
    }

    #[test]
    fn test_node_outside_extended() {
        let mut io = chain();
        splice(&mut io, HEAD, 1100, logical(1100, 100, "A")).unwrap();
        splice(&mut io, HEAD, 2000, logical(2000, 100, "B")).unwrap();
        let entries = read_extended(&mut io, Extent::new(HEAD as i64, 1142)).unwrap();
        assert_eq!(entries.len(), 2);
        match read_extended(&mut io, Extent::new(HEAD as i64, 1141)) {
            Err(Error::Integrity(IntegrityError::InvalidNode { offset: 2000 })) => (),
            result => panic!("Unexpected {:?}", result),
        }
    }
}
