/// Disk header at offset 0, holding 4 partition records
/// 25 bytes of disk fields followed by 4 * [`RECORD_SIZE`] bytes
pub mod mbr;

/// Extended chain node, one per logical partition, linked by byte offset
/// ([`NODE_SIZE`] bytes of node followed by the payload)
pub mod ebr;

pub const NAME_SIZE: usize = 16;
pub const ID_SIZE: usize = 4;
pub const NUM_PARTITIONS: usize = 4;

pub const RECORD_SIZE: usize = 3 + 8 + 8 + NAME_SIZE + 8 + ID_SIZE;
pub const HEADER_SIZE: usize = 8 + 8 + 8 + 1 + NUM_PARTITIONS * RECORD_SIZE;
pub const NODE_SIZE: usize = 2 + 8 + 8 + 8 + NAME_SIZE;

/// Chain end sentinel
pub const END: i64 = -1;
