//! Binary memory-image snapshots: save and restore a caller-declared set
//! of memory regions to a self-describing file.
//!
//! Ported from `snapshot.c`'s `sfpm_snapshot_*` functions. The C original
//! stores each region as `{void *base_address, size_t size, const char
//! *name, bool is_dynamic}` inside a fixed `MAX_REGIONS`-element array and
//! writes the file with raw `fwrite` calls. This redesigns the raw
//! pointer as a borrowed `&mut [u8]` — the descriptor borrows the
//! caller's live memory for the descriptor's lifetime, so `save` (a
//! shared read) and `restore` (an exclusive write) are both expressible
//! without `unsafe`. The on-disk layout is unchanged: it is still
//! hand-written length-prefixed byte pushing/reading, the same style
//! `fsqlite-wal`'s frame/record (de)serialization uses, because (per
//! `spec.md` §6) the format has no type-directed structure a derive macro
//! would help with.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use sfpm_error::{Result, SfpmError};

/// File magic, `"SFPM"` read as a little-endian `u32`.
pub const MAGIC: u32 = 0x5346_504D;
/// The only snapshot format version this build understands.
pub const VERSION: u32 = 1;
/// Default region-count cap, matching the C `MAX_REGIONS`.
pub const DEFAULT_MAX_REGIONS: usize = 64;
/// Fixed on-disk width of the description field, NUL-padded.
pub const DESCRIPTION_BYTES: usize = 256;

/// Metadata read from a snapshot file's header, independent of any live
/// descriptor — what [`read_metadata`] returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotMetadata {
    pub version: u32,
    pub timestamp: u64,
    pub total_size: u64,
    pub num_regions: u32,
    pub description: String,
}

/// One memory region borrowed into the descriptor for the descriptor's
/// lifetime. `save` reads it; `restore` overwrites it in place.
struct Region<'a> {
    name: String,
    is_dynamic: bool,
    base: &'a mut [u8],
}

/// A builder over a set of memory regions to save or restore as one
/// binary image.
pub struct SnapshotDescriptor<'a> {
    regions: Vec<Region<'a>>,
    description: String,
    max_regions: usize,
}

impl<'a> SnapshotDescriptor<'a> {
    /// An empty descriptor with the default region cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_regions(DEFAULT_MAX_REGIONS)
    }

    #[must_use]
    pub fn with_max_regions(max_regions: usize) -> Self {
        Self {
            regions: Vec::new(),
            description: String::from("SFPM Snapshot"),
            max_regions,
        }
    }

    /// Convenience constructor pre-registering a `"stack"` and a `"heap"`
    /// region, mirroring `sfpm_snapshot_create_for_interpreter`.
    #[must_use]
    pub fn for_interpreter(stack: &'a mut [u8], heap: &'a mut [u8]) -> Self {
        let mut snapshot = Self::new();
        if !stack.is_empty() {
            snapshot.add_region("stack", stack, false);
        }
        if !heap.is_empty() {
            snapshot.add_region("heap", heap, true);
        }
        snapshot
    }

    /// Number of regions currently registered.
    #[must_use]
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Append a region. Rejects a zero-size region or exceeding the
    /// region cap; on rejection, no partial state is mutated.
    pub fn add_region(&mut self, name: impl Into<String>, base: &'a mut [u8], is_dynamic: bool) -> bool {
        if base.is_empty() || self.regions.len() >= self.max_regions {
            return false;
        }
        self.regions.push(Region {
            name: name.into(),
            is_dynamic,
            base,
        });
        true
    }

    /// Set the snapshot's human-readable description, truncated to fit
    /// the on-disk 256-byte (255 chars + NUL) field.
    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        let truncated: String = description.chars().take(DESCRIPTION_BYTES - 1).collect();
        self.description = truncated;
    }

    /// Write every region to `path` in insertion order.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path).map_err(|source| SfpmError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        })?;

        let total_size: u64 = self.regions.iter().map(|r| r.base.len() as u64).sum();
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());

        let write_io = |result: std::io::Result<()>| -> Result<()> {
            result.map_err(|source| SfpmError::SnapshotIo {
                path: path.to_path_buf(),
                source,
            })
        };

        write_io(file.write_all(&MAGIC.to_le_bytes()))?;
        write_io(file.write_all(&VERSION.to_le_bytes()))?;
        write_io(file.write_all(&timestamp.to_le_bytes()))?;
        write_io(file.write_all(&total_size.to_le_bytes()))?;
        write_io(file.write_all(&(self.regions.len() as u32).to_le_bytes()))?;
        write_io(file.write_all(&description_field(&self.description)))?;

        for region in &self.regions {
            let size = region.base.len() as u64;
            let is_dynamic: u8 = u8::from(region.is_dynamic);
            let name_len = region.name.len() as u32;

            write_io(file.write_all(&size.to_le_bytes()))?;
            write_io(file.write_all(&[is_dynamic]))?;
            write_io(file.write_all(&name_len.to_le_bytes()))?;
            write_io(file.write_all(region.name.as_bytes()))?;
            write_io(file.write_all(region.base))?;

            tracing::debug!(region = %region.name, bytes = size, "snapshot: wrote region");
        }

        tracing::info!(path = %path.display(), total_size, regions = self.regions.len(), "snapshot saved");
        Ok(())
    }

    /// Restore every region from `path` into this descriptor's live
    /// memory, in order. Fails without touching any later region if an
    /// earlier one's size does not match the file.
    pub fn restore(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::open(path).map_err(|source| SfpmError::SnapshotIo {
            path: path.to_path_buf(),
            source,
        })?;

        let metadata = read_header(&mut file, path)?;
        if metadata.version != VERSION {
            return Err(SfpmError::VersionMismatch {
                expected: VERSION,
                found: metadata.version,
            });
        }
        if metadata.num_regions as usize != self.regions.len() {
            return Err(SfpmError::RegionCountMismatch {
                expected: self.regions.len() as u32,
                found: metadata.num_regions,
            });
        }

        for (index, region) in self.regions.iter_mut().enumerate() {
            let mut header = [0u8; 13]; // size(8) + is_dynamic(1) + name_len(4)
            read_exact(&mut file, &mut header, "region header", path)?;

            let size = u64::from_le_bytes(header[0..8].try_into().expect("8 bytes"));
            let _is_dynamic = header[8];
            let name_len = u32::from_le_bytes(header[9..13].try_into().expect("4 bytes"));

            let mut name_buf = vec![0u8; name_len as usize];
            read_exact(&mut file, &mut name_buf, "region name", path)?;

            let expected = region.base.len() as u64;
            if size != expected {
                return Err(SfpmError::RegionSizeMismatch {
                    index,
                    expected,
                    found: size,
                });
            }

            read_exact(&mut file, region.base, "region payload", path)?;
            tracing::debug!(region = %region.name, bytes = size, "snapshot: restored region");
        }

        tracing::info!(path = %path.display(), regions = self.regions.len(), "snapshot restored");
        Ok(())
    }

    /// Delta snapshots are declared in the interface but never
    /// implemented, per `spec.md` §4.6 and §9's Open Questions. This
    /// returns an error and creates no output file.
    pub fn save_delta(&self, _previous: impl AsRef<Path>, _output: impl AsRef<Path>) -> Result<()> {
        Err(SfpmError::Unimplemented {
            feature: "delta snapshots",
        })
    }
}

impl Default for SnapshotDescriptor<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn description_field(description: &str) -> [u8; DESCRIPTION_BYTES] {
    let mut field = [0u8; DESCRIPTION_BYTES];
    let bytes = description.as_bytes();
    let copy_len = bytes.len().min(DESCRIPTION_BYTES - 1);
    field[..copy_len].copy_from_slice(&bytes[..copy_len]);
    field
}

/// Read and validate the magic + fixed-width metadata header, without
/// touching region records. Shared by [`read_metadata`] and
/// [`SnapshotDescriptor::restore`].
fn read_header(file: &mut File, path: &Path) -> Result<SnapshotMetadata> {
    let mut magic_buf = [0u8; 4];
    read_exact(file, &mut magic_buf, "magic", path)?;
    if u32::from_le_bytes(magic_buf) != MAGIC {
        return Err(SfpmError::BadMagic);
    }

    let mut version_buf = [0u8; 4];
    read_exact(file, &mut version_buf, "version", path)?;
    let mut timestamp_buf = [0u8; 8];
    read_exact(file, &mut timestamp_buf, "timestamp", path)?;
    let mut total_size_buf = [0u8; 8];
    read_exact(file, &mut total_size_buf, "total_size", path)?;
    let mut num_regions_buf = [0u8; 4];
    read_exact(file, &mut num_regions_buf, "num_regions", path)?;
    let mut description_buf = [0u8; DESCRIPTION_BYTES];
    read_exact(file, &mut description_buf, "description", path)?;

    let nul = description_buf.iter().position(|&b| b == 0).unwrap_or(DESCRIPTION_BYTES);
    let description = String::from_utf8_lossy(&description_buf[..nul]).into_owned();

    Ok(SnapshotMetadata {
        version: u32::from_le_bytes(version_buf),
        timestamp: u64::from_le_bytes(timestamp_buf),
        total_size: u64::from_le_bytes(total_size_buf),
        num_regions: u32::from_le_bytes(num_regions_buf),
        description,
    })
}

fn read_exact(file: &mut File, buf: &mut [u8], what: &'static str, path: &Path) -> Result<()> {
    file.read_exact(buf).map_err(|source| {
        if source.kind() == std::io::ErrorKind::UnexpectedEof {
            SfpmError::Truncated { what }
        } else {
            SfpmError::SnapshotIo {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// Read only the magic and fixed-width metadata of a snapshot file,
/// without requiring a live descriptor to restore into. Returns an error
/// if the file does not open, lacks the magic, or is truncated.
pub fn read_metadata(path: impl AsRef<Path>) -> Result<SnapshotMetadata> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|source| SfpmError::SnapshotIo {
        path: path.to_path_buf(),
        source,
    })?;
    read_header(&mut file, path)
}
