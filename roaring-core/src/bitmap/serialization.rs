use std::io::{Cursor, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use super::Bitmap;
use crate::container::{
    ArrayContainer, BitmapContainer, Container, ContainerKind, ContainerOps, Interval,
    RunContainer, ARRAY_MAX_SIZE, BITMAP_WORDS,
};
use crate::error::{Error, Result};

const SERIAL_COOKIE_NO_RUNCONTAINER: u32 = 12346;
const SERIAL_COOKIE: u32 = 12347;
// Bitmaps with runs and fewer containers than this carry no offset table
const NO_OFFSET_THRESHOLD: usize = 4;
const MAX_CONTAINERS: usize = 1 << 16;

pub trait Serializer {
    /// Writes `bitmap` to `dst`
    fn serialize_into<W: Write>(bitmap: &Bitmap, dst: &mut W) -> Result<()>;
    /// Number of bytes [`Serializer::serialize_into`] writes for `bitmap`
    fn get_serialized_size_in_bytes(bitmap: &Bitmap) -> usize;
}

pub trait Deserializer {
    /// Reads a bitmap from the start of `buffer`, ignoring trailing bytes
    fn try_deserialize(buffer: &[u8]) -> Result<Bitmap>;
}

/// The `Portable` format is meant to be compatible with other roaring bitmap libraries, such as Go or Java.
///
/// It's defined here: <https://github.com/RoaringBitmap/RoaringFormatSpec>
pub enum Portable {}

/// Whether a non-run container is written as sorted values rather than raw words
#[inline]
fn is_sparse(container: &Container) -> bool {
    container.cardinality() as usize <= ARRAY_MAX_SIZE
}

fn payload_size(container: &Container) -> usize {
    match container {
        Container::Run(run) => 2 + 4 * run.runs().len(),
        other if is_sparse(other) => 2 * other.cardinality() as usize,
        _ => 8 * BITMAP_WORDS,
    }
}

fn header_size(count: usize, has_runs: bool) -> usize {
    if has_runs {
        let offsets = if count >= NO_OFFSET_THRESHOLD { 4 * count } else { 0 };
        4 + (count + 7) / 8 + 4 * count + offsets
    } else {
        8 + 8 * count
    }
}

fn write_payload<W: Write>(dst: &mut W, container: &Container) -> Result<()> {
    match container {
        Container::Run(run) => {
            dst.write_u16::<LittleEndian>(run.runs().len() as u16)?;
            for interval in run.runs() {
                dst.write_u16::<LittleEndian>(interval.start())?;
                dst.write_u16::<LittleEndian>(interval.last() - interval.start())?;
            }
        }
        sparse if is_sparse(sparse) => {
            for value in sparse.iter() {
                dst.write_u16::<LittleEndian>(value)?;
            }
        }
        Container::Bitmap(bitmap) => write_words(dst, bitmap.words())?,
        Container::Array(array) => write_words(dst, BitmapContainer::from(array).words())?,
    }
    Ok(())
}

fn write_words<W: Write>(dst: &mut W, words: &[u64; BITMAP_WORDS]) -> Result<()> {
    for &word in words.iter() {
        dst.write_u64::<LittleEndian>(word)?;
    }
    Ok(())
}

impl Serializer for Portable {
    fn serialize_into<W: Write>(bitmap: &Bitmap, dst: &mut W) -> Result<()> {
        let count = bitmap.containers.len();
        let has_runs = bitmap
            .containers
            .iter()
            .any(|container| container.kind() == ContainerKind::Run);

        if has_runs {
            dst.write_u32::<LittleEndian>(SERIAL_COOKIE | ((count as u32 - 1) << 16))?;
            let mut run_flags = vec![0u8; (count + 7) / 8];
            for (i, container) in bitmap.containers.iter().enumerate() {
                if container.kind() == ContainerKind::Run {
                    run_flags[i / 8] |= 1 << (i % 8);
                }
            }
            dst.write_all(&run_flags)?;
        } else {
            dst.write_u32::<LittleEndian>(SERIAL_COOKIE_NO_RUNCONTAINER)?;
            dst.write_u32::<LittleEndian>(count as u32)?;
        }

        for (key, container) in bitmap.containers() {
            dst.write_u16::<LittleEndian>(key)?;
            dst.write_u16::<LittleEndian>((container.cardinality() - 1) as u16)?;
        }

        if !has_runs || count >= NO_OFFSET_THRESHOLD {
            let mut offset = header_size(count, has_runs);
            for container in &bitmap.containers {
                dst.write_u32::<LittleEndian>(offset as u32)?;
                offset += payload_size(container);
            }
        }

        for container in &bitmap.containers {
            write_payload(dst, container)?;
        }
        Ok(())
    }

    fn get_serialized_size_in_bytes(bitmap: &Bitmap) -> usize {
        let has_runs = bitmap
            .containers
            .iter()
            .any(|container| container.kind() == ContainerKind::Run);
        bitmap
            .containers
            .iter()
            .fold(header_size(bitmap.containers.len(), has_runs), |sum, container| {
                sum + payload_size(container)
            })
    }
}

fn invalid(reason: String) -> Error {
    debug!(%reason, "rejecting serialized bitmap");
    Error::InvalidFormat(reason)
}

fn read_array(cursor: &mut Cursor<&[u8]>, key: u16, cardinality: u32) -> Result<Container> {
    let mut values = vec![0u16; cardinality as usize];
    cursor.read_u16_into::<LittleEndian>(&mut values)?;
    if values.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(invalid(format!("array container {key} is not strictly increasing")));
    }
    Ok(Container::Array(ArrayContainer::from_sorted_unchecked(values)))
}

fn read_bitmap(cursor: &mut Cursor<&[u8]>, key: u16, cardinality: u32) -> Result<Container> {
    let mut words = Box::new([0u64; BITMAP_WORDS]);
    cursor.read_u64_into::<LittleEndian>(&mut words[..])?;
    let bitmap = BitmapContainer::from_words(words);
    if bitmap.cardinality() != cardinality {
        return Err(invalid(format!(
            "bitmap container {key} holds {} values, header says {cardinality}",
            bitmap.cardinality()
        )));
    }
    Ok(Container::Bitmap(bitmap))
}

fn read_run(cursor: &mut Cursor<&[u8]>, key: u16, cardinality: u32) -> Result<Container> {
    let run_count = cursor.read_u16::<LittleEndian>()?;
    let mut runs = Vec::with_capacity(usize::from(run_count));
    let mut total = 0u32;
    let mut previous_end = None;
    for _ in 0..run_count {
        let start = cursor.read_u16::<LittleEndian>()?;
        let length = cursor.read_u16::<LittleEndian>()?;
        let Some(last) = start.checked_add(length) else {
            return Err(invalid(format!("run container {key} overflows its chunk")));
        };
        if previous_end.map_or(false, |end| u32::from(start) <= end) {
            return Err(invalid(format!(
                "run container {key} has unsorted or touching runs"
            )));
        }
        let interval = Interval::new(start, last);
        previous_end = Some(interval.end());
        total += interval.len();
        runs.push(interval);
    }
    if total != cardinality {
        return Err(invalid(format!(
            "run container {key} holds {total} values, header says {cardinality}"
        )));
    }
    Ok(Container::Run(RunContainer::from_runs_unchecked(runs)))
}

impl Deserializer for Portable {
    fn try_deserialize(buffer: &[u8]) -> Result<Bitmap> {
        let mut cursor = Cursor::new(buffer);
        let cookie = cursor.read_u32::<LittleEndian>()?;

        let (count, run_flags) = if cookie & 0xFFFF == SERIAL_COOKIE {
            let count = (cookie >> 16) as usize + 1;
            let mut run_flags = vec![0u8; (count + 7) / 8];
            cursor.read_exact(&mut run_flags)?;
            (count, Some(run_flags))
        } else if cookie == SERIAL_COOKIE_NO_RUNCONTAINER {
            let count = cursor.read_u32::<LittleEndian>()? as usize;
            if count > MAX_CONTAINERS {
                return Err(invalid(format!("{count} containers exceed the key space")));
            }
            (count, None)
        } else {
            return Err(invalid(format!("unknown cookie {cookie:#x}")));
        };

        let mut descriptors: Vec<(u16, u32)> = Vec::with_capacity(count);
        for _ in 0..count {
            let key = cursor.read_u16::<LittleEndian>()?;
            let cardinality = u32::from(cursor.read_u16::<LittleEndian>()?) + 1;
            if let Some(&(previous, _)) = descriptors.last() {
                if key <= previous {
                    return Err(invalid(format!(
                        "key {key} does not follow key {previous}"
                    )));
                }
            }
            descriptors.push((key, cardinality));
        }

        if run_flags.is_none() || count >= NO_OFFSET_THRESHOLD {
            // Containers are read in order, the offsets are not needed
            for _ in 0..count {
                cursor.read_u32::<LittleEndian>()?;
            }
        }

        let mut bitmap = Bitmap::with_capacity(count);
        for (i, (key, cardinality)) in descriptors.into_iter().enumerate() {
            let is_run = run_flags
                .as_ref()
                .map_or(false, |flags| flags[i / 8] & (1 << (i % 8)) != 0);
            let container = if is_run {
                read_run(&mut cursor, key, cardinality)?
            } else if cardinality as usize <= ARRAY_MAX_SIZE {
                read_array(&mut cursor, key, cardinality)?
            } else {
                read_bitmap(&mut cursor, key, cardinality)?
            };
            bitmap.push_container(key, container);
        }
        Ok(bitmap)
    }
}

impl Bitmap {
    /// Serializes a bitmap to a new vector of bytes in the format `S`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::{Bitmap, Portable};
    ///
    /// let original_bitmap: Bitmap = (1..5).collect();
    ///
    /// let serialized_buffer = original_bitmap.serialize::<Portable>().unwrap();
    ///
    /// let deserialized_bitmap = Bitmap::try_deserialize::<Portable>(&serialized_buffer).unwrap();
    ///
    /// assert_eq!(original_bitmap, deserialized_bitmap);
    /// ```
    pub fn serialize<S: Serializer>(&self) -> Result<Vec<u8>> {
        let mut dst = Vec::with_capacity(S::get_serialized_size_in_bytes(self));
        S::serialize_into(self, &mut dst)?;
        Ok(dst)
    }

    /// Serializes a bitmap into `dst` in the format `S`
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::{Bitmap, Portable};
    ///
    /// let mut buf = b"header".to_vec();
    /// Bitmap::of(&[7]).serialize_into::<Portable, _>(&mut buf).unwrap();
    ///
    /// let bitmap = Bitmap::try_deserialize::<Portable>(&buf[6..]).unwrap();
    /// assert_eq!(bitmap.to_vec(), [7]);
    /// ```
    pub fn serialize_into<S: Serializer, W: Write>(&self, dst: &mut W) -> Result<()> {
        S::serialize_into(self, dst)
    }

    /// Computes the serialized size in bytes of the Bitmap in format `S`.
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::{Bitmap, Portable};
    ///
    /// let sparse = Bitmap::of(&[1, 2, 3]);
    /// assert_eq!(sparse.get_serialized_size_in_bytes::<Portable>(), 22);
    ///
    /// let mut dense = Bitmap::new();
    /// dense.add_range(0..1000);
    /// dense.run_optimize();
    /// assert_eq!(dense.get_serialized_size_in_bytes::<Portable>(), 15);
    /// assert_eq!(dense.serialize::<Portable>().unwrap().len(), 15);
    /// ```
    pub fn get_serialized_size_in_bytes<S: Serializer>(&self) -> usize {
        S::get_serialized_size_in_bytes(self)
    }

    /// Given a serialized bitmap as slice of bytes in format `D`, returns a `Bitmap` instance.
    ///
    /// Malformed input is an [`Error::InvalidFormat`](crate::Error::InvalidFormat), input cut
    /// short is an [`Error::Io`](crate::Error::Io).
    ///
    /// # Examples
    ///
    /// ```
    /// use roaring_core::{Bitmap, Error, Portable};
    ///
    /// assert!(matches!(
    ///     Bitmap::try_deserialize::<Portable>(&[1, 2, 3, 4]),
    ///     Err(Error::InvalidFormat(_))
    /// ));
    ///
    /// let serialized = Bitmap::of(&[1, 2, 3]).serialize::<Portable>().unwrap();
    /// assert!(matches!(
    ///     Bitmap::try_deserialize::<Portable>(&serialized[..serialized.len() - 1]),
    ///     Err(Error::Io(_))
    /// ));
    /// ```
    pub fn try_deserialize<D: Deserializer>(buffer: &[u8]) -> Result<Self> {
        D::try_deserialize(buffer)
    }
}
