//! Reads and validates the header block of a binary map file.

use std::sync::Arc;

use crate::geometry::{lat_lon, microdegrees_to_degrees, BoundingBox, LatLong, Tag};
use crate::mapfile::read_buffer::ReadBuffer;
use crate::mapfile::MapFileError;
use crate::mercator::{latitude_to_tile_y, longitude_to_tile_x};

/// The ASCII signature every map file starts with.
pub const MAGIC_BYTES: &[u8; 20] = b"mapsforge binary OSM";

/// File format versions this reader understands.
pub const SUPPORTED_FILE_VERSIONS: std::ops::RangeInclusive<u32> = 3..=5;

/// Minimum size of the file header in bytes.
pub const HEADER_SIZE_MIN: u64 = 70;

/// Maximum size of the file header in bytes.
const HEADER_SIZE_MAX: i32 = 1_000_000;

/// Maximum valid base zoom level of a sub-file.
const BASE_ZOOM_LEVEL_MAX: u8 = 20;

/// Maximum valid zoom level of a sub-file band and of the start zoom.
const ZOOM_LEVEL_MAX: u8 = 22;

/// Length of the debug signature at the beginning of a sub-file index.
const SIGNATURE_LENGTH_INDEX: u64 = 16;

/// Size of one entry in a sub-file block index.
const BYTES_PER_INDEX_ENTRY: u64 = 5;

/// The language preference is an ISO 639-1 code of exactly this length.
const LANGUAGE_PREFERENCE_LENGTH: usize = 2;

const FLAG_DEBUG: u8 = 0x80;
const FLAG_START_POSITION: u8 = 0x40;
const FLAG_START_ZOOM_LEVEL: u8 = 0x20;
const FLAG_LANGUAGE_PREFERENCE: u8 = 0x10;
const FLAG_COMMENT: u8 = 0x08;
const FLAG_CREATED_BY: u8 = 0x04;

/// Everything the file prelude declares about the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapFileInfo {
    pub bounding_box: BoundingBox,
    pub comment: Option<String>,
    pub created_by: Option<String>,
    pub debug_file: bool,
    pub file_size: u64,
    pub file_version: u32,
    /// The raw optional-fields bitmask.
    pub flags: u8,
    pub language_preference: Option<String>,
    /// Map creation date in milliseconds since the Unix epoch.
    pub map_date: i64,
    pub number_of_sub_files: u8,
    pub poi_tags: Vec<Tag>,
    pub projection_name: String,
    pub start_position: Option<LatLong>,
    pub start_zoom_level: Option<u8>,
    pub tile_pixel_size: u16,
    pub way_tags: Vec<Tag>,
}

/// One zoom band of the map file, together with the geometry of its
/// on-disk block index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubFileParameter {
    pub base_zoom_level: u8,
    pub zoom_level_min: u8,
    pub zoom_level_max: u8,
    pub start_address: u64,
    pub index_start_address: u64,
    pub index_end_address: u64,
    pub sub_file_size: u64,
    pub boundary_tile_left: u32,
    pub boundary_tile_top: u32,
    pub boundary_tile_right: u32,
    pub boundary_tile_bottom: u32,
    pub blocks_width: u64,
    pub blocks_height: u64,
    pub number_of_blocks: u64,
}

impl SubFileParameter {
    fn new(
        base_zoom_level: u8,
        zoom_level_min: u8,
        zoom_level_max: u8,
        start_address: u64,
        sub_file_size: u64,
        bounding_box: &BoundingBox,
        debug_file: bool,
    ) -> Self {
        let index_start_address = if debug_file {
            // The block index is preceded by a debug signature.
            start_address + SIGNATURE_LENGTH_INDEX
        } else {
            start_address
        };

        let boundary_tile_left = longitude_to_tile_x(bounding_box.min_longitude, base_zoom_level);
        let boundary_tile_right = longitude_to_tile_x(bounding_box.max_longitude, base_zoom_level);
        let boundary_tile_top = latitude_to_tile_y(bounding_box.max_latitude, base_zoom_level);
        let boundary_tile_bottom = latitude_to_tile_y(bounding_box.min_latitude, base_zoom_level);

        let blocks_width = (boundary_tile_right - boundary_tile_left + 1) as u64;
        let blocks_height = (boundary_tile_bottom - boundary_tile_top + 1) as u64;
        let number_of_blocks = blocks_width * blocks_height;

        Self {
            base_zoom_level,
            zoom_level_min,
            zoom_level_max,
            start_address,
            index_start_address,
            index_end_address: index_start_address + number_of_blocks * BYTES_PER_INDEX_ENTRY,
            sub_file_size,
            boundary_tile_left,
            boundary_tile_top,
            boundary_tile_right,
            boundary_tile_bottom,
            blocks_width,
            blocks_height,
            number_of_blocks,
        }
    }
}

/// The parsed and validated header, with a per-zoom-level lookup into the
/// sub-files. Built once when the file is opened, never mutated.
#[derive(Debug)]
pub struct MapFileHeader {
    info: MapFileInfo,
    sub_file_parameters: Vec<Option<Arc<SubFileParameter>>>,
    zoom_level_minimum: u8,
    zoom_level_maximum: u8,
}

impl MapFileHeader {
    /// Parse the header from a buffer that starts at the magic bytes.
    /// `file_size` is the actual size of the file on disk.
    pub fn read(buffer: &mut ReadBuffer, file_size: u64) -> Result<Self, MapFileError> {
        read_magic_bytes(buffer)?;
        read_remaining_header_size(buffer, file_size)?;

        let file_version = buffer.read_int()? as u32;
        if !SUPPORTED_FILE_VERSIONS.contains(&file_version) {
            return Err(MapFileError::UnsupportedVersion(file_version));
        }

        let declared_file_size = buffer.read_long()?;
        if declared_file_size as u64 != file_size {
            return Err(MapFileError::MalformedInput(format!(
                "invalid file size: {declared_file_size}, actual size is {file_size}"
            )));
        }

        let map_date = buffer.read_long()?;
        let bounding_box = read_bounding_box(buffer)?;

        let tile_pixel_size = buffer.read_short()?;
        if tile_pixel_size <= 0 {
            return Err(MapFileError::MalformedInput(format!(
                "invalid tile pixel size: {tile_pixel_size}"
            )));
        }

        let projection_name = buffer.read_utf8_encoded_string()?;

        let flags = buffer.read_byte()?;
        let debug_file = flags & FLAG_DEBUG != 0;
        let start_position = (flags & FLAG_START_POSITION != 0)
            .then(|| read_start_position(buffer))
            .transpose()?;
        let start_zoom_level = (flags & FLAG_START_ZOOM_LEVEL != 0)
            .then(|| read_start_zoom_level(buffer))
            .transpose()?;
        let language_preference = (flags & FLAG_LANGUAGE_PREFERENCE != 0)
            .then(|| read_language_preference(buffer))
            .transpose()?;
        let comment = (flags & FLAG_COMMENT != 0)
            .then(|| buffer.read_utf8_encoded_string())
            .transpose()?;
        let created_by = (flags & FLAG_CREATED_BY != 0)
            .then(|| buffer.read_utf8_encoded_string())
            .transpose()?;

        let poi_tags = read_tag_table(buffer)?;
        let way_tags = read_tag_table(buffer)?;

        let number_of_sub_files = buffer.read_byte()?;
        if number_of_sub_files < 1 {
            return Err(MapFileError::MalformedInput(format!(
                "invalid number of sub-files: {number_of_sub_files}"
            )));
        }

        let info = MapFileInfo {
            bounding_box,
            comment,
            created_by,
            debug_file,
            file_size,
            file_version,
            flags,
            language_preference,
            map_date,
            number_of_sub_files,
            poi_tags,
            projection_name,
            start_position,
            start_zoom_level,
            tile_pixel_size: tile_pixel_size as u16,
            way_tags,
        };

        let sub_files = read_sub_file_parameters(
            buffer,
            file_size,
            number_of_sub_files,
            &bounding_box,
            debug_file,
        )?;

        let zoom_level_minimum = sub_files
            .iter()
            .map(|parameter| parameter.zoom_level_min)
            .min()
            .unwrap_or_default();
        let zoom_level_maximum = sub_files
            .iter()
            .map(|parameter| parameter.zoom_level_max)
            .max()
            .unwrap_or_default();

        // Fill the lookup table covering [0, zoom_level_maximum].
        let mut sub_file_parameters = vec![None; zoom_level_maximum as usize + 1];
        for parameter in sub_files {
            for zoom_level in parameter.zoom_level_min..=parameter.zoom_level_max {
                sub_file_parameters[zoom_level as usize] = Some(Arc::clone(&parameter));
            }
        }

        Ok(Self {
            info,
            sub_file_parameters,
            zoom_level_minimum,
            zoom_level_maximum,
        })
    }

    pub fn map_file_info(&self) -> &MapFileInfo {
        &self.info
    }

    /// The closest zoom level to the requested one that is covered by a
    /// sub-file.
    pub fn query_zoom_level(&self, zoom_level: u8) -> u8 {
        zoom_level.clamp(self.zoom_level_minimum, self.zoom_level_maximum)
    }

    /// The sub-file covering the given query zoom level.
    pub fn sub_file_parameter(&self, query_zoom_level: u8) -> Option<&Arc<SubFileParameter>> {
        self.sub_file_parameters
            .get(query_zoom_level as usize)?
            .as_ref()
    }
}

fn read_magic_bytes(buffer: &mut ReadBuffer) -> Result<(), MapFileError> {
    let magic = buffer.read_bytes(MAGIC_BYTES.len())?;
    if magic != MAGIC_BYTES {
        return Err(MapFileError::NotAMapFile(format!(
            "invalid magic bytes: {}",
            String::from_utf8_lossy(magic)
        )));
    }
    Ok(())
}

fn read_remaining_header_size(buffer: &mut ReadBuffer, file_size: u64) -> Result<(), MapFileError> {
    let remaining_header_size = buffer.read_int()?;
    let header_end = MAGIC_BYTES.len() as u64 + 4 + remaining_header_size.max(0) as u64;
    if remaining_header_size <= 0
        || remaining_header_size > HEADER_SIZE_MAX
        || header_end > file_size
    {
        return Err(MapFileError::MalformedInput(format!(
            "invalid remaining header size: {remaining_header_size}"
        )));
    }
    Ok(())
}

fn read_bounding_box(buffer: &mut ReadBuffer) -> Result<BoundingBox, MapFileError> {
    let min_latitude = microdegrees_to_degrees(buffer.read_int()?);
    let min_longitude = microdegrees_to_degrees(buffer.read_int()?);
    let max_latitude = microdegrees_to_degrees(buffer.read_int()?);
    let max_longitude = microdegrees_to_degrees(buffer.read_int()?);

    BoundingBox::new(min_latitude, min_longitude, max_latitude, max_longitude).ok_or_else(|| {
        MapFileError::MalformedInput(format!(
            "invalid bounding box: {min_latitude} {min_longitude} {max_latitude} {max_longitude}"
        ))
    })
}

fn read_start_position(buffer: &mut ReadBuffer) -> Result<LatLong, MapFileError> {
    let latitude = microdegrees_to_degrees(buffer.read_int()?);
    let longitude = microdegrees_to_degrees(buffer.read_int()?);
    Ok(lat_lon(latitude, longitude))
}

fn read_start_zoom_level(buffer: &mut ReadBuffer) -> Result<u8, MapFileError> {
    let start_zoom_level = buffer.read_byte()?;
    if start_zoom_level > ZOOM_LEVEL_MAX {
        return Err(MapFileError::MalformedInput(format!(
            "invalid map start zoom level: {start_zoom_level}"
        )));
    }
    Ok(start_zoom_level)
}

fn read_language_preference(buffer: &mut ReadBuffer) -> Result<String, MapFileError> {
    let language_preference = buffer.read_utf8_encoded_string()?;
    if language_preference.chars().count() != LANGUAGE_PREFERENCE_LENGTH {
        return Err(MapFileError::MalformedInput(format!(
            "invalid language preference: {language_preference}"
        )));
    }
    Ok(language_preference)
}

fn read_tag_table(buffer: &mut ReadBuffer) -> Result<Vec<Tag>, MapFileError> {
    let number_of_tags = buffer.read_short()?;
    if number_of_tags < 0 {
        return Err(MapFileError::MalformedInput(format!(
            "invalid number of tags: {number_of_tags}"
        )));
    }

    (0..number_of_tags)
        .map(|_| Ok(Tag::parse(&buffer.read_utf8_encoded_string()?)))
        .collect()
}

fn read_sub_file_parameters(
    buffer: &mut ReadBuffer,
    file_size: u64,
    number_of_sub_files: u8,
    bounding_box: &BoundingBox,
    debug_file: bool,
) -> Result<Vec<Arc<SubFileParameter>>, MapFileError> {
    let mut sub_files = Vec::with_capacity(number_of_sub_files as usize);

    for _ in 0..number_of_sub_files {
        let base_zoom_level = buffer.read_byte()?;
        if base_zoom_level > BASE_ZOOM_LEVEL_MAX {
            return Err(MapFileError::MalformedInput(format!(
                "invalid base zoom level: {base_zoom_level}"
            )));
        }

        let zoom_level_min = buffer.read_byte()?;
        if zoom_level_min > ZOOM_LEVEL_MAX {
            return Err(MapFileError::MalformedInput(format!(
                "invalid minimum zoom level: {zoom_level_min}"
            )));
        }

        let zoom_level_max = buffer.read_byte()?;
        if zoom_level_max > ZOOM_LEVEL_MAX {
            return Err(MapFileError::MalformedInput(format!(
                "invalid maximum zoom level: {zoom_level_max}"
            )));
        }

        if zoom_level_min > zoom_level_max {
            return Err(MapFileError::MalformedInput(format!(
                "invalid zoom level range: {zoom_level_min} {zoom_level_max}"
            )));
        }

        let start_address = buffer.read_long()?;
        if start_address < HEADER_SIZE_MIN as i64 || start_address as u64 >= file_size {
            return Err(MapFileError::MalformedInput(format!(
                "invalid start address: {start_address}"
            )));
        }

        let sub_file_size = buffer.read_long()?;
        if sub_file_size < 1 {
            return Err(MapFileError::MalformedInput(format!(
                "invalid sub-file size: {sub_file_size}"
            )));
        }

        sub_files.push(Arc::new(SubFileParameter::new(
            base_zoom_level,
            zoom_level_min,
            zoom_level_max,
            start_address as u64,
            sub_file_size as u64,
            bounding_box,
            debug_file,
        )));
    }

    Ok(sub_files)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Writes header fields the way the map-file format lays them out, so
    /// tests can assemble valid and broken headers byte by byte.
    #[derive(Default)]
    struct HeaderWriter {
        bytes: Vec<u8>,
    }

    impl HeaderWriter {
        fn byte(mut self, value: u8) -> Self {
            self.bytes.push(value);
            self
        }

        fn short(mut self, value: i16) -> Self {
            self.bytes.extend_from_slice(&value.to_be_bytes());
            self
        }

        fn int(mut self, value: i32) -> Self {
            self.bytes.extend_from_slice(&value.to_be_bytes());
            self
        }

        fn long(mut self, value: i64) -> Self {
            self.bytes.extend_from_slice(&value.to_be_bytes());
            self
        }

        fn string(mut self, value: &str) -> Self {
            // Lengths below 128 fit a single variable-length byte.
            assert!(value.len() < 128);
            self.bytes.push(value.len() as u8);
            self.bytes.extend_from_slice(value.as_bytes());
            self
        }
    }

    struct SampleSubFile {
        base_zoom_level: u8,
        zoom_level_min: u8,
        zoom_level_max: u8,
        start_address: i64,
        sub_file_size: i64,
    }

    struct SampleHeader {
        file_version: i32,
        declared_file_size: Option<i64>,
        map_date: i64,
        bounding_box: [i32; 4],
        tile_pixel_size: i16,
        projection_name: &'static str,
        flags: u8,
        start_position: Option<[i32; 2]>,
        start_zoom_level: Option<u8>,
        language_preference: Option<&'static str>,
        comment: Option<&'static str>,
        created_by: Option<&'static str>,
        poi_tags: Vec<&'static str>,
        way_tags: Vec<&'static str>,
        sub_files: Vec<SampleSubFile>,
    }

    impl Default for SampleHeader {
        fn default() -> Self {
            Self {
                file_version: 3,
                declared_file_size: None,
                map_date: 1_360_000_000_000,
                bounding_box: [52_000_000, 13_000_000, 53_000_000, 14_000_000],
                tile_pixel_size: 256,
                projection_name: "Mercator",
                flags: 0,
                start_position: None,
                start_zoom_level: None,
                language_preference: None,
                comment: None,
                created_by: None,
                poi_tags: Vec::new(),
                way_tags: Vec::new(),
                sub_files: vec![SampleSubFile {
                    base_zoom_level: 0,
                    zoom_level_min: 0,
                    zoom_level_max: 0,
                    start_address: 70,
                    sub_file_size: 100,
                }],
            }
        }
    }

    impl SampleHeader {
        /// Serialize field by field, exactly as a map writer would.
        fn serialize(&self) -> Vec<u8> {
            let mut body = HeaderWriter::default()
                .int(self.file_version)
                .long(self.declared_file_size.unwrap_or(0))
                .long(self.map_date);
            for coordinate in self.bounding_box {
                body = body.int(coordinate);
            }
            body = body
                .short(self.tile_pixel_size)
                .string(self.projection_name)
                .byte(self.flags);
            if let Some([latitude, longitude]) = self.start_position {
                body = body.int(latitude).int(longitude);
            }
            if let Some(zoom_level) = self.start_zoom_level {
                body = body.byte(zoom_level);
            }
            if let Some(language) = self.language_preference {
                body = body.string(language);
            }
            if let Some(comment) = self.comment {
                body = body.string(comment);
            }
            if let Some(created_by) = self.created_by {
                body = body.string(created_by);
            }
            body = body.short(self.poi_tags.len() as i16);
            for tag in &self.poi_tags {
                body = body.string(tag);
            }
            body = body.short(self.way_tags.len() as i16);
            for tag in &self.way_tags {
                body = body.string(tag);
            }
            body = body.byte(self.sub_files.len() as u8);
            for sub_file in &self.sub_files {
                body = body
                    .byte(sub_file.base_zoom_level)
                    .byte(sub_file.zoom_level_min)
                    .byte(sub_file.zoom_level_max)
                    .long(sub_file.start_address)
                    .long(sub_file.sub_file_size);
            }

            let mut bytes = MAGIC_BYTES.to_vec();
            bytes.extend_from_slice(&(body.bytes.len() as i32).to_be_bytes());
            bytes.extend_from_slice(&body.bytes);
            bytes
        }

        /// Total size of the file the header describes; used as both the
        /// declared and the actual size unless a test overrides one.
        fn file_size(&self) -> u64 {
            let header_length = self.serialize().len() as u64;
            let data_length: i64 = self
                .sub_files
                .iter()
                .map(|sub_file| sub_file.sub_file_size)
                .sum();
            header_length + data_length as u64
        }

        fn parse(&mut self) -> Result<MapFileHeader, MapFileError> {
            if self.declared_file_size.is_none() {
                self.declared_file_size = Some(self.file_size() as i64);
            }
            let file_size = self.file_size();
            MapFileHeader::read(&mut ReadBuffer::new(self.serialize()), file_size)
        }
    }

    /// Re-serialize parsed header data field by field and compare with the
    /// original bytes.
    fn assert_roundtrip(sample: &mut SampleHeader) {
        let header = sample.parse().unwrap();
        let info = header.map_file_info();

        let reparsed = SampleHeader {
            file_version: info.file_version as i32,
            declared_file_size: Some(info.file_size as i64),
            map_date: info.map_date,
            bounding_box: [
                (info.bounding_box.min_latitude * 1e6).round() as i32,
                (info.bounding_box.min_longitude * 1e6).round() as i32,
                (info.bounding_box.max_latitude * 1e6).round() as i32,
                (info.bounding_box.max_longitude * 1e6).round() as i32,
            ],
            tile_pixel_size: info.tile_pixel_size as i16,
            projection_name: sample.projection_name,
            flags: info.flags,
            start_position: sample.start_position,
            start_zoom_level: info.start_zoom_level,
            language_preference: sample.language_preference,
            comment: sample.comment,
            created_by: sample.created_by,
            poi_tags: sample.poi_tags.clone(),
            way_tags: sample.way_tags.clone(),
            sub_files: header
                .sub_file_parameters
                .iter()
                .flatten()
                .map(|parameter| SampleSubFile {
                    base_zoom_level: parameter.base_zoom_level,
                    zoom_level_min: parameter.zoom_level_min,
                    zoom_level_max: parameter.zoom_level_max,
                    start_address: parameter.start_address as i64,
                    sub_file_size: parameter.sub_file_size as i64,
                })
                .collect(),
        };

        assert_eq!(sample.serialize(), reparsed.serialize());
    }

    #[test]
    fn minimal_header_parses() {
        let header = SampleHeader::default().parse().unwrap();

        assert_eq!(0, header.query_zoom_level(5));
        assert_eq!("Mercator", header.map_file_info().projection_name);
        assert_eq!(1, header.map_file_info().number_of_sub_files);
        assert!(header.sub_file_parameter(0).is_some());
    }

    #[test]
    fn header_roundtrips_field_by_field() {
        assert_roundtrip(&mut SampleHeader::default());
        assert_roundtrip(&mut SampleHeader {
            flags: FLAG_START_POSITION | FLAG_START_ZOOM_LEVEL | FLAG_COMMENT,
            start_position: Some([52_500_000, 13_400_000]),
            start_zoom_level: Some(14),
            comment: Some("a comment"),
            poi_tags: vec!["natural=water", "amenity=cafe"],
            way_tags: vec!["highway=primary"],
            ..Default::default()
        });
    }

    #[test]
    fn invalid_magic_is_not_a_map_file() {
        let mut bytes = SampleHeader::default().serialize();
        bytes[0] = b'x';
        let result = MapFileHeader::read(&mut ReadBuffer::new(bytes), 1000);
        assert!(matches!(result, Err(MapFileError::NotAMapFile(_))));
    }

    #[test]
    fn unknown_file_version_is_rejected() {
        let result = SampleHeader {
            file_version: 42,
            ..Default::default()
        }
        .parse();
        assert!(matches!(result, Err(MapFileError::UnsupportedVersion(42))));
    }

    #[test]
    fn declared_file_size_must_match_the_actual_size() {
        let mut sample = SampleHeader {
            declared_file_size: Some(999),
            ..Default::default()
        };
        let actual_size = sample.file_size();
        let result = MapFileHeader::read(&mut ReadBuffer::new(sample.serialize()), actual_size);
        assert!(matches!(result, Err(MapFileError::MalformedInput(_))));
    }

    #[test]
    fn start_zoom_level_out_of_range_is_malformed() {
        let result = SampleHeader {
            flags: FLAG_START_ZOOM_LEVEL,
            start_zoom_level: Some(23),
            ..Default::default()
        }
        .parse();
        assert!(matches!(result, Err(MapFileError::MalformedInput(_))));
    }

    #[test]
    fn language_preference_must_be_two_characters() {
        let result = SampleHeader {
            flags: FLAG_LANGUAGE_PREFERENCE,
            language_preference: Some("deu"),
            ..Default::default()
        }
        .parse();
        assert!(matches!(result, Err(MapFileError::MalformedInput(_))));

        let header = SampleHeader {
            flags: FLAG_LANGUAGE_PREFERENCE,
            language_preference: Some("de"),
            ..Default::default()
        }
        .parse()
        .unwrap();
        assert_eq!(
            Some("de"),
            header.map_file_info().language_preference.as_deref()
        );
    }

    #[test]
    fn flipped_bounding_box_is_malformed() {
        let result = SampleHeader {
            bounding_box: [53_000_000, 13_000_000, 52_000_000, 14_000_000],
            ..Default::default()
        }
        .parse();
        assert!(matches!(result, Err(MapFileError::MalformedInput(_))));
    }

    #[test]
    fn sub_file_start_address_must_lie_within_the_file() {
        let result = SampleHeader {
            sub_files: vec![SampleSubFile {
                base_zoom_level: 10,
                zoom_level_min: 8,
                zoom_level_max: 11,
                start_address: 10,
                sub_file_size: 100,
            }],
            ..Default::default()
        }
        .parse();
        assert!(matches!(result, Err(MapFileError::MalformedInput(_))));
    }

    #[test]
    fn lookup_table_covers_the_zoom_bands() {
        let header = SampleHeader {
            sub_files: vec![
                SampleSubFile {
                    base_zoom_level: 8,
                    zoom_level_min: 0,
                    zoom_level_max: 9,
                    start_address: 70,
                    sub_file_size: 100,
                },
                SampleSubFile {
                    base_zoom_level: 14,
                    zoom_level_min: 10,
                    zoom_level_max: 16,
                    start_address: 170,
                    sub_file_size: 100,
                },
            ],
            ..Default::default()
        }
        .parse()
        .unwrap();

        assert_eq!(8, header.sub_file_parameter(9).unwrap().base_zoom_level);
        assert_eq!(14, header.sub_file_parameter(10).unwrap().base_zoom_level);
        assert_eq!(14, header.sub_file_parameter(16).unwrap().base_zoom_level);
        assert!(header.sub_file_parameter(17).is_none());

        // Requested zoom levels are clamped into the covered range.
        assert_eq!(16, header.query_zoom_level(22));
        assert_eq!(0, header.query_zoom_level(0));
    }

    #[test]
    fn debug_flag_shifts_the_index_start() {
        let header = SampleHeader {
            flags: FLAG_DEBUG,
            ..Default::default()
        }
        .parse()
        .unwrap();

        let parameter = header.sub_file_parameter(0).unwrap();
        assert_eq!(parameter.start_address + 16, parameter.index_start_address);
        assert!(header.map_file_info().debug_file);
    }

    #[test]
    fn index_geometry_follows_the_bounding_box() {
        let header = SampleHeader {
            sub_files: vec![SampleSubFile {
                base_zoom_level: 10,
                zoom_level_min: 10,
                zoom_level_max: 10,
                start_address: 70,
                sub_file_size: 100,
            }],
            ..Default::default()
        }
        .parse()
        .unwrap();

        let parameter = header.sub_file_parameter(10).unwrap();
        assert!(parameter.boundary_tile_left <= parameter.boundary_tile_right);
        assert!(parameter.boundary_tile_top <= parameter.boundary_tile_bottom);
        assert_eq!(
            parameter.number_of_blocks,
            parameter.blocks_width * parameter.blocks_height
        );
        assert_eq!(
            parameter.index_end_address,
            parameter.index_start_address + 5 * parameter.number_of_blocks
        );
    }
}
