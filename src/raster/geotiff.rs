/// GeoTIFF raster source
///
/// Georeferencing comes from the ModelPixelScale and ModelTiepoint tags.
/// Windows are assembled from the strips or tiles they overlap; decoded
/// chunks are kept only while the current window still needs them, so a
/// band of windows over the same strips decodes each strip once.

use super::{RasterBlock, RasterMetadata, RasterSource, Window};
use crate::constants::{TAG_MODEL_PIXEL_SCALE, TAG_MODEL_TIEPOINT};
use crate::error::{HullError, Result};
use glam::DVec2;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tracing::debug;

struct DecodedChunk {
    width: u32,
    samples_per_pixel: usize,
    data: Vec<u16>,
}

pub struct GeoTiffRaster<R: Read + Seek> {
    decoder: Decoder<R>,
    metadata: RasterMetadata,
    chunk_width: u32,
    chunk_height: u32,
    chunks_across: u32,
    cache: HashMap<u32, DecodedChunk>,
}

impl GeoTiffRaster<BufReader<File>> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        debug!(path = %path.as_ref().display(), "opening GeoTIFF");
        Self::new(BufReader::new(file))
    }
}

impl<R: Read + Seek> GeoTiffRaster<R> {
    pub fn new(reader: R) -> Result<Self> {
        let mut decoder = Decoder::new(reader)?;
        let metadata = read_metadata(&mut decoder)?;

        let (chunk_width, chunk_height) = decoder.chunk_dimensions();
        if chunk_width == 0 || chunk_height == 0 {
            return Err(HullError::UnsupportedRaster(
                "image has empty strips or tiles".to_string(),
            ));
        }

        Ok(Self {
            decoder,
            metadata,
            chunk_width,
            chunk_height,
            chunks_across: metadata.width.div_ceil(chunk_width),
            cache: HashMap::new(),
        })
    }

    fn chunk_index(&self, x: u32, y: u32) -> u32 {
        (y / self.chunk_height) * self.chunks_across + x / self.chunk_width
    }

    fn chunks_for(&self, window: &Window) -> BTreeSet<u32> {
        let first_column = window.x / self.chunk_width;
        let last_column = (window.x + window.width - 1) / self.chunk_width;
        let first_row = window.y / self.chunk_height;
        let last_row = (window.y + window.height - 1) / self.chunk_height;

        (first_row..=last_row)
            .flat_map(|row| {
                (first_column..=last_column).map(move |column| row * self.chunks_across + column)
            })
            .collect()
    }

    fn decode_chunk(&mut self, index: u32) -> Result<DecodedChunk> {
        let (width, height) = self.decoder.chunk_data_dimensions(index);
        let data: Vec<u16> = match self.decoder.read_chunk(index)? {
            DecodingResult::U8(data) => data.into_iter().map(u16::from).collect(),
            DecodingResult::U16(data) => data,
            _ => {
                return Err(HullError::UnsupportedRaster(
                    "only 8 and 16 bit integer samples are supported".to_string(),
                ));
            }
        };

        let pixels = width as usize * height as usize;
        if pixels == 0 || data.len() < pixels || data.len() % pixels != 0 {
            return Err(HullError::UnsupportedRaster(format!(
                "chunk {} holds {} samples for {}x{} pixels",
                index,
                data.len(),
                width,
                height
            )));
        }

        Ok(DecodedChunk {
            width,
            samples_per_pixel: data.len() / pixels,
            data,
        })
    }
}

impl<R: Read + Seek> RasterSource for GeoTiffRaster<R> {
    fn metadata(&self) -> &RasterMetadata {
        &self.metadata
    }

    fn read_window(&mut self, window: &Window) -> Result<RasterBlock> {
        if window.width == 0
            || window.height == 0
            || window.x + window.width > self.metadata.width
            || window.y + window.height > self.metadata.height
        {
            return Err(HullError::UnsupportedRaster(format!(
                "window {:?} is outside the {}x{} image",
                window, self.metadata.width, self.metadata.height
            )));
        }

        let needed = self.chunks_for(window);
        self.cache.retain(|index, _| needed.contains(index));
        for &index in &needed {
            if !self.cache.contains_key(&index) {
                let chunk = self.decode_chunk(index)?;
                self.cache.insert(index, chunk);
            }
        }

        let mut samples = Vec::with_capacity(window.pixel_count());
        for y in window.y..window.y + window.height {
            for x in window.x..window.x + window.width {
                let index = self.chunk_index(x, y);
                let chunk = self
                    .cache
                    .get(&index)
                    .ok_or_else(|| HullError::UnsupportedRaster(format!("chunk {} missing", index)))?;
                let local_x = (x % self.chunk_width) as usize;
                let local_y = (y % self.chunk_height) as usize;
                let offset = (local_y * chunk.width as usize + local_x) * chunk.samples_per_pixel;
                samples.push(chunk.data[offset]);
            }
        }

        Ok(RasterBlock {
            window: *window,
            samples,
        })
    }
}

fn read_metadata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<RasterMetadata> {
    let (width, height) = decoder.dimensions()?;
    let scale = tag_values(decoder, TAG_MODEL_PIXEL_SCALE, "ModelPixelScaleTag", 2)?;
    let tie = tag_values(decoder, TAG_MODEL_TIEPOINT, "ModelTiepointTag", 6)?;

    Ok(RasterMetadata {
        width,
        height,
        pixel_scale: DVec2::new(scale[0], scale[1]),
        tie_point_raster: DVec2::new(tie[0], tie[1]),
        tie_point_model: DVec2::new(tie[3], tie[4]),
    })
}

fn tag_values<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    id: u16,
    name: &'static str,
    min_len: usize,
) -> Result<Vec<f64>> {
    let values = decoder
        .find_tag(Tag::from_u16_exhaustive(id))?
        .ok_or(HullError::MissingTag(name))?
        .into_f64_vec()?;
    if values.len() < min_len {
        return Err(HullError::MissingTag(name));
    }
    Ok(values)
}
