use crate::pipeline::common::error::Result;
use crate::pipeline::image::types::ImageData;

pub trait ImageReader {
    fn read_image(&self, data: &[u8]) -> Result<ImageData>;
}
