//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, GIF, TIFF, WebP) | `image` crate, format sniffed from content |
//! | Decode (AVIF) | `avif-parse` (container) + `rav1d` (AV1 decode) + YUV→RGB |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → WebP | `webp` crate (lossy, quality 1-100) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::fit_to_width;
use super::params::TranscodeParams;
use crate::types::OutputFormat;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::borrow::Cow;
use std::path::Path;

/// Extensions whose decoders are compiled into the `image` crate.
///
/// AVIF is not listed: the `"avif"` feature only enables the rav1e encoder,
/// and `ImageFormat::reading_enabled()` still reports `true` for it. AVIF
/// sources go through [`decode_avif`] instead.
const DECODE_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("gif", ImageFormat::Gif),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Image file extensions (no dot) this backend can decode.
#[cfg(test)]
fn supported_input_extensions() -> Vec<&'static str> {
    let mut exts: Vec<&'static str> = DECODE_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect();
    exts.push("avif");
    exts
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn is_avif(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("avif"))
}

/// Open a reader whose format comes from the file's magic bytes when they
/// are recognizable, falling back to the extension. Misnamed files
/// (a PNG saved as `.jpg`) still decode.
fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    if is_avif(path) {
        return decode_avif(path);
    }
    open_reader(path)?.decode().map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
    })
}

fn read_avif(path: &Path) -> Result<avif_parse::AvifData, BackendError> {
    let file_data = std::fs::read(path)?;
    avif_parse::read_avif(&mut std::io::Cursor::new(&file_data)).map_err(|e| {
        BackendError::ProcessingFailed(format!("Failed to parse AVIF {}: {e:?}", path.display()))
    })
}

/// Read dimensions from an AVIF container without decoding pixels.
fn identify_avif(path: &Path) -> Result<Dimensions, BackendError> {
    let avif = read_avif(path)?;
    let meta = avif.primary_item_metadata().map_err(|e| {
        BackendError::ProcessingFailed(format!(
            "Failed to read AVIF metadata {}: {e:?}",
            path.display()
        ))
    })?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Decode an AVIF file with avif-parse (container) and rav1d (AV1).
///
/// The `image` crate can only decode AVIF through the `"avif-native"`
/// feature, which links the C dav1d library. rav1d is its Rust port.
fn decode_avif(path: &Path) -> Result<DynamicImage, BackendError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::picture::Dav1dPicture;
    use std::ptr::NonNull;

    let avif = read_avif(path)?;
    let av1_bytes: &[u8] = &avif.primary_item;

    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    unsafe { rav1d::src::lib::dav1d_default_settings(NonNull::from(&mut settings).cast()) };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc =
        unsafe { rav1d::src::lib::dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d open failed ({})",
            rc.0
        )));
    }

    let mut data = Dav1dData::default();
    let buf_ptr =
        unsafe { rav1d::src::lib::dav1d_data_create(NonNull::new(&mut data), av1_bytes.len()) };
    if buf_ptr.is_null() {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(BackendError::ProcessingFailed(
            "rav1d data_create failed".into(),
        ));
    }
    unsafe { std::ptr::copy_nonoverlapping(av1_bytes.as_ptr(), buf_ptr, av1_bytes.len()) };

    let rc = unsafe { rav1d::src::lib::dav1d_send_data(ctx, NonNull::new(&mut data)) };
    if rc.0 != 0 {
        unsafe {
            rav1d::src::lib::dav1d_data_unref(NonNull::new(&mut data));
            rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
        }
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d send_data failed ({})",
            rc.0
        )));
    }

    let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
    let rc = unsafe { rav1d::src::lib::dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
    if rc.0 != 0 {
        unsafe { rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx)) };
        return Err(BackendError::ProcessingFailed(format!(
            "rav1d get_picture failed ({})",
            rc.0
        )));
    }

    // The picture must be released whether or not conversion succeeds.
    let converted = picture_to_rgb(&pic);
    unsafe {
        rav1d::src::lib::dav1d_picture_unref(NonNull::new(&mut pic));
        rav1d::src::lib::dav1d_close(NonNull::new(&mut ctx));
    }
    let (w, h, rgb) = converted?;

    image::RgbImage::from_raw(w, h, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| {
            BackendError::ProcessingFailed("Failed to create image from decoded AVIF data".into())
        })
}

/// Convert a decoded rav1d picture into interleaved RGB8.
fn picture_to_rgb(
    pic: &rav1d::include::dav1d::picture::Dav1dPicture,
) -> Result<(u32, u32, Vec<u8>), BackendError> {
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };

    let plane = |i: usize| {
        pic.data[i]
            .map(|p| p.as_ptr() as *const u8)
            .ok_or_else(|| BackendError::ProcessingFailed(format!("AVIF plane {i} missing")))
    };

    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let layout = pic.p.layout;
    let y_ptr = plane(0)?;

    let planes = if layout == DAV1D_PIXEL_LAYOUT_I400 {
        YuvPlanes {
            y_ptr,
            u_ptr: y_ptr,
            v_ptr: y_ptr,
            y_stride: pic.stride[0],
            uv_stride: 0,
            width,
            height,
            bpc: pic.p.bpc as u32,
            ss_x: false,
            ss_y: false,
            monochrome: true,
        }
    } else {
        let (ss_x, ss_y) = match layout {
            DAV1D_PIXEL_LAYOUT_I420 => (true, true),
            DAV1D_PIXEL_LAYOUT_I422 => (true, false),
            DAV1D_PIXEL_LAYOUT_I444 => (false, false),
            _ => {
                return Err(BackendError::ProcessingFailed(format!(
                    "Unsupported AVIF pixel layout: {layout}"
                )));
            }
        };
        YuvPlanes {
            y_ptr,
            u_ptr: plane(1)?,
            v_ptr: plane(2)?,
            y_stride: pic.stride[0],
            uv_stride: pic.stride[1],
            width,
            height,
            bpc: pic.p.bpc as u32,
            ss_x,
            ss_y,
            monochrome: false,
        }
    };

    Ok((width, height, planes.to_rgb()?))
}

/// Decoded YUV plane data from rav1d, ready for RGB conversion.
struct YuvPlanes {
    y_ptr: *const u8,
    u_ptr: *const u8,
    v_ptr: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    /// Chroma subsampling: horizontal, vertical (I420 = true, true)
    ss_x: bool,
    ss_y: bool,
    monochrome: bool,
}

impl YuvPlanes {
    /// Convert YUV planes to interleaved RGB8 using BT.601 coefficients.
    fn to_rgb(&self) -> Result<Vec<u8>, BackendError> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;

        let len = rgb_buffer_len(self.width, self.height).ok_or_else(|| {
            BackendError::ProcessingFailed(format!(
                "AVIF frame too large: {}x{}",
                self.width, self.height
            ))
        })?;
        let mut rgb = vec![0u8; len];
        let row_len = self.width as usize * 3;

        for row in 0..self.height {
            for col in 0..self.width {
                let y_val = read_sample(self.y_ptr, self.y_stride, col, row, self.bpc);

                let (r, g, b) = if self.monochrome {
                    let v = (y_val * scale).clamp(0.0, 255.0);
                    (v, v, v)
                } else {
                    let u_col = if self.ss_x { col / 2 } else { col };
                    let u_row = if self.ss_y { row / 2 } else { row };
                    let cb = read_sample(self.u_ptr, self.uv_stride, u_col, u_row, self.bpc) - center;
                    let cr = read_sample(self.v_ptr, self.uv_stride, u_col, u_row, self.bpc) - center;
                    (
                        ((y_val + 1.402 * cr) * scale).clamp(0.0, 255.0),
                        ((y_val - 0.344136 * cb - 0.714136 * cr) * scale).clamp(0.0, 255.0),
                        ((y_val + 1.772 * cb) * scale).clamp(0.0, 255.0),
                    )
                };

                let idx = row as usize * row_len + col as usize * 3;
                rgb[idx] = r as u8;
                rgb[idx + 1] = g as u8;
                rgb[idx + 2] = b as u8;
            }
        }

        Ok(rgb)
    }
}

/// Byte length of an interleaved RGB8 buffer, `None` if it does not fit in memory.
fn rgb_buffer_len(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)?
        .checked_mul(3)
}

/// Read one sample from a YUV plane; >8-bit depths are stored as u16.
#[inline]
fn read_sample(ptr: *const u8, stride: isize, x: u32, y: u32, bpc: u32) -> f32 {
    if bpc <= 8 {
        (unsafe { *ptr.offset(y as isize * stride + x as isize) }) as f32
    } else {
        let byte_offset = y as isize * stride + x as isize * 2;
        (unsafe { *(ptr.offset(byte_offset) as *const u16) }) as f32
    }
}

/// Both encoders take 8-bit RGB(A) only.
fn to_rgb8_or_rgba8(img: &DynamicImage) -> Cow<'_, DynamicImage> {
    match img {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Cow::Borrowed(img),
        other if other.color().has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8())),
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}

/// Encode and write `img` in `format`, replacing anything at `path`.
fn save_image(
    img: &DynamicImage,
    path: &Path,
    format: OutputFormat,
    quality: u32,
) -> Result<(), BackendError> {
    let img = to_rgb8_or_rgba8(img);
    match format {
        OutputFormat::Webp => save_webp(&img, path, quality),
        OutputFormat::Avif => save_avif(&img, path, quality),
    }
}

fn save_webp(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let encoder = webp::Encoder::from_image(img)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e}")))?;
    // `encode` unwraps internally; oversized frames (> 16383px) must fail, not panic.
    let encoded = encoder
        .encode_simple(false, quality as f32)
        .map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {e:?}")))?;
    std::fs::write(path, &*encoded)?;
    Ok(())
}

/// Encode and save as AVIF using rav1e (speed=6 for reasonable throughput).
fn save_avif(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    let encoder =
        image::codecs::avif::AvifEncoder::new_with_speed_quality(writer, 6, quality as u8);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("AVIF encode failed: {}", e)))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        if is_avif(path) {
            return identify_avif(path);
        }
        let (width, height) = open_reader(path)?.into_dimensions().map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn transcode(&self, params: &TranscodeParams) -> Result<Dimensions, BackendError> {
        let img = load_image(&params.source)?;
        let (width, height) = fit_to_width((img.width(), img.height()), params.max_width);
        let fitted = if width == img.width() {
            img
        } else {
            img.resize_exact(width, height, FilterType::Lanczos3)
        };
        save_image(
            &fitted,
            &params.output,
            params.format,
            params.quality.value(),
        )?;
        Ok(Dimensions { width, height })
    }
}
