//! Request-driven background image loader.
//! Receives slide load jobs, decodes, orients and downsizes off-thread,
//! and returns RGBA8 frames without blocking the event loop.

use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};
use crossbeam_channel::{Receiver, Sender};
use fast_image_resize as fir;
use image::RgbaImage;
use tracing::{debug, warn};

use crate::error::Error;
use crate::events::{InvalidSlide, LoadSlide, LoaderEvent, PreparedImageCpu, SlideLoaded};
use crate::slide::SizesHint;

/// Message sent to the background loader thread.
#[derive(Debug)]
pub enum LoaderMsg {
    Load(LoadSlide),
    /// Stop the loader.
    Quit,
}

/// Pending jobs; priority jobs are served first, each group in arrival order.
#[derive(Debug, Default)]
pub struct LoadQueue {
    jobs: VecDeque<LoadSlide>,
}

impl LoadQueue {
    pub fn push(&mut self, job: LoadSlide) {
        if job.priority {
            let at = self.jobs.iter().take_while(|j| j.priority).count();
            self.jobs.insert(at, job);
        } else {
            self.jobs.push_back(job);
        }
    }

    pub fn pop(&mut self) -> Option<LoadSlide> {
        self.jobs.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

/// Spawn the request-driven loader.
pub fn spawn_loader(
    rx: Receiver<LoaderMsg>,
    tx: Sender<LoaderEvent>,
    max_texture_dim: u32,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut queue = LoadQueue::default();
        loop {
            if queue.is_empty() {
                match rx.recv() {
                    Ok(LoaderMsg::Load(job)) => queue.push(job),
                    Ok(LoaderMsg::Quit) | Err(_) => break,
                }
            }
            // pick up anything queued meanwhile so priority jobs can jump ahead
            let mut quit = false;
            while let Ok(msg) = rx.try_recv() {
                match msg {
                    LoaderMsg::Load(job) => queue.push(job),
                    LoaderMsg::Quit => quit = true,
                }
            }
            if quit {
                break;
            }
            let Some(job) = queue.pop() else {
                continue;
            };
            if tx.send(load_slide(job, max_texture_dim)).is_err() {
                break;
            }
        }
        debug!("loader stopped");
    })
}

/// Run one job to completion.
pub fn load_slide(job: LoadSlide, max_texture_dim: u32) -> LoaderEvent {
    match prepare(&job.path, job.target_width, max_texture_dim) {
        Ok(prepared) => {
            debug!(
                index = job.index,
                width = prepared.width,
                height = prepared.height,
                priority = job.priority,
                "slide loaded"
            );
            LoaderEvent::Loaded(SlideLoaded {
                index: job.index,
                prepared,
            })
        }
        Err(err) => {
            warn!(index = job.index, path = %job.path.display(), error = ?err, "invalid slide");
            LoaderEvent::Invalid(InvalidSlide {
                index: job.index,
                path: job.path,
                reason: format!("{err:#}"),
            })
        }
    }
}

fn prepare(path: &Path, target_width: u32, max_texture_dim: u32) -> Result<PreparedImageCpu> {
    let img = decode_rgba8_apply_exif(path)?;
    let (width, height) = fit_width(img.width(), img.height(), target_width, max_texture_dim);
    let img = resize_rgba(img, width, height)?;
    Ok(PreparedImageCpu {
        path: path.to_path_buf(),
        width,
        height,
        pixels: img.into_raw(),
    })
}

// Decodes an image to RGBA8 and applies EXIF orientation if available.
fn decode_rgba8_apply_exif(path: &Path) -> Result<RgbaImage, Error> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })?;
    let img = img.to_rgba8();

    let orientation = read_orientation(path).unwrap_or(1);
    Ok(match orientation {
        2 => image::imageops::flip_horizontal(&img),
        3 => image::imageops::rotate180(&img),
        4 => image::imageops::flip_vertical(&img),
        5 => image::imageops::flip_horizontal(&image::imageops::rotate90(&img)),
        6 => image::imageops::rotate90(&img),
        7 => image::imageops::flip_horizontal(&image::imageops::rotate270(&img)),
        8 => image::imageops::rotate270(&img),
        _ => img,
    })
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let o = field.value.get_uint(0)? as u16;
    debug!("exif orientation {} for {}", o, path.display());
    Some(o)
}

/// Output size for a `src_w`×`src_h` image shown at most `target_width` wide.
///
/// Keeps the aspect ratio, never upscales and keeps both sides within `max_dim`.
pub fn fit_width(src_w: u32, src_h: u32, target_width: u32, max_dim: u32) -> (u32, u32) {
    let iw = src_w.max(1) as f32;
    let ih = src_h.max(1) as f32;
    let max_dim = max_dim.max(1) as f32;
    let scale = (target_width.max(1) as f32 / iw)
        .min(max_dim / iw)
        .min(max_dim / ih)
        .min(1.0);
    let w = (iw * scale).round().max(1.0);
    let h = (ih * scale).round().max(1.0);
    (w as u32, h as u32)
}

fn resize_rgba(source: RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage> {
    if source.dimensions() == (target_w, target_h) {
        return Ok(source);
    }
    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("failed to create source view for slide resize")?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::CatmullRom));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .context("slide resize failed")?;
    RgbaImage::from_raw(target_w, target_h, dst_image.into_vec())
        .ok_or_else(|| anyhow::anyhow!("failed to construct resized RGBA image"))
}

/// Decode width in physical px for a window `window_w` physical px wide.
///
/// The `sizes` hint is evaluated in logical px; the result never drops below the
/// frame width so a slide is not blown up on screen.
pub fn decode_width(sizes: &SizesHint, window_w: u32, scale_factor: f64, frame_w: f32) -> u32 {
    let scale = scale_factor.max(f64::MIN_POSITIVE) as f32;
    let logical = window_w as f32 / scale;
    let hinted = sizes.width_for(logical) * scale;
    hinted.max(frame_w).ceil().max(1.0) as u32
}

/// Slides worth requesting now, in request order: what is on screen, then the
/// neighbours of `current`. Already requested slides are skipped.
pub fn slides_to_request(
    visible: &[usize],
    current: usize,
    count: usize,
    requested: &[bool],
) -> Vec<usize> {
    if count == 0 {
        return Vec::new();
    }
    let next = (current + 1) % count;
    let prev = (current + count - 1) % count;
    let mut out: Vec<usize> = Vec::new();
    for k in visible.iter().copied().chain([current, next, prev]) {
        if k < count && !requested.get(k).copied().unwrap_or(false) && !out.contains(&k) {
            out.push(k);
        }
    }
    out
}
