// testing.rs - Shared test doubles for the preview pipeline

use std::collections::HashSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};

use super::error::FetchError;
use super::fetch::ThumbnailFetcher;
use super::record::ThumbnailRecord;

pub fn records(n: usize) -> Vec<ThumbnailRecord> {
    (0..n)
        .map(|i| {
            ThumbnailRecord::new(
                i as u64,
                &format!("Illustration number {}", i),
                &format!("artist_{}", i),
                &format!("https://i.example.net/thumb/{}.png", i),
            )
        })
        .collect()
}

/// Distinct, JPEG-friendly colour per pid
pub fn color_for(id: u64) -> Rgb<u8> {
    let palette = [
        [200, 30, 30],
        [30, 160, 30],
        [30, 30, 200],
        [200, 200, 30],
        [30, 200, 200],
        [200, 30, 200],
        [120, 60, 0],
        [0, 90, 120],
    ];
    Rgb(palette[(id as usize) % palette.len()])
}

pub fn solid_png(width: u32, height: u32, color: Rgb<u8>) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, color);
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .unwrap();
    bytes
}

/// Fetcher that renders a solid thumbnail per pid and records concurrency
pub struct StubFetcher {
    pub calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    failing: HashSet<u64>,
    corrupt: HashSet<u64>,
    size: (u32, u32),
    delay: Duration,
    reverse_delay_base: Option<u64>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            failing: HashSet::new(),
            corrupt: HashSet::new(),
            size: (250, 250),
            delay: Duration::ZERO,
            reverse_delay_base: None,
        }
    }

    pub fn failing(mut self, ids: &[u64]) -> Self {
        self.failing.extend(ids.iter().copied());
        self
    }

    pub fn corrupt(mut self, ids: &[u64]) -> Self {
        self.corrupt.extend(ids.iter().copied());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// pid n sleeps (base - n) ms, so earlier records finish last
    pub fn with_reverse_delays(mut self, base: u64) -> Self {
        self.reverse_delay_base = Some(base);
        self
    }
}

#[async_trait]
impl ThumbnailFetcher for StubFetcher {
    async fn fetch(&self, record: &ThumbnailRecord) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = match self.reverse_delay_base {
            Some(base) => Duration::from_millis(base.saturating_sub(record.id) * 2),
            None => self.delay,
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&record.id) {
            return Err(FetchError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no thumbnail for {}", record.id),
            )));
        }
        if self.corrupt.contains(&record.id) {
            return Ok(b"\x89PNG garbage".to_vec());
        }
        Ok(solid_png(self.size.0, self.size.1, color_for(record.id)))
    }
}
