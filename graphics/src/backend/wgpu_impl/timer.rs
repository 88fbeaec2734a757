//! Elapsed-time queries for the wgpu backend.
//!
//! With timestamp support each query is a pair of timestamps written into a
//! shared query set, resolved and copied into the query's own readback
//! buffer. Without it the query falls back to the CPU clock around the
//! submissions.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

/// Queries with GPU timestamps; later ones use the CPU clock.
const MAX_GPU_QUERIES: u32 = 8;
const PAIR_BYTES: u64 = 2 * wgpu::QUERY_SIZE as u64;

struct Timestamps {
    query_set: wgpu::QuerySet,
    resolve: wgpu::Buffer,
    /// Nanoseconds per timestamp tick.
    period: f32,
}

#[derive(Default)]
struct Query {
    started: Option<Instant>,
    cpu_elapsed: Option<u64>,
    readback: Option<wgpu::Buffer>,
    mapped: Arc<AtomicBool>,
    in_flight: bool,
}

pub(super) struct TimerQueries {
    timestamps: Option<Timestamps>,
    queries: Mutex<Vec<Query>>,
}

impl TimerQueries {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, features: wgpu::Features) -> Self {
        let supported = features.contains(
            wgpu::Features::TIMESTAMP_QUERY | wgpu::Features::TIMESTAMP_QUERY_INSIDE_ENCODERS,
        );
        let timestamps = supported.then(|| Timestamps {
            query_set: device.create_query_set(&wgpu::QuerySetDescriptor {
                label: Some("frame_timestamps"),
                ty: wgpu::QueryType::Timestamp,
                count: MAX_GPU_QUERIES * 2,
            }),
            resolve: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("frame_timestamps_resolve"),
                size: u64::from(MAX_GPU_QUERIES) * PAIR_BYTES,
                usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
                mapped_at_creation: false,
            }),
            period: queue.get_timestamp_period(),
        });
        if timestamps.is_none() {
            log::info!("wgpu: timestamp queries unsupported, timing frames on the CPU");
        }
        Self {
            timestamps,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn create(&self) -> u32 {
        let mut queries = self.queries.lock();
        let slot = queries.len() as u32;
        queries.push(Query::default());
        slot
    }

    fn gpu_slot(&self, slot: u32) -> Option<&Timestamps> {
        self.timestamps.as_ref().filter(|_| slot < MAX_GPU_QUERIES)
    }

    pub fn begin(&self, device: &wgpu::Device, queue: &wgpu::Queue, slot: u32) {
        let mut queries = self.queries.lock();
        let Some(query) = queries.get_mut(slot as usize) else {
            return;
        };
        if query.in_flight {
            return;
        }
        query.cpu_elapsed = None;

        match self.gpu_slot(slot) {
            Some(timestamps) => {
                let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("timer_begin"),
                });
                encoder.write_timestamp(&timestamps.query_set, slot * 2);
                queue.submit(std::iter::once(encoder.finish()));
            }
            None => query.started = Some(Instant::now()),
        }
    }

    pub fn end(&self, device: &wgpu::Device, queue: &wgpu::Queue, slot: u32) {
        let mut queries = self.queries.lock();
        let Some(query) = queries.get_mut(slot as usize) else {
            return;
        };

        let Some(timestamps) = self.gpu_slot(slot) else {
            if let Some(started) = query.started.take() {
                query.cpu_elapsed = Some(started.elapsed().as_nanos() as u64);
            }
            return;
        };
        if query.in_flight {
            return;
        }

        let readback = query.readback.get_or_insert_with(|| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("frame_timestamps_readback"),
                size: PAIR_BYTES,
                usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                mapped_at_creation: false,
            })
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("timer_end"),
        });
        encoder.write_timestamp(&timestamps.query_set, slot * 2 + 1);
        encoder.resolve_query_set(
            &timestamps.query_set,
            slot * 2..slot * 2 + 2,
            &timestamps.resolve,
            u64::from(slot) * PAIR_BYTES,
        );
        encoder.copy_buffer_to_buffer(
            &timestamps.resolve,
            u64::from(slot) * PAIR_BYTES,
            readback,
            0,
            PAIR_BYTES,
        );
        queue.submit(std::iter::once(encoder.finish()));

        let mapped = query.mapped.clone();
        mapped.store(false, Ordering::Release);
        readback
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| match result {
                Ok(()) => mapped.store(true, Ordering::Release),
                Err(e) => log::warn!("wgpu: timestamp readback failed: {e}"),
            });
        query.in_flight = true;
    }

    /// Elapsed nanoseconds, if the query's readback has landed. Never blocks.
    pub fn result(&self, device: &wgpu::Device, slot: u32) -> Option<u64> {
        let mut queries = self.queries.lock();
        let query = queries.get_mut(slot as usize)?;

        let Some(timestamps) = self.gpu_slot(slot) else {
            return query.cpu_elapsed;
        };
        if !query.in_flight {
            return None;
        }

        let _ = device.poll(wgpu::PollType::Poll);
        if !query.mapped.load(Ordering::Acquire) {
            return None;
        }

        let readback = query.readback.as_ref()?;
        let ticks: [u64; 2] = {
            let data = readback.slice(..).get_mapped_range();
            bytemuck::pod_read_unaligned(&data[..PAIR_BYTES as usize])
        };
        readback.unmap();
        query.in_flight = false;

        let elapsed = ticks[1].saturating_sub(ticks[0]) as f64 * f64::from(timestamps.period);
        Some(elapsed as u64)
    }
}
